// Copyright 2025 Cowboy AI, LLC.

//! Sensor ingest, field-limit alerts and device status through the in-memory store

mod common;

use common::Farmyard;
use pretty_assertions::assert_eq;
use smart_agri_core::*;

fn monitor(yard: &Farmyard) -> SensorMonitor {
    SensorMonitor::new(
        yard.store.clone(),
        NotificationDispatcher::sandboxed(yard.store.clone()),
    )
}

#[tokio::test]
async fn test_one_reading_can_cross_several_limits() {
    let yard = Farmyard::new().await;
    let probe = yard.install(DeviceType::SoilSensor, "SOIL-21").await;
    let monitor = monitor(&yard);

    let report = monitor
        .ingest_reading(
            "SOIL-21",
            SensorPayload {
                soil_moisture: Some(94.0),
                air_temperature: Some(3.5),
                soil_ph: Some(9.1),
                ..SensorPayload::default()
            },
        )
        .await
        .unwrap();

    let summary: Vec<(&str, NotificationType, Priority, Vec<Channel>)> = report
        .alerts
        .iter()
        .map(|n| {
            (
                n.title.as_str(),
                n.notification_type,
                n.priority,
                n.sent_via.clone(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                "Warning: Waterlogging Risk",
                NotificationType::Irrigation,
                Priority::Critical,
                vec![Channel::InApp, Channel::Sms],
            ),
            (
                "Frost Alert",
                NotificationType::Weather,
                Priority::High,
                vec![Channel::InApp, Channel::Sms],
            ),
            (
                "Soil pH Alert",
                NotificationType::HealthAlert,
                Priority::High,
                vec![Channel::InApp],
            ),
        ]
    );
    assert_eq!(report.alerts[2].message, "Soil pH at SOIL-21 is 9.1. This may affect crop growth.");
    assert!(report
        .alerts
        .iter()
        .all(|n| n.farmer_id == yard.farmer.id && n.farm_id == Some(yard.farm.id)));
    assert_eq!(
        report.alerts[0].metadata.as_ref().unwrap()["soilMoisture"],
        94.0
    );

    let stored = monitor.latest_readings(probe.id, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].soil_ph, Some(9.1));
}

#[tokio::test]
async fn test_readings_within_limits_raise_nothing() {
    let yard = Farmyard::new().await;
    yard.install(DeviceType::WeatherStation, "WX-1").await;
    let monitor = monitor(&yard);

    let report = monitor
        .ingest_reading(
            "WX-1",
            SensorPayload {
                soil_moisture: Some(45.0),
                air_temperature: Some(29.0),
                soil_ph: Some(6.8),
                air_humidity: Some(70.0),
                ..SensorPayload::default()
            },
        )
        .await
        .unwrap();

    assert!(report.alerts.is_empty());
    assert_eq!(yard.store.notification_count().await, 0);
}

#[tokio::test]
async fn test_device_stats_cover_ingested_readings() {
    let yard = Farmyard::new().await;
    let probe = yard.install(DeviceType::SoilSensor, "SOIL-22").await;
    let monitor = monitor(&yard);
    for (moisture, temperature) in [(40.0, Some(30.0)), (50.0, None), (45.5, Some(31.0))] {
        monitor
            .ingest_reading(
                "SOIL-22",
                SensorPayload {
                    soil_moisture: Some(moisture),
                    air_temperature: temperature,
                    ..SensorPayload::default()
                },
            )
            .await
            .unwrap();
    }

    let stats = monitor.device_stats(probe.id, None).await.unwrap();
    assert_eq!(stats.reading_count, 3);
    assert_eq!(stats.avg_soil_moisture, Some(45.2));
    assert_eq!(stats.avg_temperature, Some(30.5));
    assert_eq!(stats.period_hours, 24);
    assert!(stats.last_reading.is_some());

    assert_eq!(monitor.latest_readings(probe.id, Some(2)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_device_offline_notifies_once() {
    let yard = Farmyard::new().await;
    yard.install(DeviceType::IrrigationController, "VALVE-22").await;
    let monitor = monitor(&yard);

    for _ in 0..3 {
        monitor
            .update_device_status("VALVE-22", DeviceStatus::Offline)
            .await
            .unwrap();
    }

    let inbox = NotificationDispatcher::sandboxed(yard.store.clone())
        .get_notifications(yard.farmer.id, ListOptions::default())
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
    let notice = &inbox.items[0];
    assert_eq!(notice.title, "Device Offline");
    assert_eq!(notice.message, "VALVE-22 (irrigation_controller) has gone offline.");
    assert_eq!(notice.priority, Priority::Medium);
    assert_eq!(notice.notification_type, NotificationType::Device);

    // Coming back and dropping again is a new edge
    monitor
        .update_device_status("VALVE-22", DeviceStatus::Active)
        .await
        .unwrap();
    monitor
        .update_device_status("VALVE-22", DeviceStatus::Offline)
        .await
        .unwrap();
    assert_eq!(yard.store.notification_count().await, 2);
}
