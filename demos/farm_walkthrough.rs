// Copyright 2025 Cowboy AI, LLC.

//! Farm walkthrough
//!
//! Seeds an in-memory farm, asks the engine for advice, runs an
//! irrigation schedule to completion and applies a fertilizer dose.
//! Uses sandbox messaging and no weather provider, so it runs offline.
//!
//! ```text
//! cargo run --example farm_walkthrough
//! ```

use anyhow::Context;
use chrono::{Duration, Utc};
use smart_agri_core::lifecycle::{fertilization_history, irrigation_history};
use smart_agri_core::persistence::{CropStore, DeviceStore, FarmStore, FarmerStore};
use smart_agri_core::*;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdvisorConfig::from_env().context("loading configuration")?;
    telemetry::init(config.environment, &config.log_filter);

    let store = Arc::new(InMemoryStore::new());
    let weather: Arc<dyn WeatherProvider> = Arc::new(NoWeatherProvider);
    let commands = Arc::new(RecordingCommandChannel::new());
    let dispatcher = NotificationDispatcher::sandboxed(store.clone())
        .with_delivery_timeout(config.delivery_timeout())
        .with_retention_days(config.notification_retention_days)
        .with_page_size(config.default_page_size);

    let engine = RecommendationEngine::new(store.clone(), weather.clone(), Arc::new(config.tables.clone()))
        .with_weather_timeout(config.weather_timeout());
    let irrigation = IrrigationLifecycle::new(store.clone(), weather, commands.clone(), dispatcher.clone())
        .with_weather_timeout(config.weather_timeout());
    let fertilization = FertilizationLifecycle::new(store.clone(), dispatcher.clone());
    let monitor = SensorMonitor::new(store.clone(), dispatcher.clone());

    // Seed
    let farmer = Farmer {
        id: FarmerId::new(),
        name: "Priya".into(),
        phone: "+919833333333".into(),
        email: Some("priya@example.org".into()),
    };
    let farm = Farm {
        id: FarmId::new(),
        farmer_id: farmer.id,
        name: "Hillside".into(),
        latitude: 10.85,
        longitude: 76.27,
    };
    let rice = Crop {
        id: CropId::new(),
        farm_id: farm.id,
        crop_type: "rice".into(),
        planted_date: Some(Utc::now().date_naive() - Duration::days(30)),
        area_hectares: Some(2.0),
        status: CropStatus::Active,
    };
    let soil = IoTDevice {
        id: DeviceId::new(),
        farm_id: farm.id,
        serial: "SOIL-001".into(),
        name: "Soil probe".into(),
        device_type: DeviceType::SoilSensor,
        status: DeviceStatus::Active,
        last_seen_at: None,
    };
    let npk = IoTDevice {
        id: DeviceId::new(),
        serial: "NPK-001".into(),
        name: "NPK probe".into(),
        device_type: DeviceType::NpkSensor,
        ..soil.clone()
    };
    let valve = IoTDevice {
        id: DeviceId::new(),
        serial: "VALVE-001".into(),
        name: "Main valve".into(),
        device_type: DeviceType::IrrigationController,
        ..soil.clone()
    };

    store.upsert_farmer(farmer.clone()).await?;
    store.upsert_farm(farm.clone()).await?;
    store.upsert_crop(rice.clone()).await?;
    store
        .record_health(CropHealth::assess(rice.id, Utc::now(), 0.35, Some(40.0), Some(33.0), Some(55.0)))
        .await?;
    for device in [&soil, &npk, &valve] {
        store.upsert_device(device.clone()).await?;
    }

    // Sensor ingest
    let soil_report = monitor
        .ingest_reading(
            &soil.serial,
            SensorPayload {
                soil_moisture: Some(18.5),
                air_temperature: Some(43.5),
                ..SensorPayload::default()
            },
        )
        .await?;
    for alert in &soil_report.alerts {
        info!(title = %alert.title, priority = ?alert.priority, "Sensor alert");
    }
    monitor
        .ingest_reading(
            &npk.serial,
            SensorPayload {
                nitrogen_level: Some(32.0),
                phosphorus_level: Some(41.0),
                potassium_level: Some(55.0),
                ..SensorPayload::default()
            },
        )
        .await?;

    // Advice
    let water = engine
        .irrigation_recommendations_for_farm(farmer.id, farm.id)
        .await?;
    for rec in &water {
        info!(crop = %rec.crop_type, urgency = ?rec.urgency, minutes = rec.recommended_duration, reason = %rec.reason, "Irrigation advice");
    }
    let feed = engine
        .fertilization_recommendations_for_farm(farmer.id, farm.id)
        .await?;
    for rec in &feed {
        info!(crop = %rec.crop_type, fertilizer = %rec.fertilizer_type, kg = rec.quantity_kg, cost = rec.estimated_cost, reason = %rec.reason, "Fertilization advice");
    }

    // Irrigate
    let top = water.first().context("expected an irrigation recommendation")?;
    let schedule = irrigation
        .schedule_from_recommendation(farmer.id, farm.id, top, Utc::now(), Some(valve.id))
        .await?;
    irrigation.trigger(Some(farmer.id), schedule.id).await?;
    for (topic, command) in commands.published().await {
        let payload = serde_json::to_string(&command)?;
        info!(%topic, %payload, "Device command");
    }
    irrigation
        .report_outcome(schedule.id, RunOutcome::Completed, Some(3_600.0))
        .await?;

    // Fertilize
    let dose = feed.first().context("expected a fertilization recommendation")?;
    let record = fertilization
        .record_from_recommendation(farmer.id, dose, Utc::now())
        .await?;
    fertilization
        .apply(farmer.id, record.id, Application::of(dose.quantity_kg))
        .await?;

    // Inbox and history
    let alert = dispatcher
        .create_critical_alert(
            farmer.id,
            Some(farm.id),
            NotificationType::HealthAlert,
            "Crop Health Critical",
            "Rice on Hillside shows heat stress",
            None,
        )
        .await?;
    info!(sent_via = ?alert.sent_via, "Critical alert delivered");

    let inbox = dispatcher
        .get_notifications(farmer.id, ListOptions::default())
        .await?;
    for notification in &inbox.items {
        info!(title = %notification.title, message = %notification.message, "Inbox");
    }
    info!(total = inbox.total, unread = inbox.unread_count, "Inbox summary");
    let marked = dispatcher.mark_all_as_read(farmer.id).await?;
    info!(marked, "Marked read");

    let runs = irrigation_history(store.as_ref(), farmer.id, None, None).await?;
    let doses = fertilization_history(store.as_ref(), farmer.id, HistoryFilter::default(), None).await?;
    info!(statistics = ?runs.statistics, "Irrigation history");
    info!(statistics = ?doses.statistics, "Fertilization history");
    let stats = monitor.device_stats(soil.id, None).await?;
    info!(?stats, "Soil probe, last 24h");
    monitor
        .update_device_status(&valve.serial, DeviceStatus::Offline)
        .await?;

    let metrics = dispatcher.metrics().snapshot().await;
    let sms_latency = dispatcher.metrics().average_latency(Channel::Sms).await;
    info!(?metrics, ?sms_latency, "Delivery metrics");

    Ok(())
}
