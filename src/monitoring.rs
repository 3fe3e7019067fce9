// Copyright 2025 Cowboy AI, LLC.

//! Sensor ingest and device health
//!
//! Devices report by hardware serial. Every stored reading is checked
//! against fixed field limits and the farm owner is alerted when one is
//! crossed: dry or waterlogged soil raises a critical alert on every
//! channel, heat and frost go out by SMS, and out-of-range soil pH stays
//! in-app. A device dropping offline is reported once, on the edge.

use crate::entity::{DeviceId, FarmId};
use crate::errors::{DomainError, DomainResult};
use crate::model::{
    Channel, DeviceStatus, DeviceType, Farm, IoTDevice, NewNotification, Notification,
    NotificationType, Priority, SensorReading,
};
use crate::notification::NotificationDispatcher;
use crate::persistence::DomainStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Soil moisture below which the soil counts as critically dry, %
pub const MOISTURE_CRITICAL_LOW: f64 = 15.0;

/// Soil moisture above which waterlogging is likely, %
pub const MOISTURE_WATERLOGGING: f64 = 90.0;

/// Air temperature above which a heat wave alert is sent, °C
pub const HEAT_WAVE_CELSIUS: f64 = 42.0;

/// Air temperature below which a frost alert is sent, °C
pub const FROST_CELSIUS: f64 = 5.0;

/// Soil pH range that needs no attention
pub const SOIL_PH_RANGE: RangeInclusive<f64> = 4.5..=8.5;

/// Default window for [`SensorMonitor::device_stats`]
pub const DEFAULT_STATS_HOURS: u32 = 24;

/// Default page for [`SensorMonitor::latest_readings`]
pub const DEFAULT_READINGS_LIMIT: usize = 10;

/// Measurements as reported by a device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    /// Soil moisture percentage
    pub soil_moisture: Option<f64>,
    /// Soil pH
    pub soil_ph: Option<f64>,
    /// Nitrogen, mg/kg
    pub nitrogen_level: Option<f64>,
    /// Phosphorus, mg/kg
    pub phosphorus_level: Option<f64>,
    /// Potassium, mg/kg
    pub potassium_level: Option<f64>,
    /// Air temperature, °C
    pub air_temperature: Option<f64>,
    /// Relative air humidity percentage
    pub air_humidity: Option<f64>,
}

impl SensorPayload {
    fn into_reading(self, device_id: DeviceId, recorded_at: DateTime<Utc>) -> SensorReading {
        SensorReading {
            device_id,
            recorded_at,
            soil_moisture: self.soil_moisture,
            soil_ph: self.soil_ph,
            nitrogen_level: self.nitrogen_level,
            phosphorus_level: self.phosphorus_level,
            potassium_level: self.potassium_level,
            air_temperature: self.air_temperature,
            air_humidity: self.air_humidity,
        }
    }
}

/// A field limit crossed by one reading, with the offending value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorAlert {
    /// Soil moisture below [`MOISTURE_CRITICAL_LOW`]
    DrySoil(f64),
    /// Soil moisture above [`MOISTURE_WATERLOGGING`]
    Waterlogging(f64),
    /// Air temperature above [`HEAT_WAVE_CELSIUS`]
    HeatWave(f64),
    /// Air temperature below [`FROST_CELSIUS`]
    Frost(f64),
    /// Soil pH outside [`SOIL_PH_RANGE`]
    SoilPh(f64),
}

/// Limits crossed by a reading, in moisture, temperature, pH order
pub fn sensor_alerts(payload: &SensorPayload) -> Vec<SensorAlert> {
    let mut alerts = Vec::new();

    match payload.soil_moisture {
        Some(m) if m < MOISTURE_CRITICAL_LOW => alerts.push(SensorAlert::DrySoil(m)),
        Some(m) if m > MOISTURE_WATERLOGGING => alerts.push(SensorAlert::Waterlogging(m)),
        _ => {}
    }

    match payload.air_temperature {
        Some(t) if t > HEAT_WAVE_CELSIUS => alerts.push(SensorAlert::HeatWave(t)),
        Some(t) if t < FROST_CELSIUS => alerts.push(SensorAlert::Frost(t)),
        _ => {}
    }

    if let Some(ph) = payload.soil_ph {
        if !SOIL_PH_RANGE.contains(&ph) {
            alerts.push(SensorAlert::SoilPh(ph));
        }
    }

    alerts
}

/// A stored reading and the notifications it raised
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// The reading as stored
    pub reading: SensorReading,
    /// Alerts delivered to the farm owner
    pub alerts: Vec<Notification>,
}

/// Averages over a device's recent readings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    /// Mean soil moisture, one decimal, over readings that carry it
    pub avg_soil_moisture: Option<f64>,
    /// Mean air temperature, one decimal, over readings that carry it
    pub avg_temperature: Option<f64>,
    /// Readings in the window
    pub reading_count: usize,
    /// Time of the newest reading in the window
    pub last_reading: Option<DateTime<Utc>>,
    /// Window length in hours
    pub period_hours: u32,
}

impl DeviceStats {
    /// Summarise readings ordered newest first
    pub fn summarise(readings: &[SensorReading], period_hours: u32) -> Self {
        Self {
            avg_soil_moisture: mean_one_decimal(readings.iter().filter_map(|r| r.soil_moisture)),
            avg_temperature: mean_one_decimal(readings.iter().filter_map(|r| r.air_temperature)),
            reading_count: readings.len(),
            last_reading: readings.first().map(|reading| reading.recorded_at),
            period_hours,
        }
    }
}

fn mean_one_decimal(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some((sum / f64::from(count) * 10.0).round() / 10.0)
}

/// Registers devices, stores their readings, and alerts on field limits
#[derive(Clone)]
pub struct SensorMonitor {
    store: Arc<dyn DomainStore>,
    notifications: NotificationDispatcher,
}

impl SensorMonitor {
    /// Create the service
    pub fn new(store: Arc<dyn DomainStore>, notifications: NotificationDispatcher) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Register a device on a farm under a unique hardware serial
    ///
    /// Without a name the device is called `<type>-<first 8 of serial>`.
    pub async fn register_device(
        &self,
        farm_id: FarmId,
        serial: &str,
        device_type: DeviceType,
        name: Option<String>,
    ) -> DomainResult<IoTDevice> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(DomainError::ValidationError(
                "Device serial must not be empty".into(),
            ));
        }
        if self.store.find_farm(farm_id, None).await?.is_none() {
            return Err(DomainError::not_found("Farm", farm_id));
        }

        let device = IoTDevice {
            id: DeviceId::new(),
            farm_id,
            serial: serial.to_string(),
            name: name.unwrap_or_else(|| {
                let prefix: String = serial.chars().take(8).collect();
                format!("{}-{prefix}", device_type.as_str())
            }),
            device_type,
            status: DeviceStatus::Active,
            last_seen_at: Some(Utc::now()),
        };

        if !self.store.register_device(device.clone()).await? {
            return Err(DomainError::ValidationError(format!(
                "Device {serial} is already registered"
            )));
        }
        info!(device_id = %device.id, %serial, farm_id = %farm_id, "Device registered");
        Ok(device)
    }

    /// Store a reading from the device with `serial` and raise any alerts
    ///
    /// The reading is kept even when alert delivery fails.
    pub async fn ingest_reading(
        &self,
        serial: &str,
        payload: SensorPayload,
    ) -> DomainResult<IngestReport> {
        let Some(device) = self.store.find_device_by_serial(serial).await? else {
            warn!(%serial, "Reading from unknown device");
            return Err(DomainError::not_found("IoTDevice", serial));
        };

        let now = Utc::now();
        let alerts = sensor_alerts(&payload);
        let reading = payload.into_reading(device.id, now);
        self.store.mark_device_seen(device.id, now).await?;
        self.store.record_reading(reading.clone()).await?;
        debug!(device_id = %device.id, alerts = alerts.len(), "Reading stored");

        let alerts = if alerts.is_empty() {
            Vec::new()
        } else {
            self.raise_alerts(&device, &alerts).await
        };

        Ok(IngestReport { reading, alerts })
    }

    /// Set a device's status, notifying the owner when it goes offline
    ///
    /// Only the transition into offline notifies; repeated offline
    /// reports stay silent.
    pub async fn update_device_status(
        &self,
        serial: &str,
        status: DeviceStatus,
    ) -> DomainResult<IoTDevice> {
        let Some(mut device) = self.store.find_device_by_serial(serial).await? else {
            return Err(DomainError::not_found("IoTDevice", serial));
        };

        let now = Utc::now();
        let Some(previous) = self.store.set_device_status(device.id, status, now).await? else {
            return Err(DomainError::not_found("IoTDevice", serial));
        };
        device.status = status;
        device.last_seen_at = Some(now);
        info!(device_id = %device.id, ?previous, ?status, "Device status updated");

        if status == DeviceStatus::Offline && previous != DeviceStatus::Offline {
            self.notify_offline(&device).await;
        }
        Ok(device)
    }

    /// Newest readings of a device, ten by default
    pub async fn latest_readings(
        &self,
        device_id: DeviceId,
        limit: Option<usize>,
    ) -> DomainResult<Vec<SensorReading>> {
        self.store
            .recent_readings(
                device_id,
                None,
                Some(limit.unwrap_or(DEFAULT_READINGS_LIMIT)),
            )
            .await
    }

    /// Averages over the last `hours` (default 24) of a device's readings
    pub async fn device_stats(
        &self,
        device_id: DeviceId,
        hours: Option<u32>,
    ) -> DomainResult<DeviceStats> {
        let period_hours = hours.unwrap_or(DEFAULT_STATS_HOURS);
        let since = Utc::now() - Duration::hours(i64::from(period_hours));
        let readings = self
            .store
            .recent_readings(device_id, Some(since), None)
            .await?;
        Ok(DeviceStats::summarise(&readings, period_hours))
    }

    async fn owning_farm(&self, device: &IoTDevice) -> Option<Farm> {
        match self.store.find_farm(device.farm_id, None).await {
            Ok(Some(farm)) => Some(farm),
            Ok(None) => {
                warn!(device_id = %device.id, "Device has no farm, nobody to alert");
                None
            }
            Err(e) => {
                error!(device_id = %device.id, error = %e, "Farm lookup failed");
                None
            }
        }
    }

    async fn raise_alerts(&self, device: &IoTDevice, alerts: &[SensorAlert]) -> Vec<Notification> {
        let Some(farm) = self.owning_farm(device).await else {
            return Vec::new();
        };

        let mut delivered = Vec::with_capacity(alerts.len());
        for alert in alerts {
            match self.raise(*alert, device, &farm).await {
                Ok(notification) => delivered.push(notification),
                Err(e) => {
                    error!(device_id = %device.id, ?alert, error = %e, "Sensor alert not created")
                }
            }
        }
        delivered
    }

    async fn raise(
        &self,
        alert: SensorAlert,
        device: &IoTDevice,
        farm: &Farm,
    ) -> DomainResult<Notification> {
        let name = &device.name;
        let params = match alert {
            SensorAlert::DrySoil(moisture) => {
                return self
                    .notifications
                    .create_critical_alert(
                        farm.farmer_id,
                        Some(farm.id),
                        NotificationType::Irrigation,
                        "Critical: Very Low Soil Moisture",
                        format!(
                            "Soil moisture at {name} has dropped to {moisture}%. Immediate irrigation recommended."
                        ),
                        Some(json!({ "deviceId": device.id, "soilMoisture": moisture })),
                    )
                    .await;
            }
            SensorAlert::Waterlogging(moisture) => {
                return self
                    .notifications
                    .create_critical_alert(
                        farm.farmer_id,
                        Some(farm.id),
                        NotificationType::Irrigation,
                        "Warning: Waterlogging Risk",
                        format!("Soil moisture at {name} is at {moisture}%. Risk of waterlogging."),
                        Some(json!({ "deviceId": device.id, "soilMoisture": moisture })),
                    )
                    .await;
            }
            SensorAlert::HeatWave(temperature) => NewNotification::new(
                farm.farmer_id,
                NotificationType::Weather,
                "Heat Wave Alert",
                format!(
                    "Temperature at {name} has reached {temperature}°C. Protect crops from heat stress."
                ),
            )
            .with_channels([Channel::InApp, Channel::Sms])
            .with_metadata(json!({ "deviceId": device.id, "temperature": temperature })),
            SensorAlert::Frost(temperature) => NewNotification::new(
                farm.farmer_id,
                NotificationType::Weather,
                "Frost Alert",
                format!(
                    "Temperature at {name} has dropped to {temperature}°C. Risk of frost damage."
                ),
            )
            .with_channels([Channel::InApp, Channel::Sms])
            .with_metadata(json!({ "deviceId": device.id, "temperature": temperature })),
            SensorAlert::SoilPh(ph) => NewNotification::new(
                farm.farmer_id,
                NotificationType::HealthAlert,
                "Soil pH Alert",
                format!("Soil pH at {name} is {ph}. This may affect crop growth."),
            )
            .with_metadata(json!({ "deviceId": device.id, "soilPh": ph })),
        };

        self.notifications
            .create_notification(params.with_priority(Priority::High).for_farm(farm.id))
            .await
    }

    async fn notify_offline(&self, device: &IoTDevice) {
        let Some(farm) = self.owning_farm(device).await else {
            return;
        };
        let params = NewNotification::new(
            farm.farmer_id,
            NotificationType::Device,
            "Device Offline",
            format!(
                "{} ({}) has gone offline.",
                device.name,
                device.device_type.as_str()
            ),
        )
        .with_priority(Priority::Medium)
        .for_farm(farm.id)
        .with_metadata(json!({ "deviceId": device.id }));

        if let Err(e) = self.notifications.create_notification(params).await {
            error!(device_id = %device.id, error = %e, "Offline notification not created");
        }
    }
}
