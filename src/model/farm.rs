// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{DeviceId, FarmId, FarmerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered farmer, the owner of farms and recipient of notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farmer {
    /// Farmer ID
    pub id: FarmerId,
    /// Display name
    pub name: String,
    /// Phone number used for SMS delivery
    pub phone: String,
    /// Optional email address
    pub email: Option<String>,
}

/// A farm and its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Farm ID
    pub id: FarmId,
    /// Owning farmer
    pub farmer_id: FarmerId,
    /// Display name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Kind of IoT device installed on a farm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Soil moisture probe
    SoilSensor,
    /// Nitrogen / phosphorus / potassium probe
    NpkSensor,
    /// On-site weather station
    WeatherStation,
    /// Valve or pump controller
    IrrigationController,
    /// Field camera
    Camera,
}

impl DeviceType {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::SoilSensor => "soil_sensor",
            DeviceType::NpkSensor => "npk_sensor",
            DeviceType::WeatherStation => "weather_station",
            DeviceType::IrrigationController => "irrigation_controller",
            DeviceType::Camera => "camera",
        }
    }
}

/// Operational status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Reporting normally
    Active,
    /// Disabled by the farmer
    Inactive,
    /// Under maintenance
    Maintenance,
    /// Not reachable
    Offline,
}

/// An IoT device registered to a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoTDevice {
    /// Device ID
    pub id: DeviceId,
    /// Farm the device is installed on
    pub farm_id: FarmId,
    /// Hardware serial, used to address device commands
    pub serial: String,
    /// Display name
    pub name: String,
    /// Device kind
    pub device_type: DeviceType,
    /// Operational status
    pub status: DeviceStatus,
    /// Last time the device reported or changed status
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl IoTDevice {
    /// Whether the device is currently active
    pub fn is_active(&self) -> bool {
        self.status == DeviceStatus::Active
    }
}

/// A single reading reported by a device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Reporting device
    pub device_id: DeviceId,
    /// When the reading was taken
    pub recorded_at: DateTime<Utc>,
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

impl SensorReading {
    /// Empty reading for a device at a point in time
    pub fn new(device_id: DeviceId, recorded_at: DateTime<Utc>) -> Self {
        Self {
            device_id,
            recorded_at,
            ..Default::default()
        }
    }
}
