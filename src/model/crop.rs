// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{CropId, FarmId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
    /// Growing in the field
    Active,
    /// Harvested
    Harvested,
    /// Lost
    Failed,
    /// Not yet planted
    Planned,
}

/// A crop planted on a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    /// Crop ID
    pub id: CropId,
    /// Farm the crop grows on
    pub farm_id: FarmId,
    /// Crop type key, matched case-insensitively against the agronomy tables
    pub crop_type: String,
    /// Planting date, if known
    pub planted_date: Option<NaiveDate>,
    /// Planted area in hectares
    pub area_hectares: Option<f64>,
    /// Lifecycle status
    pub status: CropStatus,
}

impl Crop {
    /// Planted area, defaulting to one hectare when unknown
    pub fn area_or_default(&self) -> f64 {
        self.area_hectares.unwrap_or(1.0)
    }

    /// Whether the crop is in the field
    pub fn is_active(&self) -> bool {
        self.status == CropStatus::Active
    }
}

/// Health classification derived from the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Score below 20
    Critical,
    /// Score 20-39
    Stressed,
    /// Score 40-59
    Moderate,
    /// Score 60-79
    Healthy,
    /// Score 80 and above
    Excellent,
}

impl HealthStatus {
    /// Map a 0-100 health score onto its status band
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => HealthStatus::Excellent,
            60..=79 => HealthStatus::Healthy,
            40..=59 => HealthStatus::Moderate,
            20..=39 => HealthStatus::Stressed,
            _ => HealthStatus::Critical,
        }
    }

    /// Stressed or critical
    pub fn is_under_stress(&self) -> bool {
        matches!(self, HealthStatus::Stressed | HealthStatus::Critical)
    }

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Critical => "critical",
            HealthStatus::Stressed => "stressed",
            HealthStatus::Moderate => "moderate",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Excellent => "excellent",
        }
    }
}

/// A point-in-time health snapshot of a crop
///
/// Build snapshots through [`CropHealth::assess`] so that `health_score`
/// and `health_status` never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropHealth {
    /// Crop the snapshot belongs to
    pub crop_id: CropId,
    /// When the underlying observation was made
    pub recorded_at: DateTime<Utc>,
    /// Satellite NDVI, -1..1
    pub ndvi_value: Option<f64>,
    /// Health score, 0-100
    pub health_score: u8,
    /// Status band of `health_score`
    pub health_status: HealthStatus,
    /// Satellite-derived moisture percentage
    pub moisture_level: Option<f64>,
    /// Air temperature at observation time, °C
    pub temperature: Option<f64>,
    /// Relative humidity at observation time
    pub humidity: Option<f64>,
    /// Ordered advisory notes
    pub recommendations: Vec<String>,
}

/// An active crop joined with its most recent health snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CropSnapshot {
    /// The crop
    pub crop: Crop,
    /// Latest health record by `recorded_at`, if any
    pub latest_health: Option<CropHealth>,
}
