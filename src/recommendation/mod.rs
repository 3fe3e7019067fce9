// Copyright 2025 Cowboy AI, LLC.

//! # Recommendation Engine
//!
//! Rule-based irrigation and fertilization advice. The decisions
//! themselves are pure functions over a crop, its latest health snapshot,
//! the latest sensor reading, and (for irrigation) a rain outlook; see
//! [`assess_irrigation`] and [`assess_fertilization`]. The engine wraps
//! them with store lookups and the weather provider.
//!
//! Evaluation never fails: a weather outage or timeout degrades to "no
//! rain signal". Farm-level aggregation fails only when the farm is not
//! visible to the farmer or the store itself errors.

pub mod fertilization;
pub mod irrigation;

pub use fertilization::{assess_fertilization, FertilizationRecommendation, FertilizationUrgency};
pub use irrigation::{assess_irrigation, IrrigationRecommendation, IrrigationUrgency};

use crate::agronomy::AgronomyTables;
use crate::entity::{FarmId, FarmerId};
use crate::errors::{DomainError, DomainResult};
use crate::external::with_timeout;
use crate::model::{Crop, CropHealth, DeviceType, Farm, SensorReading};
use crate::persistence::DomainStore;
use crate::weather::{RainOutlook, WeatherProvider};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Produces irrigation and fertilization recommendations
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn DomainStore>,
    weather: Arc<dyn WeatherProvider>,
    tables: Arc<AgronomyTables>,
    weather_timeout: Duration,
}

impl RecommendationEngine {
    /// Create an engine with a 5 second weather deadline
    pub fn new(
        store: Arc<dyn DomainStore>,
        weather: Arc<dyn WeatherProvider>,
        tables: Arc<AgronomyTables>,
    ) -> Self {
        Self {
            store,
            weather,
            tables,
            weather_timeout: Duration::from_secs(5),
        }
    }

    /// Deadline for forecast calls
    pub fn with_weather_timeout(mut self, timeout: Duration) -> Self {
        self.weather_timeout = timeout;
        self
    }

    /// Lookup tables in use
    pub fn tables(&self) -> &AgronomyTables {
        &self.tables
    }

    /// Rain outlook for a farm; `Unknown` when the forecast is unavailable
    pub async fn rain_outlook(&self, farm: &Farm) -> RainOutlook {
        let forecast = with_timeout(
            "weather",
            self.weather_timeout,
            self.weather.forecast(farm.latitude, farm.longitude),
        )
        .await;

        match forecast {
            Ok(forecast) => RainOutlook::from_forecast(Some(&forecast), Utc::now()),
            Err(e) => {
                warn!(farm_id = %farm.id, error = %e, "Weather forecast unavailable, proceeding without rain signal");
                RainOutlook::Unknown
            }
        }
    }

    /// Irrigation need for one crop
    pub async fn evaluate_irrigation(
        &self,
        crop: &Crop,
        farm: &Farm,
        latest_health: Option<&CropHealth>,
        reading: Option<&SensorReading>,
    ) -> Option<IrrigationRecommendation> {
        let outlook = self.rain_outlook(farm).await;
        assess_irrigation(crop, latest_health, reading, outlook, &self.tables)
    }

    /// Fertilization need for one crop as of today
    pub fn evaluate_fertilization(
        &self,
        crop: &Crop,
        reading: Option<&SensorReading>,
        latest_health: Option<&CropHealth>,
    ) -> Option<FertilizationRecommendation> {
        assess_fertilization(
            crop,
            reading,
            latest_health,
            Utc::now().date_naive(),
            &self.tables,
        )
    }

    /// Irrigation recommendations for every active crop on a farm, most urgent first
    ///
    /// The forecast is fetched once per farm and shared by all crops.
    pub async fn irrigation_recommendations_for_farm(
        &self,
        farmer_id: FarmerId,
        farm_id: FarmId,
    ) -> DomainResult<Vec<IrrigationRecommendation>> {
        let farm = self.owned_farm(farmer_id, farm_id).await?;
        let crops = self.store.find_active_crops_by_farm(farm_id).await?;

        let (reading, outlook) = futures::join!(
            self.latest_farm_reading(farm_id, DeviceType::SoilSensor),
            self.rain_outlook(&farm)
        );
        let reading = reading?;

        let mut recommendations: Vec<IrrigationRecommendation> = crops
            .iter()
            .filter_map(|snapshot| {
                assess_irrigation(
                    &snapshot.crop,
                    snapshot.latest_health.as_ref(),
                    reading.as_ref(),
                    outlook,
                    &self.tables,
                )
            })
            .collect();
        irrigation::sort_by_urgency(&mut recommendations);

        info!(%farm_id, crops = crops.len(), recommended = recommendations.len(), ?outlook, "Irrigation recommendations computed");
        Ok(recommendations)
    }

    /// Fertilization recommendations for every active crop on a farm, most urgent first
    pub async fn fertilization_recommendations_for_farm(
        &self,
        farmer_id: FarmerId,
        farm_id: FarmId,
    ) -> DomainResult<Vec<FertilizationRecommendation>> {
        self.owned_farm(farmer_id, farm_id).await?;
        let crops = self.store.find_active_crops_by_farm(farm_id).await?;
        let reading = self
            .latest_farm_reading(farm_id, DeviceType::NpkSensor)
            .await?;

        let today = Utc::now().date_naive();
        let mut recommendations: Vec<FertilizationRecommendation> = crops
            .iter()
            .filter_map(|snapshot| {
                assess_fertilization(
                    &snapshot.crop,
                    reading.as_ref(),
                    snapshot.latest_health.as_ref(),
                    today,
                    &self.tables,
                )
            })
            .collect();
        fertilization::sort_by_urgency(&mut recommendations);

        info!(%farm_id, crops = crops.len(), recommended = recommendations.len(), "Fertilization recommendations computed");
        Ok(recommendations)
    }

    async fn owned_farm(&self, farmer_id: FarmerId, farm_id: FarmId) -> DomainResult<Farm> {
        self.store
            .find_farm(farm_id, Some(farmer_id))
            .await?
            .ok_or_else(|| DomainError::not_found("Farm", farm_id))
    }

    /// Latest reading of the first active device of a type on the farm
    async fn latest_farm_reading(
        &self,
        farm_id: FarmId,
        device_type: DeviceType,
    ) -> DomainResult<Option<SensorReading>> {
        let devices = self
            .store
            .find_active_devices_by_farm_and_type(farm_id, device_type)
            .await?;
        let Some(device) = devices.first() else {
            debug!(%farm_id, ?device_type, "No active device of type");
            return Ok(None);
        };
        self.store.find_latest_sensor_reading(device.id).await
    }
}
