// Copyright 2025 Cowboy AI, LLC.

//! Irrigation need decision

use crate::agronomy::{AgronomyTables, WaterRequirement};
use crate::entity::CropId;
use crate::model::{Crop, CropHealth, SensorReading};
use crate::weather::RainOutlook;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Irrigation urgency, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationUrgency {
    /// Soil moisture below 20%
    Critical,
    /// Soil moisture below 35%
    High,
    /// Soil moisture below 50%
    Medium,
    /// Maintenance
    Low,
}

impl IrrigationUrgency {
    /// Sort rank, 0 is most urgent
    pub fn rank(&self) -> u8 {
        match self {
            IrrigationUrgency::Critical => 0,
            IrrigationUrgency::High => 1,
            IrrigationUrgency::Medium => 2,
            IrrigationUrgency::Low => 3,
        }
    }
}

/// An explainable irrigation recommendation for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationRecommendation {
    /// Crop to irrigate
    pub crop_id: CropId,
    /// Crop type as stored
    pub crop_type: String,
    /// Run length in minutes
    pub recommended_duration: u32,
    /// Urgency
    pub urgency: IrrigationUrgency,
    /// Triggering conditions, in the order they were applied
    pub reason: String,
    /// Short forecast summary
    pub weather_forecast: String,
    /// Moisture signal the decision was based on
    pub soil_moisture: Option<f64>,
    /// Daily water band for the crop type
    pub water_requirement: WaterRequirement,
}

const MAINTENANCE_REASON: &str = "Scheduled maintenance irrigation";
const STRESS_NOTE: &str = "Crop showing signs of stress";

/// Decide whether a crop needs water
///
/// Moisture comes from the live sensor when it reports one, otherwise
/// from the satellite estimate on the latest health snapshot. Returns
/// `None` when the soil is wet (above 80%) or when rain makes a
/// low-urgency run pointless.
pub fn assess_irrigation(
    crop: &Crop,
    latest_health: Option<&CropHealth>,
    reading: Option<&SensorReading>,
    outlook: RainOutlook,
    tables: &AgronomyTables,
) -> Option<IrrigationRecommendation> {
    let water_requirement = tables.water_requirement(&crop.crop_type);
    let moisture = reading
        .and_then(|reading| reading.soil_moisture)
        .or_else(|| latest_health.and_then(|health| health.moisture_level));

    let mut reasons: Vec<&str> = Vec::new();
    let (mut urgency, mut duration) = match moisture {
        Some(m) if m < 20.0 => {
            reasons.push("Soil moisture critically low");
            (IrrigationUrgency::Critical, 60)
        }
        Some(m) if m < 35.0 => {
            reasons.push("Soil moisture below optimal level");
            (IrrigationUrgency::High, 45)
        }
        Some(m) if m < 50.0 => {
            reasons.push("Soil moisture approaching low threshold");
            (IrrigationUrgency::Medium, 30)
        }
        Some(m) if m > 80.0 => {
            debug!(crop_id = %crop.id, moisture = m, "Soil adequately watered");
            return None;
        }
        _ => {
            reasons.push(MAINTENANCE_REASON);
            (IrrigationUrgency::Low, 30)
        }
    };

    if outlook.is_rain_expected() {
        match urgency {
            IrrigationUrgency::Critical => {}
            IrrigationUrgency::High => {
                urgency = IrrigationUrgency::Medium;
                duration = halve(duration);
                reasons.push("Rain expected - reduced urgency");
            }
            IrrigationUrgency::Medium => {
                urgency = IrrigationUrgency::Low;
                duration = halve(duration);
                reasons.push("Consider waiting for rain");
            }
            IrrigationUrgency::Low => {
                debug!(crop_id = %crop.id, "Rain expected, skipping low-urgency irrigation");
                return None;
            }
        }
    }

    if latest_health.is_some_and(|health| health.health_status.is_under_stress()) {
        if urgency == IrrigationUrgency::Low {
            urgency = IrrigationUrgency::Medium;
        }
        reasons.push(STRESS_NOTE);
    }

    let reason = reasons.join(". ");

    debug!(crop_id = %crop.id, ?urgency, duration, ?moisture, "Irrigation recommended");
    Some(IrrigationRecommendation {
        crop_id: crop.id,
        crop_type: crop.crop_type.clone(),
        recommended_duration: duration,
        urgency,
        reason,
        weather_forecast: outlook.summary().to_string(),
        soil_moisture: moisture,
        water_requirement,
    })
}

/// Half a duration, rounding half up
fn halve(minutes: u32) -> u32 {
    (minutes + 1) / 2
}

/// Stable sort, most urgent first
pub fn sort_by_urgency(recommendations: &mut [IrrigationRecommendation]) {
    recommendations.sort_by_key(|recommendation| recommendation.urgency.rank());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DeviceId, FarmId};
    use crate::model::{CropStatus, HealthStatus};
    use chrono::Utc;
    use proptest::prelude::*;
    use test_case::test_case;

    fn crop() -> Crop {
        Crop {
            id: CropId::new(),
            farm_id: FarmId::new(),
            crop_type: "Wheat".into(),
            planted_date: None,
            area_hectares: Some(2.0),
            status: CropStatus::Active,
        }
    }

    fn reading(moisture: f64) -> SensorReading {
        let mut reading = SensorReading::new(DeviceId::new(), Utc::now());
        reading.soil_moisture = Some(moisture);
        reading
    }

    fn health(crop: &Crop, score: u8) -> CropHealth {
        CropHealth::from_score(crop.id, Utc::now(), score)
    }

    fn assess(
        moisture: Option<f64>,
        health_score: Option<u8>,
        outlook: RainOutlook,
    ) -> Option<IrrigationRecommendation> {
        let crop = crop();
        let health = health_score.map(|score| health(&crop, score));
        let sensor = moisture.map(reading);
        assess_irrigation(
            &crop,
            health.as_ref(),
            sensor.as_ref(),
            outlook,
            &AgronomyTables::default(),
        )
    }

    #[test_case(5.0 => Some((IrrigationUrgency::Critical, 60)))]
    #[test_case(19.9 => Some((IrrigationUrgency::Critical, 60)))]
    #[test_case(20.0 => Some((IrrigationUrgency::High, 45)))]
    #[test_case(34.0 => Some((IrrigationUrgency::High, 45)))]
    #[test_case(49.0 => Some((IrrigationUrgency::Medium, 30)))]
    #[test_case(65.0 => Some((IrrigationUrgency::Low, 30)))]
    #[test_case(80.0 => Some((IrrigationUrgency::Low, 30)))]
    #[test_case(80.5 => None)]
    fn moisture_ladder_without_rain(moisture: f64) -> Option<(IrrigationUrgency, u32)> {
        assess(Some(moisture), None, RainOutlook::Dry)
            .map(|rec| (rec.urgency, rec.recommended_duration))
    }

    #[test_case(10.0 => Some((IrrigationUrgency::Critical, 60)))]
    #[test_case(25.0 => Some((IrrigationUrgency::Medium, 23)))]
    #[test_case(40.0 => Some((IrrigationUrgency::Low, 15)))]
    #[test_case(60.0 => None)]
    fn rain_downgrades(moisture: f64) -> Option<(IrrigationUrgency, u32)> {
        assess(Some(moisture), None, RainOutlook::Expected)
            .map(|rec| (rec.urgency, rec.recommended_duration))
    }

    #[test]
    fn zero_moisture_counts_as_a_reading() {
        let rec = assess(Some(0.0), None, RainOutlook::Dry).unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::Critical);
    }

    #[test]
    fn unknown_moisture_is_maintenance() {
        let rec = assess(None, None, RainOutlook::Unknown).unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::Low);
        assert_eq!(rec.recommended_duration, 30);
        assert_eq!(rec.reason, "Scheduled maintenance irrigation");
        assert_eq!(rec.weather_forecast, "Weather forecast unavailable");
    }

    #[test]
    fn satellite_moisture_used_without_sensor() {
        let crop = crop();
        let health = CropHealth::from_score(crop.id, Utc::now(), 70).with_moisture(30.0);
        let rec = assess_irrigation(
            &crop,
            Some(&health),
            None,
            RainOutlook::Dry,
            &AgronomyTables::default(),
        )
        .unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::High);
        assert_eq!(rec.soil_moisture, Some(30.0));
    }

    #[test]
    fn sensor_beats_satellite() {
        let crop = crop();
        let health = CropHealth::from_score(crop.id, Utc::now(), 70).with_moisture(10.0);
        let reading = reading(90.0);
        assert!(assess_irrigation(
            &crop,
            Some(&health),
            Some(&reading),
            RainOutlook::Dry,
            &AgronomyTables::default(),
        )
        .is_none());
    }

    #[test]
    fn stress_reescalates_after_rain_downgrade() {
        let rec = assess(Some(45.0), Some(30), RainOutlook::Expected).unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::Medium);
        assert_eq!(rec.recommended_duration, 15);
        assert_eq!(
            rec.reason,
            "Soil moisture approaching low threshold. Consider waiting for rain. Crop showing signs of stress"
        );
    }

    #[test]
    fn stress_does_not_revive_rain_skip() {
        assert!(assess(Some(60.0), Some(10), RainOutlook::Expected).is_none());
    }

    #[test]
    fn stress_escalates_maintenance() {
        let rec = assess(Some(60.0), Some(15), RainOutlook::Dry).unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::Medium);
        assert_eq!(
            rec.reason,
            "Scheduled maintenance irrigation. Crop showing signs of stress"
        );
        assert_eq!(HealthStatus::from_score(15), HealthStatus::Critical);
    }

    #[test]
    fn stress_keeps_maintenance_reason_when_moisture_unknown() {
        let rec = assess(None, Some(30), RainOutlook::Dry).unwrap();
        assert_eq!(rec.urgency, IrrigationUrgency::Medium);
        assert!(rec.reason.starts_with("Scheduled maintenance irrigation"));
        assert!(rec.reason.ends_with("Crop showing signs of stress"));
    }

    #[test]
    fn sort_is_stable_by_rank() {
        let make = |urgency| IrrigationRecommendation {
            crop_id: CropId::new(),
            crop_type: "rice".into(),
            recommended_duration: 30,
            urgency,
            reason: String::new(),
            weather_forecast: String::new(),
            soil_moisture: None,
            water_requirement: AgronomyTables::default().default_water,
        };
        let low = make(IrrigationUrgency::Low);
        let critical = make(IrrigationUrgency::Critical);
        let medium_a = make(IrrigationUrgency::Medium);
        let medium_b = make(IrrigationUrgency::Medium);

        let mut recs = vec![low.clone(), medium_a.clone(), critical.clone(), medium_b.clone()];
        sort_by_urgency(&mut recs);
        assert_eq!(recs, vec![critical, medium_a, medium_b, low]);
    }

    proptest! {
        #[test]
        fn wet_soil_never_irrigated(
            moisture in 80.0001f64..100.0,
            score in proptest::option::of(0u8..=100),
            rain in any::<bool>(),
        ) {
            let outlook = if rain { RainOutlook::Expected } else { RainOutlook::Dry };
            prop_assert!(assess(Some(moisture), score, outlook).is_none());
        }

        #[test]
        fn dry_soil_always_critical(
            moisture in 0.0f64..20.0,
            score in proptest::option::of(0u8..=100),
            rain in any::<bool>(),
        ) {
            let outlook = if rain { RainOutlook::Expected } else { RainOutlook::Dry };
            let rec = assess(Some(moisture), score, outlook).unwrap();
            prop_assert_eq!(rec.urgency, IrrigationUrgency::Critical);
            prop_assert_eq!(rec.recommended_duration, 60);
        }
    }
}
