// Copyright 2025 Cowboy AI, LLC.

//! Fertilization need decision

use crate::agronomy::{AgronomyTables, Nutrient};
use crate::entity::CropId;
use crate::model::{Crop, CropHealth, HealthStatus, SensorReading};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fertilization urgency, most urgent first
///
/// There is no critical tier; nutrient shortfalls are never treated as
/// emergencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FertilizationUrgency {
    /// Severe deficiency
    High,
    /// Deficiency or crop stress
    Medium,
    /// Routine stage feeding
    Low,
}

impl FertilizationUrgency {
    /// Sort rank, 0 is most urgent
    pub fn rank(&self) -> u8 {
        match self {
            FertilizationUrgency::High => 0,
            FertilizationUrgency::Medium => 1,
            FertilizationUrgency::Low => 2,
        }
    }
}

/// An explainable fertilization recommendation for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizationRecommendation {
    /// Crop to fertilize
    pub crop_id: CropId,
    /// Crop type as stored
    pub crop_type: String,
    /// Fertilizer label with grade
    pub fertilizer_type: String,
    /// Whole kilograms of product
    pub quantity_kg: f64,
    /// N:P:K ratio of the product
    pub npk_ratio: String,
    /// Urgency
    pub urgency: FertilizationUrgency,
    /// Why this nutrient was chosen
    pub reason: String,
    /// Whole currency units
    pub estimated_cost: f64,
    /// Growth stage label
    pub growth_stage: String,
    /// Nutrient being supplied
    pub nutrient: Nutrient,
}

/// Per-nutrient deficiency thresholds in mg/kg: (deficient below, severe below)
const THRESHOLDS: [(Nutrient, f64, f64); 3] = [
    (Nutrient::Nitrogen, 40.0, 20.0),
    (Nutrient::Phosphorus, 30.0, 15.0),
    (Nutrient::Potassium, 40.0, 20.0),
];

fn level(reading: &SensorReading, nutrient: Nutrient) -> Option<f64> {
    match nutrient {
        Nutrient::Nitrogen => reading.nitrogen_level,
        Nutrient::Phosphorus => reading.phosphorus_level,
        Nutrient::Potassium => reading.potassium_level,
    }
}

/// First deficient nutrient in N, P, K order
fn deficiency(reading: &SensorReading) -> Option<(Nutrient, FertilizationUrgency)> {
    THRESHOLDS.iter().find_map(|&(nutrient, deficient, severe)| {
        let value = level(reading, nutrient)?;
        (value < deficient).then(|| {
            let urgency = if value < severe {
                FertilizationUrgency::High
            } else {
                FertilizationUrgency::Medium
            };
            (nutrient, urgency)
        })
    })
}

/// Decide what fertilizer a crop needs today
///
/// Always produces a recommendation for a well-formed crop: a sensor
/// deficiency, a stress boost, or routine feeding for the growth stage.
/// Returns `None` only when the tables lack the stage or price needed.
pub fn assess_fertilization(
    crop: &Crop,
    reading: Option<&SensorReading>,
    latest_health: Option<&CropHealth>,
    today: NaiveDate,
    tables: &AgronomyTables,
) -> Option<FertilizationRecommendation> {
    let requirement = tables.npk_requirement(&crop.crop_type);
    let days_since_planting = crop
        .planted_date
        .map(|planted| (today - planted).num_days());
    let Some(stage) = tables.growth_stage(days_since_planting) else {
        warn!(crop_id = %crop.id, ?days_since_planting, "No growth stage configured");
        return None;
    };

    let (nutrient, urgency, reason) = if let Some((nutrient, urgency)) =
        reading.and_then(deficiency)
    {
        let reason = format!("Low {} levels detected in soil", nutrient.as_str());
        (nutrient, urgency, reason)
    } else if latest_health.is_some_and(|health| health.health_status == HealthStatus::Stressed) {
        (
            stage.focus.nutrient(),
            FertilizationUrgency::Medium,
            "Crop showing stress symptoms - nutrient boost recommended".to_string(),
        )
    } else {
        (
            stage.focus.nutrient(),
            FertilizationUrgency::Low,
            format!("Scheduled fertilization for {}", stage.label),
        )
    };

    let base = requirement.of(nutrient) * stage.share * crop.area_or_default();
    let fertilizer = nutrient.fertilizer();
    let quantity_kg = (base / fertilizer.nutrient_fraction()).round();
    let Some(price) = tables.fertilizer_price(fertilizer) else {
        warn!(crop_id = %crop.id, fertilizer = fertilizer.price_key(), "No price configured");
        return None;
    };

    debug!(crop_id = %crop.id, ?nutrient, ?urgency, quantity_kg, stage = %stage.label, "Fertilization recommended");
    Some(FertilizationRecommendation {
        crop_id: crop.id,
        crop_type: crop.crop_type.clone(),
        fertilizer_type: fertilizer.label().to_string(),
        quantity_kg,
        npk_ratio: fertilizer.npk_ratio().to_string(),
        urgency,
        reason,
        estimated_cost: (quantity_kg * price).round(),
        growth_stage: stage.label.clone(),
        nutrient,
    })
}

/// Stable sort, most urgent first
pub fn sort_by_urgency(recommendations: &mut [FertilizationRecommendation]) {
    recommendations.sort_by_key(|recommendation| recommendation.urgency.rank());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DeviceId, FarmId};
    use crate::model::CropStatus;
    use chrono::{Duration, Utc};
    use test_case::test_case;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    fn crop(crop_type: &str, planted_days_ago: Option<i64>, area: Option<f64>) -> Crop {
        Crop {
            id: CropId::new(),
            farm_id: FarmId::new(),
            crop_type: crop_type.into(),
            planted_date: planted_days_ago.map(|days| today() - Duration::days(days)),
            area_hectares: area,
            status: CropStatus::Active,
        }
    }

    fn npk(n: Option<f64>, p: Option<f64>, k: Option<f64>) -> SensorReading {
        let mut reading = SensorReading::new(DeviceId::new(), Utc::now());
        reading.nitrogen_level = n;
        reading.phosphorus_level = p;
        reading.potassium_level = k;
        reading
    }

    fn assess(crop: &Crop, reading: Option<&SensorReading>, health: Option<&CropHealth>) -> FertilizationRecommendation {
        assess_fertilization(crop, reading, health, today(), &AgronomyTables::default()).unwrap()
    }

    #[test]
    fn rice_vegetative_nitrogen_worked_example() {
        let crop = crop("rice", Some(30), Some(2.0));
        let reading = npk(Some(30.0), None, None);
        let rec = assess(&crop, Some(&reading), None);

        assert_eq!(rec.fertilizer_type, "Urea (46-0-0)");
        assert_eq!(rec.npk_ratio, "46:0:0");
        assert_eq!(rec.quantity_kg, 209.0);
        assert_eq!(rec.estimated_cost, 1254.0);
        assert_eq!(rec.urgency, FertilizationUrgency::Medium);
        assert_eq!(rec.growth_stage, "Vegetative Stage");
        assert_eq!(rec.reason, "Low nitrogen levels detected in soil");
    }

    #[test]
    fn nitrogen_checked_before_phosphorus() {
        let crop = crop("wheat", Some(70), None);
        let reading = npk(Some(10.0), Some(10.0), Some(10.0));
        let rec = assess(&crop, Some(&reading), None);
        assert_eq!(rec.nutrient, Nutrient::Nitrogen);
        assert_eq!(rec.urgency, FertilizationUrgency::High);
    }

    #[test_case(Some(50.0), Some(14.0), None => (Nutrient::Phosphorus, FertilizationUrgency::High))]
    #[test_case(Some(50.0), Some(25.0), None => (Nutrient::Phosphorus, FertilizationUrgency::Medium))]
    #[test_case(None, Some(35.0), Some(19.0) => (Nutrient::Potassium, FertilizationUrgency::High))]
    #[test_case(Some(0.0), None, None => (Nutrient::Nitrogen, FertilizationUrgency::High))]
    fn deficiency_ladder(n: Option<f64>, p: Option<f64>, k: Option<f64>) -> (Nutrient, FertilizationUrgency) {
        let crop = crop("maize", Some(40), None);
        let rec = assess(&crop, Some(&npk(n, p, k)), None);
        (rec.nutrient, rec.urgency)
    }

    #[test]
    fn mop_quantity_uses_sixty_percent() {
        let crop = crop("tomato", Some(100), Some(1.5));
        let rec = assess(&crop, Some(&npk(None, None, Some(30.0))), None);
        // 120 kg/ha * 0.15 * 1.5 ha / 0.60 = 45 kg
        assert_eq!(rec.fertilizer_type, "MOP (0-0-60)");
        assert_eq!(rec.quantity_kg, 45.0);
        assert_eq!(rec.estimated_cost, 765.0);
        assert_eq!(rec.growth_stage, "Fruiting Stage");
    }

    #[test]
    fn stressed_crop_gets_stage_focus_boost() {
        let crop = crop("cotton", Some(75), None);
        let health = CropHealth::from_score(crop.id, Utc::now(), 25);
        let rec = assess(&crop, Some(&npk(Some(60.0), Some(40.0), Some(60.0))), Some(&health));

        assert_eq!(rec.nutrient, Nutrient::Phosphorus);
        assert_eq!(rec.fertilizer_type, "DAP (18-46-0)");
        assert_eq!(rec.urgency, FertilizationUrgency::Medium);
        assert_eq!(rec.reason, "Crop showing stress symptoms - nutrient boost recommended");
    }

    #[test]
    fn critical_health_is_not_a_stress_boost() {
        let crop = crop("cotton", Some(75), None);
        let health = CropHealth::from_score(crop.id, Utc::now(), 5);
        let rec = assess(&crop, None, Some(&health));
        assert_eq!(rec.urgency, FertilizationUrgency::Low);
    }

    #[test]
    fn seedling_without_data_is_routine_urea() {
        let crop = crop("vegetables", Some(10), None);
        let rec = assess(&crop, None, None);

        assert_eq!(rec.urgency, FertilizationUrgency::Low);
        assert!(rec.reason.contains("Scheduled fertilization for Seedling Stage"));
        assert_eq!(rec.fertilizer_type, "Urea (46-0-0)");
        // 100 kg/ha * 0.2 / 0.46 = 43.5
        assert_eq!(rec.quantity_kg, 43.0);
    }

    #[test]
    fn unknown_planting_date_is_vegetative() {
        let crop = crop("Potato", None, None);
        let rec = assess(&crop, None, None);
        assert_eq!(rec.growth_stage, "Vegetative Stage");
        // 180 * 0.4 / 0.46 = 156.5
        assert_eq!(rec.quantity_kg, 157.0);
    }

    #[test]
    fn missing_price_yields_none() {
        let mut tables = AgronomyTables::default();
        tables.fertilizer_prices.shift_remove("urea");
        let crop = crop("rice", Some(30), None);
        assert!(assess_fertilization(&crop, None, None, today(), &tables).is_none());
    }
}
