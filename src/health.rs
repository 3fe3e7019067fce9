// Copyright 2025 Cowboy AI, LLC.

//! Crop health scoring from satellite NDVI

use crate::entity::CropId;
use crate::model::{CropHealth, HealthStatus};
use chrono::{DateTime, Utc};

/// Map an NDVI value (-1..1) onto a 0-100 health score
///
/// Non-vegetated surfaces (NDVI below zero) score 0; the bands between
/// 0.2 and 0.6 are stretched because that is where most field crops sit.
pub fn health_score_from_ndvi(ndvi: f64) -> u8 {
    let score = if ndvi < 0.0 {
        0.0
    } else if ndvi < 0.2 {
        ndvi * 100.0
    } else if ndvi < 0.4 {
        20.0 + (ndvi - 0.2) * 150.0
    } else if ndvi < 0.6 {
        50.0 + (ndvi - 0.4) * 150.0
    } else {
        80.0 + (ndvi - 0.6) * 50.0
    };
    score.round().clamp(0.0, 100.0) as u8
}

/// Ordered advisory notes for a health observation
pub fn health_advisories(
    health_score: u8,
    ndvi: f64,
    moisture: Option<f64>,
    temperature: Option<f64>,
) -> Vec<String> {
    let mut advisories: Vec<&str> = Vec::new();

    if ndvi < 0.3 {
        advisories.push("Crop shows signs of stress. Check for pest infestation or disease.");
        advisories.push("Consider soil testing for nutrient deficiencies.");
    } else if ndvi < 0.5 {
        advisories.push("Moderate vegetation health. Ensure adequate water and nutrients.");
    }

    match moisture {
        Some(m) if m < 30.0 => advisories.push("Soil moisture is low. Schedule irrigation soon."),
        Some(m) if m > 80.0 => advisories
            .push("Soil moisture is high. Reduce irrigation to prevent waterlogging."),
        _ => {}
    }

    match temperature {
        Some(t) if t > 35.0 => {
            advisories.push("High temperature detected. Consider increasing irrigation frequency.");
            advisories.push("Apply mulching to retain soil moisture.");
        }
        Some(t) if t < 10.0 => advisories.push("Low temperature detected. Monitor for frost damage."),
        _ => {}
    }

    if health_score < 40 {
        advisories.push("Consider consulting an agricultural expert for detailed assessment.");
    }

    advisories.into_iter().map(String::from).collect()
}

impl CropHealth {
    /// Build a snapshot from an NDVI observation
    ///
    /// Score, status, and advisories are all derived here, so a snapshot
    /// built this way is always internally consistent.
    pub fn assess(
        crop_id: CropId,
        recorded_at: DateTime<Utc>,
        ndvi: f64,
        moisture_level: Option<f64>,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> Self {
        let health_score = health_score_from_ndvi(ndvi);
        Self {
            crop_id,
            recorded_at,
            ndvi_value: Some(ndvi),
            health_score,
            health_status: HealthStatus::from_score(health_score),
            moisture_level,
            temperature,
            humidity,
            recommendations: health_advisories(health_score, ndvi, moisture_level, temperature),
        }
    }

    /// Snapshot with a known score and no NDVI, e.g. from field scouting
    pub fn from_score(crop_id: CropId, recorded_at: DateTime<Utc>, health_score: u8) -> Self {
        let health_score = health_score.min(100);
        Self {
            crop_id,
            recorded_at,
            ndvi_value: None,
            health_score,
            health_status: HealthStatus::from_score(health_score),
            moisture_level: None,
            temperature: None,
            humidity: None,
            recommendations: Vec::new(),
        }
    }

    /// Attach a satellite moisture estimate
    pub fn with_moisture(mut self, moisture_level: f64) -> Self {
        self.moisture_level = Some(moisture_level);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(-0.5 => 0)]
    #[test_case(0.1 => 10)]
    #[test_case(0.3 => 35)]
    #[test_case(0.5 => 65)]
    #[test_case(0.8 => 90)]
    #[test_case(1.0 => 100)]
    fn ndvi_score_bands(ndvi: f64) -> u8 {
        health_score_from_ndvi(ndvi)
    }

    #[test]
    fn advisories_follow_observation_order() {
        let advisories = health_advisories(30, 0.25, Some(20.0), Some(38.0));
        assert_eq!(
            advisories,
            vec![
                "Crop shows signs of stress. Check for pest infestation or disease.",
                "Consider soil testing for nutrient deficiencies.",
                "Soil moisture is low. Schedule irrigation soon.",
                "High temperature detected. Consider increasing irrigation frequency.",
                "Apply mulching to retain soil moisture.",
                "Consider consulting an agricultural expert for detailed assessment.",
            ]
        );
    }

    #[test]
    fn healthy_observation_has_no_advisories() {
        assert!(health_advisories(85, 0.75, Some(55.0), Some(24.0)).is_empty());
    }

    proptest! {
        #[test]
        fn assessed_snapshot_is_consistent(ndvi in -1.0f64..=1.0) {
            let snapshot = CropHealth::assess(CropId::new(), Utc::now(), ndvi, None, None, None);
            prop_assert!(snapshot.health_score <= 100);
            prop_assert_eq!(snapshot.health_status, HealthStatus::from_score(snapshot.health_score));
        }

        #[test]
        fn score_is_monotonic_in_ndvi(a in -1.0f64..=1.0, b in -1.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(health_score_from_ndvi(lo) <= health_score_from_ndvi(hi));
        }
    }
}
