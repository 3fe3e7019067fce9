// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{CropId, FertilizationRecordId};
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a fertilization record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FertilizationStatus {
    /// Produced from a recommendation
    Recommended,
    /// Farmer committed to a date
    Scheduled,
    /// Fertilizer was applied
    Applied,
    /// Farmer skipped the application
    Skipped,
}

impl State for FertilizationStatus {
    fn name(&self) -> &'static str {
        match self {
            FertilizationStatus::Recommended => "recommended",
            FertilizationStatus::Scheduled => "scheduled",
            FertilizationStatus::Applied => "applied",
            FertilizationStatus::Skipped => "skipped",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, FertilizationStatus::Applied | FertilizationStatus::Skipped)
    }
}

impl StateTransitions for FertilizationStatus {
    const ALL: &'static [Self] = &[
        FertilizationStatus::Recommended,
        FertilizationStatus::Scheduled,
        FertilizationStatus::Applied,
        FertilizationStatus::Skipped,
    ];

    fn can_transition_to(&self, target: &Self) -> bool {
        use FertilizationStatus::*;
        matches!(
            (self, target),
            (Recommended, Scheduled) | (Recommended | Scheduled, Applied | Skipped)
        )
    }
}

/// How fertilizer was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMethod {
    /// Spread over the surface
    #[default]
    Broadcasting,
    /// Sprayed on leaves
    Foliar,
    /// Through drip lines
    Drip,
    /// In bands beside rows
    Band,
    /// Spot treatment
    Spot,
}

/// A recommended or executed fertilizer application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizationRecord {
    /// Record ID
    pub id: FertilizationRecordId,
    /// Crop to fertilize
    pub crop_id: CropId,
    /// Recommended application date
    pub recommended_date: DateTime<Utc>,
    /// Fertilizer label, e.g. "Urea (46-0-0)"
    pub fertilizer_type: String,
    /// Recommended quantity
    pub quantity_kg: f64,
    /// N:P:K ratio string
    pub npk_ratio: String,
    /// Estimated cost
    pub cost_estimate: f64,
    /// Lifecycle status
    pub status: FertilizationStatus,
    /// Set on apply
    pub applied_at: Option<DateTime<Utc>>,
    /// Set on apply
    pub actual_quantity_kg: Option<f64>,
    /// Set on apply
    pub actual_cost: Option<f64>,
    /// Set on apply
    pub application_method: Option<ApplicationMethod>,
    /// Farmer notes or skip reason
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Input for creating a fertilization record
#[derive(Debug, Clone, PartialEq)]
pub struct NewFertilizationRecord {
    /// Crop to fertilize
    pub crop_id: CropId,
    /// Fertilizer label
    pub fertilizer_type: String,
    /// Quantity, must be positive
    pub quantity_kg: f64,
    /// N:P:K ratio string
    pub npk_ratio: String,
    /// Recommended application date
    pub recommended_date: DateTime<Utc>,
    /// Estimated cost
    pub cost_estimate: f64,
}

/// Field changes applied together with a record status transition
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChange {
    /// Target status
    pub to: FertilizationStatus,
    /// Move the recommended date
    pub recommended_date: Option<DateTime<Utc>>,
    /// Set `applied_at`
    pub applied_at: Option<DateTime<Utc>>,
    /// Set `actual_quantity_kg`
    pub actual_quantity_kg: Option<f64>,
    /// Set `actual_cost`
    pub actual_cost: Option<f64>,
    /// Set `application_method`
    pub application_method: Option<ApplicationMethod>,
    /// Replace `notes`
    pub notes: Option<String>,
}

impl RecordChange {
    /// Status-only change
    pub fn to(status: FertilizationStatus) -> Self {
        Self {
            to: status,
            recommended_date: None,
            applied_at: None,
            actual_quantity_kg: None,
            actual_cost: None,
            application_method: None,
            notes: None,
        }
    }

    /// Apply the change to a record
    pub fn apply(&self, record: &mut FertilizationRecord) {
        record.status = self.to;
        if let Some(date) = self.recommended_date {
            record.recommended_date = date;
        }
        if let Some(at) = self.applied_at {
            record.applied_at = Some(at);
        }
        if let Some(quantity) = self.actual_quantity_kg {
            record.actual_quantity_kg = Some(quantity);
        }
        if let Some(cost) = self.actual_cost {
            record.actual_cost = Some(cost);
        }
        if let Some(method) = self.application_method {
            record.application_method = Some(method);
        }
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FertilizationStatus::*;

    #[test]
    fn terminal_states_are_not_reenterable() {
        for terminal in [Applied, Skipped] {
            assert!(terminal.is_terminal());
            for target in FertilizationStatus::ALL {
                assert!(terminal.ensure_transition(target).is_err());
            }
        }
    }

    #[test]
    fn apply_and_skip_sources() {
        assert_eq!(FertilizationStatus::sources_for(&Applied), vec![Recommended, Scheduled]);
        assert_eq!(FertilizationStatus::sources_for(&Skipped), vec![Recommended, Scheduled]);
        assert_eq!(FertilizationStatus::sources_for(&Scheduled), vec![Recommended]);
        assert!(FertilizationStatus::sources_for(&Recommended).is_empty());
    }
}
