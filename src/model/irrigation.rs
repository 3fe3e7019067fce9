// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{CropId, DeviceId, FarmId, ScheduleId};
use crate::state_machine::{State, StateTransitions};
use crate::weather::CurrentConditions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an irrigation schedule
///
/// ```text
/// pending ──► scheduled ──► in_progress ──► completed
///    │            │               └───────► failed
///    ├────────────┴──► cancelled
///    └──────────────► in_progress
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationStatus {
    /// Created but not yet confirmed
    Pending,
    /// Confirmed for its scheduled time
    Scheduled,
    /// Device command sent, water running
    InProgress,
    /// Device reported completion
    Completed,
    /// Device reported failure
    Failed,
    /// Cancelled by the farmer
    Cancelled,
}

impl State for IrrigationStatus {
    fn name(&self) -> &'static str {
        match self {
            IrrigationStatus::Pending => "pending",
            IrrigationStatus::Scheduled => "scheduled",
            IrrigationStatus::InProgress => "in_progress",
            IrrigationStatus::Completed => "completed",
            IrrigationStatus::Failed => "failed",
            IrrigationStatus::Cancelled => "cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            IrrigationStatus::Completed | IrrigationStatus::Failed | IrrigationStatus::Cancelled
        )
    }
}

impl StateTransitions for IrrigationStatus {
    const ALL: &'static [Self] = &[
        IrrigationStatus::Pending,
        IrrigationStatus::Scheduled,
        IrrigationStatus::InProgress,
        IrrigationStatus::Completed,
        IrrigationStatus::Failed,
        IrrigationStatus::Cancelled,
    ];

    fn can_transition_to(&self, target: &Self) -> bool {
        use IrrigationStatus::*;
        matches!(
            (self, target),
            (Pending, Scheduled)
                | (Pending | Scheduled, InProgress)
                | (Pending | Scheduled, Cancelled)
                | (InProgress, Completed | Failed)
        )
    }
}

/// What caused a schedule to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Farmer action
    #[default]
    Manual,
    /// Converted from an engine recommendation
    Auto,
    /// Recurring schedule
    Schedule,
    /// Sensor threshold
    Sensor,
}

/// A planned or executed irrigation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationSchedule {
    /// Schedule ID
    pub id: ScheduleId,
    /// Farm being irrigated
    pub farm_id: FarmId,
    /// Target crop, if any
    pub crop_id: Option<CropId>,
    /// Controller that runs the water, if any
    pub device_id: Option<DeviceId>,
    /// Planned start
    pub scheduled_time: DateTime<Utc>,
    /// Planned run length
    pub duration_minutes: u32,
    /// Lifecycle status
    pub status: IrrigationStatus,
    /// Creation cause
    pub triggered_by: TriggerSource,
    /// When the device command was sent
    pub executed_at: Option<DateTime<Utc>>,
    /// When the device reported an outcome
    pub completed_at: Option<DateTime<Utc>>,
    /// Water volume reported by the device
    pub actual_volume_liters: Option<f64>,
    /// Weather at creation time
    pub weather_condition: Option<CurrentConditions>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Input for creating an irrigation schedule
#[derive(Debug, Clone, PartialEq)]
pub struct NewIrrigationSchedule {
    /// Farm being irrigated
    pub farm_id: FarmId,
    /// Target crop
    pub crop_id: Option<CropId>,
    /// Controller device
    pub device_id: Option<DeviceId>,
    /// Planned start
    pub scheduled_time: DateTime<Utc>,
    /// Planned run length, 1..=480
    pub duration_minutes: u32,
    /// Creation cause
    pub triggered_by: TriggerSource,
    /// Unconfirmed schedules start as pending
    pub confirmed: bool,
}

impl NewIrrigationSchedule {
    /// Confirmed manual schedule for a farm
    pub fn new(farm_id: FarmId, scheduled_time: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            farm_id,
            crop_id: None,
            device_id: None,
            scheduled_time,
            duration_minutes,
            triggered_by: TriggerSource::Manual,
            confirmed: true,
        }
    }

    /// Target a crop
    pub fn for_crop(mut self, crop_id: CropId) -> Self {
        self.crop_id = Some(crop_id);
        self
    }

    /// Run through a controller device
    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    /// Record what caused the schedule
    pub fn triggered_by(mut self, source: TriggerSource) -> Self {
        self.triggered_by = source;
        self
    }

    /// Leave the schedule pending until confirmed
    pub fn unconfirmed(mut self) -> Self {
        self.confirmed = false;
        self
    }
}

/// Field changes applied together with a schedule status transition
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleChange {
    /// Target status
    pub to: IrrigationStatus,
    /// Set `executed_at`
    pub executed_at: Option<DateTime<Utc>>,
    /// Set `completed_at`
    pub completed_at: Option<DateTime<Utc>>,
    /// Set `actual_volume_liters`
    pub actual_volume_liters: Option<f64>,
}

impl ScheduleChange {
    /// Status-only change
    pub fn to(status: IrrigationStatus) -> Self {
        Self {
            to: status,
            executed_at: None,
            completed_at: None,
            actual_volume_liters: None,
        }
    }

    /// Apply the change to a schedule
    pub fn apply(&self, schedule: &mut IrrigationSchedule) {
        schedule.status = self.to;
        if let Some(at) = self.executed_at {
            schedule.executed_at = Some(at);
        }
        if let Some(at) = self.completed_at {
            schedule.completed_at = Some(at);
        }
        if let Some(volume) = self.actual_volume_liters {
            schedule.actual_volume_liters = Some(volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IrrigationStatus::*;

    #[test]
    fn terminal_states_have_no_exits() {
        for status in [Completed, Failed, Cancelled] {
            assert!(status.is_terminal());
            assert!(status.valid_transitions().is_empty());
        }
    }

    #[test]
    fn cancel_allowed_only_before_execution() {
        assert_eq!(IrrigationStatus::sources_for(&Cancelled), vec![Pending, Scheduled]);
        assert!(InProgress.ensure_transition(&Cancelled).is_err());
    }

    #[test]
    fn outcome_only_from_in_progress() {
        assert_eq!(IrrigationStatus::sources_for(&Completed), vec![InProgress]);
        assert_eq!(IrrigationStatus::sources_for(&Failed), vec![InProgress]);
    }

    #[test]
    fn no_backward_moves() {
        assert!(!Scheduled.can_transition_to(&Pending));
        assert!(!InProgress.can_transition_to(&Scheduled));
        assert!(!Completed.can_transition_to(&InProgress));
    }
}
