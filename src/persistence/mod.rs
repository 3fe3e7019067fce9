// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! Repository interfaces for the farm domain. Stores return plain data and
//! explicit latest-or-none lookups. Ownership scoping is a query parameter
//! (`owner: Option<FarmerId>`), so a record that exists but belongs to
//! another farmer is indistinguishable from a missing one.
//!
//! ## Status transitions
//!
//! Schedule and record status changes are conditional updates: the store
//! applies the change only if the current status is in the allowed source
//! set, and reports what it found otherwise. This gives per-record
//! atomicity without locks held across calls.
//!
//! ## Components
//!
//! - **Store traits**: one per entity family, all `async_trait`
//! - **InMemoryStore**: implements every trait; used by tests and demos
//! - **Query support**: notification paging and history filters

pub mod memory;
pub mod query_support;

pub use memory::InMemoryStore;
pub use query_support::{NotificationPage, NotificationQuery, RecordFilter, ScheduleFilter};

use crate::entity::{
    CropId, DeviceId, FarmId, FarmerId, FertilizationRecordId, NotificationId, ScheduleId,
};
use crate::errors::DomainResult;
use crate::model::{
    Crop, CropHealth, CropSnapshot, DeviceStatus, DeviceType, Farm, Farmer, FertilizationRecord,
    FertilizationStatus, IoTDevice, IrrigationSchedule, IrrigationStatus, Notification,
    RecordChange, ScheduleChange, SensorReading,
};
use crate::state_machine::{rejected_transition, State};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of a conditional status update
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome<T, S> {
    /// The change was applied; carries the updated entity
    Applied(T),
    /// No such entity visible to the owner
    NotFound,
    /// The entity exists but its status was not an allowed source
    Rejected {
        /// Status found at update time
        current: S,
    },
}

impl<T, S: State> TransitionOutcome<T, S> {
    /// Convert into a domain result
    ///
    /// `NotFound` maps to `EntityNotFound` and `Rejected` to
    /// `InvalidStateTransition` towards `target`.
    pub fn into_result(
        self,
        entity_type: &str,
        id: impl ToString,
        target: S,
    ) -> DomainResult<T> {
        match self {
            TransitionOutcome::Applied(entity) => Ok(entity),
            TransitionOutcome::NotFound => {
                Err(crate::errors::DomainError::not_found(entity_type, id))
            }
            TransitionOutcome::Rejected { current } => Err(rejected_transition(current, target)),
        }
    }
}

/// Farmers
#[async_trait]
pub trait FarmerStore: Send + Sync {
    /// Insert or replace a farmer
    async fn upsert_farmer(&self, farmer: Farmer) -> DomainResult<()>;

    /// Farmer by id
    async fn find_farmer(&self, id: FarmerId) -> DomainResult<Option<Farmer>>;

    /// Every farmer id, in registration order
    async fn list_farmer_ids(&self) -> DomainResult<Vec<FarmerId>>;
}

/// Farms
#[async_trait]
pub trait FarmStore: Send + Sync {
    /// Insert or replace a farm
    async fn upsert_farm(&self, farm: Farm) -> DomainResult<()>;

    /// Farm by id, scoped to an owner when given
    async fn find_farm(&self, id: FarmId, owner: Option<FarmerId>) -> DomainResult<Option<Farm>>;
}

/// Crops and their health history
#[async_trait]
pub trait CropStore: Send + Sync {
    /// Insert or replace a crop
    async fn upsert_crop(&self, crop: Crop) -> DomainResult<()>;

    /// Crop by id, scoped to the owner of its farm when given
    async fn find_crop(&self, id: CropId, owner: Option<FarmerId>) -> DomainResult<Option<Crop>>;

    /// Active crops on a farm in a stable order, each with its latest health
    async fn find_active_crops_by_farm(&self, farm_id: FarmId) -> DomainResult<Vec<CropSnapshot>>;

    /// Append a health snapshot
    async fn record_health(&self, health: CropHealth) -> DomainResult<()>;

    /// Most recent health snapshot by `recorded_at`
    async fn latest_health(&self, crop_id: CropId) -> DomainResult<Option<CropHealth>>;
}

/// IoT devices
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Insert or replace a device
    async fn upsert_device(&self, device: IoTDevice) -> DomainResult<()>;

    /// Device by id
    async fn find_device(&self, id: DeviceId) -> DomainResult<Option<IoTDevice>>;

    /// Device by hardware serial
    async fn find_device_by_serial(&self, serial: &str) -> DomainResult<Option<IoTDevice>>;

    /// Insert a device unless its serial is already registered; returns
    /// whether it was inserted
    async fn register_device(&self, device: IoTDevice) -> DomainResult<bool>;

    /// Update `last_seen_at` without touching the status
    async fn mark_device_seen(&self, id: DeviceId, at: DateTime<Utc>) -> DomainResult<()>;

    /// Set status and `last_seen_at`; returns the previous status, or
    /// `None` if there is no such device
    async fn set_device_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<DeviceStatus>>;

    /// Active devices of a type on a farm, in registration order
    async fn find_active_devices_by_farm_and_type(
        &self,
        farm_id: FarmId,
        device_type: DeviceType,
    ) -> DomainResult<Vec<IoTDevice>>;
}

/// Sensor readings
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Append a reading
    async fn record_reading(&self, reading: SensorReading) -> DomainResult<()>;

    /// Most recent reading for a device by `recorded_at`
    async fn find_latest_sensor_reading(
        &self,
        device_id: DeviceId,
    ) -> DomainResult<Option<SensorReading>>;

    /// Readings of a device newest first, optionally bounded by time and count
    async fn recent_readings(
        &self,
        device_id: DeviceId,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<SensorReading>>;
}

/// Irrigation schedules
#[async_trait]
pub trait IrrigationScheduleStore: Send + Sync {
    /// Insert a new schedule
    async fn insert_schedule(&self, schedule: IrrigationSchedule) -> DomainResult<()>;

    /// Schedule by id, scoped to the owner of its farm when given
    async fn find_schedule(
        &self,
        id: ScheduleId,
        owner: Option<FarmerId>,
    ) -> DomainResult<Option<IrrigationSchedule>>;

    /// Apply `change` only if the current status is in `allowed`
    async fn transition_schedule(
        &self,
        id: ScheduleId,
        owner: Option<FarmerId>,
        allowed: &[IrrigationStatus],
        change: ScheduleChange,
    ) -> DomainResult<TransitionOutcome<IrrigationSchedule, IrrigationStatus>>;

    /// Schedules matching a filter
    async fn list_schedules(&self, filter: &ScheduleFilter)
        -> DomainResult<Vec<IrrigationSchedule>>;
}

/// Fertilization records
#[async_trait]
pub trait FertilizationRecordStore: Send + Sync {
    /// Insert a new record
    async fn insert_record(&self, record: FertilizationRecord) -> DomainResult<()>;

    /// Record by id, scoped to the owner of its crop's farm when given
    async fn find_record(
        &self,
        id: FertilizationRecordId,
        owner: Option<FarmerId>,
    ) -> DomainResult<Option<FertilizationRecord>>;

    /// Apply `change` only if the current status is in `allowed`
    async fn transition_record(
        &self,
        id: FertilizationRecordId,
        owner: Option<FarmerId>,
        allowed: &[FertilizationStatus],
        change: RecordChange,
    ) -> DomainResult<TransitionOutcome<FertilizationRecord, FertilizationStatus>>;

    /// Records matching a filter
    async fn list_records(&self, filter: &RecordFilter) -> DomainResult<Vec<FertilizationRecord>>;
}

/// Notifications
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a new notification
    async fn insert_notification(&self, notification: Notification) -> DomainResult<()>;

    /// A page of a farmer's notifications, newest first
    async fn query_notifications(&self, query: &NotificationQuery)
        -> DomainResult<NotificationPage>;

    /// Set `read_at` if unset; returns whether the farmer owns such a notification
    async fn mark_read(
        &self,
        id: NotificationId,
        farmer_id: FarmerId,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Set `read_at` on every unread notification of a farmer; returns the count
    async fn mark_all_read(&self, farmer_id: FarmerId, at: DateTime<Utc>) -> DomainResult<usize>;

    /// Delete read notifications created before `cutoff`; returns the count
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> DomainResult<usize>;
}

/// Every store the services need, as one object
pub trait DomainStore:
    FarmerStore
    + FarmStore
    + CropStore
    + DeviceStore
    + SensorStore
    + IrrigationScheduleStore
    + FertilizationRecordStore
    + NotificationStore
{
}

impl<T> DomainStore for T where
    T: FarmerStore
        + FarmStore
        + CropStore
        + DeviceStore
        + SensorStore
        + IrrigationScheduleStore
        + FertilizationRecordStore
        + NotificationStore
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_maps_to_domain_errors() {
        let applied: TransitionOutcome<u32, IrrigationStatus> = TransitionOutcome::Applied(7);
        assert_eq!(
            applied
                .into_result("IrrigationSchedule", "s-1", IrrigationStatus::Cancelled)
                .unwrap(),
            7
        );

        let missing: TransitionOutcome<u32, IrrigationStatus> = TransitionOutcome::NotFound;
        assert!(missing
            .into_result("IrrigationSchedule", "s-1", IrrigationStatus::Cancelled)
            .unwrap_err()
            .is_not_found());

        let rejected: TransitionOutcome<u32, IrrigationStatus> = TransitionOutcome::Rejected {
            current: IrrigationStatus::Completed,
        };
        let err = rejected
            .into_result("IrrigationSchedule", "s-1", IrrigationStatus::Cancelled)
            .unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(
            err.to_string(),
            "Invalid state transition from completed to cancelled"
        );
    }
}
