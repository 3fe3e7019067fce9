// Copyright 2025 Cowboy AI, LLC.

//! In-memory implementation of every store trait
//!
//! All tables sit behind a single `RwLock`, so ownership joins and
//! conditional status updates see a consistent view and are applied
//! atomically. Insertion order is preserved, which gives the stable crop
//! ordering the farm aggregations rely on.

use super::{
    CropStore, DeviceStore, FarmStore, FarmerStore, FertilizationRecordStore,
    IrrigationScheduleStore, NotificationPage, NotificationQuery, NotificationStore, RecordFilter,
    ScheduleFilter, SensorStore, TransitionOutcome,
};
use crate::entity::{
    CropId, DeviceId, FarmId, FarmerId, FertilizationRecordId, NotificationId, ScheduleId,
};
use crate::errors::DomainResult;
use crate::model::{
    Crop, CropHealth, CropSnapshot, DeviceStatus, DeviceType, Farm, Farmer, FertilizationRecord,
    FertilizationStatus, IoTDevice, IrrigationSchedule, IrrigationStatus, Notification,
    RecordChange, ScheduleChange, SensorReading,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    farmers: IndexMap<FarmerId, Farmer>,
    farms: IndexMap<FarmId, Farm>,
    crops: IndexMap<CropId, Crop>,
    health: Vec<CropHealth>,
    devices: IndexMap<DeviceId, IoTDevice>,
    readings: Vec<SensorReading>,
    schedules: IndexMap<ScheduleId, IrrigationSchedule>,
    records: IndexMap<FertilizationRecordId, FertilizationRecord>,
    notifications: IndexMap<NotificationId, Notification>,
}

impl Tables {
    fn farm_owned_by(&self, farm_id: FarmId, owner: Option<FarmerId>) -> bool {
        match owner {
            None => true,
            Some(owner) => self
                .farms
                .get(&farm_id)
                .is_some_and(|farm| farm.farmer_id == owner),
        }
    }

    fn crop_owned_by(&self, crop_id: CropId, owner: Option<FarmerId>) -> bool {
        self.crops
            .get(&crop_id)
            .is_some_and(|crop| self.farm_owned_by(crop.farm_id, owner))
    }

    fn crop_on_farm(&self, crop_id: CropId, farm_id: Option<FarmId>) -> bool {
        match farm_id {
            None => true,
            Some(farm_id) => self
                .crops
                .get(&crop_id)
                .is_some_and(|crop| crop.farm_id == farm_id),
        }
    }

    fn latest_health(&self, crop_id: CropId) -> Option<CropHealth> {
        self.health
            .iter()
            .filter(|health| health.crop_id == crop_id)
            .max_by_key(|health| health.recorded_at)
            .cloned()
    }
}

/// In-memory store for tests, demos, and single-process deployments
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications
    pub async fn notification_count(&self) -> usize {
        self.tables.read().await.notifications.len()
    }

    /// Snapshot of one notification, regardless of owner
    pub async fn notification(&self, id: NotificationId) -> Option<Notification> {
        self.tables.read().await.notifications.get(&id).cloned()
    }

    /// Overwrite a notification's creation time
    ///
    /// Lets retention behaviour be exercised without waiting.
    pub async fn backdate_notification(&self, id: NotificationId, created_at: DateTime<Utc>) {
        if let Some(notification) = self.tables.write().await.notifications.get_mut(&id) {
            notification.created_at = created_at;
        }
    }
}

#[async_trait]
impl FarmerStore for InMemoryStore {
    async fn upsert_farmer(&self, farmer: Farmer) -> DomainResult<()> {
        self.tables.write().await.farmers.insert(farmer.id, farmer);
        Ok(())
    }

    async fn find_farmer(&self, id: FarmerId) -> DomainResult<Option<Farmer>> {
        Ok(self.tables.read().await.farmers.get(&id).cloned())
    }

    async fn list_farmer_ids(&self) -> DomainResult<Vec<FarmerId>> {
        Ok(self.tables.read().await.farmers.keys().copied().collect())
    }
}

#[async_trait]
impl FarmStore for InMemoryStore {
    async fn upsert_farm(&self, farm: Farm) -> DomainResult<()> {
        self.tables.write().await.farms.insert(farm.id, farm);
        Ok(())
    }

    async fn find_farm(&self, id: FarmId, owner: Option<FarmerId>) -> DomainResult<Option<Farm>> {
        let tables = self.tables.read().await;
        Ok(tables
            .farms
            .get(&id)
            .filter(|_| tables.farm_owned_by(id, owner))
            .cloned())
    }
}

#[async_trait]
impl CropStore for InMemoryStore {
    async fn upsert_crop(&self, crop: Crop) -> DomainResult<()> {
        self.tables.write().await.crops.insert(crop.id, crop);
        Ok(())
    }

    async fn find_crop(&self, id: CropId, owner: Option<FarmerId>) -> DomainResult<Option<Crop>> {
        let tables = self.tables.read().await;
        Ok(tables
            .crops
            .get(&id)
            .filter(|_| tables.crop_owned_by(id, owner))
            .cloned())
    }

    async fn find_active_crops_by_farm(&self, farm_id: FarmId) -> DomainResult<Vec<CropSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables
            .crops
            .values()
            .filter(|crop| crop.farm_id == farm_id && crop.is_active())
            .map(|crop| CropSnapshot {
                crop: crop.clone(),
                latest_health: tables.latest_health(crop.id),
            })
            .collect())
    }

    async fn record_health(&self, health: CropHealth) -> DomainResult<()> {
        self.tables.write().await.health.push(health);
        Ok(())
    }

    async fn latest_health(&self, crop_id: CropId) -> DomainResult<Option<CropHealth>> {
        Ok(self.tables.read().await.latest_health(crop_id))
    }
}

#[async_trait]
impl DeviceStore for InMemoryStore {
    async fn upsert_device(&self, device: IoTDevice) -> DomainResult<()> {
        self.tables.write().await.devices.insert(device.id, device);
        Ok(())
    }

    async fn find_device(&self, id: DeviceId) -> DomainResult<Option<IoTDevice>> {
        Ok(self.tables.read().await.devices.get(&id).cloned())
    }

    async fn find_device_by_serial(&self, serial: &str) -> DomainResult<Option<IoTDevice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .values()
            .find(|device| device.serial == serial)
            .cloned())
    }

    async fn register_device(&self, device: IoTDevice) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .devices
            .values()
            .any(|existing| existing.serial == device.serial)
        {
            return Ok(false);
        }
        tables.devices.insert(device.id, device);
        Ok(true)
    }

    async fn mark_device_seen(&self, id: DeviceId, at: DateTime<Utc>) -> DomainResult<()> {
        if let Some(device) = self.tables.write().await.devices.get_mut(&id) {
            device.last_seen_at = Some(at);
        }
        Ok(())
    }

    async fn set_device_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<DeviceStatus>> {
        let mut tables = self.tables.write().await;
        let Some(device) = tables.devices.get_mut(&id) else {
            return Ok(None);
        };
        let previous = std::mem::replace(&mut device.status, status);
        device.last_seen_at = Some(at);
        Ok(Some(previous))
    }

    async fn find_active_devices_by_farm_and_type(
        &self,
        farm_id: FarmId,
        device_type: DeviceType,
    ) -> DomainResult<Vec<IoTDevice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .values()
            .filter(|device| {
                device.farm_id == farm_id && device.device_type == device_type && device.is_active()
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SensorStore for InMemoryStore {
    async fn record_reading(&self, reading: SensorReading) -> DomainResult<()> {
        self.tables.write().await.readings.push(reading);
        Ok(())
    }

    async fn find_latest_sensor_reading(
        &self,
        device_id: DeviceId,
    ) -> DomainResult<Option<SensorReading>> {
        let tables = self.tables.read().await;
        Ok(tables
            .readings
            .iter()
            .filter(|reading| reading.device_id == device_id)
            .max_by_key(|reading| reading.recorded_at)
            .cloned())
    }

    async fn recent_readings(
        &self,
        device_id: DeviceId,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<SensorReading>> {
        let tables = self.tables.read().await;
        let mut readings: Vec<SensorReading> = tables
            .readings
            .iter()
            .filter(|reading| reading.device_id == device_id)
            .filter(|reading| since.map_or(true, |since| reading.recorded_at >= since))
            .cloned()
            .collect();
        readings.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if let Some(limit) = limit {
            readings.truncate(limit);
        }
        Ok(readings)
    }
}

#[async_trait]
impl IrrigationScheduleStore for InMemoryStore {
    async fn insert_schedule(&self, schedule: IrrigationSchedule) -> DomainResult<()> {
        self.tables
            .write()
            .await
            .schedules
            .insert(schedule.id, schedule);
        Ok(())
    }

    async fn find_schedule(
        &self,
        id: ScheduleId,
        owner: Option<FarmerId>,
    ) -> DomainResult<Option<IrrigationSchedule>> {
        let tables = self.tables.read().await;
        Ok(tables
            .schedules
            .get(&id)
            .filter(|schedule| tables.farm_owned_by(schedule.farm_id, owner))
            .cloned())
    }

    async fn transition_schedule(
        &self,
        id: ScheduleId,
        owner: Option<FarmerId>,
        allowed: &[IrrigationStatus],
        change: ScheduleChange,
    ) -> DomainResult<TransitionOutcome<IrrigationSchedule, IrrigationStatus>> {
        let mut tables = self.tables.write().await;
        let visible = tables
            .schedules
            .get(&id)
            .is_some_and(|schedule| tables.farm_owned_by(schedule.farm_id, owner));
        if !visible {
            return Ok(TransitionOutcome::NotFound);
        }
        let Some(schedule) = tables.schedules.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !allowed.contains(&schedule.status) {
            debug!(schedule_id = %id, current = ?schedule.status, target = ?change.to, "Conditional update rejected");
            return Ok(TransitionOutcome::Rejected {
                current: schedule.status,
            });
        }
        change.apply(schedule);
        Ok(TransitionOutcome::Applied(schedule.clone()))
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> DomainResult<Vec<IrrigationSchedule>> {
        let tables = self.tables.read().await;
        Ok(tables
            .schedules
            .values()
            .filter(|schedule| tables.farm_owned_by(schedule.farm_id, filter.owner))
            .filter(|schedule| filter.matches(schedule))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FertilizationRecordStore for InMemoryStore {
    async fn insert_record(&self, record: FertilizationRecord) -> DomainResult<()> {
        self.tables.write().await.records.insert(record.id, record);
        Ok(())
    }

    async fn find_record(
        &self,
        id: FertilizationRecordId,
        owner: Option<FarmerId>,
    ) -> DomainResult<Option<FertilizationRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .get(&id)
            .filter(|record| tables.crop_owned_by(record.crop_id, owner))
            .cloned())
    }

    async fn transition_record(
        &self,
        id: FertilizationRecordId,
        owner: Option<FarmerId>,
        allowed: &[FertilizationStatus],
        change: RecordChange,
    ) -> DomainResult<TransitionOutcome<FertilizationRecord, FertilizationStatus>> {
        let mut tables = self.tables.write().await;
        let visible = tables
            .records
            .get(&id)
            .is_some_and(|record| tables.crop_owned_by(record.crop_id, owner));
        if !visible {
            return Ok(TransitionOutcome::NotFound);
        }
        let Some(record) = tables.records.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !allowed.contains(&record.status) {
            debug!(record_id = %id, current = ?record.status, target = ?change.to, "Conditional update rejected");
            return Ok(TransitionOutcome::Rejected {
                current: record.status,
            });
        }
        change.apply(record);
        Ok(TransitionOutcome::Applied(record.clone()))
    }

    async fn list_records(&self, filter: &RecordFilter) -> DomainResult<Vec<FertilizationRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .filter(|record| tables.crop_owned_by(record.crop_id, filter.owner))
            .filter(|record| tables.crop_on_farm(record.crop_id, filter.farm_id))
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert_notification(&self, notification: Notification) -> DomainResult<()> {
        self.tables
            .write()
            .await
            .notifications
            .insert(notification.id, notification);
        Ok(())
    }

    async fn query_notifications(
        &self,
        query: &NotificationQuery,
    ) -> DomainResult<NotificationPage> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Notification> = tables
            .notifications
            .values()
            .filter(|notification| query.matches(notification))
            .collect();
        // Newest first; insertion order breaks ties between equal timestamps
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let unread_count = tables
            .notifications
            .values()
            .filter(|notification| notification.farmer_id == query.farmer_id && !notification.is_read())
            .count();

        Ok(NotificationPage {
            total: matching.len(),
            items: matching
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect(),
            unread_count,
        })
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        farmer_id: FarmerId,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.notifications.get_mut(&id) {
            Some(notification) if notification.farmer_id == farmer_id => {
                if notification.read_at.is_none() {
                    notification.read_at = Some(at);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, farmer_id: FarmerId, at: DateTime<Utc>) -> DomainResult<usize> {
        let mut tables = self.tables.write().await;
        let mut count = 0;
        for notification in tables.notifications.values_mut() {
            if notification.farmer_id == farmer_id && notification.read_at.is_none() {
                notification.read_at = Some(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.notifications.len();
        tables
            .notifications
            .retain(|_, notification| !(notification.is_read() && notification.created_at < cutoff));
        Ok(before - tables.notifications.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CropStatus, DeviceStatus, IrrigationStatus, TriggerSource};
    use chrono::Duration;

    fn farm(farmer_id: FarmerId) -> Farm {
        Farm {
            id: FarmId::new(),
            farmer_id,
            name: "North field".into(),
            latitude: 18.52,
            longitude: 73.85,
        }
    }

    fn crop(farm_id: FarmId, status: CropStatus) -> Crop {
        Crop {
            id: CropId::new(),
            farm_id,
            crop_type: "wheat".into(),
            planted_date: None,
            area_hectares: None,
            status,
        }
    }

    fn schedule(farm_id: FarmId, status: IrrigationStatus) -> IrrigationSchedule {
        IrrigationSchedule {
            id: ScheduleId::new(),
            farm_id,
            crop_id: None,
            device_id: None,
            scheduled_time: Utc::now(),
            duration_minutes: 30,
            status,
            triggered_by: TriggerSource::Manual,
            executed_at: None,
            completed_at: None,
            actual_volume_liters: None,
            weather_condition: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_farm_lookup_is_owner_scoped() {
        let store = InMemoryStore::new();
        let owner = FarmerId::new();
        let farm = farm(owner);
        store.upsert_farm(farm.clone()).await.unwrap();

        assert_eq!(store.find_farm(farm.id, Some(owner)).await.unwrap(), Some(farm.clone()));
        assert_eq!(store.find_farm(farm.id, Some(FarmerId::new())).await.unwrap(), None);
        assert!(store.find_farm(farm.id, None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_active_crops_keep_insertion_order_with_latest_health() {
        let store = InMemoryStore::new();
        let farm = farm(FarmerId::new());
        store.upsert_farm(farm.clone()).await.unwrap();

        let first = crop(farm.id, CropStatus::Active);
        let harvested = crop(farm.id, CropStatus::Harvested);
        let second = crop(farm.id, CropStatus::Active);
        for c in [&first, &harvested, &second] {
            store.upsert_crop(c.clone()).await.unwrap();
        }

        let now = Utc::now();
        let old = CropHealth::from_score(first.id, now - Duration::days(3), 90);
        let new = CropHealth::from_score(first.id, now, 30);
        store.record_health(new.clone()).await.unwrap();
        store.record_health(old).await.unwrap();

        let snapshots = store.find_active_crops_by_farm(farm.id).await.unwrap();
        let ids: Vec<CropId> = snapshots.iter().map(|s| s.crop.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(snapshots[0].latest_health, Some(new));
        assert_eq!(snapshots[1].latest_health, None);
    }

    fn probe(serial: &str) -> IoTDevice {
        IoTDevice {
            id: DeviceId::new(),
            farm_id: FarmId::new(),
            serial: serial.into(),
            name: "Probe".into(),
            device_type: DeviceType::SoilSensor,
            status: DeviceStatus::Active,
            last_seen_at: None,
        }
    }

    #[tokio::test]
    async fn test_register_device_rejects_taken_serial() {
        let store = InMemoryStore::new();
        let first = probe("SOIL-7");
        assert!(store.register_device(first.clone()).await.unwrap());
        assert!(!store.register_device(probe("SOIL-7")).await.unwrap());

        let found = store.find_device_by_serial("SOIL-7").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.find_device_by_serial("SOIL-8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_device_status_returns_previous() {
        let store = InMemoryStore::new();
        let device = probe("SOIL-2");
        store.upsert_device(device.clone()).await.unwrap();
        let at = Utc::now();

        let previous = store
            .set_device_status(device.id, DeviceStatus::Offline, at)
            .await
            .unwrap();
        assert_eq!(previous, Some(DeviceStatus::Active));
        let stored = store.find_device(device.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeviceStatus::Offline);
        assert_eq!(stored.last_seen_at, Some(at));

        assert_eq!(
            store
                .set_device_status(DeviceId::new(), DeviceStatus::Offline, at)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_recent_readings_newest_first_within_window() {
        let store = InMemoryStore::new();
        let device = probe("SOIL-3");
        let now = Utc::now();
        for hours in [30, 2, 1, 5] {
            store
                .record_reading(SensorReading::new(device.id, now - Duration::hours(hours)))
                .await
                .unwrap();
        }

        let window = store
            .recent_readings(device.id, Some(now - Duration::hours(24)), None)
            .await
            .unwrap();
        let ages: Vec<i64> = window
            .iter()
            .map(|reading| (now - reading.recorded_at).num_hours())
            .collect();
        assert_eq!(ages, vec![1, 2, 5]);

        let latest_two = store.recent_readings(device.id, None, Some(2)).await.unwrap();
        assert_eq!(latest_two.len(), 2);
        assert_eq!(latest_two[0].recorded_at, now - Duration::hours(1));
    }

    #[tokio::test]
    async fn test_latest_reading_by_recorded_at() {
        let store = InMemoryStore::new();
        let device = IoTDevice {
            id: DeviceId::new(),
            farm_id: FarmId::new(),
            serial: "SOIL-1".into(),
            name: "Probe".into(),
            device_type: DeviceType::SoilSensor,
            status: DeviceStatus::Active,
            last_seen_at: None,
        };
        store.upsert_device(device.clone()).await.unwrap();

        let now = Utc::now();
        let mut newer = SensorReading::new(device.id, now);
        newer.soil_moisture = Some(42.0);
        let mut older = SensorReading::new(device.id, now - Duration::hours(1));
        older.soil_moisture = Some(12.0);
        store.record_reading(newer).await.unwrap();
        store.record_reading(older).await.unwrap();

        let latest = store.find_latest_sensor_reading(device.id).await.unwrap().unwrap();
        assert_eq!(latest.soil_moisture, Some(42.0));
        assert!(store
            .find_latest_sensor_reading(DeviceId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_conditional_transition() {
        let store = InMemoryStore::new();
        let owner = FarmerId::new();
        let farm = farm(owner);
        store.upsert_farm(farm.clone()).await.unwrap();
        let s = schedule(farm.id, IrrigationStatus::Completed);
        store.insert_schedule(s.clone()).await.unwrap();

        let allowed = [IrrigationStatus::Pending, IrrigationStatus::Scheduled];
        let outcome = store
            .transition_schedule(
                s.id,
                Some(owner),
                &allowed,
                ScheduleChange::to(IrrigationStatus::Cancelled),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Rejected {
                current: IrrigationStatus::Completed
            }
        );

        let outcome = store
            .transition_schedule(
                s.id,
                Some(FarmerId::new()),
                &allowed,
                ScheduleChange::to(IrrigationStatus::Cancelled),
            )
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::NotFound);

        let stored = store.find_schedule(s.id, None).await.unwrap().unwrap();
        assert_eq!(stored.status, IrrigationStatus::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_transitions_apply_once() {
        let store = InMemoryStore::new();
        let farm = farm(FarmerId::new());
        store.upsert_farm(farm.clone()).await.unwrap();
        let s = schedule(farm.id, IrrigationStatus::Scheduled);
        store.insert_schedule(s.clone()).await.unwrap();

        let allowed = [IrrigationStatus::Pending, IrrigationStatus::Scheduled];
        let trigger = store.transition_schedule(
            s.id,
            None,
            &allowed,
            ScheduleChange::to(IrrigationStatus::InProgress),
        );
        let cancel = store.transition_schedule(
            s.id,
            None,
            &allowed,
            ScheduleChange::to(IrrigationStatus::Cancelled),
        );
        let (a, b) = tokio::join!(trigger, cancel);
        let applied = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|outcome| matches!(outcome, TransitionOutcome::Applied(_)))
            .count();
        assert_eq!(applied, 1);
    }
}
