// Copyright 2025 Cowboy AI, LLC.

//! Irrigation schedule lifecycle

use crate::command_channel::{command_topic, DeviceCommandChannel, IrrigationCommand};
use crate::entity::{CropId, DeviceId, FarmId, FarmerId, ScheduleId};
use crate::errors::{DomainError, DomainResult};
use crate::external::with_timeout;
use crate::model::{
    Channel, IrrigationSchedule, IrrigationStatus, NewIrrigationSchedule, NewNotification,
    NotificationType, Priority, ScheduleChange, TriggerSource,
};
use crate::notification::NotificationDispatcher;
use crate::persistence::DomainStore;
use crate::recommendation::IrrigationRecommendation;
use crate::state_machine::StateTransitions;
use crate::weather::{CurrentConditions, WeatherProvider};
use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Accepted run lengths in minutes
pub const DURATION_RANGE: RangeInclusive<u32> = 1..=480;

/// Result reported by an irrigation controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Water ran for the full duration
    Completed,
    /// The run did not finish
    Failed,
}

impl RunOutcome {
    fn status(&self) -> IrrigationStatus {
        match self {
            RunOutcome::Completed => IrrigationStatus::Completed,
            RunOutcome::Failed => IrrigationStatus::Failed,
        }
    }
}

/// Creates, triggers, and closes irrigation schedules
#[derive(Clone)]
pub struct IrrigationLifecycle {
    store: Arc<dyn DomainStore>,
    weather: Arc<dyn WeatherProvider>,
    commands: Arc<dyn DeviceCommandChannel>,
    notifications: NotificationDispatcher,
    weather_timeout: Duration,
}

impl IrrigationLifecycle {
    /// Create the service
    pub fn new(
        store: Arc<dyn DomainStore>,
        weather: Arc<dyn WeatherProvider>,
        commands: Arc<dyn DeviceCommandChannel>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            weather,
            commands,
            notifications,
            weather_timeout: Duration::from_secs(5),
        }
    }

    /// Deadline for the current-conditions call
    pub fn with_weather_timeout(mut self, timeout: Duration) -> Self {
        self.weather_timeout = timeout;
        self
    }

    /// Create a schedule on a farm the farmer owns
    ///
    /// Starts as `scheduled`, or `pending` when unconfirmed. Crop and
    /// device must belong to the same farm.
    pub async fn create_schedule(
        &self,
        farmer_id: FarmerId,
        input: NewIrrigationSchedule,
    ) -> DomainResult<IrrigationSchedule> {
        if !DURATION_RANGE.contains(&input.duration_minutes) {
            return Err(DomainError::ValidationError(format!(
                "duration must be between {} and {} minutes, got {}",
                DURATION_RANGE.start(),
                DURATION_RANGE.end(),
                input.duration_minutes
            )));
        }

        let farm = self
            .store
            .find_farm(input.farm_id, Some(farmer_id))
            .await?
            .ok_or_else(|| DomainError::not_found("Farm", input.farm_id))?;

        if let Some(crop_id) = input.crop_id {
            let crop = self.store.find_crop(crop_id, Some(farmer_id)).await?;
            if crop.map_or(true, |crop| crop.farm_id != farm.id) {
                return Err(DomainError::not_found("Crop", crop_id));
            }
        }
        if let Some(device_id) = input.device_id {
            self.device_on_farm(device_id, farm.id).await?;
        }

        let weather_condition = self.current_conditions(farm.latitude, farm.longitude).await;
        let schedule = IrrigationSchedule {
            id: ScheduleId::new(),
            farm_id: farm.id,
            crop_id: input.crop_id,
            device_id: input.device_id,
            scheduled_time: input.scheduled_time,
            duration_minutes: input.duration_minutes,
            status: if input.confirmed {
                IrrigationStatus::Scheduled
            } else {
                IrrigationStatus::Pending
            },
            triggered_by: input.triggered_by,
            executed_at: None,
            completed_at: None,
            actual_volume_liters: None,
            weather_condition,
            created_at: Utc::now(),
        };

        self.store.insert_schedule(schedule.clone()).await?;
        info!(
            schedule_id = %schedule.id,
            farm_id = %schedule.farm_id,
            status = ?schedule.status,
            triggered_by = ?schedule.triggered_by,
            "Irrigation schedule created"
        );
        Ok(schedule)
    }

    /// Turn a recommendation into a confirmed, auto-triggered schedule
    pub async fn schedule_from_recommendation(
        &self,
        farmer_id: FarmerId,
        farm_id: FarmId,
        recommendation: &IrrigationRecommendation,
        scheduled_time: DateTime<Utc>,
        device_id: Option<DeviceId>,
    ) -> DomainResult<IrrigationSchedule> {
        let mut input =
            NewIrrigationSchedule::new(farm_id, scheduled_time, recommendation.recommended_duration)
                .for_crop(recommendation.crop_id)
                .triggered_by(TriggerSource::Auto);
        input.device_id = device_id;
        self.create_schedule(farmer_id, input).await
    }

    /// Confirm a pending schedule
    pub async fn confirm(
        &self,
        farmer_id: FarmerId,
        schedule_id: ScheduleId,
    ) -> DomainResult<IrrigationSchedule> {
        self.transition(
            schedule_id,
            Some(farmer_id),
            ScheduleChange::to(IrrigationStatus::Scheduled),
        )
        .await
    }

    /// Start a pending or scheduled run and command its controller
    ///
    /// `owner` is `None` for system-initiated triggers. The device command
    /// is fire-and-forget; a publish failure is logged and the schedule
    /// stays in progress.
    pub async fn trigger(
        &self,
        owner: Option<FarmerId>,
        schedule_id: ScheduleId,
    ) -> DomainResult<IrrigationSchedule> {
        let mut change = ScheduleChange::to(IrrigationStatus::InProgress);
        change.executed_at = Some(Utc::now());
        let schedule = self.transition(schedule_id, owner, change).await?;

        if let Some(device_id) = schedule.device_id {
            self.send_start_command(&schedule, device_id).await;
        }
        Ok(schedule)
    }

    /// Create a schedule for now and start it immediately
    pub async fn trigger_now(
        &self,
        farmer_id: FarmerId,
        farm_id: FarmId,
        duration_minutes: u32,
        crop_id: Option<CropId>,
        device_id: Option<DeviceId>,
    ) -> DomainResult<IrrigationSchedule> {
        let mut input = NewIrrigationSchedule::new(farm_id, Utc::now(), duration_minutes);
        input.crop_id = crop_id;
        input.device_id = device_id;
        let schedule = self.create_schedule(farmer_id, input).await?;
        self.trigger(Some(farmer_id), schedule.id).await
    }

    /// Record the controller's status callback and notify the farmer
    pub async fn report_outcome(
        &self,
        schedule_id: ScheduleId,
        outcome: RunOutcome,
        actual_volume_liters: Option<f64>,
    ) -> DomainResult<IrrigationSchedule> {
        let mut change = ScheduleChange::to(outcome.status());
        change.completed_at = Some(Utc::now());
        change.actual_volume_liters = actual_volume_liters;
        let schedule = self.transition(schedule_id, None, change).await?;

        self.notify_outcome(&schedule, outcome).await;
        Ok(schedule)
    }

    /// Cancel a run that has not started
    pub async fn cancel(
        &self,
        farmer_id: FarmerId,
        schedule_id: ScheduleId,
    ) -> DomainResult<IrrigationSchedule> {
        self.transition(
            schedule_id,
            Some(farmer_id),
            ScheduleChange::to(IrrigationStatus::Cancelled),
        )
        .await
    }

    /// Schedule by id, scoped to the farmer
    pub async fn get_schedule(
        &self,
        farmer_id: FarmerId,
        schedule_id: ScheduleId,
    ) -> DomainResult<IrrigationSchedule> {
        self.store
            .find_schedule(schedule_id, Some(farmer_id))
            .await?
            .ok_or_else(|| DomainError::not_found("IrrigationSchedule", schedule_id))
    }

    async fn transition(
        &self,
        schedule_id: ScheduleId,
        owner: Option<FarmerId>,
        change: ScheduleChange,
    ) -> DomainResult<IrrigationSchedule> {
        let target = change.to;
        let allowed = IrrigationStatus::sources_for(&target);
        let schedule = self
            .store
            .transition_schedule(schedule_id, owner, &allowed, change)
            .await?
            .into_result("IrrigationSchedule", schedule_id, target)?;
        info!(%schedule_id, status = ?schedule.status, "Irrigation schedule transitioned");
        Ok(schedule)
    }

    async fn device_on_farm(&self, device_id: DeviceId, farm_id: FarmId) -> DomainResult<()> {
        match self.store.find_device(device_id).await? {
            Some(device) if device.farm_id == farm_id => Ok(()),
            _ => Err(DomainError::not_found("IoTDevice", device_id)),
        }
    }

    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Option<CurrentConditions> {
        let result = with_timeout(
            "weather",
            self.weather_timeout,
            self.weather.current_conditions(latitude, longitude),
        )
        .await;
        match result {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(error = %e, "Current weather unavailable, schedule stored without snapshot");
                None
            }
        }
    }

    async fn send_start_command(&self, schedule: &IrrigationSchedule, device_id: DeviceId) {
        let device = match self.store.find_device(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                warn!(schedule_id = %schedule.id, %device_id, "Controller not found, no command sent");
                return;
            }
            Err(e) => {
                error!(schedule_id = %schedule.id, error = %e, "Controller lookup failed, no command sent");
                return;
            }
        };

        let topic = command_topic(&device.serial);
        let command = IrrigationCommand::start(schedule.id, schedule.duration_minutes);
        match self.commands.publish(&topic, &command).await {
            Ok(()) => info!(schedule_id = %schedule.id, %topic, "Start command sent"),
            Err(e) => warn!(schedule_id = %schedule.id, %topic, error = %e, "Start command not delivered"),
        }
    }

    async fn notify_outcome(&self, schedule: &IrrigationSchedule, outcome: RunOutcome) {
        let farm = match self.store.find_farm(schedule.farm_id, None).await {
            Ok(Some(farm)) => farm,
            Ok(None) => {
                warn!(schedule_id = %schedule.id, "Farm missing, outcome not notified");
                return;
            }
            Err(e) => {
                error!(schedule_id = %schedule.id, error = %e, "Farm lookup failed, outcome not notified");
                return;
            }
        };

        let (title, message, priority) = match outcome {
            RunOutcome::Completed => (
                "Irrigation Completed",
                format!("Irrigation completed for {} minutes", schedule.duration_minutes),
                Priority::Low,
            ),
            RunOutcome::Failed => (
                "Irrigation Failed",
                "Irrigation failed. Please check your equipment.".to_string(),
                Priority::High,
            ),
        };

        let mut params =
            NewNotification::new(farm.farmer_id, NotificationType::Irrigation, title, message)
                .with_priority(priority)
                .with_channels([Channel::InApp])
                .for_farm(farm.id)
                .with_metadata(serde_json::json!({ "scheduleId": schedule.id }));
        params.crop_id = schedule.crop_id;

        if let Err(e) = self.notifications.create_notification(params).await {
            error!(schedule_id = %schedule.id, error = %e, "Outcome notification not stored");
        }
    }
}
