// Copyright 2025 Cowboy AI, LLC.

//! Fertilization record lifecycle

use crate::entity::{FarmerId, FertilizationRecordId};
use crate::errors::{DomainError, DomainResult};
use crate::model::{
    ApplicationMethod, Channel, FertilizationRecord, FertilizationStatus,
    NewFertilizationRecord, NewNotification, NotificationType, Priority, RecordChange,
};
use crate::notification::NotificationDispatcher;
use crate::persistence::DomainStore;
use crate::recommendation::FertilizationRecommendation;
use crate::state_machine::StateTransitions;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default note on a skipped record
pub const DEFAULT_SKIP_NOTE: &str = "Skipped by farmer";

/// Longest accepted note
pub const MAX_NOTE_CHARS: usize = 500;

/// What the farmer reports when marking a record applied
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Quantity actually applied, kg
    pub actual_quantity_kg: f64,
    /// Money spent; zero when not reported
    pub actual_cost: Option<f64>,
    /// Method; broadcasting when not reported
    pub application_method: Option<ApplicationMethod>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl Application {
    /// Applied quantity with nothing else reported
    pub fn of(actual_quantity_kg: f64) -> Self {
        Self {
            actual_quantity_kg,
            actual_cost: None,
            application_method: None,
            notes: None,
        }
    }
}

fn validate_note(note: Option<&str>) -> DomainResult<()> {
    match note {
        Some(note) if note.chars().count() > MAX_NOTE_CHARS => Err(DomainError::ValidationError(
            format!("notes must be at most {MAX_NOTE_CHARS} characters"),
        )),
        _ => Ok(()),
    }
}

/// Creates and closes fertilization records
#[derive(Clone)]
pub struct FertilizationLifecycle {
    store: Arc<dyn DomainStore>,
    notifications: NotificationDispatcher,
}

impl FertilizationLifecycle {
    /// Create the service
    pub fn new(store: Arc<dyn DomainStore>, notifications: NotificationDispatcher) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Record a recommended application for a crop the farmer owns
    pub async fn create_record(
        &self,
        farmer_id: FarmerId,
        input: NewFertilizationRecord,
    ) -> DomainResult<FertilizationRecord> {
        if !(input.quantity_kg.is_finite() && input.quantity_kg > 0.0) {
            return Err(DomainError::ValidationError(format!(
                "quantity must be greater than 0, got {}",
                input.quantity_kg
            )));
        }
        if !(input.cost_estimate.is_finite() && input.cost_estimate >= 0.0) {
            return Err(DomainError::ValidationError(
                "cost estimate must not be negative".to_string(),
            ));
        }

        self.store
            .find_crop(input.crop_id, Some(farmer_id))
            .await?
            .ok_or_else(|| DomainError::not_found("Crop", input.crop_id))?;

        let record = FertilizationRecord {
            id: FertilizationRecordId::new(),
            crop_id: input.crop_id,
            recommended_date: input.recommended_date,
            fertilizer_type: input.fertilizer_type,
            quantity_kg: input.quantity_kg,
            npk_ratio: input.npk_ratio,
            cost_estimate: input.cost_estimate,
            status: FertilizationStatus::Recommended,
            applied_at: None,
            actual_quantity_kg: None,
            actual_cost: None,
            application_method: None,
            notes: None,
            created_at: Utc::now(),
        };

        self.store.insert_record(record.clone()).await?;
        info!(record_id = %record.id, crop_id = %record.crop_id, fertilizer = %record.fertilizer_type, "Fertilization record created");
        Ok(record)
    }

    /// Persist a recommendation as a record
    pub async fn record_from_recommendation(
        &self,
        farmer_id: FarmerId,
        recommendation: &FertilizationRecommendation,
        recommended_date: DateTime<Utc>,
    ) -> DomainResult<FertilizationRecord> {
        let input = NewFertilizationRecord {
            crop_id: recommendation.crop_id,
            fertilizer_type: recommendation.fertilizer_type.clone(),
            quantity_kg: recommendation.quantity_kg,
            npk_ratio: recommendation.npk_ratio.clone(),
            recommended_date,
            cost_estimate: recommendation.estimated_cost,
        };
        self.create_record(farmer_id, input).await
    }

    /// Commit to an application date
    pub async fn schedule(
        &self,
        farmer_id: FarmerId,
        record_id: FertilizationRecordId,
        date: DateTime<Utc>,
    ) -> DomainResult<FertilizationRecord> {
        let mut change = RecordChange::to(FertilizationStatus::Scheduled);
        change.recommended_date = Some(date);
        self.transition(record_id, farmer_id, change).await
    }

    /// Mark a record applied and notify the farmer
    pub async fn apply(
        &self,
        farmer_id: FarmerId,
        record_id: FertilizationRecordId,
        application: Application,
    ) -> DomainResult<FertilizationRecord> {
        if !(application.actual_quantity_kg.is_finite() && application.actual_quantity_kg >= 0.0) {
            return Err(DomainError::ValidationError(
                "actual quantity must not be negative".to_string(),
            ));
        }
        if application
            .actual_cost
            .is_some_and(|cost| !(cost.is_finite() && cost >= 0.0))
        {
            return Err(DomainError::ValidationError(
                "actual cost must not be negative".to_string(),
            ));
        }
        validate_note(application.notes.as_deref())?;

        let mut change = RecordChange::to(FertilizationStatus::Applied);
        change.applied_at = Some(Utc::now());
        change.actual_quantity_kg = Some(application.actual_quantity_kg);
        change.actual_cost = Some(application.actual_cost.unwrap_or(0.0));
        change.application_method = Some(application.application_method.unwrap_or_default());
        change.notes = application.notes;
        let record = self.transition(record_id, farmer_id, change).await?;

        self.notify_applied(&record).await;
        Ok(record)
    }

    /// Skip a record, with the farmer's reason or the default note
    pub async fn skip(
        &self,
        farmer_id: FarmerId,
        record_id: FertilizationRecordId,
        reason: Option<String>,
    ) -> DomainResult<FertilizationRecord> {
        validate_note(reason.as_deref())?;
        let mut change = RecordChange::to(FertilizationStatus::Skipped);
        change.notes = Some(reason.unwrap_or_else(|| DEFAULT_SKIP_NOTE.to_string()));
        self.transition(record_id, farmer_id, change).await
    }

    async fn transition(
        &self,
        record_id: FertilizationRecordId,
        farmer_id: FarmerId,
        change: RecordChange,
    ) -> DomainResult<FertilizationRecord> {
        let target = change.to;
        let allowed = FertilizationStatus::sources_for(&target);
        let record = self
            .store
            .transition_record(record_id, Some(farmer_id), &allowed, change)
            .await?
            .into_result("FertilizationRecord", record_id, target)?;
        info!(%record_id, status = ?record.status, "Fertilization record transitioned");
        Ok(record)
    }

    async fn notify_applied(&self, record: &FertilizationRecord) {
        let crop = match self.store.find_crop(record.crop_id, None).await {
            Ok(Some(crop)) => crop,
            Ok(None) => {
                warn!(record_id = %record.id, "Crop missing, application not notified");
                return;
            }
            Err(e) => {
                error!(record_id = %record.id, error = %e, "Crop lookup failed, application not notified");
                return;
            }
        };
        let farm = match self.store.find_farm(crop.farm_id, None).await {
            Ok(Some(farm)) => farm,
            Ok(None) => {
                warn!(record_id = %record.id, "Farm missing, application not notified");
                return;
            }
            Err(e) => {
                error!(record_id = %record.id, error = %e, "Farm lookup failed, application not notified");
                return;
            }
        };

        let quantity = record.actual_quantity_kg.unwrap_or(record.quantity_kg);
        let params = NewNotification::new(
            farm.farmer_id,
            NotificationType::Fertilization,
            "Fertilization Applied",
            format!(
                "{} applied to {} ({}kg)",
                record.fertilizer_type, crop.crop_type, quantity
            ),
        )
        .with_priority(Priority::Low)
        .with_channels([Channel::InApp])
        .for_farm(farm.id)
        .for_crop(crop.id);

        if let Err(e) = self.notifications.create_notification(params).await {
            error!(record_id = %record.id, error = %e, "Application notification not stored");
        }
    }
}
