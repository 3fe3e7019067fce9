// Copyright 2025 Cowboy AI, LLC.

//! Irrigation and fertilization history with summary statistics

use crate::entity::{CropId, FarmId, FarmerId};
use crate::errors::DomainResult;
use crate::model::{
    FertilizationRecord, FertilizationStatus, IrrigationSchedule, IrrigationStatus,
};
use crate::persistence::{DomainStore, RecordFilter, ScheduleFilter};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Default irrigation look-back in days
pub const IRRIGATION_HISTORY_DAYS: u32 = 30;

/// Default fertilization look-back in days
pub const FERTILIZATION_HISTORY_DAYS: u32 = 90;

/// Totals over completed irrigation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationStatistics {
    /// Completed runs in the window
    pub total_sessions: usize,
    /// Sum of run lengths
    pub total_duration_minutes: u64,
    /// Sum of reported volumes; runs without a volume count as zero
    pub total_volume_liters: f64,
    /// Rounded mean run length, 0 when empty
    pub average_duration_minutes: u64,
    /// Window length
    pub period_days: u32,
}

impl IrrigationStatistics {
    /// Summarise completed runs
    pub fn summarise(schedules: &[IrrigationSchedule], period_days: u32) -> Self {
        let total_sessions = schedules.len();
        let total_duration_minutes: u64 = schedules
            .iter()
            .map(|schedule| u64::from(schedule.duration_minutes))
            .sum();
        let total_volume_liters = schedules
            .iter()
            .filter_map(|schedule| schedule.actual_volume_liters)
            .sum();
        let average_duration_minutes = if total_sessions == 0 {
            0
        } else {
            (total_duration_minutes as f64 / total_sessions as f64).round() as u64
        };

        Self {
            total_sessions,
            total_duration_minutes,
            total_volume_liters,
            average_duration_minutes,
            period_days,
        }
    }
}

/// Completed runs and their totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationHistory {
    /// Completed runs, most recent completion first
    pub schedules: Vec<IrrigationSchedule>,
    /// Totals
    pub statistics: IrrigationStatistics,
}

/// Totals over fertilization records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizationStatistics {
    /// Records in the window
    pub total_records: usize,
    /// Applied records
    pub applied: usize,
    /// Recommended or scheduled records
    pub pending: usize,
    /// Rounded actual quantity over applied records
    pub total_quantity_kg: f64,
    /// Rounded actual cost over applied records
    pub total_cost: f64,
    /// Window length
    pub period_days: u32,
}

impl FertilizationStatistics {
    /// Summarise records
    pub fn summarise(records: &[FertilizationRecord], period_days: u32) -> Self {
        let applied: Vec<&FertilizationRecord> = records
            .iter()
            .filter(|record| record.status == FertilizationStatus::Applied)
            .collect();
        let pending = records
            .iter()
            .filter(|record| {
                matches!(
                    record.status,
                    FertilizationStatus::Recommended | FertilizationStatus::Scheduled
                )
            })
            .count();

        Self {
            total_records: records.len(),
            applied: applied.len(),
            pending,
            total_quantity_kg: applied
                .iter()
                .filter_map(|record| record.actual_quantity_kg)
                .sum::<f64>()
                .round(),
            total_cost: applied
                .iter()
                .filter_map(|record| record.actual_cost)
                .sum::<f64>()
                .round(),
            period_days,
        }
    }
}

/// Records and their totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizationHistory {
    /// Records, latest recommended date first
    pub records: Vec<FertilizationRecord>,
    /// Totals
    pub statistics: FertilizationStatistics,
}

/// Optional narrowing for fertilization history
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryFilter {
    /// Only this farm
    pub farm_id: Option<FarmId>,
    /// Only this crop
    pub crop_id: Option<CropId>,
    /// Only this status
    pub status: Option<FertilizationStatus>,
}

/// Completed irrigation runs for a farmer within the last `days` (default 30)
pub async fn irrigation_history(
    store: &dyn DomainStore,
    farmer_id: FarmerId,
    farm_id: Option<FarmId>,
    days: Option<u32>,
) -> DomainResult<IrrigationHistory> {
    let period_days = days.unwrap_or(IRRIGATION_HISTORY_DAYS);
    let filter = ScheduleFilter {
        owner: Some(farmer_id),
        farm_id,
        status: Some(IrrigationStatus::Completed),
        completed_since: Some(Utc::now() - Duration::days(i64::from(period_days))),
        ..ScheduleFilter::default()
    };

    let mut schedules = store.list_schedules(&filter).await?;
    schedules.sort_by_key(|schedule| Reverse(schedule.completed_at));
    let statistics = IrrigationStatistics::summarise(&schedules, period_days);
    Ok(IrrigationHistory {
        schedules,
        statistics,
    })
}

/// Fertilization records created within the last `days` (default 90)
pub async fn fertilization_history(
    store: &dyn DomainStore,
    farmer_id: FarmerId,
    filter: HistoryFilter,
    days: Option<u32>,
) -> DomainResult<FertilizationHistory> {
    let period_days = days.unwrap_or(FERTILIZATION_HISTORY_DAYS);
    let record_filter = RecordFilter {
        owner: Some(farmer_id),
        farm_id: filter.farm_id,
        crop_id: filter.crop_id,
        status: filter.status,
        created_since: Some(Utc::now() - Duration::days(i64::from(period_days))),
    };

    let mut records = store.list_records(&record_filter).await?;
    records.sort_by_key(|record| Reverse(record.recommended_date));
    let statistics = FertilizationStatistics::summarise(&records, period_days);
    Ok(FertilizationHistory {
        records,
        statistics,
    })
}
