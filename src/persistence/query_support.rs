// Copyright 2025 Cowboy AI, LLC.

//! Query support for persistence layer

use crate::entity::{CropId, FarmId, FarmerId};
use crate::model::{FertilizationStatus, IrrigationStatus, Notification, NotificationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for notification listings
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filter and paging for a farmer's notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    /// Recipient
    pub farmer_id: FarmerId,
    /// Only notifications without `read_at`
    pub unread_only: bool,
    /// Only notifications of this type
    pub notification_type: Option<NotificationType>,
    /// Maximum number of items
    pub limit: usize,
    /// Number of items to skip
    pub offset: usize,
}

impl NotificationQuery {
    /// First page of everything for a farmer
    pub fn for_farmer(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id,
            unread_only: false,
            notification_type: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }

    /// Restrict to unread notifications
    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Restrict to one type
    pub fn of_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    /// Set the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether a notification passes the filter, ignoring paging
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.farmer_id == self.farmer_id
            && (!self.unread_only || !notification.is_read())
            && self
                .notification_type
                .map_or(true, |kind| notification.notification_type == kind)
    }
}

/// A page of notifications with counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    /// Notifications in the page, newest first
    pub items: Vec<Notification>,
    /// Number of notifications matching the filter, before paging
    pub total: usize,
    /// All unread notifications of the farmer, regardless of filter
    pub unread_count: usize,
}

impl NotificationPage {
    /// Whether more matching notifications follow this page
    pub fn has_more(&self, offset: usize) -> bool {
        offset + self.items.len() < self.total
    }
}

/// Filter for irrigation schedule listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFilter {
    /// Only schedules on farms owned by this farmer
    pub owner: Option<FarmerId>,
    /// Only schedules on this farm
    pub farm_id: Option<FarmId>,
    /// Only schedules for this crop
    pub crop_id: Option<CropId>,
    /// Only schedules in this status
    pub status: Option<IrrigationStatus>,
    /// Only schedules completed at or after this time
    pub completed_since: Option<DateTime<Utc>>,
}

impl ScheduleFilter {
    /// Whether a schedule passes the non-ownership parts of the filter
    pub fn matches(&self, schedule: &crate::model::IrrigationSchedule) -> bool {
        self.farm_id.map_or(true, |id| schedule.farm_id == id)
            && self.crop_id.map_or(true, |id| schedule.crop_id == Some(id))
            && self.status.map_or(true, |status| schedule.status == status)
            && self.completed_since.map_or(true, |since| {
                schedule.completed_at.is_some_and(|at| at >= since)
            })
    }
}

/// Filter for fertilization record listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Only records for crops on farms owned by this farmer
    pub owner: Option<FarmerId>,
    /// Only records for crops on this farm
    pub farm_id: Option<FarmId>,
    /// Only records for this crop
    pub crop_id: Option<CropId>,
    /// Only records in this status
    pub status: Option<FertilizationStatus>,
    /// Only records created at or after this time
    pub created_since: Option<DateTime<Utc>>,
}

impl RecordFilter {
    /// Whether a record passes the non-ownership parts of the filter
    ///
    /// `farm_id` needs the crop's farm and is resolved by the store.
    pub fn matches(&self, record: &crate::model::FertilizationRecord) -> bool {
        self.crop_id.map_or(true, |id| record.crop_id == id)
            && self.status.map_or(true, |status| record.status == status)
            && self
                .created_since
                .map_or(true, |since| record.created_at >= since)
    }
}
