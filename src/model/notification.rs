// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{CropId, FarmId, FarmerId, NotificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Irrigation run outcomes
    Irrigation,
    /// Fertilizer applications
    Fertilization,
    /// Crop health alerts
    HealthAlert,
    /// Weather warnings
    Weather,
    /// Device status
    Device,
    /// Platform announcements
    System,
}

/// Priority of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational
    Low,
    /// Default
    #[default]
    Medium,
    /// Needs attention
    High,
    /// Needs immediate attention
    Critical,
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The stored notification record itself
    InApp,
    /// Text message to the farmer's phone
    Sms,
    /// Email to the farmer's address on file
    Email,
}

impl Channel {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::InApp => "in_app",
            Channel::Sms => "sms",
            Channel::Email => "email",
        }
    }
}

/// A farmer-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID
    pub id: NotificationId,
    /// Recipient
    pub farmer_id: FarmerId,
    /// Related farm
    pub farm_id: Option<FarmId>,
    /// Related crop
    pub crop_id: Option<CropId>,
    /// Category
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Priority
    pub priority: Priority,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Requested channels
    pub channels: Vec<Channel>,
    /// Channels with confirmed delivery; always contains `InApp`
    pub sent_via: Vec<Channel>,
    /// Set once when the farmer reads the notification
    pub read_at: Option<DateTime<Utc>>,
    /// Deep link for the client
    pub action_url: Option<String>,
    /// Free-form context
    pub metadata: Option<serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the farmer has read this notification
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Whether a channel was requested
    pub fn requested(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

/// Parameters for creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Recipient
    pub farmer_id: FarmerId,
    /// Related farm
    pub farm_id: Option<FarmId>,
    /// Related crop
    pub crop_id: Option<CropId>,
    /// Category
    pub notification_type: NotificationType,
    /// Priority
    pub priority: Priority,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Requested channels
    pub channels: Vec<Channel>,
    /// Deep link for the client
    pub action_url: Option<String>,
    /// Free-form context
    pub metadata: Option<serde_json::Value>,
}

impl NewNotification {
    /// In-app notification at medium priority
    pub fn new(
        farmer_id: FarmerId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            farmer_id,
            farm_id: None,
            crop_id: None,
            notification_type,
            priority: Priority::default(),
            title: title.into(),
            message: message.into(),
            channels: vec![Channel::InApp],
            action_url: None,
            metadata: None,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Request delivery channels
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        let mut requested: Vec<Channel> = Vec::new();
        for channel in channels {
            if !requested.contains(&channel) {
                requested.push(channel);
            }
        }
        self.channels = requested;
        self
    }

    /// Relate to a farm
    pub fn for_farm(mut self, farm_id: FarmId) -> Self {
        self.farm_id = Some(farm_id);
        self
    }

    /// Relate to a crop
    pub fn for_crop(mut self, crop_id: CropId) -> Self {
        self.crop_id = Some(crop_id);
        self
    }

    /// Attach a deep link
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Attach free-form context
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether a channel was requested
    pub fn requested(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}
