// Copyright 2025 Cowboy AI, LLC.

//! # Notification Dispatcher
//!
//! Records farmer-facing notifications and fans them out to SMS and email.
//!
//! Every notification is persisted exactly once. The stored record itself
//! is the in-app delivery, so `sent_via` always contains `in_app`; SMS and
//! email are appended only when the provider confirms the hand-off. A
//! failed, erroring, or timed-out provider never fails the operation.

pub mod messaging;
pub mod metrics;

pub use messaging::{EmailSender, NatsMessaging, SandboxMessaging, SmsSender};
pub use metrics::{DeliveryMetrics, DeliveryOutcome, DeliveryTimer};

use crate::entity::{FarmId, FarmerId, NotificationId};
use crate::errors::DomainResult;
use crate::external::with_timeout;
use crate::model::{
    Channel, Farmer, NewNotification, Notification, NotificationType, Priority,
};
use crate::persistence::query_support::DEFAULT_PAGE_SIZE;
use crate::persistence::{DomainStore, NotificationPage, NotificationQuery};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest message excerpt included in an SMS
pub const SMS_EXCERPT_CHARS: usize = 140;

/// Default retention for read notifications
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Listing options for [`NotificationDispatcher::get_notifications`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Only unread notifications
    pub unread_only: bool,
    /// Only notifications of this type
    pub notification_type: Option<NotificationType>,
    /// Page size; the dispatcher default when absent
    pub limit: Option<usize>,
    /// Items to skip
    pub offset: Option<usize>,
}

/// SMS body for a notification
pub fn sms_text(title: &str, message: &str) -> String {
    let excerpt: String = message.chars().take(SMS_EXCERPT_CHARS).collect();
    format!("[Smart Agri] {title}: {excerpt}")
}

/// Creates, delivers, and tracks notifications
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn DomainStore>,
    sms: Arc<dyn SmsSender>,
    email: Arc<dyn EmailSender>,
    metrics: DeliveryMetrics,
    delivery_timeout: Duration,
    retention_days: u32,
    page_size: usize,
}

impl NotificationDispatcher {
    /// Dispatcher with default timeout, retention, and page size
    pub fn new(
        store: Arc<dyn DomainStore>,
        sms: Arc<dyn SmsSender>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            store,
            sms,
            email,
            metrics: DeliveryMetrics::new(),
            delivery_timeout: Duration::from_secs(10),
            retention_days: DEFAULT_RETENTION_DAYS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Dispatcher that logs instead of sending
    pub fn sandboxed(store: Arc<dyn DomainStore>) -> Self {
        let sandbox = Arc::new(SandboxMessaging);
        Self::new(store, sandbox.clone(), sandbox)
    }

    /// Deadline for each provider call
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Age after which read notifications are removed by cleanup
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Page size when a listing does not set one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Delivery counters
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Persist a notification and attempt the requested channels
    ///
    /// Only a store failure on insert is returned as an error.
    pub async fn create_notification(&self, params: NewNotification) -> DomainResult<Notification> {
        let mut sent_via = vec![Channel::InApp];

        let wants_sms = params.requested(Channel::Sms);
        let wants_email = params.requested(Channel::Email);
        let farmer = if wants_sms || wants_email {
            self.recipient(params.farmer_id).await
        } else {
            None
        };

        if wants_sms && self.deliver_sms(farmer.as_ref(), &params).await {
            sent_via.push(Channel::Sms);
        }
        if wants_email && self.deliver_email(farmer.as_ref(), &params).await {
            sent_via.push(Channel::Email);
        }

        let notification = Notification {
            id: NotificationId::new(),
            farmer_id: params.farmer_id,
            farm_id: params.farm_id,
            crop_id: params.crop_id,
            notification_type: params.notification_type,
            priority: params.priority,
            title: params.title,
            message: params.message,
            channels: params.channels,
            sent_via,
            read_at: None,
            action_url: params.action_url,
            metadata: params.metadata,
            created_at: Utc::now(),
        };

        self.store.insert_notification(notification.clone()).await?;
        self.metrics
            .record(Channel::InApp, DeliveryOutcome::Success)
            .await;

        info!(
            notification_id = %notification.id,
            farmer_id = %notification.farmer_id,
            kind = ?notification.notification_type,
            sent_via = ?notification.sent_via,
            "Notification created"
        );
        Ok(notification)
    }

    /// Critical-priority notification on every channel
    pub async fn create_critical_alert(
        &self,
        farmer_id: FarmerId,
        farm_id: Option<FarmId>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> DomainResult<Notification> {
        let mut params = NewNotification::new(farmer_id, notification_type, title, message)
            .with_priority(Priority::Critical)
            .with_channels([Channel::InApp, Channel::Sms, Channel::Email]);
        params.farm_id = farm_id;
        params.metadata = metadata;
        self.create_notification(params).await
    }

    /// A page of a farmer's notifications, newest first
    ///
    /// `unread_count` covers all of the farmer's unread notifications,
    /// whatever the filter.
    pub async fn get_notifications(
        &self,
        farmer_id: FarmerId,
        options: ListOptions,
    ) -> DomainResult<NotificationPage> {
        let query = NotificationQuery {
            farmer_id,
            unread_only: options.unread_only,
            notification_type: options.notification_type,
            limit: options.limit.unwrap_or(self.page_size),
            offset: options.offset.unwrap_or(0),
        };
        self.store.query_notifications(&query).await
    }

    /// Mark one notification read; `false` if the farmer has no such notification
    pub async fn mark_as_read(
        &self,
        notification_id: NotificationId,
        farmer_id: FarmerId,
    ) -> DomainResult<bool> {
        let found = self
            .store
            .mark_read(notification_id, farmer_id, Utc::now())
            .await?;
        debug!(%notification_id, %farmer_id, found, "Mark as read");
        Ok(found)
    }

    /// Mark every unread notification of a farmer read
    pub async fn mark_all_as_read(&self, farmer_id: FarmerId) -> DomainResult<usize> {
        let count = self.store.mark_all_read(farmer_id, Utc::now()).await?;
        debug!(%farmer_id, count, "Marked all as read");
        Ok(count)
    }

    /// Delete read notifications older than `days_old` (retention default when absent)
    ///
    /// Unread notifications are kept regardless of age.
    pub async fn cleanup_old_notifications(&self, days_old: Option<u32>) -> DomainResult<usize> {
        let days = days_old.unwrap_or(self.retention_days);
        let cutoff = Utc::now() - ChronoDuration::days(i64::from(days));
        let deleted = self.store.delete_read_before(cutoff).await?;
        info!(days, deleted, "Cleaned up old notifications");
        Ok(deleted)
    }

    /// One in-app system notification per farmer; returns how many were created
    pub async fn create_system_notification(
        &self,
        title: &str,
        message: &str,
    ) -> DomainResult<usize> {
        let farmer_ids = self.store.list_farmer_ids().await?;
        let mut sent = 0;
        for farmer_id in farmer_ids {
            let params = NewNotification::new(farmer_id, NotificationType::System, title, message);
            match self.create_notification(params).await {
                Ok(_) => sent += 1,
                Err(e) => error!(%farmer_id, error = %e, "System notification failed"),
            }
        }
        info!(sent, "System notification sent");
        Ok(sent)
    }

    async fn recipient(&self, farmer_id: FarmerId) -> Option<Farmer> {
        match self.store.find_farmer(farmer_id).await {
            Ok(Some(farmer)) => Some(farmer),
            Ok(None) => {
                warn!(%farmer_id, "Recipient not found, skipping external channels");
                None
            }
            Err(e) => {
                warn!(%farmer_id, error = %e, "Recipient lookup failed, skipping external channels");
                None
            }
        }
    }

    async fn deliver_sms(&self, farmer: Option<&Farmer>, params: &NewNotification) -> bool {
        let Some(farmer) = farmer.filter(|farmer| !farmer.phone.is_empty()) else {
            self.metrics.record(Channel::Sms, DeliveryOutcome::Skipped).await;
            return false;
        };

        let text = sms_text(&params.title, &params.message);
        let timer = DeliveryTimer::start(&self.metrics, Channel::Sms);
        let result = with_timeout(
            "sms",
            self.delivery_timeout,
            self.sms.send_sms(&farmer.phone, &text),
        )
        .await;

        match result {
            Ok(()) => {
                timer.finish(DeliveryOutcome::Success).await;
                true
            }
            Err(e) => {
                warn!(farmer_id = %farmer.id, error = %e, "SMS delivery failed");
                timer.finish(DeliveryOutcome::Failure).await;
                false
            }
        }
    }

    async fn deliver_email(&self, farmer: Option<&Farmer>, params: &NewNotification) -> bool {
        let Some(address) = farmer.and_then(|farmer| farmer.email.as_deref()) else {
            self.metrics
                .record(Channel::Email, DeliveryOutcome::Skipped)
                .await;
            return false;
        };

        let timer = DeliveryTimer::start(&self.metrics, Channel::Email);
        let result = with_timeout(
            "email",
            self.delivery_timeout,
            self.email
                .send_email(address, &params.title, &params.message),
        )
        .await;

        match result {
            Ok(()) => {
                timer.finish(DeliveryOutcome::Success).await;
                true
            }
            Err(e) => {
                warn!(address, error = %e, "Email delivery failed");
                timer.finish(DeliveryOutcome::Failure).await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::messaging::{MockEmailSender, MockSmsSender};
    use super::*;
    use crate::errors::DomainError;
    use crate::persistence::{FarmerStore, InMemoryStore};
    use pretty_assertions::assert_eq;

    async fn farmer(store: &InMemoryStore, email: Option<&str>) -> Farmer {
        let farmer = Farmer {
            id: FarmerId::new(),
            name: "Asha".into(),
            phone: "+919800000000".into(),
            email: email.map(String::from),
        };
        store.upsert_farmer(farmer.clone()).await.unwrap();
        farmer
    }

    #[test]
    fn sms_text_truncates_message() {
        let message = "x".repeat(200);
        let text = sms_text("Low moisture", &message);
        assert_eq!(text, format!("[Smart Agri] Low moisture: {}", "x".repeat(140)));
    }

    #[tokio::test]
    async fn sms_failure_does_not_block_email() {
        let store = InMemoryStore::new();
        let farmer = farmer(&store, Some("asha@example.com")).await;

        let mut sms = MockSmsSender::new();
        sms.expect_send_sms()
            .times(1)
            .returning(|_, _| Err(DomainError::external("sms", "gateway down")));
        let mut email = MockEmailSender::new();
        email
            .expect_send_email()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dispatcher =
            NotificationDispatcher::new(Arc::new(store.clone()), Arc::new(sms), Arc::new(email));
        let params = NewNotification::new(farmer.id, NotificationType::Weather, "Storm", "Hail")
            .with_channels([Channel::InApp, Channel::Sms, Channel::Email]);
        let notification = dispatcher.create_notification(params).await.unwrap();

        assert_eq!(notification.sent_via, vec![Channel::InApp, Channel::Email]);
        assert_eq!(
            dispatcher
                .metrics()
                .get(Channel::Sms, DeliveryOutcome::Failure)
                .await,
            1
        );
        assert_eq!(store.notification_count().await, 1);
    }

    #[tokio::test]
    async fn email_skipped_without_address() {
        let store = InMemoryStore::new();
        let farmer = farmer(&store, None).await;

        let mut sms = MockSmsSender::new();
        sms.expect_send_sms().times(1).returning(|_, _| Ok(()));
        let mut email = MockEmailSender::new();
        email.expect_send_email().never();

        let dispatcher =
            NotificationDispatcher::new(Arc::new(store), Arc::new(sms), Arc::new(email));
        let notification = dispatcher
            .create_critical_alert(
                farmer.id,
                None,
                NotificationType::HealthAlert,
                "Crop stress",
                "NDVI dropped",
                None,
            )
            .await
            .unwrap();

        assert_eq!(notification.priority, Priority::Critical);
        assert_eq!(
            notification.channels,
            vec![Channel::InApp, Channel::Sms, Channel::Email]
        );
        assert_eq!(notification.sent_via, vec![Channel::InApp, Channel::Sms]);
        assert_eq!(
            dispatcher
                .metrics()
                .get(Channel::Email, DeliveryOutcome::Skipped)
                .await,
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        struct SlowSms;

        #[async_trait::async_trait]
        impl SmsSender for SlowSms {
            async fn send_sms(&self, _phone: &str, _text: &str) -> DomainResult<()> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let store = InMemoryStore::new();
        let farmer = farmer(&store, None).await;
        let dispatcher = NotificationDispatcher::new(
            Arc::new(store),
            Arc::new(SlowSms),
            Arc::new(SandboxMessaging),
        )
        .with_delivery_timeout(Duration::from_millis(100));

        let params = NewNotification::new(farmer.id, NotificationType::Device, "Offline", "Pump")
            .with_channels([Channel::Sms]);
        let notification = dispatcher.create_notification(params).await.unwrap();
        assert_eq!(notification.sent_via, vec![Channel::InApp]);
    }

    #[tokio::test]
    async fn unknown_recipient_still_persists() {
        let store = InMemoryStore::new();
        let dispatcher = NotificationDispatcher::sandboxed(Arc::new(store.clone()));

        let params = NewNotification::new(FarmerId::new(), NotificationType::System, "t", "m")
            .with_channels([Channel::Sms, Channel::Email]);
        let notification = dispatcher.create_notification(params).await.unwrap();

        assert_eq!(notification.sent_via, vec![Channel::InApp]);
        assert_eq!(store.notification_count().await, 1);
    }
}
