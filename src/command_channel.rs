// Copyright 2025 Cowboy AI, LLC.

//! Fire-and-forget commands to irrigation controllers

use crate::entity::ScheduleId;
use crate::errors::{DomainError, DomainResult};
use crate::nats::subject;
use async_nats::Client;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Topic an irrigation controller listens on
pub fn command_topic(serial: &str) -> String {
    subject(&["irrigation", serial, "command"])
}

/// Command action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    /// Open the valve for the given duration
    Start,
}

/// Payload sent to a controller when a schedule starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationCommand {
    /// What the device should do
    pub action: CommandAction,
    /// Schedule the run belongs to; echoed back in the status callback
    pub schedule_id: ScheduleId,
    /// Run length
    pub duration_minutes: u32,
}

impl IrrigationCommand {
    /// Start command for a schedule
    pub fn start(schedule_id: ScheduleId, duration_minutes: u32) -> Self {
        Self {
            action: CommandAction::Start,
            schedule_id,
            duration_minutes,
        }
    }
}

/// Outbound channel to devices
///
/// Publishing is fire-and-forget: success means the command left the
/// process, not that the device acted on it.
#[async_trait]
pub trait DeviceCommandChannel: Send + Sync {
    /// Publish a command to a device topic
    async fn publish(&self, topic: &str, command: &IrrigationCommand) -> DomainResult<()>;
}

/// Command channel over core NATS publish
#[derive(Debug, Clone)]
pub struct NatsCommandChannel {
    client: Client,
}

impl NatsCommandChannel {
    /// Wrap a connected client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceCommandChannel for NatsCommandChannel {
    async fn publish(&self, topic: &str, command: &IrrigationCommand) -> DomainResult<()> {
        let payload = Bytes::from(serde_json::to_vec(command)?);
        self.client
            .publish(topic.to_string(), payload)
            .await
            .map_err(|e| DomainError::external("nats", format!("publish to {topic} failed: {e}")))?;
        debug!(topic, schedule_id = %command.schedule_id, "Device command published");
        Ok(())
    }
}

/// Command channel that records what was published
#[derive(Debug, Clone, Default)]
pub struct RecordingCommandChannel {
    published: Arc<RwLock<Vec<(String, IrrigationCommand)>>>,
}

impl RecordingCommandChannel {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub async fn published(&self) -> Vec<(String, IrrigationCommand)> {
        self.published.read().await.clone()
    }
}

#[async_trait]
impl DeviceCommandChannel for RecordingCommandChannel {
    async fn publish(&self, topic: &str, command: &IrrigationCommand) -> DomainResult<()> {
        self.published
            .write()
            .await
            .push((topic.to_string(), command.clone()));
        Ok(())
    }
}
