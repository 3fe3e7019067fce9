// Copyright 2025 Cowboy AI, LLC.

//! NATS connection used for device commands and outbound messaging

use crate::errors::{DomainError, DomainResult};
use async_nats::{Client, ConnectOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Subject prefix shared by every message this crate publishes
pub const SUBJECT_ROOT: &str = "smart-agri";

/// Configuration for NATS client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URL (e.g., "nats://localhost:4222")
    pub url: String,

    /// Optional username for authentication
    pub user: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Whether TLS is required
    pub tls_required: bool,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Reconnect interval in seconds
    pub reconnect_interval_secs: u64,

    /// Maximum reconnect attempts (0 = infinite)
    pub max_reconnects: usize,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            user: None,
            password: None,
            tls_required: false,
            connection_timeout_secs: 10,
            reconnect_interval_secs: 5,
            max_reconnects: 0,
        }
    }
}

impl NatsConfig {
    /// Connect to the configured server
    pub async fn connect(&self) -> DomainResult<Client> {
        let reconnect_interval = Duration::from_secs(self.reconnect_interval_secs);
        let max_reconnects = self.max_reconnects;

        let mut options = ConnectOptions::new()
            .connection_timeout(Duration::from_secs(self.connection_timeout_secs))
            .reconnect_delay_callback(move |attempts| {
                if max_reconnects > 0 && attempts >= max_reconnects {
                    Duration::from_secs(0)
                } else {
                    reconnect_interval
                }
            })
            .event_callback(|event| async move {
                match event {
                    async_nats::Event::Disconnected => warn!("NATS disconnected"),
                    async_nats::Event::Connected => info!("NATS connected"),
                    async_nats::Event::ClientError(err) => warn!(error = %err, "NATS client error"),
                    _ => {}
                }
            });

        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            options = options.user_and_password(user.clone(), password.clone());
        }

        if self.tls_required {
            options = options.require_tls(true);
        }

        options.connect(&self.url).await.map_err(|e| {
            DomainError::external("nats", format!("Failed to connect to {}: {e}", self.url))
        })
    }
}

/// Build a subject under [`SUBJECT_ROOT`]
pub fn subject(parts: &[&str]) -> String {
    let mut subject = String::from(SUBJECT_ROOT);
    for part in parts {
        subject.push('.');
        subject.push_str(part);
    }
    subject
}
