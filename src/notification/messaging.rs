// Copyright 2025 Cowboy AI, LLC.

//! SMS and email senders
//!
//! A send returns `Ok(())` only on confirmed hand-off to the provider.
//! The sandbox senders log the message and succeed, which is the
//! behaviour for every non-production environment.

use crate::errors::{DomainError, DomainResult};
use crate::nats::subject;
use async_nats::Client;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

/// Text message sender
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send a text message
    async fn send_sms(&self, phone: &str, text: &str) -> DomainResult<()>;
}

/// Email sender
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> DomainResult<()>;
}

/// Log-and-succeed sender for development and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxMessaging;

#[async_trait]
impl SmsSender for SandboxMessaging {
    async fn send_sms(&self, phone: &str, text: &str) -> DomainResult<()> {
        info!(phone, text, "[sandbox] SMS");
        Ok(())
    }
}

#[async_trait]
impl EmailSender for SandboxMessaging {
    async fn send_email(&self, address: &str, subject: &str, _body: &str) -> DomainResult<()> {
        info!(address, subject, "[sandbox] email");
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboundSms<'a> {
    phone: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct OutboundEmail<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Hands messages to a delivery gateway over NATS
///
/// Messages go to `smart-agri.outbound.sms` and `smart-agri.outbound.email`.
/// A send succeeds once the server has acknowledged the flush.
#[derive(Debug, Clone)]
pub struct NatsMessaging {
    client: Client,
}

impl NatsMessaging {
    /// Wrap a connected client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn hand_off(&self, kind: &str, payload: Vec<u8>) -> DomainResult<()> {
        let topic = subject(&["outbound", kind]);
        self.client
            .publish(topic, Bytes::from(payload))
            .await
            .map_err(|e| DomainError::external(kind, e.to_string()))?;
        self.client
            .flush()
            .await
            .map_err(|e| DomainError::external(kind, e.to_string()))
    }
}

#[async_trait]
impl SmsSender for NatsMessaging {
    async fn send_sms(&self, phone: &str, text: &str) -> DomainResult<()> {
        let payload = serde_json::to_vec(&OutboundSms { phone, text })?;
        self.hand_off("sms", payload).await
    }
}

#[async_trait]
impl EmailSender for NatsMessaging {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> DomainResult<()> {
        let payload = serde_json::to_vec(&OutboundEmail {
            to: address,
            subject,
            body,
        })?;
        self.hand_off("email", payload).await
    }
}
