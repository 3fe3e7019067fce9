// Copyright 2025 Cowboy AI, LLC.

//! Delivery outcome counters

use crate::model::Channel;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Outcome of one channel delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryOutcome {
    /// Provider confirmed delivery
    Success,
    /// Provider failed, errored, or timed out
    Failure,
    /// Not attempted, e.g. no address on file
    Skipped,
}

impl DeliveryOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Success => "success",
            DeliveryOutcome::Failure => "failure",
            DeliveryOutcome::Skipped => "skipped",
        }
    }
}

/// Metrics for notification delivery
#[derive(Debug, Clone, Default)]
pub struct DeliveryMetrics {
    counters: Arc<RwLock<HashMap<String, u64>>>,
    latencies: Arc<RwLock<HashMap<Channel, Vec<Duration>>>>,
}

impl DeliveryMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one delivery outcome, e.g. `sms.success`
    pub async fn record(&self, channel: Channel, outcome: DeliveryOutcome) {
        let key = format!("{}.{}", channel.as_str(), outcome.as_str());
        let mut counters = self.counters.write().await;
        *counters.entry(key).or_insert(0) += 1;
    }

    /// Record how long a provider call took
    pub async fn record_latency(&self, channel: Channel, latency: Duration) {
        let mut latencies = self.latencies.write().await;
        let samples = latencies.entry(channel).or_default();
        samples.push(latency);

        // Keep only last 1000 measurements per channel
        if samples.len() > 1000 {
            let excess = samples.len() - 1000;
            samples.drain(0..excess);
        }
    }

    /// Get counter value
    pub async fn get(&self, channel: Channel, outcome: DeliveryOutcome) -> u64 {
        let key = format!("{}.{}", channel.as_str(), outcome.as_str());
        self.counters.read().await.get(&key).copied().unwrap_or(0)
    }

    /// Average provider latency for a channel
    pub async fn average_latency(&self, channel: Channel) -> Option<Duration> {
        let latencies = self.latencies.read().await;
        let samples = latencies.get(&channel).filter(|samples| !samples.is_empty())?;
        let sum: Duration = samples.iter().sum();
        Some(sum / samples.len() as u32)
    }

    /// All counters by name
    pub async fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.read().await.clone()
    }
}

/// Timer for a provider call
pub struct DeliveryTimer<'a> {
    metrics: &'a DeliveryMetrics,
    channel: Channel,
    start: Instant,
}

impl<'a> DeliveryTimer<'a> {
    /// Start timing a call on a channel
    pub fn start(metrics: &'a DeliveryMetrics, channel: Channel) -> Self {
        Self {
            metrics,
            channel,
            start: Instant::now(),
        }
    }

    /// Record the elapsed time and the outcome
    pub async fn finish(self, outcome: DeliveryOutcome) {
        self.metrics
            .record_latency(self.channel, self.start.elapsed())
            .await;
        self.metrics.record(self.channel, outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_by_channel_and_outcome() {
        let metrics = DeliveryMetrics::new();
        metrics.record(Channel::Sms, DeliveryOutcome::Success).await;
        metrics.record(Channel::Sms, DeliveryOutcome::Success).await;
        metrics.record(Channel::Email, DeliveryOutcome::Skipped).await;

        assert_eq!(metrics.get(Channel::Sms, DeliveryOutcome::Success).await, 2);
        assert_eq!(metrics.get(Channel::Sms, DeliveryOutcome::Failure).await, 0);

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.get("email.skipped"), Some(&1));
    }

    #[tokio::test]
    async fn test_timer_records_latency() {
        let metrics = DeliveryMetrics::new();
        DeliveryTimer::start(&metrics, Channel::Email)
            .finish(DeliveryOutcome::Failure)
            .await;

        assert!(metrics.average_latency(Channel::Email).await.is_some());
        assert!(metrics.average_latency(Channel::Sms).await.is_none());
        assert_eq!(metrics.get(Channel::Email, DeliveryOutcome::Failure).await, 1);
    }
}
