// Copyright 2025 Cowboy AI, LLC.

//! # Smart Agri Core
//!
//! Advisory core for IoT farm management. It decides when crops need
//! water or fertilizer, drives irrigation schedules and fertilization
//! records through their lifecycles, and delivers notifications to
//! farmers over in-app, SMS and email channels.
//!
//! The crate provides:
//! - **Recommendation engine**: rule-based irrigation and fertilization
//!   advice with a human-readable reason for every decision
//! - **Lifecycles**: conditional status transitions for irrigation
//!   schedules and fertilization records, plus history statistics
//! - **Notification dispatcher**: persistence, paging, read tracking,
//!   retention cleanup and best-effort SMS/email delivery
//! - **Sensor monitoring**: reading ingest with field-limit alerts,
//!   device offline notices and per-device averages
//! - **Stores**: async storage traits with an in-memory implementation
//! - **Integrations**: weather provider, device command channel and
//!   outbound messaging over NATS
//!
//! ## Design Principles
//!
//! 1. **Ownership scoping**: every farmer-facing read and write is scoped
//!    to the farmer's own farms; foreign entities are reported as missing
//! 2. **Controlled state**: status enums declare their transitions and the
//!    store applies them atomically
//! 3. **Degrade, don't fail**: weather and messaging outages reduce the
//!    quality of a result instead of failing the request

#![warn(missing_docs)]

pub mod agronomy;
pub mod command_channel;
pub mod config;
pub mod entity;
pub mod errors;
pub mod external;
pub mod health;
pub mod lifecycle;
pub mod model;
pub mod monitoring;
pub mod nats;
pub mod notification;
pub mod persistence;
pub mod recommendation;
pub mod state_machine;
pub mod telemetry;
pub mod weather;

pub use agronomy::AgronomyTables;
pub use command_channel::{
    DeviceCommandChannel, IrrigationCommand, NatsCommandChannel, RecordingCommandChannel,
};
pub use config::{AdvisorConfig, Environment};
pub use entity::{
    CropId, DeviceId, EntityId, FarmId, FarmerId, FertilizationRecordId, NotificationId,
    ScheduleId,
};
pub use errors::{DomainError, DomainResult};
pub use lifecycle::{
    Application, FertilizationLifecycle, HistoryFilter, IrrigationLifecycle, RunOutcome,
};
pub use model::{
    ApplicationMethod, Channel, Crop, CropHealth, CropStatus, DeviceStatus, DeviceType, Farm,
    Farmer, FertilizationRecord, FertilizationStatus, HealthStatus, IoTDevice,
    IrrigationSchedule, IrrigationStatus, NewFertilizationRecord, NewIrrigationSchedule,
    NewNotification, Notification, NotificationType, Priority, SensorReading, TriggerSource,
};
pub use monitoring::{DeviceStats, IngestReport, SensorAlert, SensorMonitor, SensorPayload};
pub use nats::NatsConfig;
pub use notification::{ListOptions, NotificationDispatcher, SandboxMessaging};
pub use persistence::{DomainStore, InMemoryStore, TransitionOutcome};
pub use recommendation::{
    FertilizationRecommendation, FertilizationUrgency, IrrigationRecommendation,
    IrrigationUrgency, RecommendationEngine,
};
pub use state_machine::{State, StateTransitions};
pub use weather::{NoWeatherProvider, RainOutlook, WeatherProvider};
