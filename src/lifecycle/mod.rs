// Copyright 2025 Cowboy AI, LLC.

//! Irrigation schedule and fertilization record lifecycles
//!
//! Every status change goes through the store's conditional update with
//! the source set taken from the status type's transition table, so two
//! concurrent requests can never both move the same entity.

pub mod fertilization;
pub mod history;
pub mod irrigation;

pub use fertilization::{Application, FertilizationLifecycle, DEFAULT_SKIP_NOTE};
pub use history::{
    fertilization_history, irrigation_history, FertilizationHistory, FertilizationStatistics,
    HistoryFilter, IrrigationHistory, IrrigationStatistics,
};
pub use irrigation::{IrrigationLifecycle, RunOutcome};
