// Copyright 2025 Cowboy AI, LLC.

//! Plain data structures for farms, crops, devices and the records the
//! advisory core reads and writes

mod crop;
mod farm;
mod fertilization;
mod irrigation;
mod notification;

pub use crop::{Crop, CropHealth, CropSnapshot, CropStatus, HealthStatus};
pub use farm::{DeviceStatus, DeviceType, Farm, Farmer, IoTDevice, SensorReading};
pub use fertilization::{
    ApplicationMethod, FertilizationRecord, FertilizationStatus, NewFertilizationRecord,
    RecordChange,
};
pub use irrigation::{
    IrrigationSchedule, IrrigationStatus, NewIrrigationSchedule, ScheduleChange, TriggerSource,
};
pub use notification::{Channel, NewNotification, Notification, NotificationType, Priority};
