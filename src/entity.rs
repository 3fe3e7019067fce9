// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers for farm entities

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// IDs for different entity types cannot be mixed up at compile time,
/// while serializing as a bare UUID string on the wire.
///
/// # Examples
///
/// ```rust
/// use smart_agri_core::{CropId, FarmId};
///
/// let crop_id = CropId::new();
/// let farm_id = FarmId::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: CropId = farm_id;
/// assert_ne!(crop_id.as_uuid(), farm_id.as_uuid());
/// ```
pub struct EntityId<T> {
    id: Uuid,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

// Marker types for entity IDs
/// Marker for farmers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FarmerMarker;

/// Marker for farms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FarmMarker;

/// Marker for crops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropMarker;

/// Marker for IoT devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceMarker;

/// Marker for irrigation schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleMarker;

/// Marker for fertilization records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FertilizationMarker;

/// Marker for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationMarker;

/// Farmer identifier
pub type FarmerId = EntityId<FarmerMarker>;
/// Farm identifier
pub type FarmId = EntityId<FarmMarker>;
/// Crop identifier
pub type CropId = EntityId<CropMarker>;
/// IoT device identifier
pub type DeviceId = EntityId<DeviceMarker>;
/// Irrigation schedule identifier
pub type ScheduleId = EntityId<ScheduleMarker>;
/// Fertilization record identifier
pub type FertilizationRecordId = EntityId<FertilizationMarker>;
/// Notification identifier
pub type NotificationId = EntityId<NotificationMarker>;
