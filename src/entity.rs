//! Entity types: named chemical species with integer populations.
//!
//! Counts are stored as `u64`, so negative populations are unrepresentable.
//! Untyped numeric input (from a form or a JSON document) goes through
//! [`Entity::from_raw`] / [`Entity::set_count_raw`], which reject fractional,
//! negative and non-finite values instead of clamping them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Process-unique entity identifier.
///
/// Identifiers are handed out in creation order and never reused.
///
/// # Examples
///
/// ```
/// use crnsim::EntityId;
///
/// let a = EntityId::next();
/// let b = EntityId::next();
/// assert!(b > a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocates the next identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw value. Only meaningful for ids read back from serialized data.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// A chemical species with a population count.
///
/// # Examples
///
/// ```
/// use crnsim::Entity;
///
/// let a = Entity::new("A", 10);
/// assert_eq!(a.count(), 10);
/// assert_eq!(a.name, "A");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,

    /// Display name.
    pub name: String,

    count: u64,
}

impl Entity {
    /// Creates an entity with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            id: EntityId::next(),
            name: name.into(),
            count,
        }
    }

    /// Creates an entity from an untyped numeric count.
    ///
    /// Fails with [`ValidationError::InvalidCount`] unless `count` is a finite,
    /// non-negative integer.
    pub fn from_raw(name: impl Into<String>, count: f64) -> Result<Self, ValidationError> {
        Ok(Self::new(name, count_from_f64(count)?))
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the current population.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Overwrites the population with an untyped numeric value.
    ///
    /// On error the previous count is kept.
    pub fn set_count_raw(&mut self, count: f64) -> Result<(), ValidationError> {
        self.count = count_from_f64(count)?;
        Ok(())
    }

    pub(crate) fn set_count(&mut self, count: u64) {
        self.count = count;
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity '{}' ({})", self.name, self.count)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from_f64(value: f64) -> Result<u64, ValidationError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_EXACT_F64_INT {
        return Err(ValidationError::InvalidCount { value });
    }
    Ok(value as u64)
}
