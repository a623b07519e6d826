//! Binary reactions: `X + Y -> 2Z`.
//!
//! A [`Reaction`] never owns entities. It stores the ids of its two reactants
//! and its product together with their slots in the owning
//! [`ReactionNetwork`](crate::network::ReactionNetwork), and reads or mutates
//! counts through the network's entity slice.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::{ExecutionError, ValidationError};

static NEXT_REACTION_ID: AtomicU64 = AtomicU64::new(0);

/// Units of the product created per firing.
pub const PRODUCT_YIELD: i64 = 2;

/// Process-unique reaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionId(u64);

impl ReactionId {
    /// Allocates the next identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_REACTION_ID.fetch_add(1, Ordering::Relaxed))
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

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reaction#{}", self.0)
    }
}

/// A signed population change applied to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChange {
    /// Entity that changed.
    pub entity: EntityId,
    /// Signed delta.
    pub change: i64,
}

/// Record of the most recent firing of a reaction.
///
/// Transient: overwritten by the next firing of the same reaction. Meant for
/// observers that animate transitions; it is not simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Units taken from each reactant, in reactant order.
    pub removals: Vec<EntityChange>,
    /// Units added to the product.
    pub creations: Vec<EntityChange>,
}

impl ReactionEvent {
    /// Net change per entity, combining removals and creations.
    ///
    /// Entities whose changes cancel out (e.g. `A` in `A + C -> 2A`) are kept
    /// with their net value.
    #[must_use]
    pub fn net_changes(&self) -> BTreeMap<EntityId, i64> {
        let mut net = BTreeMap::new();
        for change in self.removals.iter().chain(&self.creations) {
            *net.entry(change.entity).or_insert(0) += change.change;
        }
        net
    }
}

/// A rule consuming one unit of each reactant and producing two of the product.
#[derive(Debug, Clone, Serialize)]
pub struct Reaction {
    id: ReactionId,
    reactants: [EntityId; 2],
    product: EntityId,
    rate_constant: f64,

    // Positions of reactant_a, reactant_b, product in the network's entity slice.
    #[serde(skip)]
    slots: [usize; 3],

    fired: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    last_event: Option<ReactionEvent>,
}

impl Reaction {
    /// Validates the rate constant and builds a reaction bound to entity slots.
    ///
    /// Slot resolution is done by the network, which is the only caller.
    pub(crate) fn new(
        reactants: [EntityId; 2],
        product: EntityId,
        rate_constant: f64,
        slots: [usize; 3],
    ) -> Result<Self, ValidationError> {
        if !rate_constant.is_finite() || rate_constant < 0.0 {
            return Err(ValidationError::InvalidRateConstant {
                value: rate_constant,
            });
        }
        Ok(Self {
            id: ReactionId::next(),
            reactants,
            product,
            rate_constant,
            slots,
            fired: 0,
            last_event: None,
        })
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> ReactionId {
        self.id
    }

    /// Returns the two reactant ids.
    #[must_use]
    pub const fn reactants(&self) -> [EntityId; 2] {
        self.reactants
    }

    /// Returns the product id.
    #[must_use]
    pub const fn product(&self) -> EntityId {
        self.product
    }

    /// Returns the rate constant.
    #[must_use]
    pub const fn rate_constant(&self) -> f64 {
        self.rate_constant
    }

    /// How many times this reaction has fired.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// The most recent firing, if any.
    #[must_use]
    pub const fn last_event(&self) -> Option<&ReactionEvent> {
        self.last_event.as_ref()
    }

    /// `rate_constant * count(reactant_a) * count(reactant_b)`.
    ///
    /// Self-reactions (`X + X`) depart from the plain product rule: the
    /// second factor is `count - 1`, so the propensity is `k * n * (n - 1)`.
    /// A single molecule cannot collide with itself, and a positive
    /// propensity must always mean the reaction can fire.
    ///
    /// `entities` must be the slice of the network that built this reaction.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn propensity(&self, entities: &[Entity]) -> f64 {
        let a = entities[self.slots[0]].count();
        let b = if self.slots[0] == self.slots[1] {
            a.saturating_sub(1)
        } else {
            entities[self.slots[1]].count()
        };
        self.rate_constant * a as f64 * b as f64
    }

    /// Applies the reaction: -1 to each reactant, +2 to the product.
    ///
    /// All count updates happen or none do. Fails with
    /// [`ExecutionError::InsufficientPopulation`] if a reactant cannot cover
    /// its consumption, or [`ExecutionError::PopulationOverflow`] if the
    /// product count would exceed `u64::MAX`.
    pub(crate) fn fire(
        &mut self,
        entities: &mut [Entity],
    ) -> Result<&ReactionEvent, ExecutionError> {
        let deltas: [(usize, i64); 3] = [
            (self.slots[0], -1),
            (self.slots[1], -1),
            (self.slots[2], PRODUCT_YIELD),
        ];

        // Net per slot so coinciding entities are checked against their
        // combined consumption.
        let mut net: Vec<(usize, i64)> = Vec::with_capacity(3);
        for (slot, delta) in deltas {
            match net.iter_mut().find(|(s, _)| *s == slot) {
                Some((_, d)) => *d += delta,
                None => net.push((slot, delta)),
            }
        }

        let mut updated: Vec<(usize, u64)> = Vec::with_capacity(net.len());
        for &(slot, delta) in &net {
            let entity = &entities[slot];
            let count = entity.count();
            let next = if delta < 0 {
                count
                    .checked_sub(delta.unsigned_abs())
                    .ok_or(ExecutionError::InsufficientPopulation {
                        reaction: self.id,
                        entity: entity.id(),
                        count,
                        needed: delta.unsigned_abs(),
                    })?
            } else {
                count
                    .checked_add(delta.unsigned_abs())
                    .ok_or(ExecutionError::PopulationOverflow { entity: entity.id() })?
            };
            updated.push((slot, next));
        }

        for (slot, count) in updated {
            entities[slot].set_count(count);
        }

        self.fired += 1;
        let event = ReactionEvent {
            removals: vec![
                EntityChange {
                    entity: self.reactants[0],
                    change: -1,
                },
                EntityChange {
                    entity: self.reactants[1],
                    change: -1,
                },
            ],
            creations: vec![EntityChange {
                entity: self.product,
                change: PRODUCT_YIELD,
            }],
        };
        Ok(&*self.last_event.insert(event))
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} + {} -> {}{} (k={})",
            self.id,
            self.reactants[0],
            self.reactants[1],
            PRODUCT_YIELD,
            self.product,
            self.rate_constant
        )
    }
}
