//! Reaction networks and propensity utilities.
//!
//! A [`ReactionNetwork`] owns a disjoint set of entities and the reactions that
//! connect them. Nothing in a network is shared with another network, so every
//! simulation run gets its own populations.

use serde::Serialize;

use crate::entity::{Entity, EntityId};
use crate::error::{ExecutionError, ValidationError};
use crate::reaction::{Reaction, ReactionEvent, ReactionId};

/// Propensity of every reaction, in input order.
///
/// `entities` must be the slice the reactions were built against.
#[must_use]
pub(crate) fn all_propensities(reactions: &[Reaction], entities: &[Entity]) -> Vec<f64> {
    reactions.iter().map(|r| r.propensity(entities)).collect()
}

/// Sum of [`all_propensities`]. Zero exactly when every reaction is quiescent.
#[must_use]
pub(crate) fn sum_propensities(reactions: &[Reaction], entities: &[Entity]) -> f64 {
    reactions.iter().map(|r| r.propensity(entities)).sum()
}

/// Entities plus the reactions between them.
///
/// # Examples
///
/// ```
/// use crnsim::ReactionNetwork;
///
/// let mut network = ReactionNetwork::new();
/// let a = network.add_entity("A", 3);
/// let b = network.add_entity("B", 2);
/// let c = network.add_entity("C", 0);
/// network.add_reaction(a, b, c, 1.0).unwrap();
///
/// assert_eq!(network.sum_propensities(), 6.0);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReactionNetwork {
    entities: Vec<Entity>,
    reactions: Vec<Reaction>,
}

impl ReactionNetwork {
    /// Creates an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its id.
    pub fn add_entity(&mut self, name: impl Into<String>, count: u64) -> EntityId {
        let entity = Entity::new(name, count);
        let id = entity.id();
        self.entities.push(entity);
        id
    }

    /// Adds an entity from an untyped numeric count.
    pub fn add_entity_raw(
        &mut self,
        name: impl Into<String>,
        count: f64,
    ) -> Result<EntityId, ValidationError> {
        let entity = Entity::from_raw(name, count)?;
        let id = entity.id();
        self.entities.push(entity);
        Ok(id)
    }

    /// Adds `reactant_a + reactant_b -> 2 product`.
    ///
    /// All three entities must already belong to this network. Reactants may
    /// coincide with each other or with the product.
    pub fn add_reaction(
        &mut self,
        reactant_a: EntityId,
        reactant_b: EntityId,
        product: EntityId,
        rate_constant: f64,
    ) -> Result<ReactionId, ValidationError> {
        let slots = [
            self.slot_of(reactant_a)?,
            self.slot_of(reactant_b)?,
            self.slot_of(product)?,
        ];
        let reaction = Reaction::new([reactant_a, reactant_b], product, rate_constant, slots)?;
        let id = reaction.id();
        self.reactions.push(reaction);
        Ok(id)
    }

    /// All entities, in insertion order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All reactions, in insertion order.
    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Looks up an entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Current count of an entity.
    #[must_use]
    pub fn count(&self, id: EntityId) -> Option<u64> {
        self.entity(id).map(Entity::count)
    }

    /// Looks up a reaction.
    #[must_use]
    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id() == id)
    }

    /// Current propensity of a reaction in this network.
    #[must_use]
    pub fn propensity(&self, id: ReactionId) -> Option<f64> {
        self.reaction(id).map(|r| r.propensity(&self.entities))
    }

    /// Number of reactions.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Returns true if the network has no reactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Sum of all entity counts.
    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.entities.iter().map(Entity::count).sum()
    }

    /// Propensity of every reaction, in insertion order.
    #[must_use]
    pub fn all_propensities(&self) -> Vec<f64> {
        all_propensities(&self.reactions, &self.entities)
    }

    /// Sum of all propensities.
    #[must_use]
    pub fn sum_propensities(&self) -> f64 {
        sum_propensities(&self.reactions, &self.entities)
    }

    /// Fires the reaction at `index` (insertion order).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub(crate) fn fire_at(&mut self, index: usize) -> Result<&ReactionEvent, ExecutionError> {
        self.reactions[index].fire(&mut self.entities)
    }

    fn slot_of(&self, id: EntityId) -> Result<usize, ValidationError> {
        self.entities
            .iter()
            .position(|e| e.id() == id)
            .ok_or(ValidationError::UnknownEntity { id })
    }
}
