//! Gate and fence registry
//!
//! Resolves which concrete structure an agent should head for given its role and side.
//! Attackers target the opposing side's structures, defenders their own.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::state::{Role, Side};
use crate::util::vec2::Vec2;

/// Structure kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StructureType {
    /// Scoring target for the opposing attacker
    Gate,
    /// Heading here without a ball is self-elimination
    Fence,
}

/// Stable structure identifier (registration order)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StructureId(pub u32);

/// A registered gate or fence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StructureRef {
    pub id: StructureId,
    pub kind: StructureType,
    pub side: Side,
    pub position: Vec2,
}

/// Static set of structures registered at level load
#[derive(Debug, Clone, Default)]
pub struct StructureRegistry {
    structures: Vec<StructureRef>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard two-gate, four-fence field matching the default spawn areas
    pub fn standard_field() -> Self {
        let mut registry = Self::new();
        for (side, z) in [(Side::Player, -14.0), (Side::Enemy, 14.0)] {
            registry.register(StructureType::Gate, side, Vec2::new(0.0, z));
            registry.register(StructureType::Fence, side, Vec2::new(-6.0, z));
            registry.register(StructureType::Fence, side, Vec2::new(6.0, z));
        }
        registry
    }

    /// Register a structure. Only called while building the level.
    pub fn register(&mut self, kind: StructureType, side: Side, position: Vec2) -> StructureId {
        let id = StructureId(self.structures.len() as u32);
        self.structures.push(StructureRef {
            id,
            kind,
            side,
            position,
        });
        id
    }

    /// Side whose structures `role` on `own_side` should target
    pub fn target_side(role: Role, own_side: Side) -> Side {
        match role {
            Role::Attacker => own_side.opponent(),
            Role::Defender => own_side,
        }
    }

    /// All structures matching the resolved side and kind
    pub fn candidates(
        &self,
        role: Role,
        own_side: Side,
        kind: StructureType,
    ) -> SmallVec<[&StructureRef; 4]> {
        let target_side = Self::target_side(role, own_side);
        self.structures
            .iter()
            .filter(|s| s.kind == kind && s.side == target_side)
            .collect()
    }

    /// Pick one matching structure uniformly at random.
    /// None means "target unavailable" and must be handled by the caller.
    pub fn find_target<R: Rng + ?Sized>(
        &self,
        role: Role,
        own_side: Side,
        kind: StructureType,
        rng: &mut R,
    ) -> Option<StructureRef> {
        let candidates = self.candidates(role, own_side, kind);
        if candidates.is_empty() {
            tracing::warn!(
                "No {:?} found for {} side",
                kind,
                Self::target_side(role, own_side)
            );
            return None;
        }
        let index = rng.gen_range(0..candidates.len());
        Some(*candidates[index])
    }

    pub fn get(&self, id: StructureId) -> Option<&StructureRef> {
        self.structures.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureRef> {
        self.structures.iter()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}
