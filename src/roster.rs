//! Client-side view of the units in play.
//!
//! The roster is kept current by `EntityNew`, `EntityChanged` and `EntityRemoved`
//! events. Feedback requests only carry ids, so the dispatcher resolves names,
//! weapons and legality inputs through it.

use std::collections::BTreeMap;
use std::fmt;

use crate::cfr::{AttackCandidate, TargetKind, TargetRef};
use crate::{EntityId, PlayerId};

/// What the client knows about a unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntitySummary {
    /// Server id.
    pub id: EntityId,
    /// Display name, e.g. `"Atlas AS7-D"`.
    pub name: String,
    /// Owning player.
    pub owner: PlayerId,
    /// Hex column.
    pub x: i32,
    /// Hex row.
    pub y: i32,
    /// Mounted weapons by weapon id.
    pub weapons: BTreeMap<i32, String>,
}

impl EntitySummary {
    /// Creates a summary with no weapons at the board origin.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, owner: PlayerId) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            x: 0,
            y: 0,
            weapons: BTreeMap::new(),
        }
    }

    /// Places the unit on a hex.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Adds a mounted weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon_id: i32, name: impl Into<String>) -> Self {
        self.weapons.insert(weapon_id, name.into());
        self
    }
}

/// A roster lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No unit with this id is known.
    UnknownEntity(EntityId),
    /// The unit exists but does not mount this weapon.
    UnknownWeapon {
        /// The unit.
        entity: EntityId,
        /// The weapon id that was not found.
        weapon: i32,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownEntity(id) => write!(f, "no entity {} in roster", id),
            LookupError::UnknownWeapon { entity, weapon } => {
                write!(f, "entity {} has no weapon {}", entity, weapon)
            },
        }
    }
}

impl std::error::Error for LookupError {}

/// All units known to this client.
#[derive(Debug, Clone, Default)]
pub struct EntityRoster {
    entities: BTreeMap<EntityId, EntitySummary>,
}

impl EntityRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a unit. Returns `true` if the unit was already known.
    pub fn upsert(&mut self, entity: EntitySummary) -> bool {
        self.entities.insert(entity.id, entity).is_some()
    }

    /// Removes a unit, returning it if it was known.
    pub fn remove(&mut self, id: EntityId) -> Option<EntitySummary> {
        self.entities.remove(&id)
    }

    /// Forgets every unit.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Returns the unit with `id`, if known.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySummary> {
        self.entities.get(&id)
    }

    /// Like [`get`](Self::get) but with a descriptive error.
    pub fn require(&self, id: EntityId) -> Result<&EntitySummary, LookupError> {
        self.get(id).ok_or(LookupError::UnknownEntity(id))
    }

    /// Number of known units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no unit is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over the known units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySummary> {
        self.entities.values()
    }

    /// Renders an incoming attack as `"{attacker}: {weapon}"`.
    pub fn describe_attack(&self, attack: &AttackCandidate) -> Result<String, LookupError> {
        let attacker = self.require(attack.attacker)?;
        let weapon = attacker
            .weapons
            .get(&attack.weapon)
            .ok_or(LookupError::UnknownWeapon {
                entity: attack.attacker,
                weapon: attack.weapon,
            })?;
        Ok(format!("{}: {}", attacker.name, weapon))
    }

    /// Display name of a targetable object.
    ///
    /// Hexes and buildings are not tracked by the roster and are named by their
    /// encoded coordinates.
    pub fn target_name(&self, target: &TargetRef) -> Result<String, LookupError> {
        match target.kind {
            TargetKind::Entity => self
                .require(EntityId::new(target.id))
                .map(|e| e.name.clone()),
            TargetKind::Hex => Ok(format!("Hex {:04}", target.id)),
            TargetKind::Building => Ok(format!("Building at {:04}", target.id)),
        }
    }
}
