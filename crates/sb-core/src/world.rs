use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Mushroom,
    Crystal,
    Herbs,
    Water,
    Goblin,
    Troll,
    Dragon,
    BrokenPlank,
}

impl EntityKind {
    pub const MONSTERS: [EntityKind; 3] = [Self::Goblin, Self::Troll, Self::Dragon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mushroom => "mushroom",
            Self::Crystal => "crystal",
            Self::Herbs => "herbs",
            Self::Water => "water",
            Self::Goblin => "goblin",
            Self::Troll => "troll",
            Self::Dragon => "dragon",
            Self::BrokenPlank => "brokenPlank",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mushroom" => Some(Self::Mushroom),
            "crystal" => Some(Self::Crystal),
            "herbs" => Some(Self::Herbs),
            "water" => Some(Self::Water),
            "goblin" => Some(Self::Goblin),
            "troll" => Some(Self::Troll),
            "dragon" => Some(Self::Dragon),
            "brokenPlank" => Some(Self::BrokenPlank),
            _ => None,
        }
    }

    pub fn is_monster(&self) -> bool {
        Self::MONSTERS.contains(self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Weather {
    Sunny,
    Rainy,
    Stormy,
}

impl Weather {
    pub const ALL: [Weather; 3] = [Self::Sunny, Self::Rainy, Self::Stormy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|weather| weather.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub position: usize,
    /// Collected, defeated or repaired. Only ever flips from false to true within a run.
    pub resolved: bool,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: EntityKind, position: usize) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            resolved: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub position: usize,
    pub track_length: usize,
    pub entities: Vec<Entity>,
    pub flags: BTreeMap<String, Value>,
    /// Entity scanned at the current position. Cleared whenever the wizard moves.
    pub target: Option<String>,
}

impl WorldState {
    pub fn new(track_length: usize) -> Self {
        Self {
            position: 0,
            track_length: track_length.max(1),
            entities: Vec::new(),
            flags: BTreeMap::new(),
            target: None,
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: Value) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn track_end(&self) -> usize {
        self.track_length - 1
    }

    pub fn at_track_end(&self) -> bool {
        self.position >= self.track_end()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// First unresolved entity at the wizard's position matching `filter`.
    pub fn unresolved_here(&self, filter: impl Fn(&Entity) -> bool) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.position == self.position && !entity.resolved && filter(entity))
    }

    pub fn resolve(&mut self, id: &str) -> bool {
        match self.entity_mut(id) {
            Some(entity) if !entity.resolved => {
                entity.resolved = true;
                true
            }
            _ => false,
        }
    }

    pub fn all_resolved(&self, filter: impl Fn(&Entity) -> bool) -> bool {
        self.entities
            .iter()
            .filter(|entity| filter(entity))
            .all(|entity| entity.resolved)
    }

    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: Value) {
        self.flags.insert(name.into(), value);
    }
}
