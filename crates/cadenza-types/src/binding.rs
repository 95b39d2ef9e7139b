use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hit::MISS_GLYPH;

/// Gameplay category of a bound input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    Move,
    Attack,
    Parry,
}

/// One of eight compass directions, or no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Center,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

/// Maps one raw input identifier to its action, direction and display glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBinding {
    pub input_id: String,
    pub glyph: char,
    pub action: ActionType,
    #[serde(default)]
    pub direction: Direction,
}

impl InputBinding {
    pub fn new(
        input_id: impl Into<String>,
        glyph: char,
        action: ActionType,
        direction: Direction,
    ) -> Self {
        Self {
            input_id: input_id.into(),
            glyph,
            action,
            direction,
        }
    }
}

/// Ordered input bindings. Lookup returns the first entry for an id;
/// validation guarantees there is only one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBindingMap {
    pub entries: Vec<InputBinding>,
}

impl Default for InputBindingMap {
    fn default() -> Self {
        use ActionType::*;
        use Direction::*;
        Self {
            entries: vec![
                InputBinding::new("KeyW", 'N', Move, N),
                InputBinding::new("KeyA", 'W', Move, W),
                InputBinding::new("KeyS", 'S', Move, S),
                InputBinding::new("KeyD", 'E', Move, E),
                InputBinding::new("KeyJ", 'A', Attack, Center),
                InputBinding::new("KeyK", 'R', Attack, N),
                InputBinding::new("KeyL", 'P', Parry, Center),
            ],
        }
    }
}

impl InputBindingMap {
    pub fn new(entries: Vec<InputBinding>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, input_id: &str) -> Option<&InputBinding> {
        self.entries.iter().find(|e| e.input_id == input_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject empty ids, duplicate ids, and blank or reserved glyphs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.input_id.trim().is_empty() {
                return Err(ConfigError::EmptyInputId);
            }
            if !seen.insert(entry.input_id.as_str()) {
                return Err(ConfigError::DuplicateBinding(entry.input_id.clone()));
            }
            if entry.glyph.is_whitespace() || entry.glyph.is_control() || entry.glyph == MISS_GLYPH
            {
                return Err(ConfigError::InvalidGlyph {
                    input_id: entry.input_id.clone(),
                    glyph: entry.glyph,
                });
            }
        }
        Ok(())
    }
}
