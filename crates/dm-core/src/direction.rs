//! Migration direction.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which statement set of a delta is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Forward migration
    Up,
    /// Reverse migration
    Down,
}

impl Direction {
    /// Derive the direction of travel from `last` to `target`.
    ///
    /// Returns `None` when both bounds are equal (nothing to do).
    pub fn between<T: Ord>(last: &T, target: &T) -> Option<Direction> {
        match last.cmp(target) {
            Ordering::Less => Some(Direction::Up),
            Ordering::Greater => Some(Direction::Down),
            Ordering::Equal => None,
        }
    }

    /// XML section / keyword for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(CoreError::UnknownKeyword {
                kind: "direction",
                value: s.to_string(),
                expected: "up, down",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta_id::DeltaId;

    #[test]
    fn test_between() {
        let ten = DeltaId::Number(10);
        let thirteen = DeltaId::Number(13);
        assert_eq!(Direction::between(&ten, &thirteen), Some(Direction::Up));
        assert_eq!(Direction::between(&thirteen, &ten), Some(Direction::Down));
        assert_eq!(Direction::between(&ten, &ten), None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!(" down".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"up\"");
        let d: Direction = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(d, Direction::Down);
    }
}
