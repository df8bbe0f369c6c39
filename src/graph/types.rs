//! Core type definitions shared by every graph and decorator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, comparable element identifier
///
/// Base graphs mint `Int` identifiers natively; callers may supply either
/// variant to graphs that accept caller-chosen IDs. The `Display` form is the
/// bare number or string, which is also the key used by the bulk-load cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Id {
    Int(u64),
    Str(String),
}

impl Id {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Id::Int(i) => Some(*i),
            Id::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Str(s) => Some(s),
            Id::Int(_) => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(i) => write!(f, "{}", i),
            Id::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for Id {
    fn from(id: u64) -> Self {
        Id::Int(id)
    }
}

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Id::Int(id as u64)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Str(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Str(s)
    }
}

impl From<&Id> for Id {
    fn from(id: &Id) -> Self {
        id.clone()
    }
}

/// Edge direction relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edges whose tail is the vertex
    Out,
    /// Edges whose head is the vertex
    In,
    Both,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Out => Direction::In,
            Direction::In => Direction::Out,
            Direction::Both => Direction::Both,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Out => write!(f, "OUT"),
            Direction::In => write!(f, "IN"),
            Direction::Both => write!(f, "BOTH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::from(42u64).to_string(), "42");
        assert_eq!(Id::from("http://example.com/a").to_string(), "http://example.com/a");
    }

    #[test]
    fn test_id_accessors() {
        let id: Id = 7u64.into();
        assert_eq!(id.as_u64(), Some(7));
        assert_eq!(id.as_str(), None);

        let id: Id = "alice".into();
        assert_eq!(id.as_str(), Some("alice"));
        assert_eq!(id.as_u64(), None);
    }

    #[test]
    fn test_id_ordering() {
        assert!(Id::from(1u64) < Id::from(2u64));
        assert!(Id::from("a") < Id::from("b"));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Out.opposite(), Direction::In);
        assert_eq!(Direction::In.opposite(), Direction::Out);
        assert_eq!(Direction::Both.opposite(), Direction::Both);
    }
}
