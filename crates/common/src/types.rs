use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity in the world store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity together with its world position, as handed to the spatial
/// index and the visibility culler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPoint {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
}

impl EntityPoint {
    pub fn new(id: EntityId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// How aggressively a behavior system may be throttled under load.
///
/// `Critical` systems are never throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn priority_orders_critical_first() {
        let mut all = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        all.sort();
        assert_eq!(
            all,
            vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]
        );
    }

    #[test]
    fn priority_display_is_lowercase() {
        assert_eq!(Priority::Medium.to_string(), "medium");
        assert_eq!(Priority::Critical.as_str(), "critical");
        assert_eq!(format!("{:<6}|", Priority::Low), "low   |");
    }
}
