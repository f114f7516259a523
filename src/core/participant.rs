use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a participant in a shared outing.
///
/// A participant is any named party that pays for and/or consumes
/// expense items. The identifier is a stable key — typically a display
/// name or account handle — and its lexicographic order is used as the
/// deterministic tie-break order throughout the engine (remainder-cent
/// allocation, settlement matching).
///
/// # Examples
///
/// ```
/// use split_engine::core::participant::ParticipantId;
///
/// let alice = ParticipantId::new("alice");
/// let bob = ParticipantId::new("bob");
/// assert_ne!(alice, bob);
/// assert!(alice < bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a new participant identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this participant ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_equality() {
        let a = ParticipantId::new("alice");
        let b = ParticipantId::new("alice");
        let c = ParticipantId::new("bob");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_participant_display() {
        let p = ParticipantId::new("carol");
        assert_eq!(format!("{}", p), "carol");
    }

    #[test]
    fn test_participant_ordering() {
        let a = ParticipantId::new("alice");
        let b = ParticipantId::new("bob");
        assert!(a < b);
    }
}
