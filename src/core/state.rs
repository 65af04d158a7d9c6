//! State identifiers.
//!
//! States are registered and looked up by name. Names compare without
//! regard to ASCII case, so `"follow_off"`, `"FOLLOW_OFF"` and
//! `"Follow_Off"` all refer to the same state, while the declared
//! spelling is kept for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Case-insensitive name of a state.
///
/// # Example
///
/// ```rust
/// use nzsf::core::StateName;
///
/// let declared = StateName::new("follow_off");
/// assert_eq!(declared, StateName::new("FOLLOW_OFF"));
/// assert_eq!(declared.as_str(), "follow_off");
/// assert_eq!(declared.upper(), "FOLLOW_OFF");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(String);

impl StateName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as declared.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name upper-cased, the form used in run reports.
    pub fn upper(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    /// Compare against a raw string without allocating.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for StateName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for StateName {}

impl Hash for StateName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&StateName> for StateName {
    fn from(name: &StateName) -> Self {
        name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn names_compare_case_insensitively() {
        assert_eq!(StateName::new("rec_error"), StateName::new("REC_ERROR"));
        assert_eq!(StateName::new("Rec_Error"), StateName::new("rec_error"));
        assert_ne!(StateName::new("rec_error"), StateName::new("rec_success"));
    }

    #[test]
    fn names_hash_case_insensitively() {
        let mut set = HashSet::new();
        set.insert(StateName::new("follow_on"));
        assert!(set.contains(&StateName::new("FOLLOW_ON")));
        assert!(!set.insert(StateName::new("Follow_On")));
    }

    #[test]
    fn map_lookup_ignores_case() {
        let mut map = HashMap::new();
        map.insert(StateName::new("start"), 1);
        assert_eq!(map.get(&StateName::new("START")), Some(&1));
    }

    #[test]
    fn declared_spelling_is_preserved() {
        let name = StateName::new("az_Assert");
        assert_eq!(name.as_str(), "az_Assert");
        assert_eq!(name.to_string(), "az_Assert");
        assert_eq!(name.upper(), "AZ_ASSERT");
    }

    #[test]
    fn matches_raw_strings() {
        let name = StateName::new("follow_off");
        assert!(name.matches("FOLLOW_OFF"));
        assert!(!name.matches("follow_on"));
    }

    #[test]
    fn name_serializes_as_plain_string() {
        let name = StateName::new("no_fault");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"no_fault\"");
        let back: StateName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
