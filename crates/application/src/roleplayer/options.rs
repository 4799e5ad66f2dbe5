use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options recognised when a capability is attached. None are defined yet.
const DEFAULT_OPTIONS: &[(&str, Value)] = &[];

/// Free-form options supplied when attaching the capability.
///
/// Keys are merged as given and never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleplayerOptions(Map<String, Value>);

impl Default for RoleplayerOptions {
    fn default() -> Self {
        Self(
            DEFAULT_OPTIONS
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.clone()))
                .collect(),
        )
    }
}

impl RoleplayerOptions {
    /// Sets one option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Merges `other` over `self`, keeping the value from `other` on collisions.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Returns an option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
