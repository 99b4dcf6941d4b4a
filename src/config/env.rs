//! Raw environment input

use std::collections::HashMap;
use std::path::Path;

/// Flat name -> value mapping that settings are resolved from
///
/// Captured once so resolution never reads process state directly. Tests
/// build one from literal pairs instead of touching real variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Empty environment: every setting falls back to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    ///
    /// Names and values that are not valid unicode are kept with the bad
    /// bytes replaced by U+FFFD, so such a value fails validation instead
    /// of looking unset.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .map(|(k, v)| {
                    (
                        k.to_string_lossy().into_owned(),
                        v.to_string_lossy().into_owned(),
                    )
                })
                .collect(),
        }
    }

    /// Load a dotenv file into the process environment, then snapshot it
    ///
    /// Variables already set in the process win over the file. A missing
    /// file is not an error.
    pub fn from_process_with_dotenv(path: Option<&Path>) -> anyhow::Result<Self> {
        let loaded = match path {
            Some(path) => dotenvy::from_path(path).map(|_| ()),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match loaded {
            Ok(()) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(anyhow::anyhow!("Failed to load dotenv file: {}", e)),
        }
        Ok(Self::from_process())
    }

    /// Build from literal pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Return a copy with one variable set
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value with surrounding whitespace removed; blank counts as unset
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
