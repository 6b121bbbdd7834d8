//! Environment variable access behind a mockable reader.
//!
//! The server reads its defaults (provider key, listen address, GitHub
//! token) from the process environment. Tests swap in [`Env::mock`] so no
//! test ever mutates the real environment.

use std::collections::HashMap;
use std::str::FromStr;

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Read only from the given key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// Look up a variable, treating blank values as unset.
    ///
    /// `REVU_API_KEY=` in a shell profile must not count as a configured key.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a variable with [`FromStr`].
    ///
    /// Returns `None` when unset, `Some(Err(raw))` when present but invalid.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        self.non_empty(name)
            .map(|raw| raw.parse::<T>().map_err(|_| raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        assert!(Env::real().var("CARGO_MANIFEST_DIR").is_ok());
    }

    #[test]
    fn mock_env_returns_only_given_values() {
        let env = Env::mock([("FOO", "bar")]);
        assert_eq!(env.var("FOO").unwrap(), "bar");
        assert!(env.var("CARGO_MANIFEST_DIR").is_err());
    }

    #[test]
    fn non_empty_filters_blank_values() {
        let env = Env::mock([("BLANK", "   "), ("SET", " key ")]);
        assert_eq!(env.non_empty("BLANK"), None);
        assert_eq!(env.non_empty("SET").as_deref(), Some("key"));
        assert_eq!(env.non_empty("MISSING"), None);
    }

    #[test]
    fn parse_reports_invalid_raw_value() {
        let env = Env::mock([("TIMEOUT", "45"), ("BAD", "soon")]);
        assert_eq!(env.parse::<u64>("TIMEOUT"), Some(Ok(45)));
        assert_eq!(env.parse::<u64>("BAD"), Some(Err("soon".to_string())));
        assert_eq!(env.parse::<u64>("MISSING"), None);
    }
}
