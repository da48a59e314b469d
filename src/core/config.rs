//! Configuration store and namespaced readers.
//!
//! Values are stored under fully qualified `namespace:key` names. Sources are
//! layered, later wins: settings file, `STACKRUN_CONFIG` (JSON object), then
//! an explicit config map.

use super::parser;
use super::types::{ConfigValue, StackSettings};
use crate::error::{Result, StackError};
use indexmap::IndexMap;

/// Environment variable holding a JSON object of extra config values.
pub const CONFIG_ENV: &str = "STACKRUN_CONFIG";

/// All configuration values visible to a run.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    project: String,
    values: IndexMap<String, ConfigValue>,
}

/// Qualify `key` with `namespace` unless it already carries one.
pub fn full_key(namespace: &str, key: &str) -> String {
    if key.contains(':') {
        key.to_string()
    } else {
        format!("{}:{}", namespace, key)
    }
}

impl ConfigStore {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            values: IndexMap::new(),
        }
    }

    /// Seed a store from the settings file's `config` block.
    pub fn from_settings(settings: &StackSettings) -> Self {
        let mut store = Self::new(&settings.project);
        store.set_all(&settings.config);
        store
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(full_key(&self.project, key), value);
    }

    pub fn set_all(&mut self, map: &IndexMap<String, ConfigValue>) {
        for (key, value) in map {
            self.set(key, value.clone());
        }
    }

    /// Overlay values from a JSON object (`{"proj:key": "v", ...}`). Keys
    /// are checked like settings keys; a malformed key rejects the whole
    /// object.
    pub fn overlay_json(&mut self, json: &str) -> Result<()> {
        let map: IndexMap<String, ConfigValue> = serde_json::from_str(json)
            .map_err(|e| StackError::Parse(format!("{}: {}", CONFIG_ENV, e)))?;
        parser::check_config_map(&map, CONFIG_ENV)?;
        self.set_all(&map);
        Ok(())
    }

    /// Overlay values from `STACKRUN_CONFIG` when it is set and non-empty.
    pub fn overlay_env(&mut self) -> Result<()> {
        match std::env::var(CONFIG_ENV) {
            Ok(json) if !json.trim().is_empty() => {
                tracing::debug!("overlaying config from {}", CONFIG_ENV);
                self.overlay_json(&json)
            }
            _ => Ok(()),
        }
    }

    /// Look up a fully qualified key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(&full_key(&self.project, key))
    }

    /// Plaintext of every secret value, for masking in reports.
    pub fn secret_values(&self) -> Vec<&str> {
        self.values
            .values()
            .filter(|v| v.secret && !v.value.is_empty())
            .map(|v| v.value.as_str())
            .collect()
    }
}

/// A reader bound to one namespace, handed to fixture programs.
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    store: &'a ConfigStore,
    namespace: &'a str,
}

impl<'a> Config<'a> {
    pub fn new(store: &'a ConfigStore, namespace: &'a str) -> Self {
        Self { store, namespace }
    }

    /// Fully qualified name of `key` in this namespace.
    pub fn full_key(&self, key: &str) -> String {
        full_key(self.namespace, key)
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.store
            .values
            .get(&self.full_key(key))
            .map(|v| v.value.as_str())
    }

    /// Like `get`, but absence is an error.
    pub fn require(&self, key: &str) -> Result<&'a str> {
        self.get(key).ok_or_else(|| StackError::MissingConfig {
            key: self.full_key(key),
        })
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.store
            .values
            .get(&self.full_key(key))
            .is_some_and(|v| v.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        let mut s = ConfigStore::new("fixtures");
        s.set("name", ConfigValue::plain("x"));
        s.set("token", ConfigValue::secret("hunter2"));
        s.set("aws:region", ConfigValue::plain("eu-west-1"));
        s
    }

    #[test]
    fn test_full_key() {
        assert_eq!(full_key("p", "name"), "p:name");
        assert_eq!(full_key("p", "aws:region"), "aws:region");
    }

    #[test]
    fn test_bare_keys_land_in_project_namespace() {
        let s = store();
        assert!(s.values.contains_key("fixtures:name"));
        assert_eq!(s.get("fixtures:name").unwrap().value, "x");
        assert_eq!(s.get("name").unwrap().value, "x");
    }

    #[test]
    fn test_require_present_and_missing() {
        let s = store();
        let cfg = Config::new(&s, "fixtures");
        assert_eq!(cfg.require("name").unwrap(), "x");
        let err = cfg.require("missing").unwrap_err();
        assert_eq!(
            err,
            StackError::MissingConfig {
                key: "fixtures:missing".to_string()
            }
        );
    }

    #[test]
    fn test_other_namespace() {
        let s = store();
        let aws = Config::new(&s, "aws");
        assert_eq!(aws.get("region"), Some("eu-west-1"));
        assert_eq!(aws.get("name"), None);
    }

    #[test]
    fn test_secrets() {
        let s = store();
        let cfg = Config::new(&s, "fixtures");
        assert!(cfg.is_secret("token"));
        assert!(!cfg.is_secret("name"));
        assert_eq!(s.secret_values(), vec!["hunter2"]);
    }

    #[test]
    fn test_overlay_json_wins() {
        let mut s = store();
        s.overlay_json(r#"{"fixtures:name": "y", "extra": {"value": "z", "secret": true}}"#)
            .unwrap();
        assert_eq!(s.get("name").unwrap().value, "y");
        assert!(s.get("extra").unwrap().secret);
        assert!(s.overlay_json("not json").is_err());
    }

    #[test]
    fn test_overlay_json_rejects_malformed_keys() {
        let mut s = store();
        for json in [r#"{"a:b:c": "v"}"#, r#"{":x": "v"}"#, r#"{"name": "y", "p:": "v"}"#] {
            assert!(
                matches!(s.overlay_json(json), Err(StackError::InvalidConfig { .. })),
                "{} accepted",
                json
            );
        }
        assert_eq!(s.get("name").unwrap().value, "x");
        assert!(!s.values.keys().any(|k| k.starts_with("a:b") || k.starts_with(':')));
    }

    #[test]
    fn test_from_settings() {
        let settings: StackSettings =
            serde_yaml_ng::from_str("version: \"1.0\"\nproject: p\nconfig:\n  name: x\n").unwrap();
        let s = ConfigStore::from_settings(&settings);
        assert_eq!(s.project, "p");
        assert_eq!(s.values.len(), 1);
        assert_eq!(Config::new(&s, "p").require("name").unwrap(), "x");
    }
}
