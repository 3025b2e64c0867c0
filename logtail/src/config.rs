//! Configuration-profile merger, grounded on `main()` in
//! `original_source/logfire.py`: a `~/.logfirerc` (falling back to
//! `/etc/logfirerc`) JSON file of named profiles, each contributing
//! `options` and `files`, merged in `["default", ...requested]` order.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub files: Vec<String>,
}

pub type ProfileConfig = HashMap<String, Profile>;

pub fn config_file_path() -> Option<PathBuf> {
    let home_path = dirs::home_dir().map(|h| h.join(".logfirerc"));
    if let Some(p) = &home_path {
        if p.is_file() {
            return home_path;
        }
    }
    let etc = PathBuf::from("/etc/logfirerc");
    if etc.is_file() {
        return Some(etc);
    }
    None
}

pub fn load(path: &std::path::Path) -> std::io::Result<ProfileConfig> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[derive(Debug, Default)]
pub struct MergedOptions {
    pub options: HashMap<String, serde_json::Value>,
    pub files: Vec<String>,
}

/// Merge `"default"` plus any profiles named in `requested_profiles`, in
/// order, later profiles overriding earlier ones' `options` and appending
/// to `files`.
pub fn merge(config: &ProfileConfig, requested_profiles: &[String]) -> MergedOptions {
    let mut merged = MergedOptions::default();
    let mut active = vec!["default".to_string()];
    active.extend(requested_profiles.iter().cloned());

    for name in active {
        if let Some(profile) = config.get(&name) {
            for (k, v) in &profile.options {
                merged.options.insert(k.clone(), v.clone());
            }
            merged.files.extend(profile.files.iter().cloned());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_applies_default_then_named_profiles() {
        let json = r#"{
            "default": {"options": {"follow": true}, "files": ["/var/log/a.log"]},
            "prod": {"options": {"follow": false}, "files": ["/var/log/b.log"]}
        }"#;
        let config: ProfileConfig = serde_json::from_str(json).unwrap();
        let merged = merge(&config, &["prod".to_string()]);
        assert_eq!(merged.options.get("follow"), Some(&serde_json::Value::Bool(false)));
        assert_eq!(merged.files, vec!["/var/log/a.log", "/var/log/b.log"]);
    }
}
