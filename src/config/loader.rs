//! Multi-source config loading.
//!
//! Priority, lowest first:
//! 1. built-in defaults
//! 2. user config (`<config dir>/autocov/config.yaml`)
//! 3. project config (`<project root>/autocov.yaml`)
//! 4. an explicit `--config` file
//! 5. `AUTOCOV_*` environment variables
//!
//! YAML layers are deep-merged, so a project file only needs the keys it
//! changes.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use super::schema::{DashboardConfig, Secret};
use crate::error::{CoverageError, Result};

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "autocov.yaml";

/// File name inside the per-user config directory.
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Load the effective configuration.
///
/// A missing explicit file is an error; missing user or project files are
/// skipped.
pub fn load_config(explicit: Option<&Path>, project_root: Option<&Path>) -> Result<DashboardConfig> {
    let mut layers = Vec::new();
    if let Some(dirs) = directories::ProjectDirs::from("io", "autocov", "autocov") {
        layers.push(dirs.config_dir().join(USER_CONFIG_FILE));
    }
    if let Some(root) = project_root {
        layers.push(root.join(PROJECT_CONFIG_FILE));
    }

    let mut config = load_layers(&layers, explicit)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Merge the YAML files in `layers` (skipping absent ones) and then
/// `explicit`, which must exist.
pub fn load_layers(layers: &[PathBuf], explicit: Option<&Path>) -> Result<DashboardConfig> {
    let mut merged = Value::Mapping(Mapping::new());

    for path in layers {
        if path.is_file() {
            tracing::debug!("loading config layer {}", path.display());
            merge_values(&mut merged, read_yaml(path)?);
        }
    }

    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(CoverageError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        merge_values(&mut merged, read_yaml(path)?);
    }

    Ok(serde_yaml::from_value(merged)?)
}

fn read_yaml(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|e| {
        CoverageError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    // An empty file parses as null; treat it as "no overrides".
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    })
}

/// Recursively merge `overlay` into `base`. Mappings merge key by key;
/// every other value in `overlay` replaces the one in `base`.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply `AUTOCOV_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut DashboardConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get("AUTOCOV_BASE_URL") {
        config.upstream.base_url = Some(url);
    }
    if let Some(id) = get("AUTOCOV_PROJECT_ID") {
        config.upstream.project_id = parse_id("AUTOCOV_PROJECT_ID", &id)?;
    }
    if let Some(id) = get("AUTOCOV_SUITE_ID") {
        config.upstream.suite_id = Some(parse_id("AUTOCOV_SUITE_ID", &id)?);
    }
    if let Some(user) = get("AUTOCOV_USER") {
        config.upstream.user = Some(user);
    }
    if let Some(key) = get("AUTOCOV_API_KEY") {
        config.upstream.api_key = Some(Secret::new(key));
    }
    if let Some(bind) = get("AUTOCOV_BIND") {
        config.server.bind = bind;
    }
    Ok(())
}

fn parse_id(var: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| CoverageError::config(format!("{var} must be an integer, got {raw:?}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::ClosureMode;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn no_layers_gives_defaults() {
        let config = load_layers(&[], None).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3001");
        assert_eq!(config.upstream.base_url, None);
    }

    #[test]
    fn missing_layers_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = load_layers(&[dir.path().join("absent.yaml")], None).unwrap();
        assert_eq!(config.upstream.page_size, 250);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = load_layers(&[], Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, CoverageError::Config(_)));
    }

    #[test]
    fn later_layers_override_nested_keys_only() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.yaml",
            "upstream:\n  base_url: https://user.example\n  project_id: 3\nserver:\n  cors_origin: https://dash.example\n",
        );
        let project = write(&dir, "project.yaml", "upstream:\n  project_id: 9\n");
        let explicit = write(&dir, "explicit.yaml", "aggregation:\n  mode: strict\n");

        let config = load_layers(&[user, project], Some(&explicit)).unwrap();
        assert_eq!(config.upstream.base_url.as_deref(), Some("https://user.example"));
        assert_eq!(config.upstream.project_id, 9);
        assert_eq!(config.server.cors_origin, "https://dash.example");
        assert_eq!(config.aggregation.mode, ClosureMode::Strict);
    }

    #[test]
    fn empty_file_is_treated_as_no_overrides() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.yaml", "");
        let config = load_layers(&[empty], None).unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.yaml", "upstream: [unclosed");
        let err = load_layers(&[bad], None).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"), "got {err}");
    }

    #[test]
    fn env_overrides_apply_last() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AUTOCOV_BASE_URL", "https://env.example"),
            ("AUTOCOV_PROJECT_ID", "42"),
            ("AUTOCOV_SUITE_ID", "7"),
            ("AUTOCOV_USER", "qa@example.com"),
            ("AUTOCOV_API_KEY", "k3y"),
            ("AUTOCOV_BIND", "0.0.0.0:8080"),
        ]);
        let mut config = DashboardConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.upstream.base_url.as_deref(), Some("https://env.example"));
        assert_eq!(config.upstream.project_id, 42);
        assert_eq!(config.upstream.suite_id, Some(7));
        assert_eq!(config.upstream.user.as_deref(), Some("qa@example.com"));
        assert_eq!(config.upstream.api_key.as_ref().map(Secret::expose), Some("k3y"));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = DashboardConfig::default();
        apply_env_overrides(&mut config, |_| Some("   ".to_string())).unwrap();
        assert_eq!(config.upstream.base_url, None);
        assert_eq!(config.upstream.project_id, 1);
    }

    #[test]
    fn non_numeric_project_id_is_rejected() {
        let mut config = DashboardConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "AUTOCOV_PROJECT_ID").then(|| "abc".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("AUTOCOV_PROJECT_ID"));
    }
}
