use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

/// Settings stored alongside the project in `.obra/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub items: ItemsConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub reopen: ReopenConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overhead index (percent) given to new projects.
    #[serde(default = "default_overhead_index")]
    pub default_overhead_index: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_overhead_index: default_overhead_index(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsConfig {
    #[serde(default = "default_unit")]
    pub default_unit: String,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            default_unit: default_unit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Category for ledger entries created without one.
    #[serde(default = "default_ledger_category")]
    pub default_category: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_category: default_ledger_category(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenConfig {
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for ReopenConfig {
    fn default() -> Self {
        Self {
            require_confirmation: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `.obra/config.toml` under `project_root`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".obra/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/obra/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("obra/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config, and environment.
///
/// # Errors
///
/// Propagates load errors from either config file.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Pick the output mode: `--json` flag, then `FORMAT`, then user config,
/// then `pretty` on a terminal and `text` otherwise.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_overhead_index() -> f64 {
    0.0
}

fn default_unit() -> String {
    "un".to_string()
}

fn default_ledger_category() -> String {
    "Materials".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg, ProjectConfig::default());
        assert_eq!(cfg.engine.default_overhead_index, 0.0);
        assert_eq!(cfg.items.default_unit, "un");
        assert_eq!(cfg.ledger.default_category, "Materials");
        assert!(cfg.reopen.require_confirmation);
    }

    #[test]
    fn partial_project_config_fills_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".obra")).expect("create .obra");
        std::fs::write(
            root.path().join(".obra/config.toml"),
            "[engine]\ndefault_overhead_index = 25.5\n\n[ledger]\ndefault_category = \"Services\"\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.engine.default_overhead_index, 25.5);
        assert_eq!(cfg.ledger.default_category, "Services");
        assert_eq!(cfg.items.default_unit, "un");
        assert!(cfg.reopen.require_confirmation);
    }

    #[test]
    fn malformed_project_config_names_the_file() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".obra")).expect("create .obra");
        std::fs::write(root.path().join(".obra/config.toml"), "[engine\n").expect("write config");

        let err = load_project_config(root.path()).expect_err("parse must fail");
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("text".to_string()));
        assert_eq!(output, "text");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let pretty = resolve_output(false, Some("table".to_string()), Some("human".to_string()));
        assert_eq!(pretty, "pretty");

        let text = resolve_output(false, Some("human".to_string()), Some("table".to_string()));
        assert_eq!(text, "text");
    }

    #[test]
    fn unknown_env_value_falls_through_to_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("yaml".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
