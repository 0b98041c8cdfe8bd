use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::authorship::attribution_tracker::{AttributionConfig, DEFAULT_MAX_ALIGNMENT_CELLS};

const ENV_PREFIX: &str = "GIT_BLAMEBOT_";

/// Centralized configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    git_path: String,
    max_alignment_cells: usize,
}

/// `~/.git-blamebot/config.json`
#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    git_path: Option<String>,
    #[serde(default)]
    max_alignment_cells: Option<usize>,
}

/// `GIT_BLAMEBOT_*` environment overrides
#[derive(Deserialize, Default)]
struct EnvConfig {
    #[serde(default)]
    git_path: Option<String>,
    #[serde(default)]
    max_alignment_cells: Option<usize>,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Access the global configuration. Lazily initializes if not already initialized.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(build_config)
    }

    /// Returns the command to invoke git.
    pub fn git_cmd(&self) -> &str {
        &self.git_path
    }

    pub fn max_alignment_cells(&self) -> usize {
        self.max_alignment_cells
    }

    pub fn attribution_config(&self) -> AttributionConfig {
        AttributionConfig {
            max_alignment_cells: self.max_alignment_cells,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            git_path: "git".to_string(),
            max_alignment_cells: DEFAULT_MAX_ALIGNMENT_CELLS,
        }
    }
}

fn build_config() -> Config {
    let file_cfg = load_file_config();
    let env_cfg = load_env_config();
    config_from_sources(file_cfg, env_cfg)
}

/// Environment overrides the file; anything unset or invalid keeps its default.
fn config_from_sources(file_cfg: Option<FileConfig>, env_cfg: Option<EnvConfig>) -> Config {
    let file_cfg = file_cfg.unwrap_or_default();
    let env_cfg = env_cfg.unwrap_or_default();

    let max_alignment_cells = env_cfg
        .max_alignment_cells
        .or(file_cfg.max_alignment_cells)
        .filter(|cells| *cells > 0)
        .unwrap_or(DEFAULT_MAX_ALIGNMENT_CELLS);

    let configured_git = env_cfg
        .git_path
        .or(file_cfg.git_path)
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty());

    Config {
        git_path: resolve_git_path(configured_git),
        max_alignment_cells,
    }
}

fn resolve_git_path(configured: Option<String>) -> String {
    // 1) From config file or environment
    if let Some(path) = configured {
        if is_executable(Path::new(&path)) {
            return path;
        }
        eprintln!(
            "Warning: configured git_path '{}' does not exist, falling back to defaults",
            path
        );
    }

    // 2) Probe common locations across platforms
    let candidates: &[&str] = &[
        "/opt/homebrew/bin/git",
        "/usr/local/bin/git",
        "/usr/bin/git",
        "/bin/git",
        r"C:\\Program Files\\Git\\bin\\git.exe",
        r"C:\\Program Files (x86)\\Git\\bin\\git.exe",
    ];

    if let Some(found) = candidates.iter().map(Path::new).find(|p| is_executable(p)) {
        return found.to_string_lossy().to_string();
    }

    // 3) Let PATH lookup decide
    "git".to_string()
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_file_path()?;
    let data = fs::read(&path).ok()?;
    serde_json::from_slice::<FileConfig>(&data).ok()
}

fn load_env_config() -> Option<EnvConfig> {
    envy::prefixed(ENV_PREFIX).from_env::<EnvConfig>().ok()
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".git-blamebot").join("config.json"))
}

fn is_executable(path: &Path) -> bool {
    path.exists() && path.is_file()
}
