use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DumpError;
use crate::models::clone::CloneMode;
use crate::models::repo::UrlProtocol;

/// Name of the folder created under the dump root.
pub const DUMP_DIR_NAME: &str = "gh-dump";

/// Environment variable consulted for the API token.
pub const DEFAULT_TOKEN_ENV_VAR: &str = "GITHUB_API_TOKEN";

/// gh-dump configuration, stored at `~/.ghdump/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_url")]
    pub api_url: url::Url,

    /// Mirror or working-tree clones.
    #[serde(default)]
    pub clone_mode: CloneMode,

    /// Which clone URL to use from the listing.
    #[serde(default)]
    pub protocol: UrlProtocol,

    /// Maximum concurrent clone processes. Unset means one process per repo.
    #[serde(default)]
    pub max_concurrent_clones: Option<usize>,

    /// Page size for the repository listing.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Stop listing after this many pages.
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Version-control client to execute.
    #[serde(default = "default_git_program")]
    pub git_program: String,

    /// Extra arguments placed before `clone`, e.g. `["-c", "core.askPass=true"]`.
    #[serde(default)]
    pub git_args: Vec<String>,

    /// Environment variable holding the API token.
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,

    /// Look the token up in the OS keychain before prompting.
    #[serde(default)]
    pub use_keyring: bool,
}

fn default_api_url() -> url::Url {
    url::Url::parse("https://api.github.com").expect("static URL is valid")
}

fn default_per_page() -> u32 {
    100
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_token_env_var() -> String {
    DEFAULT_TOKEN_ENV_VAR.to_string()
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            clone_mode: CloneMode::Mirror,
            protocol: UrlProtocol::Ssh,
            max_concurrent_clones: None,
            per_page: default_per_page(),
            max_pages: None,
            git_program: default_git_program(),
            git_args: Vec::new(),
            token_env_var: default_token_env_var(),
            use_keyring: false,
        }
    }
}

impl DumpConfig {
    /// Returns the gh-dump home directory (`~/.ghdump/`).
    pub fn home_dir() -> Result<PathBuf, DumpError> {
        let base = dirs::home_dir().ok_or_else(|| DumpError::Config {
            message: "could not determine home directory".into(),
        })?;
        Ok(base.join(".ghdump"))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Result<PathBuf, DumpError> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Default parent of the dump folder: the invoking user's home.
    pub fn default_dump_root() -> Result<PathBuf, DumpError> {
        dirs::home_dir().ok_or_else(|| DumpError::Config {
            message: "could not determine home directory; pass --dump-root".into(),
        })
    }

    /// Load config from the default location, or return defaults if not found.
    pub fn load() -> Result<Self, DumpError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, DumpError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| DumpError::Serialization(e.to_string()))?;
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), DumpError> {
        if self.per_page == 0 || self.per_page > 100 {
            return Err(DumpError::Config {
                message: format!("per_page must be between 1 and 100, got {}", self.per_page),
            });
        }
        if self.max_concurrent_clones == Some(0) {
            return Err(DumpError::Config {
                message: "max_concurrent_clones must be at least 1".into(),
            });
        }
        if self.max_pages == Some(0) {
            return Err(DumpError::Config {
                message: "max_pages must be at least 1".into(),
            });
        }
        if self.git_program.trim().is_empty() {
            return Err(DumpError::Config {
                message: "git_program must not be empty".into(),
            });
        }
        Ok(())
    }
}
