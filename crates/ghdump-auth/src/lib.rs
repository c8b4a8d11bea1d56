use ghdump_core::config::DumpConfig;
use ghdump_core::error::DumpError;

/// Keychain service under which a token may be stored.
pub const KEYRING_SERVICE: &str = "gh-dump";

/// Keychain entry holding the GitHub token.
pub const KEYRING_ENTRY: &str = "github";

/// Source of the API access token.
///
/// An empty token is valid and means the listing is made unauthenticated.
pub trait CredentialProvider: Send + Sync {
    /// Resolve the token.
    fn token(&self) -> Result<String, DumpError>;

    /// Short label for log output.
    fn describe(&self) -> &'static str;
}

/// Reads the token from an environment variable.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// True when the variable is set, even to an empty string.
    pub fn is_present(&self) -> bool {
        std::env::var_os(&self.var).is_some()
    }
}

impl CredentialProvider for EnvCredentials {
    fn token(&self) -> Result<String, DumpError> {
        std::env::var(&self.var).map_err(|e| DumpError::CredentialError {
            message: format!("{}: {e}", self.var),
        })
    }

    fn describe(&self) -> &'static str {
        "environment"
    }
}

/// OS keychain-backed token lookup using the `keyring` crate.
pub struct KeyringCredentials {
    service: String,
    entry: String,
}

impl KeyringCredentials {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            entry: KEYRING_ENTRY.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, DumpError> {
        keyring::Entry::new(&self.service, &self.entry).map_err(|e| DumpError::CredentialError {
            message: e.to_string(),
        })
    }

    /// Look the token up, returning `None` when nothing is stored.
    pub fn lookup(&self) -> Result<Option<String>, DumpError> {
        match self.entry()?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(DumpError::CredentialError {
                message: e.to_string(),
            }),
        }
    }
}

impl Default for KeyringCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for KeyringCredentials {
    fn token(&self) -> Result<String, DumpError> {
        self.lookup()?.ok_or_else(|| DumpError::CredentialError {
            message: format!("no token stored in keychain for {}/{}", self.service, self.entry),
        })
    }

    fn describe(&self) -> &'static str {
        "keychain"
    }
}

/// Asks for the token on the terminal with hidden input.
pub struct PromptCredentials {
    prompt: String,
}

impl PromptCredentials {
    pub fn new(var: &str) -> Self {
        Self {
            prompt: format!("`{var}` not found in environment, enter your access token"),
        }
    }
}

impl CredentialProvider for PromptCredentials {
    fn token(&self) -> Result<String, DumpError> {
        let token = dialoguer::Password::new()
            .with_prompt(&self.prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| DumpError::CredentialError {
                message: format!("failed to read token: {e}"),
            })?;
        Ok(token.trim().to_string())
    }

    fn describe(&self) -> &'static str {
        "prompt"
    }
}

/// Fixed token, for tests and embedding.
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// No token: requests go out unauthenticated.
    pub fn anonymous() -> Self {
        Self::new("")
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Result<String, DumpError> {
        Ok(self.token.clone())
    }

    fn describe(&self) -> &'static str {
        "static"
    }
}

/// Pick the credential source once at startup.
///
/// Order: environment variable, then the keychain when `use_keyring` is
/// set and an entry exists, then an interactive prompt.
pub fn select_provider(config: &DumpConfig) -> Box<dyn CredentialProvider> {
    let env = EnvCredentials::new(&config.token_env_var);
    if env.is_present() {
        tracing::debug!("using token from ${}", config.token_env_var);
        return Box::new(env);
    }

    if config.use_keyring {
        let keyring = KeyringCredentials::new();
        match keyring.lookup() {
            Ok(Some(_)) => {
                tracing::debug!("using token from OS keychain");
                return Box::new(keyring);
            }
            Ok(None) => tracing::debug!("no token in OS keychain"),
            Err(e) => tracing::warn!("keychain unavailable: {e}"),
        }
    }

    Box::new(PromptCredentials::new(&config.token_env_var))
}
