use serde::{Deserialize, Serialize};

/// A repository locator as returned by the hosting API.
///
/// Names are unique within one listing, so the name doubles as the
/// repository's identity and as its directory name inside the dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    pub clone_url: String,
}

impl RepositoryRef {
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
        }
    }
}

/// Which of the API's URL fields to clone from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlProtocol {
    #[default]
    Ssh,
    Https,
}

impl std::fmt::Display for UrlProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlProtocol::Ssh => write!(f, "ssh"),
            UrlProtocol::Https => write!(f, "https"),
        }
    }
}

impl std::str::FromStr for UrlProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssh" => Ok(UrlProtocol::Ssh),
            "https" | "http" => Ok(UrlProtocol::Https),
            _ => Err(format!("unknown protocol: {s}")),
        }
    }
}
