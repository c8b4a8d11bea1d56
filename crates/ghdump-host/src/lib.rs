pub mod github;

use async_trait::async_trait;
use ghdump_core::config::DumpConfig;
use ghdump_core::error::DumpError;
use ghdump_core::models::repo::{RepositoryRef, UrlProtocol};

/// Paging and URL selection for a listing.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub per_page: u32,
    /// `None` follows pages until a short one comes back.
    pub max_pages: Option<u32>,
    pub protocol: UrlProtocol,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_pages: None,
            protocol: UrlProtocol::Ssh,
        }
    }
}

impl From<&DumpConfig> for ListOptions {
    fn from(config: &DumpConfig) -> Self {
        Self {
            per_page: config.per_page,
            max_pages: config.max_pages,
            protocol: config.protocol,
        }
    }
}

/// Lists the repositories owned by one account.
#[async_trait]
pub trait RepositoryLister: Send + Sync {
    /// Fetch every repository of `account`, in API order.
    ///
    /// An empty `token` makes an unauthenticated request. Errors are never
    /// turned into a partial or empty list.
    async fn list_repositories(
        &self,
        account: &str,
        token: &str,
    ) -> Result<Vec<RepositoryRef>, DumpError>;
}

/// Create the lister described by the config.
pub fn create_lister(config: &DumpConfig) -> Result<Box<dyn RepositoryLister>, DumpError> {
    Ok(Box::new(github::GitHubLister::new(
        config.api_url.clone(),
        ListOptions::from(config),
    )?))
}

/// Reject account names that are empty or would alter the request path.
pub fn validate_account(account: &str) -> Result<(), DumpError> {
    let bad = account.is_empty()
        || account
            .chars()
            .any(|c| c == '/' || c == '?' || c == '#' || c == '%' || c.is_whitespace());
    if bad {
        return Err(DumpError::InvalidAccount {
            account: account.to_string(),
        });
    }
    Ok(())
}
