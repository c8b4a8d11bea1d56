use std::path::PathBuf;

use chrono::Utc;

use ghdump_auth::CredentialProvider;
use ghdump_core::error::DumpError;
use ghdump_core::models::clone::DumpReport;
use ghdump_core::models::repo::RepositoryRef;
use ghdump_host::RepositoryLister;

use crate::destination;
use crate::orchestrator::CloneOrchestrator;

/// What to dump and where.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    pub account: String,
    /// Parent of the `gh-dump` folder.
    pub dump_root: PathBuf,
}

/// Run one dump.
///
/// Flow:
/// 1. Create `<dump_root>/gh-dump`, aborting if it exists
/// 2. Resolve the API token
/// 3. List the account's repositories
/// 4. Clone them all and collect the results
///
/// Steps 2 and 3 never run when step 1 fails. If they fail, the still
/// empty dump folder is removed again so the next run is not blocked.
pub async fn run_dump(
    request: &DumpRequest,
    credentials: &dyn CredentialProvider,
    lister: &dyn RepositoryLister,
    orchestrator: &CloneOrchestrator,
) -> Result<DumpReport, DumpError> {
    let started_at = Utc::now();
    let dest = destination::prepare(&request.dump_root)?;

    let repos = match fetch_repos(request, credentials, lister).await {
        Ok(repos) => repos,
        Err(e) => {
            destination::discard_if_empty(&dest);
            return Err(e);
        }
    };

    let results = match orchestrator.clone_all(&repos, &dest).await {
        Ok(results) => results,
        Err(e) => {
            destination::discard_if_empty(&dest);
            return Err(e);
        }
    };

    Ok(DumpReport {
        destination: dest,
        results,
        started_at,
        finished_at: Utc::now(),
    })
}

async fn fetch_repos(
    request: &DumpRequest,
    credentials: &dyn CredentialProvider,
    lister: &dyn RepositoryLister,
) -> Result<Vec<RepositoryRef>, DumpError> {
    tracing::debug!("resolving API token via {}", credentials.describe());
    let token = credentials.token()?;
    lister.list_repositories(&request.account, &token).await
}
