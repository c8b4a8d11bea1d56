use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::process::Child;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use ghdump_core::config::DumpConfig;
use ghdump_core::error::DumpError;
use ghdump_core::models::clone::{CloneMode, CloneResult, CloneStatus};
use ghdump_core::models::repo::RepositoryRef;

use crate::git_ops::{self, GitClient};

/// One planned clone: a repository and the directory it will own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneJob {
    pub repo: RepositoryRef,
    pub dest_path: PathBuf,
}

/// Runs one clone process per repository and gathers every outcome.
pub struct CloneOrchestrator {
    git: GitClient,
    mode: CloneMode,
    max_concurrent: Option<usize>,
}

enum Launched {
    Running(JoinHandle<CloneResult>),
    Done(CloneResult),
}

struct Pending {
    job: CloneJob,
    started_at: DateTime<Utc>,
    launched: Launched,
}

impl CloneOrchestrator {
    pub fn new(git: GitClient, mode: CloneMode) -> Self {
        Self {
            git,
            mode,
            max_concurrent: None,
        }
    }

    /// Cap the number of live clone processes. `None` starts all at once.
    pub fn with_max_concurrent(mut self, cap: Option<usize>) -> Self {
        self.max_concurrent = cap.map(|n| n.max(1));
        self
    }

    pub fn from_config(config: &DumpConfig) -> Self {
        Self::new(GitClient::from_config(config), config.clone_mode)
            .with_max_concurrent(config.max_concurrent_clones)
    }

    /// Clone every repository into `dest_root/<name>`.
    ///
    /// Returns one result per repository, in input order. A failed clone
    /// is reported in its result; only an unplannable batch is an error.
    pub async fn clone_all(
        &self,
        repos: &[RepositoryRef],
        dest_root: &Path,
    ) -> Result<Vec<CloneResult>, DumpError> {
        if repos.is_empty() {
            tracing::info!("no repositories to clone");
            return Ok(Vec::new());
        }

        let jobs = plan_jobs(repos, dest_root)?;
        tracing::info!(
            "cloning {} repositories into {} ({} mode, {})",
            jobs.len(),
            dest_root.display(),
            self.mode,
            match self.max_concurrent {
                Some(n) => format!("at most {n} at a time"),
                None => "all at once".to_string(),
            }
        );

        let pending: Vec<Pending> = match self.max_concurrent {
            None => jobs.into_iter().map(|job| self.launch(job)).collect(),
            Some(cap) => {
                let semaphore = Arc::new(Semaphore::new(cap));
                jobs.into_iter()
                    .map(|job| self.launch_gated(job, semaphore.clone()))
                    .collect()
            }
        };

        let mut results = Vec::with_capacity(pending.len());
        for p in pending {
            let result = match p.launched {
                Launched::Done(result) => result,
                Launched::Running(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        failed_result(&p.job, p.started_at, format!("clone task failed: {e}"))
                    }
                },
            };

            if result.is_success() {
                tracing::info!("{}: cloned", result.name);
            } else {
                tracing::warn!(
                    "{}: {}{}",
                    result.name,
                    result.status,
                    result
                        .stderr_tail
                        .as_deref()
                        .map(|t| format!(" ({t})"))
                        .unwrap_or_default()
                );
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Start the child right away; a waiter task collects its exit.
    fn launch(&self, job: CloneJob) -> Pending {
        let started_at = Utc::now();
        let launched = match self.spawn(&job) {
            Ok(child) => {
                Launched::Running(tokio::spawn(wait_child(job.clone(), child, started_at)))
            }
            Err(e) => Launched::Done(failed_result(&job, started_at, e.to_string())),
        };
        Pending {
            job,
            started_at,
            launched,
        }
    }

    /// Start the child once a permit is free; the permit is held until it exits.
    fn launch_gated(&self, job: CloneJob, semaphore: Arc<Semaphore>) -> Pending {
        let git = self.git.clone();
        let mode = self.mode;
        let task_job = job.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let started_at = Utc::now();
            match spawn_clone(&git, mode, &task_job) {
                Ok(child) => wait_child(task_job, child, started_at).await,
                Err(e) => failed_result(&task_job, started_at, e.to_string()),
            }
        });
        Pending {
            job,
            started_at: Utc::now(),
            launched: Launched::Running(handle),
        }
    }

    fn spawn(&self, job: &CloneJob) -> std::io::Result<Child> {
        spawn_clone(&self.git, self.mode, job)
    }
}

fn spawn_clone(git: &GitClient, mode: CloneMode, job: &CloneJob) -> std::io::Result<Child> {
    tracing::debug!(
        "{}: {} clone {} -> {}",
        job.repo.name,
        git.program(),
        job.repo.clone_url,
        job.dest_path.display()
    );
    git.clone_command(&job.repo.clone_url, &job.dest_path, mode)
        .spawn()
        .map_err(|e| {
            tracing::error!("{}: could not start {}: {e}", job.repo.name, git.program());
            e
        })
}

async fn wait_child(job: CloneJob, child: Child, started_at: DateTime<Utc>) -> CloneResult {
    let (status, stderr_tail) = match child.wait_with_output().await {
        Ok(output) => (
            output
                .status
                .code()
                .map(CloneStatus::Exited)
                .unwrap_or(CloneStatus::Terminated),
            git_ops::stderr_tail(&output.stderr),
        ),
        Err(e) => (CloneStatus::LaunchFailed(format!("lost clone process: {e}")), None),
    };

    CloneResult {
        name: job.repo.name,
        dest_path: job.dest_path,
        status,
        stderr_tail,
        started_at,
        finished_at: Utc::now(),
    }
}

fn failed_result(job: &CloneJob, started_at: DateTime<Utc>, reason: String) -> CloneResult {
    CloneResult {
        name: job.repo.name.clone(),
        dest_path: job.dest_path.clone(),
        status: CloneStatus::LaunchFailed(reason),
        stderr_tail: None,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Map each repository to `dest_root/<name>`.
///
/// The whole batch is rejected if any name is not a single plain path
/// component or if two names would land in the same directory. Names are
/// compared case-insensitively so the check holds on case-insensitive
/// filesystems too.
pub fn plan_jobs(repos: &[RepositoryRef], dest_root: &Path) -> Result<Vec<CloneJob>, DumpError> {
    let mut seen = HashSet::new();
    for repo in repos {
        validate_name(&repo.name)?;
        if repo.clone_url.is_empty() {
            return Err(DumpError::InvalidBatch {
                message: format!("repository {} has no clone URL", repo.name),
            });
        }
        if !seen.insert(repo.name.to_lowercase()) {
            return Err(DumpError::InvalidBatch {
                message: format!(
                    "more than one repository maps to {}",
                    dest_root.join(&repo.name).display()
                ),
            });
        }
    }

    Ok(repos
        .iter()
        .map(|repo| CloneJob {
            repo: repo.clone(),
            dest_path: dest_root.join(&repo.name),
        })
        .collect())
}

fn validate_name(name: &str) -> Result<(), DumpError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(DumpError::InvalidBatch {
            message: format!("repository name {name:?} is not a valid directory name"),
        });
    }
    Ok(())
}
