use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How each repository is cloned into the dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneMode {
    /// `git clone --mirror`: a bare repository with every ref.
    #[default]
    Mirror,
    /// A regular working-tree clone.
    Checkout,
}

impl std::fmt::Display for CloneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloneMode::Mirror => write!(f, "mirror"),
            CloneMode::Checkout => write!(f, "checkout"),
        }
    }
}

impl std::str::FromStr for CloneMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mirror" => Ok(CloneMode::Mirror),
            "checkout" | "working-tree" | "working_tree" => Ok(CloneMode::Checkout),
            _ => Err(format!("unknown clone mode: {s}")),
        }
    }
}

/// How a single clone process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneStatus {
    /// The client exited with this code.
    Exited(i32),
    /// The client was killed by a signal and has no exit code.
    Terminated,
    /// The client could not be started at all.
    LaunchFailed(String),
}

impl std::fmt::Display for CloneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloneStatus::Exited(0) => write!(f, "ok"),
            CloneStatus::Exited(code) => write!(f, "exit {code}"),
            CloneStatus::Terminated => write!(f, "terminated"),
            CloneStatus::LaunchFailed(reason) => write!(f, "launch failed: {reason}"),
        }
    }
}

/// Outcome of cloning one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneResult {
    pub name: String,
    pub dest_path: PathBuf,
    pub status: CloneStatus,
    /// Last non-empty line the client wrote to stderr, if any.
    pub stderr_tail: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CloneResult {
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            CloneStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CloneStatus::Exited(0)
    }
}

/// Final accounting of one dump run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpReport {
    pub destination: PathBuf,
    pub results: Vec<CloneResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DumpReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &CloneResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CloneResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}
