use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use ghdump_core::config::DumpConfig;
use ghdump_core::models::clone::CloneMode;
use tokio::process::Command;

/// The version-control client used for clones.
///
/// Commands are built as argument vectors and executed directly, never
/// through a shell, so repository names and URLs are not interpreted.
#[derive(Debug, Clone)]
pub struct GitClient {
    program: String,
    base_args: Vec<String>,
}

impl GitClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments inserted before the subcommand.
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    pub fn from_config(config: &DumpConfig) -> Self {
        Self::new(config.git_program.clone()).with_base_args(config.git_args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for cloning `url` into `dest`.
    ///
    /// `dest` is passed through as an `OsStr` so non-UTF-8 paths reach the
    /// client unchanged.
    pub fn clone_args(&self, url: &str, dest: &Path, mode: CloneMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.base_args.iter().map(OsString::from).collect();
        args.push("clone".into());
        if mode == CloneMode::Mirror {
            args.push("--mirror".into());
        }
        // Keeps a URL starting with `-` from being read as an option.
        args.push("--".into());
        args.push(url.into());
        args.push(dest.as_os_str().to_os_string());
        args
    }

    /// A ready-to-spawn clone command.
    ///
    /// stdin is closed and terminal prompts are disabled so a private
    /// repository fails instead of waiting for input. stderr is piped so
    /// the caller can report why a clone failed.
    pub fn clone_command(&self, url: &str, dest: &Path, mode: CloneMode) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.clone_args(url, dest, mode))
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new("git")
    }
}

/// Last non-empty line of a process's stderr.
pub fn stderr_tail(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_args() {
        let git = GitClient::default();
        let args = git.clone_args("git@host:x.git", Path::new("/dump/x"), CloneMode::Mirror);
        assert_eq!(args, ["clone", "--mirror", "--", "git@host:x.git", "/dump/x"]);
    }

    #[test]
    fn test_checkout_args_with_base_args() {
        let git = GitClient::new("git")
            .with_base_args(vec!["-c".into(), "core.askPass=true".into()]);
        let args =
            git.clone_args("https://host/x.git", Path::new("/dump/x"), CloneMode::Checkout);
        assert_eq!(
            args,
            ["-c", "core.askPass=true", "clone", "--", "https://host/x.git", "/dump/x"]
        );
    }

    #[test]
    fn test_hostile_url_stays_one_argument() {
        let git = GitClient::default();
        let url = "git@host:x.git; rm -rf ~";
        let args = git.clone_args(url, Path::new("/dump/x"), CloneMode::Mirror);
        assert!(args.iter().any(|a| a == url));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_dest_is_passed_verbatim() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dest = Path::new(OsStr::from_bytes(b"/dump\xff/x"));
        let args = GitClient::default().clone_args("git@host:x.git", dest, CloneMode::Mirror);
        assert_eq!(args.last().map(OsString::as_os_str), Some(dest.as_os_str()));
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(
            stderr_tail(b"Cloning into bare repository 'x'...\nfatal: repository not found\n\n"),
            Some("fatal: repository not found".to_string())
        );
        assert_eq!(stderr_tail(b"  \n"), None);
    }
}
