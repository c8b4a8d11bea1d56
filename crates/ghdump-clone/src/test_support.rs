use ghdump_core::models::repo::RepositoryRef;

use crate::git_ops::GitClient;

/// Stand-in for `git clone`: fails like a missing remote for URLs under
/// `git@host:broken`, otherwise creates the destination directory.
pub const FAKE_GIT: &str = r#"
for last in "$@"; do :; done
for arg in "$@"; do
  case "$arg" in
    git@host:broken*)
      echo "Cloning into bare repository '$last'..." >&2
      echo "fatal: Could not read from remote repository." >&2
      exit 128 ;;
  esac
done
mkdir "$last"
"#;

pub fn fake_git() -> GitClient {
    GitClient::new("sh").with_base_args(vec![
        "-c".to_string(),
        FAKE_GIT.to_string(),
        "fake-git".to_string(),
    ])
}

pub fn repo(name: &str) -> RepositoryRef {
    RepositoryRef::new(name, format!("git@host:{name}.git"))
}
