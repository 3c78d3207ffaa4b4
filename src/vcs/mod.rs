//! Revision lookup.
//!
//! [`RevisionSource`] fetches a file's bytes as of a historical revision.
//! [`Git`] implements it with the `git` executable, run from the file's
//! directory so relative paths resolve inside the right repository.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::process;

/// Something that can produce a tracked file's content at a revision.
pub trait RevisionSource {
    fn content_at(&self, path: &Path, revision: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    binary: PathBuf,
}

impl Git {
    pub const TOOL: &'static str = "git";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command.current_dir(dir);
        command
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new(Self::TOOL)
    }
}

impl RevisionSource for Git {
    fn content_at(&self, path: &Path, revision: &str) -> Result<Vec<u8>> {
        let name = path.file_name().ok_or_else(|| {
            Error::EnvironmentPrecondition(format!("{} does not name a file", path.display()))
        })?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut toplevel = self.command(dir);
        toplevel.args(["rev-parse", "--show-toplevel"]);
        process::run(Self::TOOL, &mut toplevel, &[0]).map_err(|err| match err {
            Error::ProcessFailure { .. } => Error::EnvironmentPrecondition(format!(
                "{} is not inside a git repository",
                path.display()
            )),
            other => other,
        })?;

        let mut tracked = self.command(dir);
        tracked
            .args(["ls-files", "--error-unmatch", "--"])
            .arg(name);
        process::run(Self::TOOL, &mut tracked, &[0]).map_err(|err| match err {
            Error::ProcessFailure { .. } => Error::EnvironmentPrecondition(format!(
                "{} is not tracked by git",
                path.display()
            )),
            other => other,
        })?;

        let mut object = std::ffi::OsString::from(format!("{revision}:./"));
        object.push(name);
        let mut show = self.command(dir);
        show.arg("show").arg(object);
        let output = process::run(Self::TOOL, &mut show, &[0])?;
        debug!(
            path = %path.display(),
            revision,
            bytes = output.stdout.len(),
            "fetched revision content"
        );
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_without_file_name_is_rejected() {
        let err = Git::default().content_at(Path::new("/"), "HEAD").unwrap_err();
        assert!(matches!(err, Error::EnvironmentPrecondition(_)));
    }

    #[test]
    fn test_missing_git_binary_is_environment_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int x;\n").unwrap();
        let err = Git::new("fmtpatch-no-such-git-77aa")
            .content_at(&path, "HEAD")
            .unwrap_err();
        assert!(matches!(err, Error::EnvironmentPrecondition(_)));
    }
}
