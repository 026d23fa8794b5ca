//! Error type shared by every module of the crate.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while driving the terminal or the repository.
#[derive(Debug, Error)]
pub enum Error {
    /// The controlling terminal could not be configured or queried.
    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),

    /// The underlying git library reported a failure.
    #[error("git: {0}")]
    Git(#[from] git2::Error),

    /// A sub-process could not be started.
    #[error("failed to run `{program} {args}`: {source}")]
    Spawn {
        program: String,
        args: String,
        #[source]
        source: io::Error,
    },

    /// A sub-process ran but exited unsuccessfully.
    #[error("`{program} {args}` exited with {status}")]
    Command {
        program: String,
        args: String,
        status: ExitStatus,
    },

    /// A frame line handed to the writer contained `\r` or `\n`.
    #[error("frame lines must not contain line breaks")]
    LineBreak,

    /// Refused to delete the branch HEAD points at.
    #[error("branch `{0}` is checked out")]
    CurrentBranch(String),

    /// Refused a non-forced delete of a branch not merged into HEAD.
    #[error("branch `{0}` is not fully merged")]
    Unmerged(String),

    /// The repository has no working directory.
    #[error("repository has no working directory")]
    Bare,

    #[error(transparent)]
    Io(#[from] io::Error),
}
