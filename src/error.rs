// src/error.rs

use crate::model::CommitHash;
use thiserror::Error;

/// Which side of a merge failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    /// The current HEAD (the merge commit's first parent)
    Head,
    /// The ref being merged in (the second parent)
    Source,
}

impl std::fmt::Display for MergeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeSide::Head => write!(f, "HEAD"),
            MergeSide::Source => write!(f, "source"),
        }
    }
}

/// Errors raised while scripting a history against a [`crate::Repository`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Strict resolution of a branch that is unknown or was never committed to.
    #[error("unknown branch '{0}'")]
    MissingBranch(String),

    /// A commit ref whose hash is not in the commit store.
    #[error("unknown commit {0}")]
    UnknownCommit(CommitHash),

    /// Checkout of a branch that does not exist, without asking to create it.
    #[error("no branch with name '{0}'")]
    NoSuchBranch(String),

    #[error("cannot merge: {side} '{reference}' does not resolve to a commit")]
    MergeTargetMissing { side: MergeSide, reference: String },
}

/// Errors raised while laying out or painting a diagram.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The layout produced an edge whose endpoint is not in the commit map.
    #[error("layout produced a dangling edge {from} -> {to}")]
    DanglingEdge { from: CommitHash, to: CommitHash },

    #[error("nothing to render: the layout contains no commits")]
    EmptyLayout,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors raised while reading render settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid color '{0}', expected a hex value such as #fbb4ae")]
    InvalidColor(String),

    #[error("the palette must contain at least one color")]
    EmptyPalette,

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while loading or replaying a diagram script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid diagram book: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("diagram '{diagram}', step {step}: {source}")]
    Step {
        diagram: String,
        step: String,
        #[source]
        source: GraphError,
    },

    #[error("duplicate diagram name '{0}'")]
    DuplicateDiagram(String),
}
