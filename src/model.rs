// src/model.rs

use crate::error::GraphError;
use crate::repository::Repository;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters shown for a commit in labels.
pub const SHORT_HASH_LEN: usize = 7;

/// Content-derived identity of a commit (SHA-256)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The abbreviated form used in labels, e.g. `3fa94c1`.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_HASH_LEN);
        hex
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A single node of the history. Never mutated once created; its hash is
/// computed with [`hash_commit`] rather than stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub description: String,
    /// Creation-order counter, only used for vertical ordering
    pub timestamp: u64,
    /// First parent is the mainline, any further parents were merged in
    pub parents: Vec<CommitRef>,
}

impl Commit {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Digest of the full commit content. Identical content yields an identical hash.
pub fn hash_commit(commit: &Commit) -> CommitHash {
    let parents: Vec<String> = commit.parents.iter().map(|p| p.hash.to_hex()).collect();
    // serde_json sorts object keys, so the encoding is canonical
    let canonical = json!({
        "description": commit.description,
        "timestamp": commit.timestamp,
        "parents": parents,
    })
    .to_string();
    CommitHash(Sha256::digest(canonical.as_bytes()).into())
}

/// Immutable handle to a commit by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitRef {
    pub hash: CommitHash,
}

impl CommitRef {
    pub fn from_commit(commit: &Commit) -> Self {
        Self {
            hash: hash_commit(commit),
        }
    }

    /// A commit ref always resolves to itself.
    pub fn resolve(&self) -> CommitRef {
        *self
    }

    pub fn describe(&self) -> String {
        self.hash.short()
    }
}

/// A named, movable pointer. Resolution goes through the repository's
/// current branch table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchRef {
    pub name: String,
}

impl BranchRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn resolve(&self, repo: &Repository) -> Result<CommitRef, GraphError> {
        repo.resolve_branch(&self.name)
    }

    pub fn try_resolve(&self, repo: &Repository) -> Option<CommitRef> {
        repo.try_resolve_branch(&self.name)
    }

    pub fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Either a bare commit or a branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ref {
    Commit(CommitRef),
    Branch(BranchRef),
}

impl Ref {
    pub fn branch(name: impl Into<String>) -> Self {
        Ref::Branch(BranchRef::new(name))
    }

    pub fn resolve(&self, repo: &Repository) -> Result<CommitRef, GraphError> {
        match self {
            Ref::Commit(commit) => Ok(commit.resolve()),
            Ref::Branch(branch) => branch.resolve(repo),
        }
    }

    pub fn try_resolve(&self, repo: &Repository) -> Option<CommitRef> {
        match self {
            Ref::Commit(commit) => Some(commit.resolve()),
            Ref::Branch(branch) => branch.try_resolve(repo),
        }
    }

    /// Short label: the branch name, or the abbreviated hash.
    pub fn describe(&self) -> String {
        match self {
            Ref::Commit(commit) => commit.describe(),
            Ref::Branch(branch) => branch.describe(),
        }
    }

    pub fn as_branch(&self) -> Option<&BranchRef> {
        match self {
            Ref::Branch(branch) => Some(branch),
            Ref::Commit(_) => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Ref::Commit(_))
    }
}

impl From<&str> for Ref {
    fn from(name: &str) -> Self {
        Ref::branch(name)
    }
}

impl From<String> for Ref {
    fn from(name: String) -> Self {
        Ref::branch(name)
    }
}

impl From<&String> for Ref {
    fn from(name: &String) -> Self {
        Ref::branch(name.as_str())
    }
}

impl From<CommitRef> for Ref {
    fn from(commit: CommitRef) -> Self {
        Ref::Commit(commit)
    }
}

impl From<BranchRef> for Ref {
    fn from(branch: BranchRef) -> Self {
        Ref::Branch(branch)
    }
}

impl From<&Ref> for Ref {
    fn from(r: &Ref) -> Self {
        r.clone()
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
