// src/repository.rs

use crate::error::{GraphError, MergeSide};
use crate::model::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Branch checked out by a fresh repository.
pub const DEFAULT_BRANCH: &str = "master";

/// Options for [`Repository::checkout_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutOptions {
    /// Create the branch at the current HEAD if it does not exist yet
    pub create_branch: bool,
}

impl CheckoutOptions {
    pub fn create() -> Self {
        Self { create_branch: true }
    }
}

/// A branch entry. `tip` is `None` only for a branch created before any
/// commit existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub tip: Option<CommitRef>,
}

/// In-memory history session: commit store, branch table and HEAD.
///
/// The branch table is kept in creation order, which doubles as the lane
/// numbering used by the layout.
#[derive(Debug, Clone)]
pub struct Repository {
    next_timestamp: u64,
    commits: HashMap<CommitHash, Commit>,
    branches: Vec<Branch>,
    head: Ref,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    pub fn new() -> Self {
        Self::with_initial_branch(DEFAULT_BRANCH)
    }

    /// A fresh repository whose HEAD points at the (not yet existing) branch `name`.
    pub fn with_initial_branch(name: impl Into<String>) -> Self {
        Self {
            next_timestamp: 0,
            commits: HashMap::new(),
            branches: Vec::new(),
            head: Ref::branch(name),
        }
    }

    pub fn head(&self) -> &Ref {
        &self.head
    }

    /// Branches in creation order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, hash: &CommitHash) -> Option<&Commit> {
        self.commits.get(hash)
    }

    pub fn resolve_commit(&self, commit: &CommitRef) -> Result<&Commit, GraphError> {
        self.commits
            .get(&commit.hash)
            .ok_or(GraphError::UnknownCommit(commit.hash))
    }

    fn find_branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.find_branch(name).is_some()
    }

    pub fn resolve_branch(&self, name: &str) -> Result<CommitRef, GraphError> {
        self.try_resolve_branch(name)
            .ok_or_else(|| GraphError::MissingBranch(name.to_string()))
    }

    pub fn try_resolve_branch(&self, name: &str) -> Option<CommitRef> {
        self.find_branch(name).and_then(|b| b.tip)
    }

    /// Lane number of a branch: 0 for "no branch", otherwise 1 + its
    /// position in creation order. Unknown names also map to 0.
    pub fn branch_index(&self, name: Option<&str>) -> usize {
        name.and_then(|name| self.branches.iter().position(|b| b.name == name))
            .map_or(0, |pos| pos + 1)
    }

    /// The branch currently pointing exactly at `r`'s commit, if any.
    ///
    /// A branch ref that resolves is its own tip. For a bare commit the
    /// first matching branch in creation order wins.
    pub fn as_branch_tip(&self, r: &Ref) -> Option<BranchRef> {
        match r {
            Ref::Branch(branch) => branch.try_resolve(self).map(|_| branch.clone()),
            Ref::Commit(commit) => self
                .branches
                .iter()
                .find(|b| b.tip.map(|t| t.hash) == Some(commit.hash))
                .map(|b| BranchRef::new(b.name.clone())),
        }
    }

    /// Records a commit whose single parent is the current HEAD (if HEAD
    /// resolves) and advances HEAD.
    pub fn commit(&mut self, description: impl Into<String>) -> CommitRef {
        let parents = self.head.try_resolve(self).into_iter().collect();
        self.create_commit(description.into(), parents)
    }

    fn create_commit(&mut self, description: String, parents: Vec<CommitRef>) -> CommitRef {
        let commit = Commit {
            description,
            timestamp: self.next_timestamp,
            parents,
        };
        self.next_timestamp += 1;

        let commit_ref = CommitRef::from_commit(&commit);
        debug!(
            hash = %commit_ref.describe(),
            parents = commit.parents.len(),
            head = %self.head,
            "commit: {}", commit.description
        );
        // Append-only: an existing hash already holds identical content
        self.commits.entry(commit_ref.hash).or_insert(commit);

        match self.head.as_branch().map(|b| b.name.clone()) {
            Some(name) => self.set_branch_tip(name, Some(commit_ref)),
            None => self.head = Ref::Commit(commit_ref),
        }
        commit_ref
    }

    fn set_branch_tip(&mut self, name: String, tip: Option<CommitRef>) {
        match self.branches.iter_mut().find(|b| b.name == name) {
            Some(branch) => branch.tip = tip,
            None => self.branches.push(Branch { name, tip }),
        }
    }

    pub fn checkout(&mut self, target: impl Into<Ref>) -> Result<(), GraphError> {
        self.checkout_with(target, CheckoutOptions::default())
    }

    /// Moves HEAD. A missing branch is created at the *current* HEAD when
    /// `options.create_branch` is set; otherwise HEAD is left untouched.
    pub fn checkout_with(
        &mut self,
        target: impl Into<Ref>,
        options: CheckoutOptions,
    ) -> Result<(), GraphError> {
        let target = target.into();
        match &target {
            Ref::Branch(branch) if !self.has_branch(&branch.name) => {
                if !options.create_branch {
                    return Err(GraphError::NoSuchBranch(branch.name.clone()));
                }
                let start = self.head.try_resolve(self);
                debug!(
                    branch = %branch.name,
                    at = %start.map_or_else(|| "<empty>".to_string(), |c| c.describe()),
                    "create branch"
                );
                self.set_branch_tip(branch.name.clone(), start);
            }
            Ref::Commit(commit) => {
                self.resolve_commit(commit)?;
            }
            Ref::Branch(_) => {}
        }
        debug!(from = %self.head, to = %target, "checkout");
        self.head = target;
        Ok(())
    }

    /// Creates a two-parent commit: current HEAD first, `source` second.
    pub fn merge(&mut self, source: impl Into<Ref>) -> Result<CommitRef, GraphError> {
        let source = source.into();
        let head_commit = self
            .head
            .try_resolve(self)
            .ok_or_else(|| GraphError::MergeTargetMissing {
                side: MergeSide::Head,
                reference: self.head.describe(),
            })?;
        let source_commit = source
            .try_resolve(self)
            .filter(|c| self.commits.contains_key(&c.hash))
            .ok_or_else(|| GraphError::MergeTargetMissing {
                side: MergeSide::Source,
                reference: source.describe(),
            })?;

        let description = format!("Merge {} into {}", source.describe(), self.head.describe());
        Ok(self.create_commit(description, vec![head_commit, source_commit]))
    }

    /// Runs `block` with HEAD moved to `target`, then restores the previous
    /// HEAD whether or not `block` succeeded.
    pub fn with_head<T, E>(
        &mut self,
        target: impl Into<Ref>,
        block: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<GraphError>,
    {
        let previous = self.head.clone();
        self.checkout(target)?;
        let result = block(self);
        debug!(to = %previous, "restore head");
        self.head = previous;
        result
    }

    /// Commits reachable from `from`, newest first (by timestamp).
    pub fn history(&self, from: &Ref) -> Result<Vec<CommitRef>, GraphError> {
        let start = from.resolve(self)?;
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.hash) {
                continue;
            }
            let commit = self.resolve_commit(&current)?;
            stack.extend(commit.parents.iter().copied());
            out.push((commit.timestamp, current));
        }
        out.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(out.into_iter().map(|(_, c)| c).collect())
    }
}
