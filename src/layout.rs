// src/layout.rs

use crate::error::GraphError;
use crate::model::*;
use crate::repository::Repository;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

/// A commit as it will be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRendering {
    pub hash: CommitHash,
    pub commit: Commit,
    /// Horizontal lane, normalized so the leftmost visible lane is 0
    pub lane: usize,
    /// Branch the commit is attributed to, `None` when unattributed
    pub branch: Option<String>,
    /// Full label, e.g. `3fa94c1 Make it fast (a-feature)`
    pub text: String,
}

/// An edge between two laid-out commits, pointing from the older (parent)
/// to the newer (child) commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub from: CommitHash,
    pub to: CommitHash,
}

/// Snapshot produced by [`prepare`] and consumed by the renderer.
#[derive(Debug, Clone)]
pub struct RenderingData {
    pub commits: BTreeMap<CommitHash, CommitRendering>,
    /// Commit hashes in the order they were laid out (ancestors first)
    pub order: Vec<CommitHash>,
    pub links: Vec<Link>,
    /// The commit the walk started from
    pub head: CommitHash,
}

impl RenderingData {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Laid-out commits in layout order.
    pub fn iter(&self) -> impl Iterator<Item = &CommitRendering> {
        self.order.iter().filter_map(|hash| self.commits.get(hash))
    }

    pub fn get(&self, hash: &CommitHash) -> Option<&CommitRendering> {
        self.commits.get(hash)
    }

    pub fn max_lane(&self) -> usize {
        self.commits.values().map(|c| c.lane).max().unwrap_or(0)
    }

    pub fn min_lane(&self) -> usize {
        self.commits.values().map(|c| c.lane).min().unwrap_or(0)
    }

    pub fn max_timestamp(&self) -> u64 {
        self.commits.values().map(|c| c.commit.timestamp).max().unwrap_or(0)
    }

    pub fn min_timestamp(&self) -> u64 {
        self.commits.values().map(|c| c.commit.timestamp).min().unwrap_or(0)
    }
}

/// Walks the history reachable from `from` and assigns every commit a lane
/// and a label. Each commit is laid out once, however many paths reach it.
#[instrument(skip(repo, from), fields(from = %from))]
pub fn prepare(repo: &Repository, from: &Ref) -> Result<RenderingData, GraphError> {
    let head = from.resolve(repo)?;
    let branch = from.as_branch().map(|b| b.name.clone());
    let lane = repo.branch_index(branch.as_deref());

    let mut walker = Walker {
        repo,
        visited: HashSet::new(),
        commits: BTreeMap::new(),
        order: Vec::new(),
        links: Vec::new(),
    };
    walker.visited.insert(head.hash);
    walker.walk(from, lane, branch)?;

    let mut data = RenderingData {
        commits: walker.commits,
        order: walker.order,
        links: walker.links,
        head: head.hash,
    };
    normalize_lanes(&mut data);
    debug!(
        commits = data.commits.len(),
        links = data.links.len(),
        lanes = data.max_lane() + 1,
        "layout prepared"
    );
    Ok(data)
}

/// Shifts every lane so the minimum becomes 0.
fn normalize_lanes(data: &mut RenderingData) {
    let min = data.min_lane();
    if min == 0 {
        return;
    }
    for commit in data.commits.values_mut() {
        commit.lane -= min;
    }
}

struct Walker<'a> {
    repo: &'a Repository,
    visited: HashSet<CommitHash>,
    commits: BTreeMap<CommitHash, CommitRendering>,
    order: Vec<CommitHash>,
    links: Vec<Link>,
}

/// A commit whose parents are still being walked.
struct Frame<'a> {
    r: Ref,
    commit_ref: CommitRef,
    commit: &'a Commit,
    is_head: bool,
    lane: usize,
    branch: Option<String>,
    next_parent: usize,
}

impl<'a> Walker<'a> {
    /// Depth-first, parents in order, a commit is emitted after all of its
    /// parents. Uses an explicit stack so deep histories cannot overflow.
    fn walk(
        &mut self,
        from: &Ref,
        lane: usize,
        branch: Option<String>,
    ) -> Result<(), GraphError> {
        let mut stack = vec![self.frame(from.clone(), true, lane, branch)?];

        while let Some(frame) = stack.last_mut() {
            let Some(parent) = frame.commit.parents.get(frame.next_parent).copied() else {
                if let Some(done) = stack.pop() {
                    self.emit(done);
                }
                continue;
            };
            let offset = frame.next_parent;
            frame.next_parent += 1;

            self.links.push(Link {
                from: parent.hash,
                to: frame.commit_ref.hash,
            });
            if !self.visited.insert(parent.hash) {
                continue;
            }

            // The mainline keeps the child's lane; merged-in parents take
            // the lane of the branch tipping there, if any.
            let (parent_lane, parent_branch) = if offset == 0 {
                (frame.lane, frame.branch.clone())
            } else {
                match self.repo.as_branch_tip(&Ref::Commit(parent)) {
                    Some(tip) => (self.repo.branch_index(Some(&tip.name)), Some(tip.name)),
                    None => (frame.lane + offset, None),
                }
            };
            let next = self.frame(Ref::Commit(parent), false, parent_lane, parent_branch)?;
            stack.push(next);
        }
        Ok(())
    }

    fn frame(
        &self,
        r: Ref,
        is_head: bool,
        lane: usize,
        branch: Option<String>,
    ) -> Result<Frame<'a>, GraphError> {
        let repo: &'a Repository = self.repo;
        let commit_ref = r.resolve(repo)?;
        let commit = repo.resolve_commit(&commit_ref)?;
        Ok(Frame {
            r,
            commit_ref,
            commit,
            is_head,
            lane,
            branch,
            next_parent: 0,
        })
    }

    fn emit(&mut self, frame: Frame<'a>) {
        let tip = self.repo.as_branch_tip(&frame.r);
        let (lane, branch) = match &tip {
            Some(tip) => (self.repo.branch_index(Some(&tip.name)), Some(tip.name.clone())),
            None => (frame.lane, frame.branch),
        };
        let text = label(
            &frame.commit_ref,
            frame.commit,
            &frame.r,
            frame.is_head,
            tip.as_ref(),
        );

        let hash = frame.commit_ref.hash;
        self.order.push(hash);
        self.commits.insert(
            hash,
            CommitRendering {
                hash,
                commit: frame.commit.clone(),
                lane,
                branch,
                text,
            },
        );
    }
}

fn label(
    commit_ref: &CommitRef,
    commit: &Commit,
    r: &Ref,
    is_head: bool,
    tip: Option<&BranchRef>,
) -> String {
    let annotation = match (is_head, tip) {
        (true, Some(tip)) if r.is_detached() => format!("HEAD, {}", tip.name),
        (true, Some(tip)) => format!("HEAD -> {}", tip.name),
        (true, None) => "HEAD".to_string(),
        (false, Some(tip)) => tip.name.clone(),
        (false, None) => String::new(),
    };
    let mut text = format!("{} {}", commit_ref.describe(), commit.description);
    if !annotation.is_empty() {
        text.push_str(&format!(" ({annotation})"));
    }
    text
}
