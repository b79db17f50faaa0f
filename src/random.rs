// src/random.rs

use crate::error::GraphError;
use crate::repository::{CheckoutOptions, Repository, DEFAULT_BRANCH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Parameters for [`generate`].
#[derive(Debug, Clone, Copy)]
pub struct RandomHistory {
    pub seed: u64,
    /// Total number of commits, merges included
    pub commits: usize,
    /// Upper bound on the number of branches, the initial one included
    pub branches: usize,
}

impl Default for RandomHistory {
    fn default() -> Self {
        Self {
            seed: 42,
            commits: 24,
            branches: 4,
        }
    }
}

/// Builds a random but reproducible history: the same parameters always
/// produce the same commits. HEAD ends on the initial branch.
pub fn generate(params: RandomHistory) -> Result<Repository, GraphError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut repo = Repository::new();
    let mut names = vec![DEFAULT_BRANCH.to_string()];
    let mut current = 0usize;

    repo.commit("Initial commit");
    while repo.len() < params.commits.max(1) {
        let roll = rng.gen_range(0..100);
        if roll < 55 {
            repo.commit(format!("Change {}", repo.len()));
        } else if roll < 70 && names.len() < params.branches.max(1) {
            let name = format!("topic-{}", names.len());
            repo.checkout_with(name.as_str(), CheckoutOptions::create())?;
            names.push(name);
            current = names.len() - 1;
        } else if roll < 85 {
            current = rng.gen_range(0..names.len());
            repo.checkout(names[current].as_str())?;
        } else {
            let other = rng.gen_range(0..names.len());
            let same_tip = repo.resolve_branch(&names[other])? == repo.resolve_branch(&names[current])?;
            if other != current && !same_tip {
                repo.merge(names[other].as_str())?;
            }
        }
    }

    repo.checkout(DEFAULT_BRANCH)?;
    debug!(
        seed = params.seed,
        commits = repo.len(),
        branches = names.len(),
        "random history generated"
    );
    Ok(repo)
}
