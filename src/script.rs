// src/script.rs

use crate::config::{RenderConfig, RenderSettings};
use crate::error::{GraphError, ScriptError};
use crate::model::Ref;
use crate::repository::{CheckoutOptions, Repository};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// The branching-workflow history shipped with the binary.
pub const PARTITIONING_DEMO: &str = include_str!("../demos/partitioning.toml");

/// A TOML file describing one or more diagrams.
///
/// ```toml
/// [render]
/// font_size = 16.0
///
/// [[diagram]]
/// name = "feature-flow"
/// show = "master"
/// steps = [
///   { commit = "Initial commit" },
///   { checkout = "develop", create = true },
///   { commit = "Add TypeScript" },
///   { with_head = "master", steps = [{ commit = "Hotfix" }] },
///   { checkout = "master" },
///   { merge = "develop" },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Book {
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default, rename = "diagram")]
    pub diagrams: Vec<DiagramScript>,
}

impl Book {
    pub fn from_toml(text: &str) -> Result<Self, ScriptError> {
        let book: Book = toml::from_str(text)?;
        let mut names = HashSet::new();
        for diagram in &book.diagrams {
            if !names.insert(diagram.name.as_str()) {
                return Err(ScriptError::DuplicateDiagram(diagram.name.clone()));
            }
        }
        Ok(book)
    }

    /// The book's `[render]` overrides applied on top of `base`.
    pub fn render_config(&self, base: RenderConfig) -> Result<RenderConfig, ScriptError> {
        Ok(self.render.apply(base)?)
    }
}

/// One scripted history and the ref to draw it from.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramScript {
    pub name: String,
    /// Branch checked out before the first step (defaults to `master`)
    #[serde(default)]
    pub initial_branch: Option<String>,
    /// Branch the layout starts from (defaults to HEAD after the last step)
    #[serde(default)]
    pub show: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Commit {
        commit: String,
    },
    Checkout {
        checkout: String,
        #[serde(default)]
        create: bool,
    },
    Merge {
        merge: String,
    },
    WithHead {
        with_head: String,
        steps: Vec<Step>,
    },
}

impl DiagramScript {
    /// Replays the steps against a fresh repository.
    pub fn build(&self) -> Result<Repository, ScriptError> {
        let mut repo = match &self.initial_branch {
            Some(name) => Repository::with_initial_branch(name.clone()),
            None => Repository::new(),
        };
        replay(&mut repo, &self.steps, "").map_err(|failure| ScriptError::Step {
            diagram: self.name.clone(),
            step: failure.step,
            source: failure.source,
        })?;
        debug!(diagram = %self.name, commits = repo.len(), "script replayed");
        Ok(repo)
    }

    /// Where the layout walk begins for this diagram.
    pub fn start(&self, repo: &Repository) -> Ref {
        match &self.show {
            Some(branch) => Ref::branch(branch.clone()),
            None => repo.head().clone(),
        }
    }
}

/// A failed step, addressed as a dotted 1-based path (`4.2` is the second
/// nested step of the fourth step).
struct Failure {
    step: String,
    source: GraphError,
}

fn replay(repo: &mut Repository, steps: &[Step], prefix: &str) -> Result<(), Failure> {
    for (i, step) in steps.iter().enumerate() {
        let at = if prefix.is_empty() {
            (i + 1).to_string()
        } else {
            format!("{prefix}.{}", i + 1)
        };
        let fail = |source: GraphError| Failure {
            step: at.clone(),
            source,
        };

        match step {
            Step::Commit { commit } => {
                repo.commit(commit.as_str());
            }
            Step::Checkout { checkout, create } => {
                let options = CheckoutOptions {
                    create_branch: *create,
                };
                repo.checkout_with(checkout.as_str(), options).map_err(fail)?;
            }
            Step::Merge { merge } => {
                repo.merge(merge.as_str()).map_err(fail)?;
            }
            Step::WithHead { with_head, steps } => {
                repo.with_head(with_head.as_str(), |repo| {
                    Ok::<_, GraphError>(replay(repo, steps, &at))
                })
                .map_err(fail)??;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_parse_from_inline_tables() {
        let book = Book::from_toml(
            r#"
            [[diagram]]
            name = "tiny"
            steps = [
              { commit = "one" },
              { checkout = "dev", create = true },
              { checkout = "master" },
              { merge = "dev" },
              { with_head = "dev", steps = [{ commit = "two" }] },
            ]
            "#,
        )
        .unwrap();

        let steps = &book.diagrams[0].steps;
        assert_eq!(steps[0], Step::Commit { commit: "one".into() });
        assert_eq!(
            steps[1],
            Step::Checkout {
                checkout: "dev".into(),
                create: true
            }
        );
        assert_eq!(
            steps[2],
            Step::Checkout {
                checkout: "master".into(),
                create: false
            }
        );
        assert_eq!(steps[3], Step::Merge { merge: "dev".into() });
        assert!(matches!(&steps[4], Step::WithHead { steps, .. } if steps.len() == 1));
    }

    #[test]
    fn replay_builds_the_history() {
        let book = Book::from_toml(
            r#"
            [[diagram]]
            name = "merge"
            show = "master"
            steps = [
              { commit = "Initial" },
              { checkout = "dev", create = true },
              { commit = "A" },
              { checkout = "master" },
              { merge = "dev" },
            ]
            "#,
        )
        .unwrap();
        let diagram = &book.diagrams[0];
        let repo = diagram.build().unwrap();
        assert_eq!(repo.len(), 3);
        assert_eq!(diagram.start(&repo), Ref::branch("master"));
        let tip = repo.resolve_branch("master").unwrap();
        assert_eq!(repo.resolve_commit(&tip).unwrap().parents.len(), 2);
    }

    #[test]
    fn failing_step_reports_its_path() {
        let book = Book::from_toml(
            r#"
            [[diagram]]
            name = "broken"
            steps = [
              { commit = "Initial" },
              { with_head = "master", steps = [{ commit = "ok" }, { checkout = "ghost" }] },
            ]
            "#,
        )
        .unwrap();
        match book.diagrams[0].build() {
            Err(ScriptError::Step {
                diagram,
                step,
                source,
            }) => {
                assert_eq!(diagram, "broken");
                assert_eq!(step, "2.2");
                assert_eq!(source, GraphError::NoSuchBranch("ghost".into()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn with_head_target_failure_is_attributed_to_the_step() {
        let book = Book::from_toml(
            r#"
            [[diagram]]
            name = "missing"
            steps = [{ commit = "Initial" }, { with_head = "nowhere", steps = [] }]
            "#,
        )
        .unwrap();
        assert!(matches!(
            book.diagrams[0].build(),
            Err(ScriptError::Step { ref step, .. }) if step == "2"
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Book::from_toml(
            r#"
            [[diagram]]
            name = "same"
            steps = []

            [[diagram]]
            name = "same"
            steps = []
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::DuplicateDiagram(name) if name == "same"));
    }

    #[test]
    fn render_table_overrides_config() {
        let book = Book::from_toml(
            r#"
            [render]
            lane_width = 32.0
            "#,
        )
        .unwrap();
        let config = book.render_config(RenderConfig::default()).unwrap();
        assert_eq!(config.lane_width, 32.0);
        assert!(book.diagrams.is_empty());
    }

    #[test]
    fn bundled_demo_replays() {
        let book = Book::from_toml(PARTITIONING_DEMO).unwrap();
        assert_eq!(book.diagrams.len(), 1);
        let repo = book.diagrams[0].build().unwrap();
        assert_eq!(repo.len(), 13);
        assert_eq!(repo.head(), &Ref::branch("master"));
    }
}
