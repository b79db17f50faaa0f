//! Property tests over arbitrary scripted histories.

use std::collections::HashSet;

use gitgraph::renderer::BranchPalette;
use gitgraph::surface::SvgSurface;
use gitgraph::{
    hash_commit, prepare, CheckoutOptions, Commit, CommitRef, Ref, RenderConfig, Renderer,
    Repository,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Commit,
    Branch,
    Checkout(usize),
    Merge(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Commit),
        1 => Just(Op::Branch),
        2 => (0usize..8).prop_map(Op::Checkout),
        2 => (0usize..8).prop_map(Op::Merge),
    ]
}

/// Applies `ops` after a root commit; invalid operations are skipped.
fn build(ops: &[Op]) -> (Repository, Vec<String>) {
    let mut repo = Repository::new();
    let mut names = vec!["master".to_string()];
    repo.commit("root");
    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::Commit => {
                repo.commit(format!("c{i}"));
            }
            Op::Branch => {
                let name = format!("b{i}");
                repo.checkout_with(name.as_str(), CheckoutOptions::create()).unwrap();
                names.push(name);
            }
            Op::Checkout(n) => {
                repo.checkout(names[n % names.len()].as_str()).unwrap();
            }
            Op::Merge(n) => {
                repo.merge(names[n % names.len()].as_str()).unwrap();
            }
        }
    }
    (repo, names)
}

proptest! {
    #[test]
    fn prop_hash_is_pure(description in ".{0,40}", timestamp in 0u64..1_000, parents in 0usize..3) {
        let parent_refs: Vec<CommitRef> = (0..parents)
            .map(|i| CommitRef::from_commit(&Commit {
                description: format!("p{i}"),
                timestamp: i as u64,
                parents: vec![],
            }))
            .collect();
        let a = Commit { description: description.clone(), timestamp, parents: parent_refs.clone() };
        let b = Commit { description: description.clone(), timestamp, parents: parent_refs };
        prop_assert_eq!(hash_commit(&a), hash_commit(&b));

        let bumped = Commit { timestamp: timestamp + 1, ..a.clone() };
        prop_assert_ne!(hash_commit(&a), hash_commit(&bumped));
        let renamed = Commit { description: format!("{description}!"), ..a.clone() };
        prop_assert_ne!(hash_commit(&a), hash_commit(&renamed));
    }

    #[test]
    fn prop_layout_visits_each_reachable_commit_once(ops in prop::collection::vec(op(), 0..40)) {
        let (repo, names) = build(&ops);
        for name in &names {
            let from = Ref::branch(name.as_str());
            let data = prepare(&repo, &from).unwrap();
            let reachable = repo.history(&from).unwrap();

            prop_assert_eq!(data.len(), reachable.len());
            prop_assert_eq!(data.order.len(), data.len());
            let unique: HashSet<_> = data.order.iter().collect();
            prop_assert_eq!(unique.len(), data.order.len());

            // one edge per parent of every laid-out commit
            let parents: usize = data.iter().map(|c| c.commit.parents.len()).sum();
            prop_assert_eq!(data.links.len(), parents);
            for link in &data.links {
                prop_assert!(data.get(&link.from).is_some());
                prop_assert!(data.get(&link.to).is_some());
            }
            prop_assert_eq!(data.min_lane(), 0);
        }
    }

    #[test]
    fn prop_layouts_always_render(ops in prop::collection::vec(op(), 0..30)) {
        let (repo, _) = build(&ops);
        let data = prepare(&repo, repo.head()).unwrap();
        let renderer = Renderer::new(RenderConfig::default());
        let surface: SvgSurface = renderer.render(&data).unwrap();
        let (width, height) = renderer.canvas_size(&data);
        prop_assert!(width > 0 && height > 0);
        prop_assert!(surface.document().matches("<circle").count() == 2 * data.len());

        let palette = BranchPalette::new(&data, renderer.config().palette.clone());
        prop_assert_eq!(palette.slot(None), 0);
    }

    #[test]
    fn prop_with_head_restores_head(
        ops in prop::collection::vec(op(), 0..20),
        inner in prop::collection::vec(op(), 0..10),
        target in 0usize..8,
    ) {
        let (mut repo, names) = build(&ops);
        let before = repo.head().clone();
        let target = names[target % names.len()].clone();
        let inner_names = names.clone();

        repo.with_head(target.as_str(), |repo| -> Result<(), gitgraph::GraphError> {
            for (i, op) in inner.iter().enumerate() {
                match op {
                    Op::Commit => { repo.commit(format!("inner{i}")); }
                    Op::Branch => {
                        repo.checkout_with(format!("inner-b{i}"), CheckoutOptions::create())?;
                    }
                    Op::Checkout(n) => repo.checkout(inner_names[n % inner_names.len()].as_str())?,
                    Op::Merge(n) => { repo.merge(inner_names[n % inner_names.len()].as_str())?; }
                }
            }
            Ok(())
        }).unwrap();

        prop_assert_eq!(repo.head(), &before);
    }

    #[test]
    fn prop_linear_history_has_n_minus_one_ancestors(n in 1usize..50) {
        let mut repo = Repository::new();
        for i in 0..n {
            repo.commit(format!("c{i}"));
        }
        let mut current = repo.resolve_branch("master").unwrap();
        let mut ancestors = 0;
        while let Some(parent) = repo.resolve_commit(&current).unwrap().parents.first().copied() {
            ancestors += 1;
            current = parent;
        }
        prop_assert_eq!(ancestors, n - 1);
        prop_assert!(repo.resolve_commit(&current).unwrap().parents.is_empty());
    }
}
