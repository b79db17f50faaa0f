// src/lib.rs

//! Scripted commit graphs rendered as documentation diagrams.
//!
//! A [`Repository`] is scripted with `commit`, `checkout`, `merge` and
//! `with_head`; [`layout::prepare`] turns the history reachable from a ref
//! into lanes and rows, and [`Renderer`] paints that onto a PNG or SVG
//! surface.
//!
//! ```
//! use gitgraph::{render_graph, CheckoutOptions, OutputFormat, Ref, RenderConfig, Repository};
//!
//! let mut repo = Repository::new();
//! repo.commit("Initial commit");
//! repo.checkout_with("develop", CheckoutOptions::create())?;
//! repo.commit("Add TypeScript");
//! repo.checkout("master")?;
//! repo.merge("develop")?;
//!
//! let svg = render_graph(&repo, &Ref::branch("master"), &RenderConfig::default(), OutputFormat::Svg)?;
//! assert!(svg.width > 0 && svg.height > 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod random;
pub mod renderer;
pub mod repository;
pub mod script;
pub mod surface;

pub use config::RenderConfig;
pub use error::{ConfigError, GraphError, MergeSide, RenderError, ScriptError};
pub use layout::{prepare, RenderingData};
pub use model::{hash_commit, BranchRef, Commit, CommitHash, CommitRef, Ref};
pub use renderer::{render_graph, Rendered, Renderer};
pub use repository::{CheckoutOptions, Repository};
pub use surface::OutputFormat;
