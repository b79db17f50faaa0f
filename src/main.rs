// src/main.rs

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use gitgraph::random::{self, RandomHistory};
use gitgraph::script::{Book, DiagramScript, PARTITIONING_DEMO};
use gitgraph::{render_graph, OutputFormat, Ref, RenderConfig, Rendered};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let start_time = Instant::now();

    let base = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            RenderConfig::from_toml(&text)
                .with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => RenderConfig::default(),
    };

    match args.command {
        Command::Render {
            book,
            output,
            format,
        } => {
            let text = fs::read_to_string(&book)
                .with_context(|| format!("reading book {}", book.display()))?;
            let book = Book::from_toml(&text)?;
            let config = book.render_config(base)?;
            render_book(&book, &config, &output, format)?;
        }
        Command::Demo { output, format } => {
            let book = Book::from_toml(PARTITIONING_DEMO)?;
            let config = book.render_config(base)?;
            for diagram in &book.diagrams {
                let rendered = render_diagram(diagram, &config, format)?;
                write_rendered(&output, &rendered)?;
            }
        }
        Command::Random {
            seed,
            commits,
            branches,
            output,
            format,
        } => {
            let repo = random::generate(RandomHistory {
                seed,
                commits,
                branches,
            })?;
            let rendered = render_graph(&repo, repo.head(), &base, format)?;
            write_rendered(&output, &rendered)?;
        }
    }

    info!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn init_logging(verbose: bool) {
    let env_filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// `RUST_LOG` wins when set and valid; otherwise `--verbose` picks the level.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Renders all diagrams of a book in parallel, one file each.
fn render_book(
    book: &Book,
    config: &RenderConfig,
    output: &Path,
    format: OutputFormat,
) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("creating output directory {}", output.display()))?;

    let bar = ProgressBar::new(book.diagrams.len() as u64);
    bar.set_message("Rendering diagrams");

    let written: Vec<PathBuf> = book
        .diagrams
        .par_iter()
        .progress_with(bar)
        .map(|diagram| -> Result<PathBuf> {
            let rendered = render_diagram(diagram, config, format)?;
            let path = output.join(format!("{}.{}", diagram.name, format.extension()));
            write_rendered(&path, &rendered)?;
            Ok(path)
        })
        .collect::<Result<_>>()?;

    info!("Rendered {} diagrams into {}", written.len(), output.display());
    Ok(())
}

fn render_diagram(
    diagram: &DiagramScript,
    config: &RenderConfig,
    format: OutputFormat,
) -> Result<Rendered> {
    let repo = diagram.build()?;
    let start: Ref = diagram.start(&repo);
    let rendered = render_graph(&repo, &start, config, format)
        .with_context(|| format!("rendering diagram '{}'", diagram.name))?;
    Ok(rendered)
}

fn write_rendered(path: &Path, rendered: &Rendered) -> Result<()> {
    fs::write(path, &rendered.bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(
        "Wrote {} ({}x{} {})",
        path.display(),
        rendered.width,
        rendered.height,
        rendered.format.extension()
    );
    Ok(())
}
