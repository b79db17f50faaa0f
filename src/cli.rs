// src/cli.rs

use clap::{Parser, Subcommand};
use gitgraph::OutputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render scripted commit graphs as diagrams", long_about = None)]
pub struct Args {
    /// TOML file with render settings (diameter, lane width, palette, ...)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every repository operation
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every diagram of a TOML book
    Render {
        /// The book to render
        book: PathBuf,

        /// Directory to save the diagrams in
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
    },

    /// Render the bundled branching-workflow demo
    Demo {
        /// File to write
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
    },

    /// Render a reproducible random history
    Random {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of commits to generate
        #[arg(long, default_value_t = 24)]
        commits: usize,

        /// Maximum number of branches
        #[arg(long, default_value_t = 4)]
        branches: usize,

        /// File to write
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
    },
}
