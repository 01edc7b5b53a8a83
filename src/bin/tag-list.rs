use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use tagtool::{ConfigOverrides, TaggedFile};
use tracing_subscriber::EnvFilter;

/// List the tags of files
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Match tags case-insensitively
    #[arg(long)]
    nocase: bool,

    /// Files to list tags of
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let overrides = ConfigOverrides {
        case_sensitive: args.nocase.then_some(false),
        ..ConfigOverrides::default()
    };

    let mut failed = false;
    let mut tags = FxHashSet::default();
    for file in &args.files {
        match TaggedFile::open(file, &overrides) {
            Ok(file) => tags.extend(file.tags()),
            Err(e) => {
                failed = true;
                eprintln!("{}: {e}", file.display());
            }
        }
    }

    for tag in tags.into_iter().sorted() {
        println!("{tag}");
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
