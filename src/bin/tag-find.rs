use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tagtool::{select, Config, ConfigOverrides, Operation};
use tracing_subscriber::EnvFilter;

/// Find files by their tags
///
/// Files must have every `TAG`.
/// `+TAG` and `-TAG` then include or exclude files with the tag,
/// in order,
/// the last applicable one deciding.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Match tags case-insensitively
    #[arg(long)]
    nocase: bool,

    /// Directory to search,
    /// the whole tagged tree when it has a root
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// `TAG`, `+TAG`, or `-TAG`
    #[arg(last = true, value_name = "SELECTOR")]
    selectors: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("cannot search `{}`", args.dir.display()))?;
    let config = Config::for_dir(
        &dir,
        &ConfigOverrides {
            case_sensitive: args.nocase.then_some(false),
            ..ConfigOverrides::default()
        },
    );
    let ops = args
        .selectors
        .iter()
        .map(|selector| Operation::parse(selector, config.codec()))
        .collect::<Result<Vec<_>, _>>()?;

    for path in select(&dir, &ops, &config) {
        println!("{}", path.display());
    }

    Ok(())
}
