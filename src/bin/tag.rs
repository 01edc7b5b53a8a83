use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, CommandFactory, Parser};
use itertools::Itertools;
use tagtool::{ConfigOverrides, TaggerBuilder, ADD_PREFIX, REMOVE_PREFIX};
use tracing_subscriber::EnvFilter;

/// Add and remove tags in file names,
/// moving files into matching tag directories.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Make no changes to the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Print operations taken by the program
    #[arg(short, long)]
    verbose: bool,

    /// Match tags case-insensitively
    #[arg(long)]
    nocase: bool,

    /// Only rename files, never move them between directories
    #[arg(long)]
    no_dirs: bool,

    /// `+TAG` to add a tag,
    /// `-TAG` to remove a tag,
    /// anything else is a file to tag
    ///
    /// Put operations after `--`
    /// if a tag would be mistaken for a flag.
    #[arg(
        value_name = "+TAG|-TAG|FILE",
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    args: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut files = Vec::new();
    let mut add = Vec::new();
    let mut remove = Vec::new();
    for arg in args.args {
        if let Some(tag) = arg.strip_prefix(ADD_PREFIX) {
            add.push(tag.to_owned());
        } else if let Some(tag) = arg.strip_prefix(REMOVE_PREFIX) {
            remove.push(tag.to_owned());
        } else {
            files.push(PathBuf::from(arg));
        }
    }
    let files = files.into_iter().unique().collect_vec();
    let add = add.into_iter().unique().collect_vec();
    let remove = remove.into_iter().unique().collect_vec();

    if files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "no files given")
            .exit();
    }
    if add.is_empty() && remove.is_empty() {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("no tags given, use `{ADD_PREFIX}TAG` or `{REMOVE_PREFIX}TAG`"),
            )
            .exit();
    }

    let tagger = TaggerBuilder::new()
        .overrides(ConfigOverrides {
            use_dirs: args.no_dirs.then_some(false),
            case_sensitive: args.nocase.then_some(false),
            ..ConfigOverrides::default()
        })
        .dry_run(args.dry_run)
        .build();

    let mut failed = false;
    for (file, result) in tagger.retag(&files, &add, &remove)? {
        match result {
            Ok(op) => {
                if op.from != op.to && (args.verbose || args.dry_run) {
                    println!("'{}' -> '{}'", op.from.display(), op.to.display());
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: {e}", file.display());
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
