//! Command-line surface and host-side plumbing.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use conv_core::{
    BatchConverter, ChardetngDetector, ConversionJob, EncodingSpec, ExtensionFilter, FileEntry,
};
use directories::ProjectDirs;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "textconv",
    version,
    about = "Convert batches of text files between character encodings"
)]
pub struct Cli {
    /// Also write logs to a rolling file in the data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert files in place, or into --out-dir
    Convert {
        /// Files or directories (directories are expanded recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Target encoding name (see `textconv encodings`)
        #[arg(long = "to", default_value = "UTF-8 With Bom")]
        to: String,

        /// Write converted files into this directory instead of in place
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Apply and persist this extension filter file (one pattern per line)
        #[arg(long)]
        filter: Option<PathBuf>,

        /// Ignore the persisted extension filter
        #[arg(long, conflicts_with = "filter")]
        no_filter: bool,
    },

    /// Show the detected source encoding of files
    Detect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the supported target encodings
    Encodings,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            paths,
            to,
            out_dir,
            filter,
            no_filter,
        } => run_convert(&paths, &to, out_dir, filter, no_filter),
        Command::Detect { paths } => run_detect(&paths),
        Command::Encodings => {
            for spec in EncodingSpec::ALL {
                println!("{}", spec.name());
            }
            Ok(())
        }
    }
}

fn run_convert(
    paths: &[PathBuf],
    to: &str,
    out_dir: Option<PathBuf>,
    filter_path: Option<PathBuf>,
    no_filter: bool,
) -> Result<()> {
    let target = EncodingSpec::from_name(to)
        .with_context(|| format!("unknown target encoding '{to}' (see `textconv encodings`)"))?;

    let filter = resolve_filter(filter_path, no_filter)?;
    let files = collect_files(paths, &filter);
    if files.is_empty() {
        bail!("nothing to convert: no files matched");
    }

    if let Some(dir) = &out_dir {
        if !dir.is_dir() {
            bail!("output directory does not exist: {}", dir.display());
        }
    }

    let job = ConversionJob {
        files,
        target,
        dest_dir: out_dir,
    };
    let converter = BatchConverter::new(ChardetngDetector::new());

    let bar = progress_bar(job.files.len() as u64);
    let report = converter.convert(&job, |done, _total| {
        bar.set_position(done as u64);
    })?;
    bar.finish_and_clear();

    for line in &report.log {
        eprintln!("{line}");
    }
    println!("converted {} of {} files", report.succeeded, report.total);
    Ok(())
}

fn run_detect(paths: &[PathBuf]) -> Result<()> {
    let converter = BatchConverter::new(ChardetngDetector::new());
    for path in paths {
        let entry = FileEntry::new(path.clone());
        match converter.inspect(path) {
            Ok(Some(outcome)) => println!(
                "{}: {} (confidence {:.2})",
                entry.display_path, outcome.name, outcome.confidence
            ),
            Ok(None) => println!("{}: detection failed", entry.display_path),
            Err(e) => println!("{}: {e}", entry.display_path),
        }
    }
    Ok(())
}

/// Resolve the filter for this run: an explicit file is parsed and
/// persisted for future runs, otherwise the persisted filter applies.
/// A malformed filter file aborts the run; no partial filter is applied.
fn resolve_filter(filter_path: Option<PathBuf>, no_filter: bool) -> Result<ExtensionFilter> {
    if no_filter {
        return Ok(ExtensionFilter::empty());
    }

    match filter_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read filter file {}", path.display()))?;
            let filter = ExtensionFilter::parse(&raw)
                .with_context(|| format!("malformed filter file {}; filter not applied", path.display()))?;
            let store = persisted_filter_path();
            if let Err(e) = filter.save(&store) {
                tracing::warn!("could not persist filter to {}: {e}", store.display());
            }
            Ok(filter)
        }
        None => {
            let store = persisted_filter_path();
            ExtensionFilter::load(&store)
                .with_context(|| format!("malformed persisted filter {}", store.display()))
        }
    }
}

fn persisted_filter_path() -> PathBuf {
    ProjectDirs::from("com", "textconv", "textconv")
        .map(|dirs| dirs.config_dir().join("filter.txt"))
        .unwrap_or_else(|| PathBuf::from("./filter.txt"))
}

/// Expand the argument list into the ordered, deduplicated batch.
/// Directories are walked recursively; the filter decides admission.
fn collect_files(paths: &[PathBuf], filter: &ExtensionFilter) -> Vec<FileEntry> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    let mut push = |path: PathBuf, files: &mut Vec<FileEntry>| {
        if filter.matches(&path) && seen.insert(path.clone()) {
            files.push(FileEntry::new(path));
        }
    };

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                match entry {
                    Ok(e) if e.file_type().is_file() => push(e.into_path(), &mut files),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("skipping unreadable entry: {e}"),
                }
            }
        } else {
            push(path.clone(), &mut files);
        }
    }

    files
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.green/white} {pos}/{len}")
            .expect("static progress template")
            .progress_chars("█▓░"),
    );
    bar
}
