//! Application runner: scan -> resolve -> report.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::cli::{Args, DEFAULT_DIR};
use crate::config::{PathConfig, Settings};
use crate::report;
use crate::resolver::{self, ClipGraph, ClipIndex};
use crate::scan::{self, ScanOptions};

/// Run one resolution with the given arguments.
///
/// # Returns
/// * `Ok(())` when the report was written
/// * `Err` on input/output failure, or on diagnostics in strict mode
pub fn run(args: &Args, path_config: &PathConfig) -> Result<()> {
    let settings_path = path_config.settings_file();
    debug!("Settings path: {}", settings_path.display());
    let mut settings = Settings::load(&settings_path)?;
    settings.apply_args(args);
    debug!("Effective settings: {:?}", settings);

    let names = collect_names(args, &settings)?;
    info!("Collected {} clip names", names.len());

    let graph = resolve_names(names, &settings)?;
    for diagnostic in graph.diagnostics() {
        warn!("{}", diagnostic);
    }

    let text = report::render(&graph, settings.format, settings.pretty)
        .context("Failed to serialize clip graph")?;
    report::write_output(&text, args.output.as_deref())?;

    if let Some(out) = &args.output {
        info!("Wrote {} clips to {}", graph.len(), out.display());
    }

    if settings.strict && !graph.diagnostics().is_empty() {
        bail!("{} diagnostic(s) reported (strict mode)", graph.diagnostics().len());
    }
    Ok(())
}

/// Gather names from every requested source, in argument order:
/// directory, glob, explicit files, stdin.
pub fn collect_names(args: &Args, settings: &Settings) -> Result<Vec<String>> {
    let opts = ScanOptions {
        recursive: settings.recursive,
        include_hidden: settings.include_hidden,
        ..Default::default()
    }
    .with_extensions(&settings.extensions);

    let mut names = Vec::new();

    let dir = match &args.dir {
        Some(dir) => Some(dir.clone()),
        None if args.uses_default_dir() => Some(PathBuf::from(DEFAULT_DIR)),
        None => None,
    };
    if let Some(dir) = dir {
        names.extend(scan_dir(&dir, &opts)?);
    }

    if let Some(pattern) = &args.glob {
        names.extend(scan::clip_names_from_glob(pattern, &opts)?);
    }

    names.extend(scan::clip_names_from_paths(&args.files));

    if args.stdin {
        let stdin = std::io::stdin().lock();
        names.extend(scan::clip_names_from_lines(stdin)?);
    }

    Ok(names)
}

fn scan_dir(dir: &Path, opts: &ScanOptions) -> Result<Vec<String>> {
    info!("Scanning {}", dir.display());
    scan::clip_names_in_dir(dir, opts).with_context(|| format!("Failed to scan {}", dir.display()))
}

/// Resolve on a dedicated rayon pool sized from settings.
pub fn resolve_names(names: Vec<String>, settings: &Settings) -> Result<ClipGraph> {
    let workers = settings.worker_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("clipgraph-resolve-{}", i))
        .build()
        .context("Failed to create resolver thread pool")?;
    debug!("Resolver pool: {} threads", workers);

    let index = ClipIndex::new(names);
    let graph = resolver::resolve_with_pool(&pool, &index);
    info!(
        "Resolved {} clips ({} with next, {} with alternates)",
        graph.len(),
        graph.iter().filter(|c| !c.next.is_empty()).count(),
        graph.iter().filter(|c| !c.alternates.is_empty()).count()
    );
    Ok(graph)
}
