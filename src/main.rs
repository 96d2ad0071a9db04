use anyhow::{bail, Context, Result};
use clap::Parser;
use feedtables::{
    config::SessionConfig, load::LogProgress, DiagnosticReport, Feed, FeedSession,
};
use glob::glob;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Load GTFS feed archives, report data problems and optionally rewrite them"
)]
struct Args {
    /// Feed archives or glob patterns such as `feeds/*.zip`
    #[arg(required = true)]
    inputs: Vec<String>,
    /// YAML session settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write a normalized copy of each feed here
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write a JSON diagnostic report for each feed here
    #[arg(long)]
    report_dir: Option<PathBuf>,
    /// Log read progress of each table (implies --sequential)
    #[arg(long)]
    progress: bool,
    /// Load tables one at a time
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_yaml_path(path)?,
        None => SessionConfig::default(),
    };
    // one progress listener tracks one table at a time
    if args.sequential || args.progress {
        config.parallel = false;
    }

    for dir in [&args.output_dir, &args.report_dir].into_iter().flatten() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let feeds = expand_inputs(&args.inputs)?;
    info!("{} feed(s) to process", feeds.len());

    let mut failed = 0;
    for path in &feeds {
        if let Err(e) = process_feed(path, &args, &config) {
            error!("{}: {:#}", path.display(), e);
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{} of {} feeds failed", failed, feeds.len());
    }
    Ok(())
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
            .filter_map(|p| p.ok())
            .collect();
        if matched.is_empty() {
            warn!("no files match {}", pattern);
        }
        paths.extend(matched);
    }
    if paths.is_empty() {
        bail!("no feed archives found");
    }
    Ok(paths)
}

fn process_feed(path: &Path, args: &Args, config: &SessionConfig) -> Result<()> {
    let start = Instant::now();
    let mut session = FeedSession::new(config.clone());
    if args.progress {
        session = session.with_progress(Arc::new(LogProgress::new()));
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;

    // a feed cut short by an archive fault still gets its report
    let mut feed = Feed::new();
    let loaded = feed.load_path_into(path, &session);
    if loaded.is_ok() {
        if let Some(dir) = &args.output_dir {
            feed.write_path(dir.join(file_name), &session)?;
        }
    }

    let report = DiagnosticReport::new(
        path.display().to_string(),
        feed.table_sizes(),
        session.into_diagnostics(),
    );
    for (kind, count) in &report.counts_by_kind {
        info!(kind, count, "diagnostics");
    }
    if report.has_missing_tables() {
        warn!("{} is missing required tables", path.display());
    }

    if let Some(dir) = &args.report_dir {
        let out = dir.join(Path::new(file_name).with_extension("json"));
        let writer = BufWriter::new(
            File::create(&out).with_context(|| format!("creating {}", out.display()))?,
        );
        serde_json::to_writer_pretty(writer, &report)
            .with_context(|| format!("writing report {}", out.display()))?;
        info!("report → {}", out.display());
    }
    loaded?;

    info!(
        "{} done in {:.2?}: {} diagnostics",
        path.display(),
        start.elapsed(),
        report.diagnostics.len()
    );
    Ok(())
}
