//! feedscope command line
//!
//! Profiles every file matching an input pattern into one report.
//!
//! # Usage
//!
//! ```bash
//! # Schema profile of every JSON lines file, as a table on stdout:
//! feedscope 'data/*.jsonl'
//!
//! # Partition by the `schema` attribute and write CSV:
//! feedscope 'data/*.jsonl' --group-by schema -o profile.csv
//!
//! # Only Person records, enumerating two attributes:
//! feedscope feed.json --group-by schema=Person --enumerate properties.country,properties.gender
//!
//! # Pivot: values of `number` by `type` and `country` inside `properties`:
//! feedscope feed.json --enumerate properties:type,country:number --format json
//!
//! # Latin-1 CSV export:
//! feedscope export.csv --encoding latin1
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` overrides `--log-level`.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser as ClapParser;
use feedscope::analyzers::ROOT_PATH;
use feedscope::config::{EnumerationSpec, GroupingConfig, ProfilerConfig, RecordFilter};
use feedscope::formatters::OutputFormat;
use feedscope::logging::setup::{init_logging, LoggingConfig};
use feedscope::logging::LogConfig;
use feedscope::profiler::{Profiler, RunStatus};
use feedscope::report::{Report, ReportMetadata};
use feedscope::sources::{
    encoding_for_label, expand_inputs, open_records_with, FileType, SourceOptions,
};
use tracing::{debug, error, info, warn, Level};

/// Exit status when profiling was interrupted with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 9;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Discover the structure of an unknown data feed.
#[derive(ClapParser, Debug)]
#[command(name = "feedscope", version)]
struct Cli {
    /// Input file or glob pattern (quote it to stop the shell expanding it).
    input: String,

    /// File type: csv, json, jsonl, xml or parquet. Detected from each
    /// file's extension when omitted.
    #[arg(short = 't', long)]
    file_type: Option<FileType>,

    /// Character encoding of CSV and JSON input, e.g. utf-8 or latin1.
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format: table, csv or json. Defaults to csv when writing to a
    /// file and table otherwise.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Number of top values shown per attribute.
    #[arg(long, default_value_t = 10)]
    top_values: usize,

    /// Only profile records where `attr` equals `value` (`attr=value`).
    #[arg(long)]
    filter: Option<RecordFilter>,

    /// Partition statistics by an attribute (`attr`), optionally keeping a
    /// single group (`attr=value`).
    #[arg(long)]
    group_by: Option<GroupingConfig>,

    /// Enumerate values: `a,b.c` for attribute paths or
    /// `level:dim1,dim2:value` for a pivot.
    #[arg(long)]
    enumerate: Option<EnumerationSpec>,

    /// Print the discovered attribute tree before the report.
    #[arg(long, default_value_t = false)]
    tree: bool,

    /// Log level for feedscope components.
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

impl Cli {
    fn profiler_config(&self) -> ProfilerConfig {
        let mut builder = ProfilerConfig::builder().top_values(self.top_values);
        if let Some(grouping) = &self.group_by {
            builder = builder.group_by(grouping.clone());
        }
        if let Some(filter) = &self.filter {
            builder = builder.filter(filter.clone());
        }
        if let Some(spec) = &self.enumerate {
            builder = builder.enumerate(spec.clone());
        }
        if self.log_level < Level::INFO {
            builder = builder.log_config(LogConfig::quiet());
        }
        builder.build()
    }

    fn source_options(&self) -> Result<SourceOptions> {
        let encoding = encoding_for_label(&self.encoding)?;
        Ok(SourceOptions::default().with_encoding(encoding))
    }

    fn output_format(&self) -> OutputFormat {
        match (self.format, &self.output) {
            (Some(format), _) => format,
            (None, Some(_)) => OutputFormat::Csv,
            (None, None) => OutputFormat::Table,
        }
    }
}

/// Outcome of the blocking profiling task.
struct Profiled {
    profiler: Profiler,
    status: RunStatus,
    /// Error that ended the run early, if any.
    failure: Option<anyhow::Error>,
}

/// Reads every file in order into one profiler until done or interrupted.
fn profile_files(
    mut profiler: Profiler,
    paths: &[PathBuf],
    file_type: Option<FileType>,
    options: &SourceOptions,
    interrupt: &AtomicBool,
) -> Profiled {
    let total = paths.len();
    let mut status = RunStatus::Complete;

    for (i, path) in paths.iter().enumerate() {
        info!(path = %path.display(), "reading file {} of {}", i + 1, total);
        let file_type = file_type.unwrap_or_else(|| FileType::from_path(path));

        let result = open_records_with(path, file_type, options)
            .and_then(|records| profiler.run(records, interrupt))
            .with_context(|| format!("failed to profile {}", path.display()));
        match result {
            Ok(RunStatus::Complete) => {}
            Ok(RunStatus::Interrupted) => {
                status = RunStatus::Interrupted;
                break;
            }
            Err(e) => {
                return Profiled {
                    profiler,
                    status,
                    failure: Some(e),
                }
            }
        }
    }

    Profiled {
        profiler,
        status,
        failure: None,
    }
}

fn print_trees(profiler: &Profiler) {
    for (group, tree) in profiler.schema().trees().partitions() {
        print!("{}", tree.render_tree(group.unwrap_or(ROOT_PATH)));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        LoggingConfig::default()
            .with_feedscope_level(cli.log_level)
            .with_json_format(cli.json_logs),
    )
    .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let options = cli.source_options()?;
    let config = cli.profiler_config();
    debug!(config = %serde_json::to_string(&config)?, "Profiler configuration");
    let profiler = Profiler::new(config)?;
    let paths = expand_inputs(&cli.input)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = Arc::clone(&interrupt);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing with a partial report");
                interrupt.store(true, Ordering::Relaxed);
            }
        });
    }

    let file_type = cli.file_type;
    let profiled = {
        let interrupt = Arc::clone(&interrupt);
        let paths = paths.clone();
        tokio::task::spawn_blocking(move || {
            profile_files(profiler, &paths, file_type, &options, &interrupt)
        })
        .await
        .context("profiling task panicked")?
    };
    let Profiled {
        profiler,
        status,
        failure,
    } = profiled;

    let outcome = match &failure {
        Some(_) => "failed".to_string(),
        None => status.to_string(),
    };
    eprintln!("{} rows read, file {}", profiler.stats().records_read, outcome);

    if cli.tree {
        print_trees(&profiler);
    }

    let sources = paths.iter().map(|p| p.display().to_string()).collect();
    let type_label = file_type
        .or_else(|| paths.first().map(|p| FileType::from_path(p)))
        .map_or("unknown", |t| t.as_str());
    let metadata = ReportMetadata::new(&profiler, sources, type_label);
    let report = if profiler.config().enumeration.is_some() {
        Report::enumeration(&profiler, metadata)
    } else {
        Report::profile(&profiler, metadata)
    };

    let rendered = cli.output_format().formatter().format(&report)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{rendered}"),
    }

    if let Some(e) = failure {
        error!(error = %e, "Profiling stopped early");
        return Err(e);
    }
    if status == RunStatus::Interrupted {
        process::exit(EXIT_INTERRUPTED);
    }
    if profiler.config().enumeration.is_some() && report.is_empty() {
        bail!("No enumeration data found for the specified attributes and filters");
    }
    Ok(())
}
