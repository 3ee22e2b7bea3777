use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use heft_core::config::DEFAULT_CODE_FRACTION;
use heft_core::report::{merge_entries, rollup, top_level_package};
use heft_core::workdir::{parse_build_log, scan_work_dir, work_dir_from_log};
use heft_core::{Analyzer, AnalyzerConfig, ModuleEntry};
use heft_utils::{info, init_logging, init_logging_with_level, locate_module_cache, LogFormat, LogLevel};

mod render;
mod toolchain;

use crate::render::{render_json, render_text};
use crate::toolchain::{build_binary, build_with_work_dir, remove_work_dir, BuildOptions};

/// Find which Go modules and packages make a compiled binary heavy.
#[derive(Parser, Debug)]
#[command(name = "heft")]
#[command(version)]
#[command(about = "Find which Go modules and packages make a compiled binary heavy", long_about = None)]
struct Cli
{
    /// Packages to build (as passed to `go build`)
    packages: Vec<String>,

    /// Analyze an existing binary instead of building one
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["build_analysis", "work_dir"])]
    binary: Option<PathBuf>,

    /// Size packages by the archives a verbose build compiles
    #[arg(long, conflicts_with = "work_dir")]
    build_analysis: bool,

    /// Size packages from an existing `go build -work` directory
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Build tags
    #[arg(short, long)]
    tags: Option<String>,

    /// Output JSON
    #[arg(short, long)]
    json: bool,

    /// Show every package instead of grouping by top-level path
    #[arg(short, long)]
    verbose: bool,

    /// Fraction of the file attributed to code when symbol sizes are missing
    #[arg(long, value_name = "FRACTION", default_value_t = DEFAULT_CODE_FRACTION)]
    code_fraction: f64,

    /// Module cache root (default: GOMODCACHE, GOPATH/pkg/mod or ~/go/pkg/mod)
    #[arg(long, value_name = "DIR")]
    mod_cache: Option<PathBuf>,

    /// Also size modules without symbol sizes from the module cache
    #[arg(long)]
    fill_missing: bool,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

/// Rows to print and whether their sizes are estimates.
struct Output
{
    entries: Vec<ModuleEntry>,
    estimated: bool,
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => LogFormat::from_env().and_then(|format| init_logging_with_level(level, format)),
        None => init_logging(),
    };
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let options = BuildOptions {
        tags: cli.tags.clone(),
        packages: cli.packages.clone(),
    };

    let output = if let Some(dir) = &cli.work_dir {
        work_dir_output(dir, &AnalyzerConfig::new()?)?
    } else if cli.build_analysis {
        build_analysis_output(&options)?
    } else {
        let config = analyzer_config(cli)?;
        match &cli.binary {
            Some(binary) => binary_output(binary, &config)?,
            None => {
                let built = build_binary(&options)?;
                binary_output(&built.path(), &config)?
            }
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        render_json(&output.entries, &mut out)?;
    } else if cli.verbose {
        render_text(&output.entries, output.estimated, &mut out)?;
    } else {
        let grouped = rollup(&output.entries, top_level_package);
        render_text(&grouped, output.estimated, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Composition root for the analyzer configuration.
fn analyzer_config(cli: &Cli) -> Result<AnalyzerConfig, Box<dyn std::error::Error>>
{
    let module_cache = cli.mod_cache.clone().or_else(locate_module_cache);
    info!(module_cache = ?module_cache, code_fraction = cli.code_fraction, "configuring analyzer");

    let config = AnalyzerConfig::new()?
        .with_code_fraction(cli.code_fraction)?
        .with_module_cache(module_cache)
        .with_fill_missing_from_cache(cli.fill_missing);
    Ok(config)
}

fn binary_output(binary: &Path, config: &AnalyzerConfig) -> Result<Output, Box<dyn std::error::Error>>
{
    let report = Analyzer::new(config).analyze(binary)?;
    info!(
        binary = %report.binary.display(),
        format = %report.format,
        go_version = %report.go_version,
        advisories = report.advisories.len(),
        "analysis finished"
    );
    let estimated = report.is_estimate();
    Ok(Output {
        entries: report.entries,
        estimated,
    })
}

fn work_dir_output(dir: &Path, config: &AnalyzerConfig) -> Result<Output, Box<dyn std::error::Error>>
{
    Ok(Output {
        entries: scan_work_dir(dir, config.patterns())?,
        estimated: false,
    })
}

fn build_analysis_output(options: &BuildOptions) -> Result<Output, Box<dyn std::error::Error>>
{
    let config = AnalyzerConfig::new()?;
    let patterns = config.patterns();
    let log = build_with_work_dir(options)?;

    let mut entries = parse_build_log(&log, patterns);
    if let Some(work) = work_dir_from_log(&log, patterns) {
        let scanned = scan_work_dir(&work, patterns);
        remove_work_dir(&work);
        entries.extend(scanned?);
    }

    Ok(Output {
        entries: merge_entries(entries),
        estimated: false,
    })
}
