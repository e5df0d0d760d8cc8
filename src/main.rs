//! FileXtransfer CLI - copy the files a backup tree is missing

use clap::Parser;
use filextransfer::config::{CliArgs, OutputFormat, SyncSession};
use filextransfer::core::{BatchEvent, BatchResult, ProgressSink, SyncEngine};
use filextransfer::error::{FileXferError, Result};
use filextransfer::progress::ProgressReporter;
use filextransfer::report::RunLog;
use filextransfer::sync::SyncAnalysis;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    init_logging(&args);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise -v/-q pick the level
fn init_logging(args: &CliArgs) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// JSON document printed with `--output-format json`
#[derive(Serialize)]
struct JsonReport<'a> {
    analysis: &'a SyncAnalysis,
    result: Option<&'a BatchResult>,
    run_log: Option<PathBuf>,
}

/// Returns whether the run was a full success
fn run(args: CliArgs) -> Result<bool> {
    let session = SyncSession::from_cli(&args).map_err(FileXferError::ConfigError)?;
    let text = args.output_format == OutputFormat::Text;
    let chatty = text && !args.quiet;

    if args.verbose > 0 && chatty {
        print_session(&session);
    }

    let engine = SyncEngine::new(session)?;
    let analysis = engine.analyze()?;

    if args.dry_run {
        if text {
            if !args.quiet {
                analysis.print_summary();
                println!("\n=== Dry Run Mode ===");
                println!("No files will be copied.");
            }
            for path in &analysis.missing {
                println!("{}", path);
            }
        } else {
            print_json(&analysis, None, None)?;
        }
        return Ok(true);
    }

    if analysis.missing.is_empty() {
        if chatty {
            println!("Nothing to copy: the destination already has every origin file.");
        } else if !text {
            print_json(&analysis, None, None)?;
        }
        return Ok(true);
    }

    if chatty {
        analysis.print_summary();
        println!();
    }

    let progress = if args.progress && chatty {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };

    let handle = engine.spawn_copy(&analysis)?;
    for event in handle.events().iter() {
        match event {
            BatchEvent::Progress(update) => {
                if chatty && !progress.is_enabled() {
                    println!("[{}/{}] {}", update.current, update.total, update.message);
                }
                progress.on_progress(&update);
            }
            BatchEvent::Finished(summary) => progress.on_finished(&summary),
        }
    }
    let result = handle.join()?;

    let run_log = if engine.session().write_run_log {
        match RunLog::new(engine.session(), &analysis, &result).write() {
            Ok(path) => Some(path),
            Err(e) => {
                eprintln!("Warning: could not write run log: {}", e);
                None
            }
        }
    } else {
        None
    };

    if text {
        if !args.quiet {
            result.print_summary();
            if let Some(path) = &run_log {
                println!("\nRun log: {}", path.display());
            }
        }
    } else {
        print_json(&analysis, Some(&result), run_log)?;
    }

    Ok(result.is_success())
}

fn print_json(analysis: &SyncAnalysis, result: Option<&BatchResult>, run_log: Option<PathBuf>) -> Result<()> {
    let report = JsonReport {
        analysis,
        result,
        run_log,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_session(session: &SyncSession) {
    println!("=== Session ===");
    println!("Origin:       {}", session.origin.display());
    println!("Destination:  {}", session.destination.display());
    println!("Copy target:  {}", session.target().display());
    println!("Mode:         {}", session.mode.name());
    println!("Chunk size:   {}", humansize::format_size(session.chunk_size as u64, humansize::BINARY));
    println!("Traversal:    {:?}", session.traversal);
    if session.fsync {
        println!("Sync:         fsync each file");
    }
    println!("Symlinks:     {}", if session.follow_symlinks { "follow" } else { "ignore" });
    if !session.exclude_patterns.is_empty() {
        println!("Exclude:      {}", session.exclude_patterns.join(", "));
    }
    println!();
}
