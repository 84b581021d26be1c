//! Command line front end
//!
//! Usage:
//!   chartgen generate <folder>... [options]   Generate lower tiers
//!   chartgen convert <file.mid> [options]     Convert a MIDI chart
//!   chartgen history [--limit <n>] [--clear]  Show recent activity
//!   chartgen config [--init]                  Show or write the config file
//!
//! Options:
//!   --scan <root>          Also queue every chart folder under <root>
//!   --instrument <name>    guitar, coop, bass, rhythm, drums, keys
//!   --difficulty <tier>    easy, medium, hard, or all
//!   --output <path>        Where to write the converted chart
//!   --keep-empty           Keep empty sections when converting
//!   --limit <n>            Number of history entries to show
//!   --json                 Output in JSON format

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};
use walkdir::WalkDir;

use chartgen_core::activity::{ActivityEntry, ActivityLog, ActivityType};
use chartgen_core::config::Config;
use chartgen_core::job::SourceKind;
use chartgen_core::{chart, midi, Difficulty, Instrument, JobEvent, JobKey, LocalFs, QueueWorker};

/// CLI command to execute
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Generate {
        folders: Vec<PathBuf>,
        scan: Option<PathBuf>,
        instrument: Instrument,
        difficulties: Vec<Difficulty>,
    },
    Convert {
        input: PathBuf,
        output: Option<PathBuf>,
        keep_empty: bool,
    },
    History {
        limit: usize,
        clear: bool,
    },
    Config {
        init: bool,
    },
}

/// History entries shown when `--limit` is not given
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// CLI options
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub json: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", flag))
}

/// Parse CLI arguments and return command + options
pub fn parse_args(args: &[String]) -> Result<(CliCommand, CliOptions), String> {
    let mut options = CliOptions::default();
    let mut command: Option<&str> = None;
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut scan = None;
    let mut output = None;
    let mut keep_empty = false;
    let mut limit = DEFAULT_HISTORY_LIMIT;
    let mut clear = false;
    let mut init = false;
    let mut instrument = Instrument::Guitar;
    let mut difficulties = Difficulty::GENERATED.to_vec();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--json" => options.json = true,
            "--keep-empty" => keep_empty = true,
            "--clear" => clear = true,
            "--init" => init = true,
            "--limit" | "-n" => {
                i += 1;
                limit = value(args, i, "--limit")?
                    .parse()
                    .map_err(|_| "--limit expects a number".to_string())?;
            }
            "--scan" => {
                i += 1;
                scan = Some(PathBuf::from(value(args, i, "--scan")?));
            }
            "--output" | "-o" => {
                i += 1;
                output = Some(PathBuf::from(value(args, i, "--output")?));
            }
            "--instrument" | "-i" => {
                i += 1;
                instrument = value(args, i, "--instrument")?.parse()?;
            }
            "--difficulty" | "-d" => {
                i += 1;
                difficulties = parse_difficulties(value(args, i, "--difficulty")?)?;
            }
            "generate" | "convert" | "history" | "config" if command.is_none() => command = Some(arg.as_str()),
            _ if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            _ if command.is_none() => return Err(format!("Unknown command: {}", arg)),
            _ => paths.push(PathBuf::from(arg)),
        }
        i += 1;
    }

    let command = match command {
        Some("generate") => {
            if paths.is_empty() && scan.is_none() {
                return Err("generate requires at least one folder or --scan <root>".to_string());
            }
            CliCommand::Generate {
                folders: paths,
                scan,
                instrument,
                difficulties,
            }
        }
        Some("history") | Some("config") if !paths.is_empty() => {
            return Err(format!("Unexpected argument: {}", paths[0].display()));
        }
        Some("history") => CliCommand::History { limit, clear },
        Some("config") => CliCommand::Config { init },
        Some(_) => {
            let mut paths = paths.into_iter();
            let input = paths
                .next()
                .ok_or_else(|| "convert requires a MIDI file".to_string())?;
            if paths.next().is_some() {
                return Err("convert takes a single file".to_string());
            }
            CliCommand::Convert {
                input,
                output,
                keep_empty,
            }
        }
        None => {
            return Err(
                "No command specified. Use: generate, convert, history or config".to_string(),
            )
        }
    };

    Ok((command, options))
}

fn parse_difficulties(s: &str) -> Result<Vec<Difficulty>, String> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(Difficulty::GENERATED.to_vec());
    }
    match s.parse::<Difficulty>()? {
        Difficulty::Expert => Err("Expert is the source tier and cannot be generated".to_string()),
        difficulty => Ok(vec![difficulty]),
    }
}

/// Folders under `root` that hold at least one chart file
pub fn discover_chart_folders(root: &Path) -> Vec<PathBuf> {
    let folders: BTreeSet<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| SourceKind::from_path(e.path()).is_some())
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    debug!(root = %root.display(), count = folders.len(), "discovered chart folders");
    folders.into_iter().collect()
}

/// Run CLI command
pub fn run(command: CliCommand, options: CliOptions) -> anyhow::Result<()> {
    match command {
        CliCommand::Generate {
            folders,
            scan,
            instrument,
            difficulties,
        } => run_generate(folders, scan, instrument, &difficulties, options),
        CliCommand::Convert {
            input,
            output,
            keep_empty,
        } => run_convert(&input, output, keep_empty, options),
        CliCommand::History { limit, clear } => run_history(limit, clear, options),
        CliCommand::Config { init } => run_config(init, options),
    }
}

fn run_generate(
    mut folders: Vec<PathBuf>,
    scan: Option<PathBuf>,
    instrument: Instrument,
    difficulties: &[Difficulty],
    options: CliOptions,
) -> anyhow::Result<()> {
    let config = Config::load();
    let mut activity = ActivityLog::load();

    if let Some(root) = scan {
        folders.extend(discover_chart_folders(&root));
    }
    if folders.is_empty() {
        anyhow::bail!("No chart folders found");
    }

    let (tx, rx) = mpsc::channel();
    let worker = QueueWorker::spawn(Arc::new(LocalFs), config.generation_options(), tx);

    let mut queued = 0;
    for folder in &folders {
        for difficulty in difficulties {
            if worker.add(JobKey::new(folder, instrument, *difficulty)) {
                queued += 1;
            }
        }
    }
    activity.log(
        ActivityType::Info,
        format!("Queued {} {} job(s)", queued, instrument),
    );

    let mut generated = Vec::new();
    let mut failed = Vec::new();
    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                activity.record(&event);
                match event {
                    JobEvent::Progress {
                        key, header, body, ..
                    } => {
                        if !options.json {
                            eprintln!("[{}] {}: {}", key.folder.display(), header, body);
                        }
                    }
                    JobEvent::Done { key, output_path } => {
                        if !options.json {
                            println!("Generated {} -> {}", key, output_path.display());
                        }
                        generated.push((key, output_path));
                    }
                    JobEvent::Error { key, error } => {
                        if !options.json {
                            println!("Failed {}: {}", key, error);
                        }
                        failed.push((key, error));
                    }
                    JobEvent::Canceled { key } => {
                        if !options.json {
                            println!("Canceled {}", key);
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) if worker.is_idle() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    worker.shutdown();

    if let Err(e) = activity.save() {
        warn!("Failed to save activity log: {}", e);
    }

    if options.json {
        let generated: Vec<_> = generated
            .iter()
            .map(|(key, path)| {
                serde_json::json!({
                    "folder": key.folder.to_string_lossy(),
                    "instrument": key.instrument,
                    "difficulty": key.difficulty,
                    "output": path.to_string_lossy(),
                })
            })
            .collect();
        let errors: Vec<_> = failed
            .iter()
            .map(|(key, error)| {
                serde_json::json!({
                    "folder": key.folder.to_string_lossy(),
                    "instrument": key.instrument,
                    "difficulty": key.difficulty,
                    "header": error.header,
                    "body": error.body,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "queued": queued,
                "generated": generated,
                "errors": errors,
            })
        );
    } else {
        println!();
        println!("Generation Complete:");
        println!("  Queued:    {}", queued);
        println!("  Generated: {}", generated.len());
        println!("  Failed:    {}", failed.len());
    }

    if !failed.is_empty() {
        anyhow::bail!("{} job(s) failed", failed.len());
    }
    Ok(())
}

fn run_convert(
    input: &Path,
    output: Option<PathBuf>,
    keep_empty: bool,
    options: CliOptions,
) -> anyhow::Result<()> {
    let config = Config::load();
    let mut conversion = config.generation_options().conversion;
    if keep_empty {
        conversion.omit_empty_sections = false;
    }

    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let doc = midi::convert_document(&bytes, &conversion)?;
    let output = output.unwrap_or_else(|| input.with_file_name(&config.output_file_name));
    std::fs::write(&output, chart::serialize(&doc))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let mut activity = ActivityLog::load();
    activity.log_with_details(
        ActivityType::Convert,
        format!("Converted {}", input.display()),
        output.display().to_string(),
    );
    if let Err(e) = activity.save() {
        warn!("Failed to save activity log: {}", e);
    }

    let sections: Vec<&str> = doc.section_names().collect();
    if options.json {
        println!(
            "{}",
            serde_json::json!({
                "input": input.to_string_lossy(),
                "output": output.to_string_lossy(),
                "sections": sections,
            })
        );
    } else {
        println!("Converted {} -> {}", input.display(), output.display());
        println!("  Sections: {}", sections.join(", "));
    }
    Ok(())
}

fn run_history(limit: usize, clear: bool, options: CliOptions) -> anyhow::Result<()> {
    let mut activity = ActivityLog::load();

    if clear {
        let count = activity.len();
        activity.clear();
        activity.save().context("Failed to save activity log")?;
        if options.json {
            println!("{}", serde_json::json!({ "cleared": count }));
        } else {
            println!("Cleared {} history entries", count);
        }
        return Ok(());
    }

    let entries = activity.recent(limit);
    if options.json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else if entries.is_empty() {
        println!("No activity recorded yet");
    } else {
        for entry in entries {
            println!("{}", format_entry(entry));
        }
    }
    Ok(())
}

/// One history line: timestamp, padded activity type, description, details
fn format_entry(entry: &ActivityEntry) -> String {
    let mut line = format!(
        "{}  {:<8}  {}",
        entry.formatted_datetime(),
        entry.activity_type.display_name(),
        entry.description
    );
    if let Some(details) = &entry.details {
        line.push_str(&format!(" ({})", details));
    }
    line
}

fn run_config(init: bool, options: CliOptions) -> anyhow::Result<()> {
    let path = Config::config_path().context("No configuration directory on this system")?;
    let existed = path.exists();
    let config = Config::load_from(&path);

    // Writing back fills in any keys the file was missing
    if init {
        config
            .save_to(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if options.json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.to_string_lossy(),
                "exists": existed || init,
                "config": config,
            })
        );
    } else {
        if init {
            println!("Wrote {}", path.display());
        } else if !existed {
            println!("{} (not created yet, showing defaults)", path.display());
        } else {
            println!("{}", path.display());
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(())
}

/// Print CLI help
pub fn print_help() {
    println!("chartgen v{}", env!("CARGO_PKG_VERSION"));
    println!("Generate Easy, Medium and Hard tracks from Expert charts");
    println!();
    println!("USAGE:");
    println!("    chartgen <command> [options]");
    println!();
    println!("COMMANDS:");
    println!("    generate <folder>...        Generate tiers for each chart folder");
    println!("    convert <file.mid>          Convert a MIDI chart to .chart text");
    println!("    history                     Show recent generations and conversions");
    println!("    config                      Show the configuration file");
    println!();
    println!("OPTIONS:");
    println!("    --scan <root>               Queue every chart folder under <root>");
    println!("    --instrument, -i <name>     guitar, coop, bass, rhythm, drums, keys");
    println!("    --difficulty, -d <tier>     easy, medium, hard, or all (default)");
    println!("    --output, -o <path>         Output path for convert");
    println!("    --keep-empty                Keep empty sections when converting");
    println!("    --limit, -n <count>         History entries to show (default 20)");
    println!("    --clear                     Erase the history");
    println!("    --init                      Write the config file with defaults filled in");
    println!("    --json                      Output in JSON format");
    println!("    --help                      Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    chartgen generate \"Songs/My Song\"");
    println!("    chartgen generate --scan Songs -i drums -d hard");
    println!("    chartgen convert notes.mid -o notes.chart --json");
    println!("    chartgen history -n 5");
}
