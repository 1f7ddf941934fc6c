use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use javelin_assist::{
    parse_for_completion_with_options, parse_for_selection_with_options, parse_skeleton,
    AssistOptions, AssistResult,
};
use javelin_config::JavelinConfig;
use javelin_syntax::ParseMode;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "javelin", version, about = "Javelin completion and selection parser")]
struct Cli {
    /// TOML config file (defaults to `$JAVELIN_CONFIG`, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a file for completion at a caret
    Complete(CompleteArgs),
    /// Parse a file for selection of an identifier
    Select(SelectArgs),
    /// Print the declaration skeleton of a file
    Dump(DumpArgs),
}

#[derive(Args)]
struct CompleteArgs {
    /// Java source file
    file: PathBuf,
    /// Caret as a byte offset into the file
    #[arg(long, required_unless_present = "caret_marker", conflicts_with = "caret_marker")]
    offset: Option<usize>,
    /// Text marking the caret; removed before parsing
    #[arg(long)]
    caret_marker: Option<String>,
    /// Body handling (`diet` or `method`); overrides the config
    #[arg(long)]
    mode: Option<ParseMode>,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SelectArgs {
    /// Java source file
    file: PathBuf,
    /// Selection start (byte offset)
    #[arg(long)]
    start: usize,
    /// Selection end (byte offset)
    #[arg(long)]
    end: usize,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DumpArgs {
    /// Java source file
    file: PathBuf,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    javelin_config::init_tracing(&config.logging);

    match cli.command {
        Command::Complete(args) => {
            let text = read_source(&args.file)?;
            let (source, caret) = match (&args.caret_marker, args.offset) {
                (Some(marker), _) => split_caret(&text, marker)?,
                (None, Some(offset)) => (text, offset),
                (None, None) => bail!("either --offset or --caret-marker is required"),
            };
            let options = AssistOptions {
                mode: args.mode.unwrap_or(config.parser.mode),
                max_depth: config.parser.max_depth,
            };
            let result = parse_for_completion_with_options(&source, caret, options)
                .with_context(|| format!("cannot complete in {}", args.file.display()))?;
            print_result(&result, args.json)?;
            Ok(0)
        }
        Command::Select(args) => {
            let source = read_source(&args.file)?;
            let options = AssistOptions {
                max_depth: config.parser.max_depth,
                ..AssistOptions::default()
            };
            let result = parse_for_selection_with_options(&source, args.start, args.end, options)
                .with_context(|| format!("cannot select in {}", args.file.display()))?;
            print_result(&result, args.json)?;
            Ok(0)
        }
        Command::Dump(args) => {
            let source = read_source(&args.file)?;
            let options = AssistOptions {
                max_depth: config.parser.max_depth,
                ..AssistOptions::default()
            };
            let result = parse_skeleton(&source, options)
                .with_context(|| format!("cannot parse {}", args.file.display()))?;
            if args.json {
                print_json(&result.summary())?;
            } else {
                print!("{}", result.unit_string());
                for error in result.errors() {
                    println!("error:{}..{}: {}", error.range.start, error.range.end, error.message);
                }
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<JavelinConfig> {
    match path {
        Some(path) => JavelinConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => JavelinConfig::load().context("failed to load config from $JAVELIN_CONFIG"),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Remove the first `marker` from `text` and return the caret it stood for.
fn split_caret(text: &str, marker: &str) -> Result<(String, usize)> {
    if marker.is_empty() {
        bail!("--caret-marker must not be empty");
    }
    let Some(caret) = text.find(marker) else {
        bail!("caret marker {marker:?} not found in the source");
    };
    Ok((text.replacen(marker, "", 1), caret))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_result(result: &AssistResult, json: bool) -> Result<()> {
    if json {
        return print_json(&result.summary());
    }
    println!("marker: {}", result.marker_string());
    println!("parent: {}", result.parent_string());
    if let (Some(identifier), Some(range)) = (result.identifier(), result.replaced_range()) {
        println!("identifier: {identifier}");
        println!(
            "replaced: {}..{} {:?}",
            range.start,
            range.end,
            result.replaced_source().unwrap_or_default()
        );
    }
    if let Some(scope) = result.scope() {
        println!("scope: {scope:?}");
    }
    for local in result.visible_locals() {
        match &local.ty {
            Some(ty) => println!("local: {ty} {}", local.name),
            None => println!("local: {}", local.name),
        }
    }
    println!("unit:");
    print!("{}", result.unit_string());
    Ok(())
}
