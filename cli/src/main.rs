//! monswitch CLI: save, load and print monitor profiles.

use std::path::PathBuf;
use std::process;

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use monswitch_core::command::Command;
use monswitch_core::data::profile;
use monswitch_core::display::{self, DisplayBackend, MemoryBackend};
use monswitch_core::sys::Sys;
use monswitch_core::types::config::{resolve_config_dir, SwitcherSettings};
use monswitch_core::types::response::Response;
use tracing::debug;
use tracing_subscriber::EnvFilter;


#[derive(Parser, Debug)]
#[command(name = "monswitch", version)]
#[command(about = "Save and restore monitor layouts", long_about = None)]
struct Cli {
    /// Capture the active layout into a profile
    #[arg(short, long, value_name = "PROFILE")]
    save: Vec<String>,

    /// Apply a saved profile
    #[arg(short, long, value_name = "PROFILE")]
    load: Vec<String>,

    /// Print a summary of the active layout
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    print: Vec<bool>,

    /// Profiles to apply, same as --load
    #[arg(value_name = "PROFILE")]
    profiles: Vec<String>,

    /// Apply adapter ids exactly as saved
    #[arg(long)]
    no_id_match: bool,

    /// Borrow live desktop-image modes for profiles saved without them
    #[arg(short = 'v', long)]
    virtual_inject: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Directory holding config.yaml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Dry run against a saved topology instead of the live display configuration
    #[arg(long, value_name = "FILE")]
    topology: Option<PathBuf>,

    /// Show help on a topic (profile, load, config)
    #[arg(long, value_name = "TOPIC")]
    help_topic: Option<String>,
}


fn main() {
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    init_tracing(cli.debug);

    let mut commands = ordered_commands(&cli, &matches);
    if commands.is_empty() || cli.help_topic.is_some() {
        commands.insert(0, Command::Help { topic: cli.help_topic.clone() });
    }

    let config_dir = cli.config_dir.clone().unwrap_or_else(resolve_config_dir);
    let settings = match SwitcherSettings::load(&config_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("monswitch error: {}", e);
            process::exit(1);
        }
    };
    debug!(config_dir = %config_dir.display(), "settings loaded");

    let backend = match open_backend(&cli) {
        Ok(b) => b,
        Err(message) => {
            eprintln!("monswitch error: {}", message);
            process::exit(1);
        }
    };

    let mut sys = Sys::new(settings, backend);
    for cmd in commands {
        debug!(?cmd, "executing");
        match sys.execute(cmd) {
            Response::Ok { output } => {
                if !output.is_empty() {
                    println!("{}", output.trim_end());
                }
            }
            Response::Error { message } => {
                eprintln!("monswitch error: {}", message);
                process::exit(1);
            }
        }
    }
}


/// `--debug` raises the default level; `RUST_LOG` wins when set.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}


fn open_backend(cli: &Cli) -> Result<Box<dyn DisplayBackend>, String> {
    match &cli.topology {
        Some(file) => {
            let snapshot = profile::load(file).map_err(|e| format!("topology {}: {}", file.display(), e))?;
            debug!(file = %file.display(), "dry run against saved topology");
            Ok(Box::new(MemoryBackend::new(snapshot).dry_run()))
        }
        None => display::native_backend().map_err(|e| e.to_string()),
    }
}


/// Operations in command-line order.
fn ordered_commands(cli: &Cli, matches: &ArgMatches) -> Vec<Command> {
    let mut ops: Vec<(usize, Command)> = Vec::new();
    let load = |path: &String| Command::ProfileLoad {
        path: path.clone(),
        no_id_match: cli.no_id_match,
        virtual_inject: cli.virtual_inject,
    };

    if let Some(indices) = matches.indices_of("save") {
        ops.extend(indices.zip(&cli.save).map(|(i, p)| (i, Command::ProfileSave { path: p.clone() })));
    }
    if let Some(indices) = matches.indices_of("load") {
        ops.extend(indices.zip(&cli.load).map(|(i, p)| (i, load(p))));
    }
    if let Some(indices) = matches.indices_of("profiles") {
        ops.extend(indices.zip(&cli.profiles).map(|(i, p)| (i, load(p))));
    }
    if matches.value_source("print") == Some(ValueSource::CommandLine) {
        if let Some(indices) = matches.indices_of("print") {
            ops.extend(indices.map(|i| (i, Command::ProfilePrint)));
        }
    }

    ops.sort_by_key(|(i, _)| *i);
    ops.into_iter().map(|(_, cmd)| cmd).collect()
}
