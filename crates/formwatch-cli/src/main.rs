//! `formwatch` – command line entry point for the posture feedback stack.
//!
//! * `formwatch serve` (default) starts the evaluation worker and the
//!   WebSocket relay on one event bus and runs until Ctrl-C.
//! * `formwatch eval <activity> <file|->` evaluates a single keypoint frame.
//! * `formwatch schema` prints the JSON Schema of the viewer `frame` message.
//! * `formwatch init` writes a default `~/.formwatch/config.toml`.

mod config;
mod eval;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use formwatch_kernel::Dispatcher;
use formwatch_middleware::EventBus;
use formwatch_relay::RelayServer;
use formwatch_runtime::{EvaluationWorker, init_tracing};
use formwatch_types::{ClientMessage, FormError};
use tracing::{info, warn};

use crate::config::Config;

/// Real-time exercise and sitting posture feedback
#[derive(Parser, Debug)]
#[command(name = "formwatch", author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.formwatch/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the evaluation worker and WebSocket relay
    Serve {
        /// Relay port (overrides the config file)
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Evaluate one frame of keypoints read from a JSON file
    Eval {
        /// Activity tag: "squat" or "desk"
        activity: String,
        /// JSON array of keypoints, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Print the JSON Schema of the viewer frame message
    Schema,
    /// Write a default config file if none exists
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing("formwatch");

    let result = match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let mut cfg = load_config(cli.config.as_ref());
            if let Some(port) = port {
                cfg.relay_port = port;
            }
            serve(cfg)
        }
        Command::Eval { activity, input } => {
            let cfg = load_config(cli.config.as_ref());
            run_eval(&cfg, &activity, &input)
        }
        Command::Schema => print_schema(),
        Command::Init => init_config(cli.config.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Load the config file, falling back to defaults when it is absent or broken.
fn load_config(path: Option<&PathBuf>) -> Config {
    let path = path.cloned().unwrap_or_else(config::config_path);
    match config::load_from(&path) {
        Ok(Some(cfg)) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        Ok(None) => {
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            warn!(error = %e, "using default configuration");
            eprintln!("{}: {e}", "Config error".yellow());
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn serve(cfg: Config) -> Result<(), FormError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| FormError::Transport(format!("failed to start runtime: {e}")))?;

    runtime.block_on(async move {
        let bus = EventBus::new(cfg.bus_capacity);
        let worker = EvaluationWorker::new(bus.clone(), Dispatcher::with_thresholds(cfg.thresholds()));
        let stats = worker.stats();
        let worker = tokio::spawn(worker.run());

        println!(
            "  {} relay on {}",
            "formwatch".bold().cyan(),
            format!("ws://0.0.0.0:{}", cfg.relay_port).bold()
        );

        let result = tokio::select! {
            res = RelayServer::new(bus).with_port(cfg.relay_port).run() => res,
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "  Ctrl-C received, shutting down.".yellow());
                Ok(())
            }
        };
        worker.abort();
        info!(
            evaluated = stats.evaluated(),
            dropped = stats.dropped(),
            undelivered = stats.undelivered(),
            "evaluation worker stopped"
        );
        println!(
            "  {} frames evaluated, {} dropped, {} undelivered",
            stats.evaluated().to_string().bold(),
            stats.dropped(),
            stats.undelivered()
        );
        result
    })
}

fn run_eval(cfg: &Config, activity: &str, input: &Path) -> Result<(), FormError> {
    let dispatcher = Dispatcher::with_thresholds(cfg.thresholds());
    let issues = eval::run(&dispatcher, activity, input)?;
    if issues.is_empty() {
        println!("{}", "No posture issues detected.".green());
    } else {
        for issue in &issues {
            println!("  {} {issue}", "•".red().bold());
        }
    }
    Ok(())
}

fn init_config(path: Option<&PathBuf>) -> Result<(), FormError> {
    let path = path.cloned().unwrap_or_else(config::config_path);
    if path.exists() {
        println!("  Config already exists at {}", path.display().to_string().bold());
        return Ok(());
    }
    config::save_to(&Config::default(), &path)?;
    println!("  {} Config written to {}", "✓".green().bold(), path.display().to_string().bold());
    Ok(())
}

fn print_schema() -> Result<(), FormError> {
    let schema = schemars::schema_for!(ClientMessage);
    let json = serde_json::to_string_pretty(&schema)
        .map_err(|e| FormError::Protocol(format!("schema serialization: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["formwatch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_port() {
        let cli = Cli::try_parse_from(["formwatch", "serve", "--port", "9001"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve { port: Some(9001) })));
    }

    #[test]
    fn eval_takes_activity_and_input() {
        let cli =
            Cli::try_parse_from(["formwatch", "--config", "/tmp/fw.toml", "eval", "squat", "-"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/fw.toml")));
        match cli.command {
            Some(Command::Eval { activity, input }) => {
                assert_eq!(activity, "squat");
                assert_eq!(input, PathBuf::from("-"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn init_is_a_subcommand() {
        let cli = Cli::try_parse_from(["formwatch", "init"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Init)));
    }

    #[test]
    fn schema_describes_frame_message() {
        let schema = serde_json::to_value(schemars::schema_for!(ClientMessage)).unwrap();
        let text = schema.to_string();
        assert!(text.contains("keypoints"));
        assert!(text.contains("activity"));
    }
}
