use std::env;
use std::path::PathBuf;

use mdlive_core::config::Config;
use mdlive_core::controller::Controller;
use mdlive_core::monitor::OsFileSystem;
use mdlive_core::theme::{theme_index_by_name, theme_names, ThemeContext};
use tracing_subscriber::EnvFilter;

mod ui;

const USAGE: &str = "Usage: mdlive <markdown-file> [theme]";

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    Help,
    Version,
    Preview { path: PathBuf, theme: Option<String> },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = match parse_args(env::args().skip(1).collect()) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{USAGE}");
            return Err(err.into());
        }
    };

    let (path, theme_arg) = match command {
        CliCommand::Help => {
            print_help();
            return Ok(());
        }
        CliCommand::Version => {
            println!("mdlive {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        CliCommand::Preview { path, theme } => (path, theme),
    };

    let config = match config_path() {
        Some(config_path) => Config::load(&config_path)?,
        None => Config::default(),
    };
    if let Err(err) = init_file_logging(&config) {
        eprintln!("warning: {err}; logging disabled");
    }

    let theme = resolve_theme(theme_arg.as_deref().or(config.display.theme.as_deref()));
    tracing::info!(path = %path.display(), theme = theme.current().name, "starting preview");

    let controller = Controller::new(OsFileSystem, path, &config, theme);
    ui::run(controller)
}

fn parse_args(args: Vec<String>) -> Result<CliCommand, String> {
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--version" | "-V" => return Ok(CliCommand::Version),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unsupported argument: {flag}"));
            }
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let Some(path) = positional.next() else {
        return Err("missing markdown file path".to_string());
    };
    let theme = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}"));
    }
    Ok(CliCommand::Preview {
        path: PathBuf::from(path),
        theme,
    })
}

/// Unknown names warn on stderr and fall back to the first theme.
fn resolve_theme(name: Option<&str>) -> ThemeContext {
    let Some(name) = name else {
        return ThemeContext::default();
    };
    match theme_index_by_name(name) {
        Some(index) => ThemeContext::new(index),
        None => {
            let available = theme_names().collect::<Vec<_>>().join(", ");
            let fallback = ThemeContext::default().current().name;
            eprintln!("warning: unknown theme '{name}', using {fallback} (available: {available})");
            tracing::warn!(theme = name, fallback, "unknown theme");
            ThemeContext::default()
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("MDLIVE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("mdlive").join("config.toml"))
}

fn log_file_path(config: &Config) -> Option<PathBuf> {
    config
        .log
        .file
        .clone()
        .or_else(|| dirs::cache_dir().map(|dir| dir.join("mdlive").join("mdlive.log")))
}

/// The terminal belongs to the UI, so logs only ever go to a file.
fn init_file_logging(config: &Config) -> Result<(), String> {
    let Some(log_path) = log_file_path(config) else {
        return Err("no cache directory for the log file".to_string());
    };
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "failed to create log directory '{}': {error}",
                    parent.display()
                )
            })?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|error| format!("failed to open log file '{}': {error}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str())),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .try_init()
        .map_err(|error| format!("failed to install log subscriber: {error}"))
}

fn print_help() {
    println!("mdlive - live terminal preview for markdown files");
    println!();
    println!("{USAGE}");
    println!();
    println!("Themes: {}", theme_names().collect::<Vec<_>>().join(", "));
    println!();
    println!("Config: $MDLIVE_CONFIG or <config dir>/mdlive/config.toml");
    println!("Logs:   [log] file in config, default <cache dir>/mdlive/mdlive.log");
    println!();
    println!("Press ? inside the preview for key bindings.");
}
