mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_NETWORK_ERROR, EXIT_RECIPE_ERROR, EXIT_STORE_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;
use tessera_core::Engine;
use tessera_remote::{HttpBackend, RemoteConfig};

#[derive(Debug, Parser)]
#[command(
    name = "tessera",
    version,
    about = "Multi-language package manager with deterministic closure locks"
)]
struct Cli {
    /// Path to the tessera package store directory.
    #[arg(long, default_value = "~/.local/share/tessera")]
    store: String,

    /// Base URL of the resolution and package index services. When absent,
    /// falls back to ~/.config/tessera/remote.json, then the public index.
    #[arg(long)]
    service_url: Option<String>,

    /// Bearer token for the index services.
    #[arg(long)]
    token: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve and install the full dependency closure of a project.
    Restore {
        /// Project directory containing a recipe.
        #[arg(default_value = ".")]
        project: PathBuf,
    },
    /// Display a project's lock document.
    Lock {
        /// Project directory containing a lock.
        #[arg(default_value = ".")]
        project: PathBuf,
    },
    /// Save the service endpoint used when --service-url is not given.
    Remote {
        /// Base URL of the resolution and package index services.
        url: String,
        /// Bearer token stored alongside the endpoint.
        #[arg(long)]
        token: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TESSERA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let store_path = expand_tilde(&cli.store);
    let json_output = cli.json;

    let config = remote_config(cli.service_url.as_deref(), cli.token.as_deref());
    let engine = Engine::new(
        &store_path,
        Box::new(HttpBackend::new(config.clone())),
        Box::new(HttpBackend::new(config)),
    );

    let result = match cli.command {
        Commands::Restore { project } => commands::restore::run(&engine, &project, json_output),
        Commands::Lock { project } => commands::lock::run(&project, json_output),
        Commands::Remote { url, token } => commands::remote::run(&url, token.as_deref(), json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("recipe error:") || msg.starts_with("no lock document") {
                EXIT_RECIPE_ERROR
            } else if msg.starts_with("lock error:") || msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else if msg.starts_with("unable to reach") || msg.starts_with("remote error:") {
                EXIT_NETWORK_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

const DEFAULT_SERVICE_URL: &str = "https://index.tessera.dev";

/// An explicit --service-url wins; otherwise the saved remote config is
/// used, and the public index is the last resort. A --token overrides any
/// token the config file carries.
fn remote_config(service_url: Option<&str>, token: Option<&str>) -> RemoteConfig {
    let mut config = match service_url {
        Some(url) => RemoteConfig::new(url),
        None => RemoteConfig::load_default()
            .unwrap_or_else(|_| RemoteConfig::new(DEFAULT_SERVICE_URL)),
    };
    if let Some(token) = token {
        config = config.with_token(token);
    }
    config
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
