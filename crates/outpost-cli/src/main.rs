mod commands;
mod settings;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{exit_code_for, Context};
use outpost_core::{install_signal_handler, shutdown_requested};
use outpost_schema::DEFAULT_CLUSTER_NAME;
use settings::{default_settings_path, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(
    name = "outpost",
    version,
    about = "Per-repository cloud sandboxes: create, reach, and tear down environments"
)]
struct Cli {
    /// Directory holding the configuration record.
    #[arg(long, default_value = "~/.local/share/outpost", global = true)]
    root: String,

    /// Provisioning backend (overrides the settings file).
    #[arg(long, global = true, value_parser = ["local", "mock"])]
    backend: Option<String>,

    /// Cluster to operate on.
    #[arg(long, default_value = DEFAULT_CLUSTER_NAME, global = true)]
    cluster: String,

    /// Settings file (defaults to ~/.config/outpost/settings.toml).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

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
    /// Create (or resume creating) the environment for a repository.
    Init {
        /// Repository as `name`, `owner/name`, or a git URL.
        repository: String,
        /// Instance type for the cluster and environment.
        #[arg(long)]
        instance_type: Option<String>,
    },
    /// Remove the environment for a repository.
    Remove {
        repository: String,
        /// Do not ask for confirmation.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Open a port on an environment.
    OpenPort { repository: String, port: String },
    /// Close a port on an environment.
    ClosePort { repository: String, port: String },
    /// Show how to connect to an environment.
    Edit { repository: String },
    /// Remove the cluster and the configuration record.
    Uninstall,
    /// List recorded environments.
    List,
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
            tracing_subscriber::EnvFilter::try_from_env("OUTPOST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    install_signal_handler();

    let result = context(&cli).and_then(|ctx| dispatch(&ctx, cli.command));

    if shutdown_requested() {
        warn!("interrupted after the current operation completed");
        return ExitCode::from(130);
    }

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn context(cli: &Cli) -> Result<Context, String> {
    let settings_path = cli.settings.clone().or_else(default_settings_path);
    let settings = match settings_path {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let backend = cli
        .backend
        .clone()
        .unwrap_or_else(|| settings.backend().to_owned());
    Ok(Context {
        root: expand_tilde(&cli.root),
        backend,
        cluster: cli.cluster.clone(),
        settings,
        json: cli.json,
    })
}

fn dispatch(ctx: &Context, command: Commands) -> Result<u8, String> {
    match command {
        Commands::Init {
            repository,
            instance_type,
        } => commands::init::run(ctx, &repository, instance_type.as_deref()),
        Commands::Remove { repository, force } => commands::remove::run(ctx, &repository, force),
        Commands::OpenPort { repository, port } => {
            commands::open_port::run(ctx, &repository, &port)
        }
        Commands::ClosePort { repository, port } => {
            commands::close_port::run(ctx, &repository, &port)
        }
        Commands::Edit { repository } => commands::edit::run(ctx, &repository),
        Commands::Uninstall => commands::uninstall::run(ctx),
        Commands::List => commands::list::run(ctx),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
