mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Context, EXIT_CONFIG_ERROR, EXIT_FAILURE};
use snapshelf_core::install_signal_handler;
use snapshelf_runtime::{invoking_user, ShelfConfig};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

#[derive(Debug, Parser)]
#[command(
    name = "snapshelf",
    version,
    about = "Install and update snap packages from an offline folder or the online store"
)]
struct Cli {
    /// Configuration file (default: ~/.config/snapshelf/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Write the log to a timestamped file in this directory instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Machine architecture to scan for, instead of the host's.
    #[arg(long, global = true, hide = true)]
    machine: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the package archives found in an offline folder.
    Scan {
        /// Offline folder (default: configured or discovered).
        dir: Option<PathBuf>,
    },
    /// List offline archives newer than the installed revision.
    Updatable {
        /// Offline folder (default: configured or discovered).
        dir: Option<PathBuf>,
    },
    /// List offline packages that are not installed.
    Installable {
        /// Offline folder (default: configured or discovered).
        dir: Option<PathBuf>,
    },
    /// Show the manifest of a package archive.
    Info {
        /// Path to a `<name>_<revision>.snap` archive.
        archive: PathBuf,
    },
    /// Install packages and their dependencies from an offline folder.
    Install {
        /// Package names.
        #[arg(required = true)]
        names: Vec<String>,
        /// Offline folder (default: configured or discovered).
        #[arg(long)]
        from: Option<PathBuf>,
        /// Do not ask for confirmation.
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Update installed packages from an offline folder and/or online.
    Update {
        /// Offline folder to update from.
        #[arg(long)]
        from: Option<PathBuf>,
        /// Refresh from the online store.
        #[arg(long, default_value_t = false)]
        online: bool,
    },
    /// Move archives in an offline mirror into architecture folders.
    Arrange {
        /// Offline mirror root (default: configured or discovered).
        dir: Option<PathBuf>,
    },
    /// Print the offline folder that would be used by default.
    Discover,
    /// List packages with updates in the online store.
    RefreshList,
    /// Run diagnostic checks on the host.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
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

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let log_dir = cli.log_dir.clone().or_else(|| config.log_dir.clone());
    if let Err(msg) = init_logging(cli.verbose, cli.trace, log_dir.as_deref()) {
        eprintln!("error: {msg}");
        return ExitCode::from(EXIT_FAILURE);
    }

    install_signal_handler();

    let ctx = Context::new(config, cli.json, cli.machine);

    let result = match cli.command {
        Commands::Scan { dir } => commands::scan::run(&ctx, dir.as_deref()),
        Commands::Updatable { dir } => commands::updatable::run(&ctx, dir.as_deref()),
        Commands::Installable { dir } => commands::installable::run(&ctx, dir.as_deref()),
        Commands::Info { archive } => commands::info::run(&ctx, &archive),
        Commands::Install { names, from, yes } => {
            commands::install::run(&ctx, &names, from.as_deref(), yes)
        }
        Commands::Update { from, online } => commands::update::run(&ctx, from.as_deref(), online),
        Commands::Arrange { dir } => commands::arrange::run(&ctx, dir.as_deref()),
        Commands::Discover => commands::discover::run(&ctx),
        Commands::RefreshList => commands::refresh_list::run(&ctx),
        Commands::Doctor => commands::doctor::run(&ctx),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ShelfConfig, String> {
    match path {
        Some(path) => ShelfConfig::load(path),
        None => ShelfConfig::load_default(),
    }
    .map_err(|e| e.to_string())
}

fn init_logging(verbose: bool, trace: bool, log_dir: Option<&Path>) -> Result<(), String> {
    let default_level = if trace {
        "trace"
    } else if verbose {
        "debug"
    } else if log_dir.is_some() {
        "info"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SNAPSHELF_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            let created_dir = !dir.is_dir();
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create log dir {}: {e}", dir.display()))?;
            let path = dir.join(log_file_name());
            let file = File::create(&path)
                .map_err(|e| format!("cannot create log file {}: {e}", path.display()))?;
            if let Some(user) = invoking_user() {
                let mut owned = vec![path.as_path()];
                if created_dir {
                    owned.push(dir);
                }
                for target in owned {
                    if let Err(e) = user.chown(target) {
                        eprintln!(
                            "warning: cannot hand {} to {}: {e}",
                            target.display(),
                            user.name
                        );
                    }
                }
            }
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            eprintln!("snapshelf log: {}", path.display());
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// `<YYYY-mm-dd-HH-MM>-<hostname>.log`
fn log_file_name() -> String {
    let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M");
    format!("{stamp}-{}.log", hostname())
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .map(|h| h.trim().to_owned())
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}
