use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use printer_fleet::{store::ConnectionType, Config, PrinterStore};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

mod cmd_dashboard;
mod cmd_printers;
mod cmd_relays;

/// Manage a fleet of OctoPrint printers.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "printer-fleet")]
struct Cli {
    /// Config file to use. Defaults to `printer-fleet.toml`, if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print logs as json lines.
    #[arg(long)]
    json: bool,

    /// Log debug messages.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the printer profiles. The default printer is marked with `*`.
    List,

    /// Add a printer profile. The first printer added becomes the default.
    Add {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Base url of the server, like `http://octopi.local`.
        #[arg(long)]
        hostname: String,
        /// Api key of the server.
        #[arg(long, env = "PRINTER_FLEET_API_KEY")]
        api_key: String,
        /// Username for http basic auth.
        #[arg(long)]
        username: Option<String>,
        /// Password for http basic auth.
        #[arg(long, requires = "username")]
        password: Option<String>,
        /// Kind of server, `octoprint` or `klipper`.
        #[arg(long, default_value_t = ConnectionType::OctoPrint)]
        connection_type: ConnectionType,
        /// Ordering key in printer lists.
        #[arg(long, default_value_t = 0)]
        position: i32,
    },

    /// Make a printer the default one.
    SetDefault {
        /// Printer name.
        name: String,
    },

    /// Remove a printer profile and its accessories.
    Remove {
        /// Printer name.
        name: String,
    },

    /// Show or hide a printer on the dashboard.
    Include {
        /// Printer name.
        name: String,
        #[command(flatten)]
        switch: Switch,
    },

    /// Flag every profile to be synced again from scratch.
    ResetSync,

    /// List the relays of a printer's server.
    Relays {
        /// Printer name.
        name: String,
    },

    /// Turn a relay on or off.
    Relay {
        /// Printer name.
        name: String,
        /// Relay id, as listed by `relays`.
        relay: String,
        #[command(flatten)]
        switch: Switch,
    },

    /// Watch every dashboard printer until Ctrl-C.
    Dashboard {
        /// Show the camera grid instead of printer status.
        #[arg(long)]
        cameras: bool,
    },
}

#[derive(Args, Clone, Copy)]
#[group(required = true, multiple = false)]
struct Switch {
    /// Turn on.
    #[arg(long)]
    on: bool,
    /// Turn off.
    #[arg(long)]
    off: bool,
}

impl Switch {
    fn is_on(&self) -> bool {
        self.on && !self.off
    }
}

/// Resolve once SIGINT or SIGTERM arrives.
async fn handle_signals() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up SIGINT handler");
            e
        })?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up SIGTERM handler");
            e
        })?;

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await.map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up Ctrl+C handler");
            anyhow::Error::new(e)
        })?;

        tracing::info!("received Ctrl+C (SIGINT)");
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level_filter = if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    // Stdout is for command output.
    let (json, plain) = if cli.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let cfg = Config::load(cli.config.as_deref())?;
    let store = PrinterStore::open(&cfg.database)?;

    match cli.command {
        Commands::List => cmd_printers::list(&store),
        Commands::Add {
            name,
            hostname,
            api_key,
            username,
            password,
            connection_type,
            position,
        } => cmd_printers::add(
            &store,
            printer_fleet::NewPrinter {
                connection_type,
                username,
                password,
                position,
                ..printer_fleet::NewPrinter::new(&name, &hostname, &api_key)
            },
        ),
        Commands::SetDefault { ref name } => cmd_printers::set_default(&store, name),
        Commands::Remove { ref name } => cmd_printers::remove(&store, name),
        Commands::Include { ref name, switch } => cmd_printers::include(&store, name, switch.is_on()),
        Commands::ResetSync => cmd_printers::reset_sync(&store),
        Commands::Relays { ref name } => cmd_relays::list(&store, &cfg, name).await,
        Commands::Relay {
            ref name,
            ref relay,
            switch,
        } => cmd_relays::switch(&store, &cfg, name, relay, switch.is_on()).await,
        Commands::Dashboard { cameras } => cmd_dashboard::main(store, &cfg, cameras).await,
    }
}
