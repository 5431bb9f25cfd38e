mod commands;
mod error;
mod logging;

pub use error::AppError;
pub use logging::init_tracing;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use models::CorrelationStrategy;
use settings::Overrides;

#[derive(Parser, Debug)]
#[clap(name = "ignition-bmh", version = "0.1.0")]
pub struct Cli {
    /// YAML config file (defaults to config_data/config.yaml when present)
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the ignition configs, inject inventory hosts and print the upload plan
    Render {
        #[clap(flatten)]
        inventory: InventoryArgs,
        /// How manifests are paired with hosts
        #[clap(long)]
        correlation: Option<CorrelationStrategy>,
    },
    /// Inject inventory hosts into an existing bootstrap ignition file
    Inject {
        /// Path to the ignition file, rewritten in place
        #[clap(short, long)]
        ignition: PathBuf,
        #[clap(flatten)]
        inventory: InventoryArgs,
        /// How manifests are paired with hosts
        #[clap(long)]
        correlation: Option<CorrelationStrategy>,
    },
    /// Print the host list the inventory returns, as JSON
    Hosts {
        #[clap(flatten)]
        inventory: InventoryArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct InventoryArgs {
    /// Cluster whose hosts are fetched
    #[clap(long)]
    pub cluster_id: Option<String>,
    /// Assisted-install service base URL; the built-in test hosts are used when absent
    #[clap(long)]
    pub inventory_endpoint: Option<String>,
}

impl Command {
    fn overrides(&self) -> Overrides {
        let (inventory, correlation) = match self {
            Self::Render {
                inventory,
                correlation,
            }
            | Self::Inject {
                inventory,
                correlation,
                ..
            } => (inventory, *correlation),
            Self::Hosts { inventory } => (inventory, None),
        };

        Overrides {
            cluster_id: inventory.cluster_id.clone(),
            inventory_endpoint: inventory.inventory_endpoint.clone(),
            correlation,
        }
    }
}

/// Loads settings, starts tracing and runs the selected command.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let settings = settings::load(cli.config.as_deref(), &cli.command.overrides())?;
    init_tracing(&settings.logging)?;

    match &cli.command {
        Command::Render { .. } => commands::render(&settings),
        Command::Inject { ignition, .. } => commands::inject(&settings, ignition),
        Command::Hosts { .. } => commands::hosts(&settings),
    }
}

pub fn match_and_print(result: Result<(), AppError>) {
    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!(
                "{}{}",
                "Error encountered: ".red().bold(),
                e.to_string().red()
            );
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn settings_for(command: &Command) -> settings::Settings {
        settings::load_with_env(None, |_| None, &command.overrides()).unwrap()
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inject_flags() {
        let cli = Cli::try_parse_from([
            "ignition-bmh",
            "inject",
            "--ignition",
            "/tmp/bootstrap.ign",
            "--cluster-id",
            "c-1",
            "--correlation",
            "by-name",
            "--config",
            "/etc/ignition-bmh.yaml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/ignition-bmh.yaml")));
        let Command::Inject { ignition, .. } = &cli.command else {
            panic!("expected inject, got {:?}", cli.command);
        };
        assert_eq!(ignition, &PathBuf::from("/tmp/bootstrap.ign"));

        let settings = settings_for(&cli.command);
        assert_eq!(settings.cluster_id().unwrap(), "c-1");
        assert_eq!(settings.correlation, CorrelationStrategy::ByName);
        assert_eq!(settings.inventory_endpoint(), None);
    }

    #[test]
    fn unknown_correlation_is_rejected() {
        assert!(Cli::try_parse_from([
            "ignition-bmh",
            "inject",
            "--ignition",
            "x.ign",
            "--correlation",
            "random",
        ])
        .is_err());
    }

    #[test]
    fn stub_inventory_does_not_need_a_cluster_id() {
        let settings = settings_for(&Command::Hosts {
            inventory: InventoryArgs::default(),
        });
        let client = commands::provider(&settings);
        assert!(client.is_stub());
        assert_eq!(
            commands::resolve_cluster_id(&settings, &client).unwrap(),
            installer::DUMMY_CLUSTER_ID
        );
    }

    #[test]
    fn live_inventory_needs_a_cluster_id() {
        let settings = settings_for(&Command::Hosts {
            inventory: InventoryArgs {
                cluster_id: None,
                inventory_endpoint: Some("http://127.0.0.1:9".to_owned()),
            },
        });
        let client = commands::provider(&settings);
        assert!(!client.is_stub());
        assert!(matches!(
            commands::resolve_cluster_id(&settings, &client),
            Err(AppError::Settings(_))
        ));
    }

    #[test]
    fn inject_command_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.ign");
        std::fs::write(&path, br#"{"ignition":{"version":"3.2.0"},"storage":{"files":[]}}"#)
            .unwrap();

        let settings = settings_for(&Command::Hosts {
            inventory: InventoryArgs::default(),
        });
        commands::inject(&settings, &path).unwrap();

        assert_eq!(
            std::fs::read(&path).unwrap(),
            br#"{"ignition":{"version":"3.2.0"},"storage":{"files":[]}}"#
        );
    }
}
