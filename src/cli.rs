//! Command-line front end
//!
//! Every invocation starts the repository the way the application does at
//! startup (discover, load, re-assert the active configuration), then runs
//! one command against it.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Activation, ConfigurationRepository};
use crate::paths::AppPaths;
use crate::reconcile::ReconcileReport;
use crate::settings::{JsonSettingsStore, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "modswitch", version, about = "Switch which tracking modules are enabled")]
pub struct Cli {
    /// Data root holding settings.json and CustomLibs (overrides MODSWITCH_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the active configuration and the state of every known module
    Status,
    /// List configurations
    List,
    /// List known modules
    Modules,
    /// Make a configuration active and move module folders to match it
    Activate(ActivateArgs),
    /// Create a configuration
    Create {
        name: String,
        /// Module to include (repeatable)
        #[arg(long = "module", value_name = "MODULE")]
        modules: Vec<String>,
    },
    /// Copy an existing configuration under a new name
    Duplicate { id: Uuid, name: String },
    /// Delete a configuration
    Remove { id: Uuid },
    /// Rename a configuration
    Rename { id: Uuid, name: String },
    /// Include a module in a configuration
    AddModule { id: Uuid, module: String },
    /// Drop a module from a configuration
    RemoveModule { id: Uuid, module: String },
    /// Copy a module folder into the modules directory
    Import { path: PathBuf },
    /// Re-apply the active configuration to the modules directory
    Sync,
}

#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Configuration id
    #[arg(required_unless_present = "name", conflicts_with = "name")]
    pub id: Option<Uuid>,

    /// Look the configuration up by display name instead (first match wins)
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::resolve(cli.data_dir)?;
    info!(root = %paths.data_root().display(), "Using data root");

    let store = JsonSettingsStore::open(paths.settings_file())?;
    let mut repo = ConfigurationRepository::with_paths(store, &paths);
    if let Some(Activation::Activated(report)) = repo.initialize()? {
        report_failures(&report);
    }

    match cli.command {
        Command::Status => print_status(&repo),
        Command::List => print_configurations(&repo),
        Command::Modules => {
            for module in repo.known_modules() {
                println!("{module}");
            }
        }
        Command::Activate(args) => {
            let activation = match (args.id, args.name) {
                (Some(id), _) => repo.set_active(id)?,
                (None, Some(name)) => repo.set_active_by_name(&name)?,
                (None, None) => bail!("Either an id or --name is required"),
            };
            match activation {
                Activation::Activated(report) => {
                    report_failures(&report);
                    print_status(&repo);
                }
                Activation::NotFound => bail!("No matching configuration"),
            }
        }
        Command::Create { name, modules } => {
            let id = repo.add_configuration(name);
            repo.set_configuration_modules(id, modules);
            repo.save()?;
            println!("{id}");
        }
        Command::Duplicate { id, name } => {
            let Some(copy) = repo.duplicate_configuration(id, name) else {
                bail!("Configuration {id} not found");
            };
            repo.save()?;
            println!("{copy}");
        }
        Command::Remove { id } => {
            let Some(removed) = repo.remove_configuration(id) else {
                bail!("Configuration {id} not found");
            };
            repo.save()?;
            println!("Removed '{}'", removed.name);
        }
        Command::Rename { id, name } => {
            if !repo.rename_configuration(id, name) {
                bail!("Configuration {id} not found");
            }
            repo.save()?;
        }
        Command::AddModule { id, module } => {
            if repo.configuration(id).is_none() {
                bail!("Configuration {id} not found");
            }
            if !repo.known_modules().contains(&module) {
                warn!(module = %module, "Module is not installed; it will be enabled once imported");
            }
            repo.add_module_to_configuration(id, &module);
            repo.save()?;
        }
        Command::RemoveModule { id, module } => {
            if repo.configuration(id).is_none() {
                bail!("Configuration {id} not found");
            }
            repo.remove_module_from_configuration(id, &module);
            repo.save()?;
        }
        Command::Import { path } => {
            let name = repo.import_module(&path)?;
            println!("Imported '{name}'");
        }
        // initialize() already re-applied the active configuration
        Command::Sync => print_status(&repo),
    }

    Ok(())
}

fn report_failures(report: &ReconcileReport) {
    for (module, error) in &report.failures {
        warn!(module = %module, error = %error, "Module left in previous state");
    }
}

fn print_configurations<S: SettingsStore>(repo: &ConfigurationRepository<S>) {
    for configuration in repo.configurations() {
        let marker = if configuration.is_active() { "*" } else { " " };
        println!(
            "{marker} {}  {}  [{}]",
            configuration.id(),
            configuration.name,
            configuration.modules().join(", ")
        );
    }
}

fn print_status<S: SettingsStore>(repo: &ConfigurationRepository<S>) {
    match repo.active_configuration() {
        Some(active) => println!("Active: {} ({})", active.name, active.id()),
        None => println!("Active: none"),
    }
    let active = repo.active_configuration();
    for module in repo.known_modules() {
        let wanted = active.is_some_and(|c| c.includes(module));
        println!("  [{}] {module}", if wanted { "x" } else { " " });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activate_by_id() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["modswitch", "activate", &id.to_string()]).unwrap();
        match cli.command {
            Command::Activate(args) => {
                assert_eq!(args.id, Some(id));
                assert_eq!(args.name, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_activate_by_name() {
        let cli = Cli::try_parse_from(["modswitch", "activate", "--name", "Bigscreen Beyond"]).unwrap();
        match cli.command {
            Command::Activate(args) => assert_eq!(args.name.as_deref(), Some("Bigscreen Beyond")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_activate_requires_target() {
        assert!(Cli::try_parse_from(["modswitch", "activate"]).is_err());
    }

    #[test]
    fn test_create_with_modules_and_data_dir() {
        let cli = Cli::try_parse_from([
            "modswitch",
            "create",
            "Rig",
            "--module",
            "A",
            "--module",
            "B",
            "--data-dir",
            "/tmp/x",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Command::Create { name, modules } => {
                assert_eq!(name, "Rig");
                assert_eq!(modules, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_run_create_then_activate() {
        let dir = tempfile::tempdir().unwrap();
        let modules_root = dir.path().join("CustomLibs");
        std::fs::create_dir_all(modules_root.join("Custom")).unwrap();
        let data_dir = || Some(dir.path().to_path_buf());

        run(Cli {
            data_dir: data_dir(),
            command: Command::Create {
                name: "Only Custom".to_string(),
                modules: vec!["Custom".to_string()],
            },
        })
        .unwrap();

        run(Cli {
            data_dir: data_dir(),
            command: Command::Activate(ActivateArgs {
                id: None,
                name: Some("Only Custom".to_string()),
            }),
        })
        .unwrap();

        let store = JsonSettingsStore::open(dir.path().join("settings.json")).unwrap();
        let mut repo = ConfigurationRepository::new(store, &modules_root);
        repo.initialize().unwrap();
        assert_eq!(repo.active_configuration().unwrap().name, "Only Custom");
        assert!(modules_root.join("Custom").is_dir());
    }

    #[test]
    fn test_run_activate_unknown_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(Cli {
            data_dir: Some(dir.path().to_path_buf()),
            command: Command::Activate(ActivateArgs {
                id: None,
                name: Some("Missing".to_string()),
            }),
        });
        assert!(result.is_err());
    }
}
