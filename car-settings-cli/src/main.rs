//! Developer CLI for the car settings account core.
//!
//! Drives the [`AccountManager`] against a snapshot-file-backed in-memory
//! platform service, so the account lifecycle can be exercised without a
//! vehicle: every invocation loads the snapshot, runs one command through
//! the façade, and writes the snapshot back.
//!
//! Domain refusals (removing the system account, hitting the account
//! limit) are ordinary outcomes and exit zero; only I/O and argument
//! errors are reported as failures.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use tracing::debug;

use car_settings_core::platform::memory::Snapshot;
use car_settings_core::platform::{MemoryUserService, UserService};
use car_settings_core::{
    AccountId, AccountInfo, AccountKind, AccountManager, CreateOutcome, Labels,
};

/// Snapshot file name under the user data directory.
const SNAPSHOT_FILE: &str = "car-settings/accounts.json";

#[derive(Parser)]
#[command(name = "car-settings", version, about = "Account lifecycle playground")]
struct Cli {
    /// Path of the accounts snapshot file.
    #[arg(long, env = "CAR_SETTINGS_SNAPSHOT", global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the active account.
    Current,
    /// List accounts.
    List {
        /// Only list accounts of this kind (`regular` or `guest`).
        #[arg(long)]
        kind: Option<String>,
        /// Exclude the active account.
        #[arg(long)]
        others: bool,
    },
    /// Create a new account.
    Create {
        /// Display name; defaults to the stock label.
        #[arg(long)]
        name: Option<String>,
    },
    /// Rename an account.
    Rename {
        /// Identifier of the account to rename.
        id: u32,
        /// New display name.
        name: String,
    },
    /// Remove an account.
    Remove {
        /// Identifier of the account to remove.
        id: u32,
    },
    /// Switch the active session to an account.
    Switch {
        /// Identifier of the account to switch to.
        id: u32,
    },
    /// Create a fresh guest session and switch into it.
    Guest,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let path = snapshot_path(cli.snapshot)?;
    debug!(path = %path.display(), "using snapshot");

    let service = Arc::new(load_service(&path)?);
    run(&cli.command, &service)?;
    save_service(&path, &service)?;
    Ok(())
}

/// Executes one command through the façade.
fn run(command: &Command, service: &Arc<MemoryUserService>) -> eyre::Result<()> {
    let manager = AccountManager::new(Arc::clone(service));

    match command {
        Command::Current => {
            println!("{}", describe(&manager.current_account()));
        }
        Command::List { kind, others } => {
            list(service, &manager, kind.as_deref(), *others)?;
        }
        Command::Create { name } => {
            let manager = name.as_ref().map_or(manager, |name| {
                AccountManager::with_labels(
                    Arc::clone(service),
                    Labels {
                        new_account_name: name.clone(),
                        ..Labels::default()
                    },
                )
            });
            match manager.create_account() {
                CreateOutcome::Created(account) => println!("created {}", describe(&account)),
                CreateOutcome::Refused(reason) => println!("not created: {reason}"),
            }
        }
        Command::Rename { id, name } => {
            if let Some(account) = find_account(service, *id) {
                manager.set_account_name(&account, name);
                println!("renamed #{id} to {name}");
            } else {
                println!("no account #{id}");
            }
        }
        Command::Remove { id } => {
            if let Some(account) = find_account(service, *id) {
                if manager.remove_account(&account) {
                    println!("removed {}", describe(&account));
                } else {
                    println!("not removed: {}", describe(&account));
                }
            } else {
                println!("no account #{id}");
            }
        }
        Command::Switch { id } => {
            if let Some(account) = find_account(service, *id) {
                manager.switch_to_account(&account);
                println!("now {}", describe(&manager.current_account()));
            } else {
                println!("no account #{id}");
            }
        }
        Command::Guest => {
            manager.switch_to_guest();
            println!("now {}", describe(&manager.current_account()));
        }
    }
    Ok(())
}

/// Prints the account list, honouring the kind filter and `--others`.
fn list(
    service: &Arc<MemoryUserService>,
    manager: &AccountManager<MemoryUserService>,
    kind: Option<&str>,
    others: bool,
) -> eyre::Result<()> {
    let kind = kind
        .map(|raw| {
            AccountKind::from_str(raw)
                .map_err(|_| eyre!("unknown account kind `{raw}` (regular or guest)"))
        })
        .transpose()?;
    let current = manager.current_account().id;
    let accounts = if others {
        manager.other_accounts()
    } else {
        service.accounts()
    };

    for account in accounts {
        if kind.is_some_and(|kind| account.kind != kind) {
            continue;
        }
        let marker = if account.id == current { "*" } else { " " };
        println!("{marker} {}", describe(&account));
    }
    Ok(())
}

/// One-line rendering of an account.
fn describe(account: &AccountInfo) -> String {
    format!("{account} [{}]", account.kind)
}

/// Resolves an account identifier against the service.
fn find_account(service: &Arc<MemoryUserService>, id: u32) -> Option<AccountInfo> {
    let id = AccountId::new(id);
    service
        .accounts()
        .into_iter()
        .find(|account| account.id == id)
}

/// The snapshot path: the explicit flag, or the user data directory.
fn snapshot_path(explicit: Option<PathBuf>) -> eyre::Result<PathBuf> {
    explicit.map_or_else(
        || {
            dirs::data_dir()
                .map(|dir| dir.join(SNAPSHOT_FILE))
                .ok_or_else(|| eyre!("no data directory; pass --snapshot"))
        },
        Ok,
    )
}

/// Loads the service from the snapshot file, or starts fresh.
fn load_service(path: &Path) -> eyre::Result<MemoryUserService> {
    if !path.exists() {
        return Ok(MemoryUserService::new());
    }
    let json = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&json)
        .wrap_err_with(|| format!("parsing snapshot {}", path.display()))?;
    Ok(MemoryUserService::from_snapshot(snapshot))
}

/// Writes the service state back to the snapshot file.
fn save_service(path: &Path, service: &MemoryUserService) -> eyre::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating snapshot directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&service.snapshot())?;
    fs::write(path, json).wrap_err_with(|| format!("writing snapshot {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/accounts.json");

        let service = MemoryUserService::new();
        service.create_account("Alex").unwrap();
        save_service(&path, &service).unwrap();

        let restored = load_service(&path).unwrap();
        assert_eq!(restored.accounts(), service.accounts());
    }

    #[test]
    fn missing_snapshot_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let service = load_service(&dir.path().join("absent.json")).unwrap();
        assert_eq!(service.accounts().len(), 1);
        assert!(service.current_account().is_system());
    }

    #[test]
    fn explicit_snapshot_path_wins() {
        let path = PathBuf::from("/tmp/accounts.json");
        assert_eq!(snapshot_path(Some(path.clone())).unwrap(), path);
    }

    #[test]
    fn find_account_resolves_by_id() {
        let service = Arc::new(MemoryUserService::new());
        let created = service.create_account("Alex").unwrap();

        assert_eq!(find_account(&service, created.id.as_u32()), Some(created));
        assert_eq!(find_account(&service, 404), None);
    }
}
