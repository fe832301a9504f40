//! User management CLI commands.

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use stowage_core::config::AppConfig;
use stowage_core::types::{SizeMb, UserId};
use stowage_entity::user::User;
use stowage_service::UserService;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Provision a new user
    Create {
        /// Display name
        #[arg(long)]
        full_name: String,
        /// Organisational unit
        #[arg(long)]
        department: Option<String>,
        /// Quota in MB (defaults to storage.default_total_storage_mb)
        #[arg(long)]
        quota_mb: Option<SizeMb>,
    },
    /// List all users
    List,
    /// Show one user
    Show {
        /// User ID
        id: UserId,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Display name
    full_name: String,
    /// Department
    department: String,
    /// Quota ceiling
    total_mb: String,
    /// Quota used
    used_mb: String,
    /// Created at
    created_at: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            full_name: u.full_name.clone(),
            department: u.department.clone().unwrap_or_default(),
            total_mb: u.total_storage_mb.to_string(),
            used_mb: u.used_storage_mb.to_string(),
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(args: &UserArgs, config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = super::open_catalog(config).await?;
    let users = UserService::new(catalog, config.storage.default_total_storage_mb);

    match &args.command {
        UserCommand::Create {
            full_name,
            department,
            quota_mb,
        } => {
            let user = users
                .create_user(full_name, department.as_deref(), *quota_mb)
                .await
                .context("Failed to create user")?;
            output::print_success(&format!("User '{}' created ({})", user.full_name, user.id));
            output::print_item(UserRow::from(&user), format)?;
        }
        UserCommand::List => {
            let rows: Vec<UserRow> = users
                .list_users()
                .await
                .context("Failed to list users")?
                .iter()
                .map(UserRow::from)
                .collect();
            output::print_list(&rows, format)?;
        }
        UserCommand::Show { id } => {
            let user = users.get_user(*id).await.context("Failed to load user")?;
            output::print_item(UserRow::from(&user), format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Commands};

    #[test]
    fn test_parses_user_create() {
        let cli = Cli::parse_from([
            "stowage",
            "user",
            "create",
            "--full-name",
            "Ada Lovelace",
            "--quota-mb",
            "512",
        ]);
        match cli.command {
            Commands::User(UserArgs {
                command:
                    UserCommand::Create {
                        full_name,
                        department,
                        quota_mb,
                    },
            }) => {
                assert_eq!(full_name, "Ada Lovelace");
                assert_eq!(department, None);
                assert_eq!(quota_mb, Some(SizeMb::from_whole_mb(512)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_user_id() {
        assert!(Cli::try_parse_from(["stowage", "user", "show", "not-a-uuid"]).is_err());
    }
}
