use clap::{Args, Subcommand};

use crate::domain::user::{Role, User};
use crate::error::{AppError, AppResult};
use crate::services::UserDirectory;

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Register a user who can receive ticket assignments.
    Add {
        #[arg(long)]
        email: String,
        /// One of user, moderator or admin.
        #[arg(long, default_value = "moderator")]
        role: String,
        /// Skill tag; repeat for several.
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// List registered users in assignment order.
    List,
}

pub async fn run(users: &dyn UserDirectory, command: UserCommand) -> AppResult<()> {
    match command {
        UserCommand::Add {
            email,
            role,
            skills,
        } => {
            let user = add(users, &email, &role, skills).await?;
            println!("Added {} {} ({})", user.role.as_str(), user.email, user.id);
        }
        UserCommand::List => {
            for user in users.list_users().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    user.id,
                    user.role.as_str(),
                    user.email,
                    user.skills.join(", ")
                );
            }
        }
    }
    Ok(())
}

pub async fn add(
    users: &dyn UserDirectory,
    email: &str,
    role: &str,
    skills: Vec<String>,
) -> AppResult<User> {
    let email = email.trim();
    if !email.contains('@') {
        return Err(AppError::InvalidInput(format!(
            "'{email}' is not an email address"
        )));
    }
    let role = Role::from_str(role)
        .ok_or_else(|| AppError::InvalidInput(format!("unknown role '{role}'")))?;
    let skills = skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect();

    users
        .insert_user(User::new(email.to_string(), role, skills))
        .await
}
