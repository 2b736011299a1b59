use chrono::{DateTime, Utc};

use crate::auth::{clear_stored_session, AuthSession};
use crate::cli::AuthCommands;
use crate::commands::common::open_workspace;
use crate::config_profiles::ProfileFile;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let workspace = open_workspace(profile.as_deref().or(global_profile))?;
            let session = workspace.auth.sign_in(&email, &password).await?;
            println!(
                "Signed in profile '{}' as {}",
                workspace.profile_name,
                session_label(&session)
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let workspace = open_workspace(profile.as_deref().or(global_profile))?;
            let Some(session) = workspace.session.current() else {
                println!("Profile '{}' is not signed in.", workspace.profile_name);
                return Ok(());
            };

            match workspace.auth.current_user().await {
                Ok(user) => tracing::debug!("Backend confirmed user {}", user.id),
                Err(error) => tracing::warn!("Could not confirm session with backend: {error}"),
            }
            println!(
                "Profile '{}' is signed in as {} (expires {})",
                workspace.profile_name,
                session_label(&session),
                format_expiry(session.expires_at)
            );
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let profile = profile.as_deref().or(global_profile);
            match open_workspace(profile) {
                Ok(workspace) => {
                    workspace.auth.sign_out()?;
                    println!("Signed out profile '{}'", workspace.profile_name);
                }
                Err(error) => {
                    tracing::warn!("Profile could not be loaded ({error}); clearing stored session");
                    let config = ProfileFile::load()?;
                    let profile_name = config.resolve_profile_name(profile);
                    clear_stored_session(&profile_name)?;
                    println!("Signed out profile '{profile_name}'");
                }
            }
            Ok(())
        }
    }
}

pub fn session_label(session: &AuthSession) -> String {
    let user = &session.user;
    let name = user
        .name
        .as_deref()
        .or(user.email.as_deref())
        .unwrap_or_else(|| user.id.as_str());
    match user.role.as_deref() {
        Some(role) => format!("{name} [{role}]"),
        None => name.to_string(),
    }
}

pub fn format_expiry(expires_at: Option<i64>) -> String {
    expires_at
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
        .map_or_else(
            || "never".to_string(),
            |expiry| expiry.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
}
