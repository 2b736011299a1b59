use groupwork_core::util::{is_http_url, normalize_text_option};
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::print_json;
use crate::config_profiles::{profiles_path, Profile, ProfileFile};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            poll_interval,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_base_url,
            poll_interval,
            no_activate,
        ),
        ConfigCommands::Show { profile, json } => {
            run_config_show(profile.as_deref().or(global_profile), json)
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    poll_interval: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = ProfileFile::load()?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut(&profile_name);
    apply_profile_settings(profile, api_base_url, poll_interval)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save()?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    println!("Run `groupwork auth login --email <email> --password <password>` to sign in.");
    Ok(())
}

/// Merge explicit settings into a profile, rejecting malformed values.
pub fn apply_profile_settings(
    profile: &mut Profile,
    api_base_url: Option<String>,
    poll_interval: Option<u64>,
) -> Result<(), CliError> {
    if let Some(url) = normalize_text_option(api_base_url) {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        profile.api_base_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(interval) = poll_interval {
        if interval == 0 {
            return Err(CliError::Config(
                "poll_interval must be at least one second".to_string(),
            ));
        }
        profile.poll_interval_secs = Some(interval);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct EffectiveConfig {
    profile: String,
    config_path: String,
    api_base_url: String,
    poll_interval_secs: u64,
    request_timeout_secs: u64,
}

fn run_config_show(profile_name: Option<&str>, json: bool) -> Result<(), CliError> {
    let config = ProfileFile::load()?;
    let profile_name = config.resolve_profile_name(profile_name);
    let configured = config.is_configured(&profile_name);
    let client = config.client_config(&profile_name)?;

    let effective = EffectiveConfig {
        profile: profile_name,
        config_path: profiles_path().display().to_string(),
        api_base_url: client.api_base_url,
        poll_interval_secs: client.poll_interval_secs,
        request_timeout_secs: client.request_timeout_secs,
    };
    if json {
        return print_json(&effective);
    }

    if !configured {
        println!("Profile '{}' is not configured; showing defaults.", effective.profile);
    }
    println!("Profile:          {}", effective.profile);
    println!("Config file:      {}", effective.config_path);
    println!("API base URL:     {}", effective.api_base_url);
    println!("Poll interval:    {}s", effective.poll_interval_secs);
    println!("Request timeout:  {}s", effective.request_timeout_secs);
    Ok(())
}
