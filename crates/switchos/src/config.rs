//! CLI configuration: thin wrapper around `switchos_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--switch, --username, --password, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use switchos_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use switchos_config::{Config, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Build a `CoordinatorConfig` from the config file, profile, and flags.
///
/// Flag values take priority over profile values. Without a matching
/// profile, `--switch` alone is enough.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<CoordinatorConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut names: Vec<_> = config.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    // 1. Switch address (flag > env > profile)
    let switch = global
        .switch
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| profile.switch.clone());
    if switch.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    let url = switchos_config::parse_switch_url(&switch)?;

    // 2. Timing
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(config.defaults.timeout);
    let interval = profile.interval.unwrap_or(config.defaults.interval);

    let mut cfg = CoordinatorConfig::new(url)
        .with_timeout(Duration::from_secs(timeout))
        .with_refresh_interval(Duration::from_secs(interval));

    // 3. Credentials (flag > profile chain)
    let username = global.username.clone().or_else(|| profile.username.clone());
    if let Some(username) = username {
        let password = match global.password {
            Some(ref pw) => SecretString::from(pw.clone()),
            None => switchos_config::resolve_password(&profile, &profile_name)?,
        };
        cfg = cfg.with_auth(username, password);
    }

    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["switchos"];
        argv.extend_from_slice(args);
        argv.push("snapshot");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn switch_flag_without_profile() {
        let cfg = resolve(
            &global(&["--switch", "10.0.0.2", "--timeout", "3"]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(cfg.url.as_str(), "http://10.0.0.2/");
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn flags_override_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                switch: "10.0.0.2".into(),
                username: Some("admin".into()),
                password: Some("from-file".into()),
                interval: Some(30),
                ..Profile::default()
            },
        );

        let cfg = resolve(
            &global(&["--switch", "10.0.0.9", "--password", "from-flag"]),
            &config,
        )
        .unwrap();
        assert_eq!(cfg.url.as_str(), "http://10.0.0.9/");
        assert_eq!(cfg.refresh_interval, Duration::from_secs(30));
        let auth = cfg.auth.unwrap();
        assert_eq!(auth.username, "admin");
        assert_eq!(secrecy::ExposeSecret::expose_secret(&auth.password), "from-flag");
    }

    #[test]
    fn unknown_explicit_profile_is_an_error() {
        let err = resolve(&global(&["--profile", "lab"]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { .. }));
    }

    #[test]
    fn nothing_configured_is_a_usage_error() {
        let err = resolve(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
