//! This module is in charge of defining the configuration format with types
//! and reading the configuration.

use serde::Deserialize;
use std::{env, fs};

#[derive(Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub num_games_per_round: u32,
    pub num_workers: usize,
    #[serde(default = "default_promotion_threshold")]
    pub promotion_threshold: f64,
    #[serde(default = "default_match_timeout_secs")]
    pub match_timeout_secs: u64,
    /// Where the training loop writes its checkpoints.
    pub checkpoint_dir: String,
    /// How many fake training rounds the dry run feeds into the arena.
    pub num_rounds: u32,
    pub report_file: String,
    pub log_file: String,
}

fn default_promotion_threshold() -> f64 {
    0.55
}

fn default_match_timeout_secs() -> u64 {
    600
}

/// Determines from the first command line argument which config file to
/// load, parses the toml into an EnvironmentConfig struct and returns it.
/// If no argument is provided, it will load the default dry run config.
pub fn load_config() -> EnvironmentConfig {
    match load_config_inner() {
        Ok(config) => config,
        Err(err) => {
            // With the immediate exit, we can't use error!() here.
            println!("Error loading config: {err}");
            std::process::exit(1);
        }
    }
}

/// Inner method to unify error handling
fn load_config_inner() -> Result<EnvironmentConfig, String> {
    let args: Vec<String> = env::args().collect();

    let config_filename = match args.len() {
        1 => "dry-run-config.toml".to_string(),
        2 => args[1].clone(),
        _ => {
            return Err(format!("Usage: {} [config_file]", args[0]));
        }
    };

    let config_file = fs::read_to_string(&config_filename)
        .map_err(|_| format!("Could not read config file at path: {config_filename}"))?;

    let config: EnvironmentConfig = toml::from_str(&config_file).map_err(|e| {
        format!(
            "Could not parse config file at path: {}\nCaused by: {:?}",
            config_filename, e
        )
    })?;

    Ok(config)
}
