use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# pickup configuration

# Room whose weekly schedules are shared (documents are keyed <room_id>_<week>)
room_id: family

# Where schedules are stored: file, memory, or firestore
store: file

# Directory for the file store (default: ~/.local/share/pickup)
# data_dir: ~/.local/share/pickup

# Display names for the four participants
participants:
  A: A
  B: B
  C: C
  D: D
  unassigned: Unassigned

# firestore:
#   project_id: my-project
#   api_key: ...
#   collection: schedules
#   poll_interval_ms: 2000
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                cli_config_path
                                    .unwrap_or_else(Config::default_config_path)
                                    .display()
                            );
                        }
                        println!();

                        println!("room_id: {}", config.room_id.value);
                        println!("  source: {}", config.room_id.source);
                        println!();

                        println!("store: {}", config.store.value);
                        println!("  source: {}", config.store.source);
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        let names = &config.participants;
                        println!(
                            "participants: A={}, B={}, C={}, D={}, unassigned={}",
                            names.a, names.b, names.c, names.d, names.unassigned
                        );

                        if let Some(project) = &config.firestore.project_id {
                            println!();
                            println!("firestore.project_id: {}", project);
                            println!(
                                "firestore.api_key: {}",
                                if config.firestore.api_key.is_some() {
                                    "(set)"
                                } else {
                                    "(not set)"
                                }
                            );
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                // Check if config already exists
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'pickup config show' to view current configuration.");
                    return Ok(());
                }

                // Create parent directory
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}
