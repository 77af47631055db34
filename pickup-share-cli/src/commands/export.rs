use clap::Args;
use pickup_share_core::{default_file_name, to_csv, Schedule, WeekKey};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::session::Session;

#[derive(Args)]
pub struct ExportCommand {
    /// Output file (default: pickup_<week>.csv in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn run(
        &self,
        config: &Config,
        week: WeekKey,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let session = Session::open(config, week).await?;
        let state = session.handle().state();
        session.close().await;

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_file_name(week)));
        write_csv(&path, week, &state.schedule, config)?;
        println!("Exported week {} to {}", week, path.display());
        Ok(())
    }
}

/// Writes the CSV export of a week, creating parent directories.
pub fn write_csv(
    path: &Path,
    week: WeekKey,
    schedule: &Schedule,
    config: &Config,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_csv(week, schedule, &config.participants))
}
