use clap::Args;
use pickup_share_core::WeekKey;

use super::OutputFormat;
use crate::config::Config;
use crate::render;
use crate::session::Session;

#[derive(Args)]
pub struct ShowCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ShowCommand {
    pub async fn run(
        &self,
        config: &Config,
        week: WeekKey,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let session = Session::open(config, week).await?;
        let state = session.handle().state();
        session.close().await;

        let roster = &config.participants;
        match self.format {
            OutputFormat::Json => {
                let json = render::week_json(
                    config.room_id.value.as_str(),
                    week,
                    &state.schedule,
                    roster,
                )?;
                println!("{}", json);
            }
            OutputFormat::Text => {
                println!("{}", render::week_table(week, &state.schedule, roster));
            }
        }
        Ok(())
    }
}
