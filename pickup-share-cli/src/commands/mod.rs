mod config_cmd;
mod edit;
mod export;
mod show;
mod watch;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use edit::{NoteCommand, SetCommand};
pub use export::ExportCommand;
pub use show::ShowCommand;
pub use watch::WatchCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
