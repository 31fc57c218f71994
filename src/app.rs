//! Application context shared by CLI command handlers.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::store::Database;

pub struct AppContext {
    pub config: Config,
    pub db: Database,
    /// Machine-readable JSON output requested.
    pub machine: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let db = Database::open(config.db_path()?)?;
        Ok(Self {
            config,
            db,
            machine: cli.machine,
        })
    }
}
