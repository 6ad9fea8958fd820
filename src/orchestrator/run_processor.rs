//! Run processor - orchestration layer
//!
//! ## Responsibilities
//!
//! Application entry: owns the configuration, the sheet client and (while
//! running) the browser. Setup failures are fatal; everything after login
//! is contained per group by `group_processor`.
//!
//! ## Sequence
//!
//! 1. **Roster**: read the sheet, keep the target date, group it
//! 2. **Early exit**: nothing to do means no browser at all
//! 3. **Browser**: launch or attach, open the page, log in
//! 4. **Groups**: `group_processor::run_groups`
//! 5. **Summary**: final statistics, then browser shutdown

use crate::browser::BrowserSession;
use crate::clients::SheetsClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::Roster;
use crate::orchestrator::group_processor::{self, RunStats};
use crate::services::{ChromePortal, RosterLoader};
use crate::utils::logging::{log_startup, print_final_stats};
use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

/// Application
pub struct App {
    config: Config,
    loader: RosterLoader<SheetsClient>,
}

impl App {
    /// Validate configuration and prepare the sheet client
    pub async fn initialize(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let sheets = SheetsClient::new(&config).await?;
        Ok(Self {
            loader: RosterLoader::new(sheets),
            config,
        })
    }

    /// Run the whole attendance registration
    pub async fn run(&self) -> Result<RunStats> {
        info!("\n📁 Reading roster sheet '{}'...", self.config.sheet_tab);
        let roster = self
            .loader
            .load(self.config.target_date, Local::now().date_naive())
            .await?;

        log_startup(self.config.target_date, roster.total());

        if roster.is_empty() {
            warn!("⚠️ No participants for {}, nothing to do", self.config.target_date);
            return Ok(RunStats::default());
        }

        let stats = self.process_roster(&roster).await?;

        print_final_stats(stats.groups_ok, stats.groups_failed, stats.marked, stats.failed);
        Ok(stats)
    }

    /// Browser part of the run; the session is shut down on every path
    async fn process_roster(&self, roster: &Roster) -> Result<RunStats> {
        let session = BrowserSession::open(&self.config).await?;

        let result: Result<RunStats> = async {
            let page = session.new_page().await?;
            let portal = ChromePortal::new(page, &self.config);
            portal.login().await?;
            Ok(group_processor::run_groups(&portal, roster, &self.config).await)
        }
        .await;

        session.shutdown().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[tokio::test]
    async fn test_missing_credentials_fail_setup_as_config_error() {
        let result = App::initialize(Config::default()).await;

        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::Missing { var_name: "EMAIL" }))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_credentials_fail_setup_as_sheet_error() {
        let config = Config {
            email: "docente@example.com".into(),
            password: "secret".into(),
            sheet_id: "sheet".into(),
            credentials_file: "/nonexistent/credentials.json".into(),
            ..Config::default()
        };

        let result = App::initialize(config).await;

        assert!(matches!(result, Err(AppError::Sheet(_))));
    }
}
