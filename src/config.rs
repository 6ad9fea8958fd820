use crate::error::ConfigError;
use crate::utils::dates::parse_date_or;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

/// Run configuration
///
/// Built once at startup and passed by reference to every component.
#[derive(Clone, Debug)]
pub struct Config {
    /// Portal address
    pub portal_url: String,
    /// Portal login email
    pub email: String,
    /// Portal login password
    pub password: String,
    /// Spreadsheet key
    pub sheet_id: String,
    /// Worksheet name
    pub sheet_tab: String,
    /// Service-account key file
    pub credentials_file: PathBuf,
    /// Attendance date to register
    pub target_date: NaiveDate,
    /// Program link text inside a section
    pub program: String,
    /// Facility accordion title on the home screen
    pub facility: String,
    /// Run the browser without a window
    pub headless: bool,
    /// Pagination budget for participant table searches
    pub max_pages: usize,
    /// Attach to a running browser instead of launching one
    pub browser_debug_port: Option<u16>,
    /// Explicit browser binary
    pub chrome_executable: Option<PathBuf>,
    /// Browser viewport (width, height)
    pub viewport: (u32, u32),
    /// Debug-level logs
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: "https://vibi.vivebienestar.cl/".to_string(),
            email: String::new(),
            password: String::new(),
            sheet_id: String::new(),
            sheet_tab: "Asistencia".to_string(),
            credentials_file: PathBuf::from("credentials.json"),
            target_date: Local::now().date_naive(),
            program: "Gimnasia Laboral".to_string(),
            facility: "Clínica Dávila".to_string(),
            headless: false,
            max_pages: 8,
            browser_debug_port: None,
            chrome_executable: None,
            viewport: (1366, 840),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first when present
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_date = get("FECHA_OBJ").or_else(|| get("FECHA_OBJETIVO")).unwrap_or_default();

        Self {
            portal_url: get("URL").unwrap_or(default.portal_url),
            email: get("EMAIL").unwrap_or(default.email),
            password: get("PASSWORD").unwrap_or(default.password),
            sheet_id: get("SHEET_ID").unwrap_or(default.sheet_id),
            sheet_tab: get("SHEET_TAB").unwrap_or(default.sheet_tab),
            credentials_file: get("GOOGLE_CREDENTIALS").map(PathBuf::from).unwrap_or(default.credentials_file),
            target_date: parse_date_or(&raw_date, default.target_date),
            program: get("PROGRAMA").unwrap_or(default.program),
            facility: get("FACILITY").unwrap_or(default.facility),
            headless: get("HEADLESS").map(|v| v.trim() != "0").unwrap_or(default.headless),
            max_pages: get("MAX_PAGES").and_then(|v| v.trim().parse().ok()).unwrap_or(default.max_pages),
            browser_debug_port: get("BROWSER_DEBUG_PORT").and_then(|v| v.trim().parse().ok()),
            chrome_executable: get("CHROME_EXECUTABLE").map(PathBuf::from),
            viewport: default.viewport,
            verbose_logging: get("VERBOSE_LOGGING").and_then(|v| v.trim().parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// Check the values the run cannot start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("EMAIL", &self.email),
            ("PASSWORD", &self.password),
            ("SHEET_ID", &self.sheet_id),
        ];
        for (var_name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { var_name });
            }
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_PAGES",
                value: "0".to_string(),
                expected: "positive page count",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.portal_url, "https://vibi.vivebienestar.cl/");
        assert_eq!(config.sheet_tab, "Asistencia");
        assert_eq!(config.program, "Gimnasia Laboral");
        assert_eq!(config.max_pages, 8);
        assert!(!config.headless);
        assert!(config.browser_debug_port.is_none());
    }

    #[test]
    fn test_headless_flag_is_anything_but_zero() {
        assert!(!config_from(&[("HEADLESS", "0")]).headless);
        assert!(config_from(&[("HEADLESS", "1")]).headless);
        assert!(config_from(&[("HEADLESS", "true")]).headless);
    }

    #[test]
    fn test_target_date_prefers_fecha_obj() {
        let config = config_from(&[("FECHA_OBJ", "01/06/2024"), ("FECHA_OBJETIVO", "2024-07-01")]);
        assert_eq!(config.target_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let config = config_from(&[("FECHA_OBJETIVO", "2024-07-01")]);
        assert_eq!(config.target_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let config = config_from(&[("EMAIL", "a@b.cl"), ("SHEET_ID", "abc")]);
        match config.validate() {
            Err(ConfigError::Missing { var_name }) => assert_eq!(var_name, "PASSWORD"),
            other => panic!("unexpected: {:?}", other),
        }

        let config = config_from(&[("EMAIL", "a@b.cl"), ("PASSWORD", "x"), ("SHEET_ID", "abc")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let config = config_from(&[("MAX_PAGES", "many"), ("BROWSER_DEBUG_PORT", "abc")]);
        assert_eq!(config.max_pages, 8);
        assert!(config.browser_debug_port.is_none());
    }
}
