use thiserror::Error;

/// Application error type
///
/// Setup failures (config, sheet, browser) abort the whole run; navigation
/// failures only abort the group being processed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Browser related errors
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// Spreadsheet access errors
    #[error("sheet error: {0}")]
    Sheet(#[from] SheetError),
    /// Portal navigation errors
    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),
    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Browser related errors
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Could not attach to a running browser
    #[error("cannot connect to browser (port: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// Could not start a browser process
    #[error("failed to launch browser: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// Invalid launch configuration
    #[error("browser configuration failed: {0}")]
    ConfigurationFailed(String),
    /// Page creation failed
    #[error("failed to create page: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// Navigation to an address failed
    #[error("failed to navigate to {url}: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// The portal login form could not be completed
    #[error("login failed: {0}")]
    LoginFailed(String),
}

/// Spreadsheet access errors
#[derive(Debug, Error)]
pub enum SheetError {
    /// Credential file missing or unreadable
    #[error("cannot read credentials file {path}: {source}")]
    CredentialsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Credential file is not a service-account key
    #[error("invalid credentials file {path}: {source}")]
    CredentialsParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// JWT assertion could not be signed
    #[error("failed to sign token assertion: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),
    /// HTTP request failed
    #[error("request to {endpoint} failed: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success HTTP status
    #[error("{endpoint} answered {status}: {body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Endpoint address could not be built
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
    /// Worksheet has no header row
    #[error("worksheet '{tab}' is empty")]
    EmptySheet { tab: String },
}

/// Portal navigation errors
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The facility accordion never opened
    #[error("could not open facility panel '{facility}'")]
    FacilityPanel { facility: String },
    /// No locator in the cascade matched
    #[error("{step}: no element matches '{target}'")]
    TargetNotFound { step: &'static str, target: String },
    /// The destination marker never appeared
    #[error("{step}: destination marker not reached")]
    DestinationNotReached { step: &'static str },
    /// Could not return to the home screen
    #[error("could not return to home screen")]
    HomeUnreachable,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("environment variable {var_name} is not set")]
    Missing { var_name: &'static str },
    /// Variable set but unparsable
    #[error("environment variable {var_name}: '{value}' is not a valid {expected}")]
    InvalidValue {
        var_name: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ========== Convenience constructors ==========

impl NavigationError {
    /// Element lookup exhausted for a navigation step
    pub fn not_found(step: &'static str, target: impl Into<String>) -> Self {
        NavigationError::TargetNotFound {
            step,
            target: target.into(),
        }
    }
}

impl SheetError {
    /// Wrap a transport error for an endpoint
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        SheetError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}
