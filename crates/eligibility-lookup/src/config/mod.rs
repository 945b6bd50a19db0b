use crate::workflows::eligibility::{DecisionPolicy, IneligibleAction};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_SMARTY_BASE_URL: &str = "https://us-street.api.smarty.com";
const DEFAULT_OVERLAY_URL: &str =
    "https://maps3.energycenter.org/arcgis/rest/services/sync/GPServer/LocOverlay_CT/execute";
const DEFAULT_PROGRAM_SITE_URL: &str = "https://program-site";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub upstream: UpstreamConfig,
    pub reference: ReferenceConfig,
    pub program: ProgramConfig,
    pub notifications: NotificationConfig,
    pub admission: AdmissionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let upstream = UpstreamConfig {
            smarty_auth_id: optional_var("SMARTY_AUTH_ID"),
            smarty_auth_token: optional_var("SMARTY_AUTH_TOKEN"),
            smarty_base_url: optional_var("SMARTY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SMARTY_BASE_URL.to_string()),
            overlay_url: optional_var("OVERLAY_URL")
                .unwrap_or_else(|| DEFAULT_OVERLAY_URL.to_string()),
        };

        let reference = ReferenceConfig {
            tracts_path: optional_var("TRACTS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/tracts.csv")),
            income_limits_path: optional_var("INCOME_LIMITS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/income_limits.csv")),
            climate_zones_path: optional_var("CLIMATE_ZONES_CSV").map(PathBuf::from),
        };

        let ineligible_action = match optional_var("INELIGIBLE_ACTION") {
            Some(raw) => IneligibleAction::parse(&raw)
                .ok_or(ConfigError::InvalidIneligibleAction { value: raw })?,
            None => IneligibleAction::CollectEmail,
        };
        let signup_url = optional_var("SIGNUP_URL");
        if ineligible_action == IneligibleAction::VisitSignup && signup_url.is_none() {
            return Err(ConfigError::MissingSignupUrl);
        }

        let program = ProgramConfig {
            site_url: optional_var("PROGRAM_SITE_URL")
                .unwrap_or_else(|| DEFAULT_PROGRAM_SITE_URL.to_string()),
            signup_url,
            ineligible_action,
        };

        let notifications = NotificationConfig {
            log_path: optional_var("NOTIFY_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/emails.csv")),
        };

        let validate_per_second = match optional_var("VALIDATE_RATE_LIMIT") {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or(ConfigError::InvalidRateLimit)?,
            ),
            None => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            upstream,
            reference,
            program,
            notifications,
            admission: AdmissionConfig {
                validate_per_second,
            },
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Endpoints and credentials for the address-validation and overlay services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub smarty_auth_id: Option<String>,
    pub smarty_auth_token: Option<String>,
    pub smarty_base_url: String,
    pub overlay_url: String,
}

impl UpstreamConfig {
    /// Address validation cannot run without both halves of the credential pair.
    pub fn smarty_credentials(&self) -> Result<(String, String), ConfigError> {
        match (&self.smarty_auth_id, &self.smarty_auth_token) {
            (Some(id), Some(token)) => Ok((id.clone(), token.clone())),
            _ => Err(ConfigError::MissingSmartyCredentials),
        }
    }
}

/// Locations of the reference tables loaded at startup.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub tracts_path: PathBuf,
    pub income_limits_path: PathBuf,
    pub climate_zones_path: Option<PathBuf>,
}

/// Destinations and deployment policy used when building outcomes.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub site_url: String,
    pub signup_url: Option<String>,
    pub ineligible_action: IneligibleAction,
}

impl ProgramConfig {
    pub fn decision_policy(&self) -> DecisionPolicy {
        let base = self.site_url.trim_end_matches('/');
        DecisionPolicy {
            general_redirect_url: format!("{base}/general"),
            region_redirect_base: base.to_string(),
            ineligible_action: self.ineligible_action,
            signup_url: self.signup_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct AdmissionConfig {
    pub validate_per_second: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIneligibleAction { value: String },
    MissingSignupUrl,
    InvalidRateLimit,
    MissingSmartyCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIneligibleAction { value } => write!(
                f,
                "INELIGIBLE_ACTION must be 'collect-email' or 'visit-signup' (found '{}')",
                value
            ),
            ConfigError::MissingSignupUrl => {
                write!(f, "SIGNUP_URL is required when INELIGIBLE_ACTION=visit-signup")
            }
            ConfigError::InvalidRateLimit => {
                write!(f, "VALIDATE_RATE_LIMIT must be a positive integer")
            }
            ConfigError::MissingSmartyCredentials => {
                write!(f, "SMARTY_AUTH_ID and SMARTY_AUTH_TOKEN must both be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
