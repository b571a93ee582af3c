use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_SHEET_API_URL, DEFAULT_STORE_TIMEOUT_SECS, DEFAULT_TRUSTED_USER_HEADER,
};

/// Which backing store holds the tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Volatile, lost on restart
    Memory,
    /// Local redb file
    Redb,
    /// Remote spreadsheet
    Sheet,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redb" => Ok(StoreBackend::Redb),
            "sheet" => Ok(StoreBackend::Sheet),
            _ => Err(format!("Invalid STORE_BACKEND: {s}")),
        }
    }
}

/// How requests are gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Open,
    Password,
    Header,
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AccessMode::Open),
            "password" => Ok(AccessMode::Password),
            "header" => Ok(AccessMode::Header),
            _ => Err(format!("Invalid ACCESS_POLICY: {s}")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub store_backend: StoreBackend,
    pub database_path: String,
    pub sheet_api_url: String,
    pub sheet_id: Option<String>,
    pub sheet_api_token: Option<String>,
    pub store_timeout_secs: u64,
    pub seed_demo_data: bool,
    pub access_mode: AccessMode,
    pub access_password_digest: Option<String>,
    pub access_pepper: String,
    pub trusted_user_header: String,
    pub editors: Vec<String>,
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid {name}")),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let allowed_origins = list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/strategy_hub.redb".to_string());

        let sheet_api_url =
            env::var("SHEET_API_URL").unwrap_or_else(|_| DEFAULT_SHEET_API_URL.to_string());
        let sheet_id = env::var("SHEET_ID").ok();
        let sheet_api_token = env::var("SHEET_API_TOKEN").ok();
        if store_backend == StoreBackend::Sheet && (sheet_id.is_none() || sheet_api_token.is_none())
        {
            return Err("SHEET_ID and SHEET_API_TOKEN must be set for STORE_BACKEND=sheet".into());
        }

        let store_timeout_secs = env::var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_STORE_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid STORE_TIMEOUT_SECS")?;

        let seed_demo_data = parse_bool(
            "SEED_DEMO_DATA",
            &env::var("SEED_DEMO_DATA").unwrap_or_else(|_| "true".to_string()),
        )?;

        let access_mode: AccessMode = env::var("ACCESS_POLICY")
            .unwrap_or_else(|_| "open".to_string())
            .parse()?;

        let access_password_digest = env::var("ACCESS_PASSWORD_DIGEST").ok();
        if access_mode == AccessMode::Password && access_password_digest.is_none() {
            return Err("ACCESS_PASSWORD_DIGEST must be set for ACCESS_POLICY=password".into());
        }
        let access_pepper = env::var("ACCESS_PEPPER").unwrap_or_default();

        let trusted_user_header = env::var("TRUSTED_USER_HEADER")
            .unwrap_or_else(|_| DEFAULT_TRUSTED_USER_HEADER.to_string())
            .to_ascii_lowercase();
        let editors = list(&env::var("EDITORS").unwrap_or_default());

        Ok(Config {
            server_host,
            server_port,
            allowed_origins,
            environment,
            store_backend,
            database_path,
            sheet_api_url,
            sheet_id,
            sheet_api_token,
            store_timeout_secs,
            seed_demo_data,
            access_mode,
            access_password_digest,
            access_pepper,
            trusted_user_header,
            editors,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
