use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub store: StoreKind,
    pub jwt: JwtConfig,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub bcrypt_cost: u32,
    pub cors_origin: Option<String>,
    pub log_level: String,
    pub flags: FlagsConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Default)]
pub struct FlagsConfig {
    /// Base URL of the remote key-value flag store.
    pub remote_url: Option<String>,
    pub fallback_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store = match env_or("CLINIC_STORE", "postgres").as_str() {
            "memory" => StoreKind::Memory,
            "postgres" => StoreKind::Postgres,
            other => return Err(format!("Invalid CLINIC_STORE: {other}")),
        };

        let database_url = match store {
            StoreKind::Postgres => Some(env_required("DATABASE_URL")?),
            StoreKind::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let jwt = JwtConfig {
            secret: env_required("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "HealthTrack"),
            audience: env_or("JWT_AUDIENCE", "HealthTrack"),
        };

        if jwt.secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 bytes".to_string());
        }

        let host: IpAddr = env_or("CLINIC_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CLINIC_HOST: {e}"))?;

        let port: u16 = env_or("CLINIC_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid CLINIC_PORT: {e}"))?;

        let max_body_size: usize = env_or("CLINIC_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid CLINIC_MAX_BODY_SIZE: {e}"))?;

        let bcrypt_cost: u32 = env_or("CLINIC_BCRYPT_COST", "12")
            .parse()
            .map_err(|e| format!("Invalid CLINIC_BCRYPT_COST: {e}"))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(format!("CLINIC_BCRYPT_COST must be within 4..=31, got {bcrypt_cost}"));
        }

        let cors_origin = std::env::var("CLINIC_CORS_ORIGIN")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if let Some(origin) = &cors_origin {
            axum::http::HeaderValue::from_str(origin)
                .map_err(|e| format!("Invalid CLINIC_CORS_ORIGIN: {e}"))?;
        }

        let log_level = env_or("CLINIC_LOG_LEVEL", "info");

        let flags = FlagsConfig {
            remote_url: std::env::var("CLINIC_FLAGS_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            fallback_path: std::env::var("CLINIC_FLAGS_FALLBACK_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Config {
            database_url,
            store,
            jwt,
            host,
            port,
            max_body_size,
            bcrypt_cost,
            cors_origin,
            log_level,
            flags,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
