use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub public_rps: u32,
    pub push_gateway_url: Option<String>,
    pub push_gateway_secret: Option<String>,
    pub write_retry_limit: u32,
    pub max_page_size: usize,
    pub project_expiry_days: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            push_gateway_url: get_env_opt("PUSH_GATEWAY_URL"),
            push_gateway_secret: get_env_opt("PUSH_GATEWAY_SECRET"),
            write_retry_limit: get_env_parse_or("WRITE_RETRY_LIMIT", 8)?,
            max_page_size: get_env_parse_or("MAX_PAGE_SIZE", 100)?,
            project_expiry_days: get_env_parse_or("PROJECT_EXPIRY_DAYS", 30)?,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            write_retry_limit: self.write_retry_limit,
            max_page_size: self.max_page_size,
        }
    }
}

/// Knobs handed to every engine at construction time. Engines never read the
/// process environment themselves.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// How many times a lost compare-and-set write is retried from a fresh load.
    pub write_retry_limit: u32,
    pub max_page_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            write_retry_limit: 8,
            max_page_size: 100,
        }
    }
}

impl EngineSettings {
    /// Turns a 1-based page and a requested limit into `(skip, limit)`.
    pub fn paginate(&self, page: Option<i64>, limit: Option<i64>) -> (usize, usize) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(20)
            .clamp(1, self.max_page_size.max(1) as i64);
        // Saturates so the offset always fits a signed SQL OFFSET.
        let skip = (page - 1).saturating_mul(limit);
        (usize::try_from(skip).unwrap_or(usize::MAX), limit as usize)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(_) => get_env_parse(name),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_clamps_page_and_limit() {
        let settings = EngineSettings {
            write_retry_limit: 1,
            max_page_size: 50,
        };
        assert_eq!(settings.paginate(None, None), (0, 20));
        assert_eq!(settings.paginate(Some(3), Some(10)), (20, 10));
        assert_eq!(settings.paginate(Some(0), Some(500)), (0, 50));
        assert_eq!(settings.paginate(Some(-4), Some(0)), (0, 1));
        let (skip, limit) = settings.paginate(Some(i64::MAX), Some(3));
        assert_eq!(limit, 3);
        assert_eq!(skip as i64, i64::MAX);
    }
}
