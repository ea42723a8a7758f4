use std::{env, path::PathBuf, str::FromStr};

use crate::{Error, Result};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub media_dir: PathBuf,
    /// Prefix of every locator handed out by the object store.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub snapshot_buffer: usize,
    pub notification_buffer: usize,
}

impl Config {
    /// Reads `.env` (when present) and then the process environment.
    pub fn init() -> Result<Config> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL must be set".to_string()))?;
        let port = parse_or("PORT", DEFAULT_PORT)?;
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            port,
            media_dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
            public_base_url,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            snapshot_buffer: parse_or("SNAPSHOT_BUFFER", 16)?,
            notification_buffer: parse_or("NOTIFICATION_BUFFER", 256)?,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
