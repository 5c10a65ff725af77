use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" => Ok(StorageKind::Sqlite),
            "memory" | "in-memory" => Ok(StorageKind::Memory),
            other => anyhow::bail!("unknown STORAGE {other:?}, expected \"sqlite\" or \"memory\""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub storage: StorageKind,
    pub popular_default_count: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmorate.db?mode=rwc".to_string());

        let storage: StorageKind =
            std::env::var("STORAGE").unwrap_or_else(|_| "sqlite".to_string()).parse()?;

        let popular_default_count: u64 = std::env::var("POPULAR_DEFAULT_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            storage,
            popular_default_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_kind_parses_case_insensitively() {
        assert_eq!("SQLite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert_eq!(" memory ".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("postgres".parse::<StorageKind>().is_err());
    }
}
