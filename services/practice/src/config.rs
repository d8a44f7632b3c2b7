//! Service configuration.
//!
//! # Purpose
//! Reads listener addresses, storage backend selection, Postgres pool
//! settings, and the optional bootstrap administrator from `PRECEDENT_*`
//! environment variables, then applies an optional YAML override file named
//! by `PRECEDENT_CONFIG`.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

/// Platform administrator seeded at startup, if configured.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_token: Option<String>,
}

impl BootstrapConfig {
    pub fn is_enabled(&self) -> bool {
        self.admin_email.is_some() && self.admin_token.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct PracticeConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Default, Deserialize)]
struct PracticeConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres_url: Option<String>,
    pg_max_connections: Option<u32>,
    pg_connect_timeout_ms: Option<u64>,
    pg_acquire_timeout_ms: Option<u64>,
    bootstrap_admin_email: Option<String>,
    bootstrap_admin_token: Option<String>,
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|err| anyhow::anyhow!("parse {key}: {err}")),
        Err(_) => Ok(default),
    }
}

impl PracticeConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("PRECEDENT_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse PRECEDENT_BIND")?;
        let metrics_bind = std::env::var("PRECEDENT_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse PRECEDENT_METRICS_BIND")?;
        let storage = std::env::var("PRECEDENT_STORAGE")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()
            .with_context(|| "parse PRECEDENT_STORAGE")?;
        let postgres = match std::env::var("PRECEDENT_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "PRECEDENT_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "PRECEDENT_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_CONNECT_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "PRECEDENT_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            Err(_) => None,
        };
        let bootstrap = BootstrapConfig {
            admin_email: std::env::var("PRECEDENT_BOOTSTRAP_ADMIN_EMAIL").ok(),
            admin_token: std::env::var("PRECEDENT_BOOTSTRAP_ADMIN_TOKEN").ok(),
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            bootstrap,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("PRECEDENT_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read PRECEDENT_CONFIG: {path}"))?;
            let override_cfg: PracticeConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse practice config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    fn apply(&mut self, override_cfg: PracticeConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(url) = override_cfg.postgres_url {
            let pg = self.postgres.get_or_insert_with(|| PostgresConfig {
                url: String::new(),
                max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                connect_timeout_ms: DEFAULT_PG_CONNECT_TIMEOUT_MS,
                acquire_timeout_ms: DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
            });
            pg.url = url;
        }
        if let Some(pg) = self.postgres.as_mut() {
            if let Some(value) = override_cfg.pg_max_connections {
                pg.max_connections = value;
            }
            if let Some(value) = override_cfg.pg_connect_timeout_ms {
                pg.connect_timeout_ms = value;
            }
            if let Some(value) = override_cfg.pg_acquire_timeout_ms {
                pg.acquire_timeout_ms = value;
            }
        }
        if let Some(value) = override_cfg.bootstrap_admin_email {
            self.bootstrap.admin_email = Some(value);
        }
        if let Some(value) = override_cfg.bootstrap_admin_token {
            self.bootstrap.admin_token = Some(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    fn clear_all() -> Vec<EnvGuard> {
        [
            "PRECEDENT_BIND",
            "PRECEDENT_METRICS_BIND",
            "PRECEDENT_STORAGE",
            "PRECEDENT_POSTGRES_URL",
            "PRECEDENT_PG_MAX_CONNECTIONS",
            "PRECEDENT_PG_CONNECT_TIMEOUT_MS",
            "PRECEDENT_PG_ACQUIRE_TIMEOUT_MS",
            "PRECEDENT_BOOTSTRAP_ADMIN_EMAIL",
            "PRECEDENT_BOOTSTRAP_ADMIN_TOKEN",
            "PRECEDENT_CONFIG",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_use_memory_storage() {
        let _guards = clear_all();
        let config = PracticeConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.metrics_bind.port(), 9090);
        assert!(config.postgres.is_none());
        assert!(!config.bootstrap.is_enabled());
    }

    #[test]
    #[serial]
    fn postgres_settings_from_env() {
        let _guards = clear_all();
        let _g1 = EnvGuard::set("PRECEDENT_STORAGE", "postgres");
        let _g2 = EnvGuard::set("PRECEDENT_POSTGRES_URL", "postgres://localhost/precedent");
        let _g3 = EnvGuard::set("PRECEDENT_PG_MAX_CONNECTIONS", "3");
        let config = PracticeConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.acquire_timeout_ms, DEFAULT_PG_ACQUIRE_TIMEOUT_MS);
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        let _guards = clear_all();
        let _g1 = EnvGuard::set("PRECEDENT_STORAGE", "sqlite");
        assert!(PracticeConfig::from_env().is_err());
        let _g2 = EnvGuard::set("PRECEDENT_STORAGE", "memory");
        let _g3 = EnvGuard::set("PRECEDENT_BIND", "not-an-addr");
        assert!(PracticeConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn yaml_override_wins() {
        let _guards = clear_all();
        let path = std::env::temp_dir().join(format!("precedent-{}.yaml", std::process::id()));
        fs::write(
            &path,
            "bind_addr: 127.0.0.1:7000\nstorage: postgres\npostgres_url: postgres://db/precedent\npg_max_connections: 2\nbootstrap_admin_email: root@example.com\nbootstrap_admin_token: secret\n",
        )
        .expect("write yaml");
        let _g = EnvGuard::set("PRECEDENT_CONFIG", path.to_str().expect("path"));
        let config = PracticeConfig::from_env_or_yaml().expect("config");
        let _ = fs::remove_file(&path);

        assert_eq!(config.bind_addr.port(), 7000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://db/precedent");
        assert_eq!(pg.max_connections, 2);
        assert!(config.bootstrap.is_enabled());
    }

    #[test]
    #[serial]
    fn missing_yaml_file_is_an_error() {
        let _guards = clear_all();
        let _g = EnvGuard::set("PRECEDENT_CONFIG", "/nonexistent/precedent.yaml");
        let err = PracticeConfig::from_env_or_yaml().unwrap_err();
        assert!(err.to_string().contains("PRECEDENT_CONFIG"));
    }
}
