//! Server configuration.
//!
//! Every setting is a flag with an environment binding; a `.env` file in the
//! working directory is loaded first.

use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use internship_core_postgres::{DbLogLevel, PgStoreConfig};
use internship_core_service::{AuthSettings, SweepSettings};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported database scheme '{0}', this build accepts postgres:// only")]
    UnsupportedDatabase(String),

    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "internship-core", about = "Internship management API server", long_about = None)]
pub struct ServerConfig {
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Use the first `X-Forwarded-For` address as the client address. Enable
    /// only behind a proxy that overwrites the header.
    #[arg(long, env = "TRUST_FORWARDED_FOR", action = ArgAction::Set, default_value_t = false)]
    pub trust_forwarded_for: bool,

    /// Upper bound on the work done for a single request.
    #[arg(long, env = "REQUEST_TIMEOUT", value_parser = parse_duration, default_value = "30s")]
    pub request_timeout: Duration,

    // Database
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    #[arg(long, env = "DB_MAX_OPEN_CONNS", default_value_t = 20)]
    pub db_max_open_conns: u32,

    #[arg(long, env = "DB_MAX_IDLE_CONNS", default_value_t = 5)]
    pub db_max_idle_conns: u32,

    #[arg(long, env = "DB_CONN_MAX_LIFETIME", value_parser = parse_duration, default_value = "1h")]
    pub db_conn_max_lifetime: Duration,

    #[arg(long, env = "DB_CONN_MAX_IDLE_TIME", value_parser = parse_duration, default_value = "10m")]
    pub db_conn_max_idle_time: Duration,

    #[arg(long, env = "DB_LOG_LEVEL", default_value = "warn")]
    pub db_log_level: DbLogLevel,

    #[arg(long, env = "DB_SLOW_THRESHOLD", value_parser = parse_duration, default_value = "200ms")]
    pub db_slow_threshold: Duration,

    #[arg(long, env = "DB_AUTO_MIGRATE", action = ArgAction::Set, default_value_t = false)]
    pub db_auto_migrate: bool,

    // Tokens and passwords
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "JWT_ISSUER", default_value = "internship-core")]
    pub jwt_issuer: String,

    #[arg(long, env = "JWT_AUDIENCE", default_value = "internship-portal")]
    pub jwt_audience: String,

    #[arg(long, env = "ACCESS_TTL", value_parser = parse_duration, default_value = "15m")]
    pub access_ttl: Duration,

    #[arg(long, env = "REFRESH_TTL", value_parser = parse_duration, default_value = "7d")]
    pub refresh_ttl: Duration,

    #[arg(long, env = "REMEMBER_TTL", value_parser = parse_duration, default_value = "30d")]
    pub remember_ttl: Duration,

    #[arg(long, env = "RESET_TTL", value_parser = parse_duration, default_value = "1h")]
    pub reset_ttl: Duration,

    #[arg(long, env = "VERIFY_TTL", value_parser = parse_duration, default_value = "24h")]
    pub verify_ttl: Duration,

    #[arg(long, env = "PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    #[arg(long, env = "BCRYPT_COST", default_value_t = 12, value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    // Sweeps
    #[arg(long, env = "OVERDUE_SWEEP_INTERVAL", value_parser = parse_duration, default_value = "15m")]
    pub overdue_sweep_interval: Duration,

    #[arg(long, env = "TOKEN_CLEANUP_INTERVAL", value_parser = parse_duration, default_value = "1h")]
    pub token_cleanup_interval: Duration,

    #[arg(long, env = "TOKEN_CLEANUP_GRACE", value_parser = parse_duration, default_value = "1d")]
    pub token_cleanup_grace: Duration,

    #[arg(long, env = "AUDIT_SWEEP_INTERVAL", value_parser = parse_duration, default_value = "24h")]
    pub audit_sweep_interval: Duration,

    #[arg(long, env = "AUDIT_RETENTION_DAYS", default_value_t = 365)]
    pub audit_retention_days: u32,
}

impl ServerConfig {
    /// Parse flags and environment, then check cross-field rules.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env file is not an error.
        _ = dotenvy::dotenv();
        let config = Self::try_parse()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme = self
            .database_url
            .split_once(':')
            .map_or(self.database_url.as_str(), |(scheme, _)| scheme);
        match scheme {
            "postgres" | "postgresql" => Ok(()),
            other => Err(ConfigError::UnsupportedDatabase(other.to_string())),
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_config(&self) -> PgStoreConfig {
        PgStoreConfig {
            max_open_conns: self.db_max_open_conns,
            max_idle_conns: self.db_max_idle_conns,
            conn_max_lifetime: self.db_conn_max_lifetime,
            conn_max_idle_time: self.db_conn_max_idle_time,
            log_level: self.db_log_level,
            slow_threshold: self.db_slow_threshold,
            ..PgStoreConfig::new(self.database_url.clone())
        }
    }

    pub fn auth_settings(&self) -> Result<AuthSettings, ConfigError> {
        Ok(AuthSettings {
            jwt_issuer: self.jwt_issuer.clone(),
            jwt_audience: self.jwt_audience.clone(),
            access_ttl: chrono_duration("ACCESS_TTL", self.access_ttl)?,
            refresh_ttl: chrono_duration("REFRESH_TTL", self.refresh_ttl)?,
            remember_ttl: chrono_duration("REMEMBER_TTL", self.remember_ttl)?,
            reset_ttl: chrono_duration("RESET_TTL", self.reset_ttl)?,
            verify_ttl: chrono_duration("VERIFY_TTL", self.verify_ttl)?,
            bcrypt_cost: self.bcrypt_cost,
            password_pepper: self.password_pepper.clone().filter(|p| !p.is_empty()),
            ..AuthSettings::new(self.jwt_secret.clone())
        })
    }

    pub fn sweep_settings(&self) -> Result<SweepSettings, ConfigError> {
        Ok(SweepSettings {
            overdue_interval: self.overdue_sweep_interval,
            token_cleanup_interval: self.token_cleanup_interval,
            token_cleanup_grace: chrono_duration("TOKEN_CLEANUP_GRACE", self.token_cleanup_grace)?,
            audit_sweep_interval: self.audit_sweep_interval,
            audit_retention: chrono::Duration::days(i64::from(self.audit_retention_days)),
        })
    }
}

fn chrono_duration(name: &'static str, value: Duration) -> Result<chrono::Duration, ConfigError> {
    chrono::Duration::from_std(value).map_err(|_| ConfigError::OutOfRange(name))
}

/// Parse `<n>`, `<n>ms`, `<n>s`, `<n>m`, `<n>h` or `<n>d`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{raw}'"))?;
    let seconds = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{raw}' is too large"))
    };
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        "d" => seconds(24 * 60 * 60),
        other => Err(format!("unknown duration unit '{other}' in '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with_url(database_url: &str, args: &[&str]) -> ServerConfig {
        let mut argv = vec![
            "internship-core",
            "--database-url",
            database_url,
            "--jwt-secret",
            "0123456789abcdef0123456789abcdef",
        ];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    fn parse(args: &[&str]) -> ServerConfig {
        parse_with_url("postgres://localhost/internship", args)
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("200ms").unwrap(), Duration::from_millis(200));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        tokio_test::assert_err!(parse_duration("5w"));
        tokio_test::assert_err!(parse_duration("m"));
    }

    #[test]
    fn test_defaults_give_a_fifteen_minute_access_token() {
        let settings = parse(&[]).auth_settings().unwrap();
        assert_eq!(settings.access_ttl.num_seconds(), 900);
        assert_eq!(settings.bcrypt_cost, 12);
        assert_eq!(settings.jwt_issuer, "internship-core");
        assert!(!parse(&[]).trust_forwarded_for);
        assert!(parse(&["--trust-forwarded-for", "true"]).trust_forwarded_for);
    }

    #[test]
    fn test_only_postgres_urls_are_accepted() {
        assert!(parse(&[]).validate().is_ok());
        let config = parse_with_url("postgresql://db/internship", &[]);
        assert!(config.validate().is_ok());

        let config = parse_with_url("sqlite:/tmp/internship.db", &[]);
        match config.validate() {
            Err(ConfigError::UnsupportedDatabase(scheme)) => assert_eq!(scheme, "sqlite"),
            other => panic!("expected unsupported scheme, got {other:?}"),
        }

        let config = parse_with_url("mysql://root@localhost/internship", &[]);
        match config.validate() {
            Err(ConfigError::UnsupportedDatabase(scheme)) => assert_eq!(scheme, "mysql"),
            other => panic!("expected unsupported scheme, got {other:?}"),
        }
    }

    #[test]
    fn test_sweep_settings() {
        let config = parse(&["--audit-retention-days", "30", "--overdue-sweep-interval", "5m"]);
        let settings = config.sweep_settings().unwrap();
        assert_eq!(settings.audit_retention, chrono::Duration::days(30));
        assert_eq!(settings.overdue_interval, Duration::from_secs(300));
    }
}
