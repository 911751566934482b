use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (submission port).
    StartTls,
    /// TLS from the first byte (SMTPS).
    Tls,
    /// No encryption at all. Only for a relay on localhost or a sidecar.
    Insecure,
}

impl SmtpSecurity {
    /// `SMTP_INSECURE` wins over `SMTP_TLS`; STARTTLS when neither is set.
    fn from_settings(insecure: bool, tls_mode: Option<&str>) -> anyhow::Result<Self> {
        if insecure {
            return Ok(Self::Insecure);
        }
        match tls_mode.map(str::to_ascii_lowercase).as_deref() {
            None | Some("starttls") => Ok(Self::StartTls),
            Some("tls") | Some("implicit") => Ok(Self::Tls),
            Some(other) => anyhow::bail!("unknown SMTP_TLS {other:?}; use starttls or tls"),
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::StartTls => 587,
            Self::Tls => 465,
            Self::Insecure => 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    pub filter: String,
    pub json: bool,
}

/// Which persistence backend the stores are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Reject logins from users that have not consumed their code yet.
    pub require_verified_login: bool,
    pub code_length: usize,
    /// Codes are only logged when unset.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        let database_url = match backend {
            StoreBackend::Postgres => {
                Some(std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?)
            }
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "liftlog".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "liftlog-users".into()),
            ttl_minutes: parse_env("JWT_TTL_MINUTES").unwrap_or(30),
        };
        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => {
                let security = SmtpSecurity::from_settings(
                    parse_flag("SMTP_INSECURE"),
                    std::env::var("SMTP_TLS").ok().as_deref(),
                )?;
                Some(SmtpConfig {
                    host,
                    port: parse_env("SMTP_PORT").unwrap_or(security.default_port()),
                    security,
                    username: std::env::var("SMTP_USERNAME").ok(),
                    password: std::env::var("SMTP_PASSWORD").ok(),
                    from: std::env::var("SMTP_FROM")
                        .context("SMTP_FROM must be set with SMTP_HOST")?,
                })
            }
            Err(_) => None,
        };
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: match std::env::var("APP_PORT") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("APP_PORT must be a port number, got {raw:?}"))?,
                Err(_) => 8080,
            },
        };
        let log = LogConfig {
            filter: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "liftlog=debug,axum=info,tower_http=info".into()),
            json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        };
        Ok(Self {
            server,
            log,
            backend,
            database_url,
            jwt,
            require_verified_login: parse_flag("REQUIRE_VERIFIED_LOGIN"),
            code_length: parse_env("VERIFICATION_CODE_LENGTH").unwrap_or(6),
            smtp,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn parse_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
