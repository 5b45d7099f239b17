use reqwest::Url;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BACKEND_URL is not configured")]
    MissingBackendUrl,

    #[error("invalid {name} {value:?}: {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("SUPABASE_URL and SUPABASE_ANON_KEY must be set together")]
    PartialStore,

    #[error("invalid developer token {0:?}, expected TOKEN=USER_ID")]
    InvalidDevToken(String),
}

/// Where saved words live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Rest { url: String, anon_key: String },
    Memory { tokens: Vec<(String, String)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    pub backend_url: String,
    pub store: StoreConfig,
}

/// Unvalidated settings as they arrive from flags and the environment.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub addr: Option<SocketAddr>,
    pub base_url: Option<String>,
    pub backend_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub dev_tokens: Vec<String>,
}

impl ServiceConfig {
    /// Checks everything the service needs before it binds a socket.
    pub fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let backend_url = present(raw.backend_url).ok_or(ConfigError::MissingBackendUrl)?;
        let backend_url = parse_url("BACKEND_URL", &backend_url)?;
        let addr = raw
            .addr
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
        let base_url = match present(raw.base_url) {
            Some(url) => parse_url("ZIDIAN_BASE_URL", &url)?,
            None => format!("http://{addr}"),
        };
        let store = match (present(raw.supabase_url), present(raw.supabase_anon_key)) {
            (Some(url), Some(anon_key)) => StoreConfig::Rest {
                url: parse_url("SUPABASE_URL", &url)?,
                anon_key,
            },
            (None, None) => StoreConfig::Memory {
                tokens: raw
                    .dev_tokens
                    .iter()
                    .map(|pair| parse_dev_token(pair))
                    .collect::<Result<_, _>>()?,
            },
            _ => return Err(ConfigError::PartialStore),
        };
        Ok(Self {
            addr,
            base_url,
            backend_url,
            store,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_dev_token(pair: &str) -> Result<(String, String), ConfigError> {
    match pair.split_once('=') {
        Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
            Ok((token.trim().to_string(), user.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidDevToken(pair.to_string())),
    }
}
