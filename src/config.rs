use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_FEED_LIMIT: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DATA_PATH: &str = "api/data";
const EXPORT_PATH: &str = "api/export/csv";
const CHAT_PATH: &str = "chat";

/// Backend endpoints, all relative to one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub data: Url,
    pub export: Url,
    pub chat: Url,
}

impl Endpoints {
    pub fn from_base(base: &str) -> Result<Self> {
        let mut base = Url::parse(base.trim()).with_context(|| format!("invalid API URL '{}'", base))?;
        if base.cannot_be_a_base() {
            bail!("API URL '{}' cannot be used as a base URL", base);
        }
        // Url::join replaces the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            data: base.join(DATA_PATH)?,
            export: base.join(EXPORT_PATH)?,
            chat: base.join(CHAT_PATH)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub feed_limit: usize,
    /// `None` means the system local zone.
    pub timezone: Option<Tz>,
    pub timeout: Duration,
}

/// Values given on the command line; unset ones fall back to the environment
/// and then to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub feed_limit: Option<usize>,
    pub timezone: Option<String>,
}

impl Settings {
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolution with an injectable environment lookup.
    pub fn resolve_with(overrides: &Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = match &overrides.api_url {
            Some(url) => {
                debug!("Using API URL from --api-url: {}", url);
                url.clone()
            }
            None => env("CONTENT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };
        let endpoints = Endpoints::from_base(&api_url)?;

        let feed_limit = match overrides.feed_limit {
            Some(n) => n,
            None => match env("CONTENT_FEED_LIMIT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("CONTENT_FEED_LIMIT must be a number, got '{}'", raw))?,
                None => DEFAULT_FEED_LIMIT,
            },
        };
        if feed_limit == 0 {
            bail!("feed limit must be at least 1");
        }

        let timezone = match overrides.timezone.clone().or_else(|| env("CONTENT_TZ")) {
            Some(name) => Some(parse_timezone(&name)?),
            None => None,
        };

        Ok(Self {
            endpoints,
            feed_limit,
            timezone,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown timezone '{}': {}", name, e))
}
