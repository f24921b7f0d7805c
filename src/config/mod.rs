use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::errors::{AggregatorError, AggregatorResult};
use crate::filter::{CategorySpec, FieldMatch, InclusionPolicy};

/// Site-level settings passed through to the renderers.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    /// Homepage of the aggregated site.
    pub link: String,
    /// Atom id of the combined feed; defaults to `link`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl SiteConfig {
    pub fn feed_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.link)
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-feed timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("feed-aggregator/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// One configured feed and its inclusion policy.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<Vec<CategorySpec>>,
    #[serde(default)]
    pub posts: Option<Vec<FieldMatch>>,
}

impl FeedConfig {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category: None,
            posts: None,
        }
    }

    pub fn policy(&self) -> InclusionPolicy {
        InclusionPolicy {
            category: self.category.clone(),
            posts: self.posts.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Verbose per-entry logging.
    #[serde(default)]
    pub debug: bool,
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> AggregatorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> AggregatorResult<Self> {
        toml::from_str(s).map_err(|e| AggregatorError::Config(format!("config parse error: {e}")))
    }

    pub fn validate(&self) -> AggregatorResult<()> {
        if self.site.title.trim().is_empty() {
            return Err(AggregatorError::Config("site title is empty".to_string()));
        }

        let mut names = HashSet::new();
        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                return Err(AggregatorError::Config(format!(
                    "feed with url {} has an empty name",
                    feed.url
                )));
            }
            if !names.insert(feed.name.as_str()) {
                return Err(AggregatorError::Config(format!(
                    "duplicate feed name: {}",
                    feed.name
                )));
            }
            Url::parse(&feed.url).map_err(|e| {
                AggregatorError::Config(format!("feed {}: invalid url {}: {}", feed.name, feed.url, e))
            })?;
        }

        Ok(())
    }

    pub fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.iter().find(|f| f.name == name)
    }
}

/// Load `.env` from the executable's directory, then from the current one.
pub fn load_dotenv() {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    if let Some(dir) = exe_dir {
        let env_path = dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path).ok();
        }
    }
    dotenvy::dotenv().ok();
}
