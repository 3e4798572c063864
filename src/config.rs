//! Logout configuration and the override merge used by
//! [`LogoutHandler::init`](crate::logout::LogoutHandler::init).

use crate::observer::{CustomClear, LogoutObserver};
use serde::Deserialize;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3001/login";
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(500);

/// Which storage areas are cleared during logout.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageStrategy {
    #[default]
    #[serde(rename = "localStorage")]
    LocalStorage,
    #[serde(rename = "sessionStorage")]
    SessionStorage,
    #[serde(rename = "cookie")]
    Cookie,
    #[serde(rename = "all")]
    All,
    /// Delegates clearing entirely to the configured [`CustomClear`].
    #[serde(rename = "custom")]
    Custom,
}

impl StorageStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageStrategy::LocalStorage => "localStorage",
            StorageStrategy::SessionStorage => "sessionStorage",
            StorageStrategy::Cookie => "cookie",
            StorageStrategy::All => "all",
            StorageStrategy::Custom => "custom",
        }
    }
}

impl Display for StorageStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown storage strategy: {0}")]
pub struct UnknownStrategy(String);

impl FromStr for StorageStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localStorage" => Ok(StorageStrategy::LocalStorage),
            "sessionStorage" => Ok(StorageStrategy::SessionStorage),
            "cookie" => Ok(StorageStrategy::Cookie),
            "all" => Ok(StorageStrategy::All),
            "custom" => Ok(StorageStrategy::Custom),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    #[serde(alias = "strict")]
    Strict,
    #[serde(alias = "lax")]
    Lax,
    #[serde(alias = "none")]
    None,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes applied to every cookie deletion directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    /// `None` targets the current host.
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            secure: false,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    /// Returns a copy with every field present in `overrides` replaced.
    pub fn merged(&self, overrides: &CookieOptionsOverrides) -> CookieOptions {
        CookieOptions {
            path: overrides.path.clone().unwrap_or_else(|| self.path.clone()),
            domain: overrides
                .domain
                .clone()
                .unwrap_or_else(|| self.domain.clone()),
            secure: overrides.secure.unwrap_or(self.secure),
            same_site: overrides.same_site.unwrap_or(self.same_site),
        }
    }
}

/// Field-by-field overrides for [`CookieOptions`].
///
/// The outer `Option` says whether the field is overridden, the inner one
/// lets an override unset an attribute entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptionsOverrides {
    pub path: Option<Option<String>>,
    pub domain: Option<Option<String>>,
    pub secure: Option<bool>,
    pub same_site: Option<Option<SameSite>>,
}

#[derive(Clone)]
pub struct LogoutConfig {
    pub default_redirect_url: String,
    pub storage_strategy: StorageStrategy,
    pub local_storage_keys: Vec<String>,
    pub session_storage_keys: Vec<String>,
    pub cookie_names: Vec<String>,
    pub cookie_options: CookieOptions,
    pub clear_all_local_storage: bool,
    pub clear_all_session_storage: bool,
    pub clear_all_cookies: bool,
    pub redirect_delay: Duration,
    pub custom_clear: Option<Arc<dyn CustomClear>>,
    pub observer: Option<Arc<dyn LogoutObserver>>,
    pub debug: bool,
}

impl Default for LogoutConfig {
    fn default() -> Self {
        Self {
            default_redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            storage_strategy: StorageStrategy::default(),
            local_storage_keys: Vec::new(),
            session_storage_keys: Vec::new(),
            cookie_names: Vec::new(),
            cookie_options: CookieOptions::default(),
            clear_all_local_storage: false,
            clear_all_session_storage: false,
            clear_all_cookies: false,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            custom_clear: None,
            observer: None,
            debug: false,
        }
    }
}

impl fmt::Debug for LogoutConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutConfig")
            .field("default_redirect_url", &self.default_redirect_url)
            .field("storage_strategy", &self.storage_strategy)
            .field("local_storage_keys", &self.local_storage_keys)
            .field("session_storage_keys", &self.session_storage_keys)
            .field("cookie_names", &self.cookie_names)
            .field("cookie_options", &self.cookie_options)
            .field("clear_all_local_storage", &self.clear_all_local_storage)
            .field("clear_all_session_storage", &self.clear_all_session_storage)
            .field("clear_all_cookies", &self.clear_all_cookies)
            .field("redirect_delay", &self.redirect_delay)
            .field("custom_clear", &self.custom_clear.is_some())
            .field("observer", &self.observer.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

impl LogoutConfig {
    /// Applies `overrides` on top of this configuration. Cookie options are
    /// merged per field rather than replaced.
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            default_redirect_url,
            storage_strategy,
            local_storage_keys,
            session_storage_keys,
            cookie_names,
            cookie_options,
            clear_all_local_storage,
            clear_all_session_storage,
            clear_all_cookies,
            redirect_delay,
            custom_clear,
            observer,
            debug,
        } = overrides;

        if let Some(url) = default_redirect_url {
            self.default_redirect_url = url;
        }
        if let Some(strategy) = storage_strategy {
            self.storage_strategy = strategy;
        }
        if let Some(keys) = local_storage_keys {
            self.local_storage_keys = keys;
        }
        if let Some(keys) = session_storage_keys {
            self.session_storage_keys = keys;
        }
        if let Some(names) = cookie_names {
            self.cookie_names = names;
        }
        self.cookie_options = self.cookie_options.merged(&cookie_options);
        if let Some(flag) = clear_all_local_storage {
            self.clear_all_local_storage = flag;
        }
        if let Some(flag) = clear_all_session_storage {
            self.clear_all_session_storage = flag;
        }
        if let Some(flag) = clear_all_cookies {
            self.clear_all_cookies = flag;
        }
        if let Some(delay) = redirect_delay {
            self.redirect_delay = delay;
        }
        if let Some(custom_clear) = custom_clear {
            self.custom_clear = custom_clear;
        }
        if let Some(observer) = observer {
            self.observer = observer;
        }
        if let Some(debug) = debug {
            self.debug = debug;
        }
    }
}

/// Caller-supplied configuration. Every `None` keeps the current value.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub default_redirect_url: Option<String>,
    pub storage_strategy: Option<StorageStrategy>,
    pub local_storage_keys: Option<Vec<String>>,
    pub session_storage_keys: Option<Vec<String>>,
    pub cookie_names: Option<Vec<String>>,
    pub cookie_options: CookieOptionsOverrides,
    pub clear_all_local_storage: Option<bool>,
    pub clear_all_session_storage: Option<bool>,
    pub clear_all_cookies: Option<bool>,
    pub redirect_delay: Option<Duration>,
    pub custom_clear: Option<Option<Arc<dyn CustomClear>>>,
    pub observer: Option<Option<Arc<dyn LogoutObserver>>>,
    pub debug: Option<bool>,
}
