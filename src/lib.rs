use serde::Deserialize;
use std::{net::SocketAddr, time::Duration};

pub mod config;
pub mod cookie;
pub mod error;
pub mod handler;
pub mod logout;
pub mod memory;
pub mod observer;
pub mod redirect;
pub mod server;
pub mod storage;

pub use config::{
    ConfigOverrides, CookieOptions, CookieOptionsOverrides, LogoutConfig, SameSite,
    StorageStrategy,
};
pub use error::{LogoutError, UrlError};
pub use logout::LogoutHandler;
pub use observer::{CustomClear, LogoutObserver, TracingObserver};
pub use storage::{CookieDocument, Environment, KeyValueStorage, Navigator, StorageError};

/// Settings of the `logout-server` binary, read from `LOGOUT_*` variables.
#[derive(Deserialize, Clone, Debug)]
pub struct LogoutSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
    pub default_redirect_url: Option<String>,
    pub storage_strategy: Option<StorageStrategy>,
    pub local_storage_keys: Option<Vec<String>>,
    pub session_storage_keys: Option<Vec<String>>,
    pub cookie_names: Option<Vec<String>>,
    pub cookie_path: Option<String>,
    pub cookie_domain: Option<String>,
    pub cookie_secure: Option<bool>,
    pub cookie_same_site: Option<SameSite>,
    pub clear_all_local_storage: Option<bool>,
    pub clear_all_session_storage: Option<bool>,
    pub clear_all_cookies: Option<bool>,
    pub redirect_delay_ms: Option<u64>,
    pub debug: Option<bool>,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_public_origin() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl LogoutSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(envy::prefixed("LOGOUT_").from_env::<LogoutSettings>()?)
    }

    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            default_redirect_url: self.default_redirect_url,
            storage_strategy: self.storage_strategy,
            local_storage_keys: self.local_storage_keys,
            session_storage_keys: self.session_storage_keys,
            cookie_names: self.cookie_names,
            cookie_options: CookieOptionsOverrides {
                path: self.cookie_path.map(Some),
                domain: self.cookie_domain.map(Some),
                secure: self.cookie_secure,
                same_site: self.cookie_same_site.map(Some),
            },
            clear_all_local_storage: self.clear_all_local_storage,
            clear_all_session_storage: self.clear_all_session_storage,
            clear_all_cookies: self.clear_all_cookies,
            redirect_delay: self.redirect_delay_ms.map(Duration::from_millis),
            custom_clear: None,
            observer: None,
            debug: self.debug,
        }
    }
}
