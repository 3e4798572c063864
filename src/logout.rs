use crate::config::{ConfigOverrides, CookieOptionsOverrides, LogoutConfig, StorageStrategy};
use crate::cookie;
use crate::error::LogoutError;
use crate::redirect;
use crate::storage::{Environment, KeyValueStorage};

/// Debug diagnostics, emitted only when the `debug` flag is configured.
macro_rules! trace_debug {
    ($handler:expr, $($arg:tt)+) => {
        if $handler.config.debug {
            tracing::debug!($($arg)+);
        }
    };
}

/// Clears authentication data from the environment and sends the user on
/// to the next hop of the redirect chain.
///
/// ```
/// # use logout_handler::{memory::RecordingNavigator, ConfigOverrides, Environment, LogoutHandler};
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() {
/// let navigator = Arc::new(RecordingNavigator::new(
///     "https://auth.example.com/logout?next=https%3A%2F%2Fapp.example.com",
/// ));
/// let mut handler = LogoutHandler::new(Environment::new(navigator.clone()));
/// handler.init(ConfigOverrides::default()).execute().await;
///
/// assert_eq!(navigator.last().unwrap().0, "https://app.example.com");
/// # }
/// ```
pub struct LogoutHandler {
    config: LogoutConfig,
    env: Environment,
}

impl LogoutHandler {
    pub fn new(env: Environment) -> Self {
        Self {
            config: LogoutConfig::default(),
            env,
        }
    }

    pub fn config(&self) -> &LogoutConfig {
        &self.config
    }

    pub fn init(&mut self, overrides: ConfigOverrides) -> &mut Self {
        self.config.merge(overrides);
        trace_debug!(self, config = ?self.config, "initialized");
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.config = LogoutConfig::default();
        self
    }

    pub fn clear_local_storage(&self) -> Result<(), LogoutError> {
        self.clear_key_value(
            "localStorage",
            self.env.local_storage.as_deref(),
            self.config.clear_all_local_storage,
            &self.config.local_storage_keys,
        )
    }

    pub fn clear_session_storage(&self) -> Result<(), LogoutError> {
        self.clear_key_value(
            "sessionStorage",
            self.env.session_storage.as_deref(),
            self.config.clear_all_session_storage,
            &self.config.session_storage_keys,
        )
    }

    fn clear_key_value(
        &self,
        kind: &str,
        storage: Option<&dyn KeyValueStorage>,
        clear_all: bool,
        keys: &[String],
    ) -> Result<(), LogoutError> {
        let Some(storage) = storage else {
            trace_debug!(self, "{} is not available", kind);
            return Ok(());
        };

        if clear_all {
            storage.clear()?;
            trace_debug!(self, "cleared all {}", kind);
        } else {
            for key in keys {
                storage.remove_item(key)?;
                trace_debug!(self, %key, "removed {} key", kind);
            }
        }

        Ok(())
    }

    /// Expires cookie `name`. `options` override the configured cookie
    /// options field by field.
    pub fn delete_cookie(
        &self,
        name: &str,
        options: &CookieOptionsOverrides,
    ) -> Result<(), LogoutError> {
        let Some(document) = self.env.document.as_deref() else {
            trace_debug!(self, "document is not available");
            return Ok(());
        };

        let directive = cookie::deletion_directive(name, &self.config.cookie_options.merged(options));
        document.set_cookie(&directive)?;
        trace_debug!(self, %name, "deleted cookie");

        Ok(())
    }

    pub fn all_cookie_names(&self) -> Vec<String> {
        self.env
            .document
            .as_deref()
            .map(|document| cookie::cookie_names(&document.cookie()))
            .unwrap_or_default()
    }

    pub fn clear_cookies(&self) -> Result<(), LogoutError> {
        if self.env.document.is_none() {
            trace_debug!(self, "document is not available");
            return Ok(());
        }

        let no_overrides = CookieOptionsOverrides::default();
        if self.config.clear_all_cookies {
            for name in self.all_cookie_names() {
                self.delete_cookie(&name, &no_overrides)?;
            }
            trace_debug!(self, "cleared all cookies");
        } else {
            for name in &self.config.cookie_names {
                self.delete_cookie(name, &no_overrides)?;
            }
        }

        Ok(())
    }

    async fn run_custom_clear(&self, label: &str) -> Result<(), LogoutError> {
        if let Some(custom_clear) = &self.config.custom_clear {
            custom_clear.clear().await.map_err(LogoutError::CustomClear)?;
            trace_debug!(self, "executed {} custom clear", label);
        }
        Ok(())
    }

    /// Clears storage according to the configured strategy.
    ///
    /// A configured custom clear runs as the whole strategy for
    /// [`StorageStrategy::Custom`], and after the built-in clearing for
    /// every other strategy, so it always runs exactly once.
    pub async fn clear_auth_data(&self) -> Result<(), LogoutError> {
        if let Some(observer) = &self.config.observer {
            observer.on_logout_start();
        }

        let strategy = self.config.storage_strategy;
        match strategy {
            StorageStrategy::LocalStorage => self.clear_local_storage()?,
            StorageStrategy::SessionStorage => self.clear_session_storage()?,
            StorageStrategy::Cookie => self.clear_cookies()?,
            StorageStrategy::All => {
                self.clear_local_storage()?;
                self.clear_session_storage()?;
                self.clear_cookies()?;
            }
            StorageStrategy::Custom => self.run_custom_clear("strategy").await?,
        }

        if strategy != StorageStrategy::Custom {
            self.run_custom_clear("additional").await?;
        }

        if let Some(observer) = &self.config.observer {
            observer.on_logout_complete();
        }

        trace_debug!(self, %strategy, "auth data cleared");
        Ok(())
    }

    /// The decoded immediate redirect target, or `None` when the current URL
    /// has none or can't be read.
    pub fn next_url(&self) -> Option<String> {
        match redirect::next_url(&self.env.navigator.href()) {
            Ok(next) => {
                trace_debug!(self, next = ?next, "next url");
                next
            }
            Err(error) => {
                trace_debug!(self, %error, "error parsing url");
                None
            }
        }
    }

    /// The `next` parameters following the first one, undecoded.
    pub fn remaining_next_params(&self) -> Option<String> {
        let href = self.env.navigator.href();
        let remaining = redirect::remaining_next_params(&href).map(str::to_string);
        if let Some(params) = &remaining {
            trace_debug!(self, %params, "remaining params");
        }
        remaining
    }

    pub fn build_redirect_url(&self, next_url: &str) -> String {
        let remaining = self.remaining_next_params();
        let url = redirect::append_params(next_url, remaining.as_deref());
        if remaining.is_some() {
            trace_debug!(self, %url, "final redirect url");
        }
        url
    }

    pub fn redirect(&self, url: &str) {
        if let Some(observer) = &self.config.observer {
            observer.on_redirect(url);
        }

        trace_debug!(self, %url, "redirecting");
        self.env.navigator.navigate(url, self.config.redirect_delay);
    }

    pub fn redirect_to_default(&self) {
        self.redirect(&self.config.default_redirect_url);
    }

    /// Runs the whole logout flow. Always ends with exactly one navigation,
    /// falling back to the default URL when clearing fails.
    #[tracing::instrument(name = "LogoutHandler::execute", skip(self))]
    pub async fn execute(&self) {
        if let Err(error) = self.clear_auth_data().await {
            tracing::error!(%error, "logout failed");

            if let Some(observer) = &self.config.observer {
                observer.on_error(&error);
            }

            self.redirect_to_default();
            return;
        }

        match self.next_url() {
            Some(next_url) => {
                let url = self.build_redirect_url(&next_url);
                self.redirect(&url);
            }
            None => self.redirect_to_default(),
        }
    }
}
