//! In-process implementations of the storage ports.

use crate::storage::{CookieDocument, KeyValueStorage, Navigator, StorageError};
use cookie::{
    time::{self, OffsetDateTime},
    Cookie,
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex.lock().map_err(|_| StorageError::Poisoned)
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StorageError> {
        lock(&self.items)?.insert(key.into(), value.into());
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.items)?.get(key).cloned())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(lock(&self.items)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.items)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        lock(&self.items)?.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Jar {
    cookies: Vec<(String, String)>,
    written: Vec<String>,
}

/// A cookie jar that applies directives the way a document does, keyed by
/// name only. Path and domain attributes are recorded but not matched.
#[derive(Debug, Default)]
pub struct MemoryCookieDocument {
    jar: Mutex<Jar>,
}

impl MemoryCookieDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jar from a `Cookie` request header. Malformed pairs are
    /// dropped.
    pub fn from_header(header: &str) -> Self {
        Self::from_pairs(
            Cookie::split_parse(header)
                .filter_map(Result::ok)
                .map(|cookie| (cookie.name().to_string(), cookie.value().to_string())),
        )
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            jar: Mutex::new(Jar {
                cookies: pairs
                    .into_iter()
                    .map(|(name, value)| (name.into(), value.into()))
                    .collect(),
                written: Vec::new(),
            }),
        }
    }

    /// Every directive written so far, oldest first.
    pub fn written(&self) -> Vec<String> {
        lock(&self.jar)
            .map(|jar| jar.written.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.jar)
            .map(|jar| jar.cookies.iter().any(|(n, _)| n == name))
            .unwrap_or(false)
    }
}

fn is_expiring(cookie: &Cookie<'_>) -> bool {
    let expired = cookie
        .expires_datetime()
        .map(|expires| expires <= OffsetDateTime::now_utc())
        .unwrap_or(false);
    let no_age = cookie
        .max_age()
        .map(|age| age <= time::Duration::ZERO)
        .unwrap_or(false);

    expired || no_age
}

impl CookieDocument for MemoryCookieDocument {
    fn cookie(&self) -> String {
        lock(&self.jar)
            .map(|jar| {
                jar.cookies
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    fn set_cookie(&self, directive: &str) -> Result<(), StorageError> {
        let cookie = Cookie::parse(directive)
            .map_err(|error| StorageError::Unexpected(format!("{}: {:?}", error, directive)))?;

        let mut jar = lock(&self.jar)?;
        jar.written.push(directive.to_string());

        if is_expiring(&cookie) {
            jar.cookies.retain(|(name, _)| name != cookie.name());
        } else if let Some(existing) = jar.cookies.iter_mut().find(|(name, _)| name == cookie.name()) {
            existing.1 = cookie.value().to_string();
        } else {
            jar.cookies
                .push((cookie.name().to_string(), cookie.value().to_string()));
        }

        Ok(())
    }
}

/// A navigator that stays on a fixed page and only records where it was
/// asked to go.
#[derive(Debug)]
pub struct RecordingNavigator {
    href: String,
    navigations: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNavigator {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn navigations(&self) -> Vec<(String, Duration)> {
        lock(&self.navigations)
            .map(|navigations| navigations.clone())
            .unwrap_or_default()
    }

    /// The most recently scheduled navigation.
    pub fn last(&self) -> Option<(String, Duration)> {
        self.navigations().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn navigate(&self, url: &str, delay: Duration) {
        match lock(&self.navigations) {
            Ok(mut navigations) => navigations.push((url.to_string(), delay)),
            Err(error) => tracing::error!(%error, %url, "dropping navigation"),
        }
    }
}
