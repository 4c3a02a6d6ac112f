//! Caching mention resolver.
//!
//! Wraps an external [`UserLookup`] with an in-memory cache keyed by user id,
//! optionally persisted to a JSON side file so repeated runs do not repeat
//! lookups.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::mention::{MentionResolver, ResolveError};

pub const DEFAULT_CACHE_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ResolverSetupError {
    #[error("bot token cannot be empty")]
    EmptyToken,
    #[error("failed to read cache file {path}: {source}")]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode cache file {path}: {source}")]
    CacheDecode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// An external source of display names.
pub trait UserLookup: Send + Sync {
    fn lookup(&self, id: &str) -> Result<String, ResolveError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMention {
    pub username: String,
    pub cache_time: DateTime<Utc>,
}

pub type MentionCache = HashMap<String, CachedMention>;

pub struct CachingResolver<L> {
    lookup: L,
    cache: Mutex<MentionCache>,
    cache_path: Option<PathBuf>,
    ttl: Option<TimeDelta>,
}

impl<L: UserLookup> CachingResolver<L> {
    /// A resolver whose cache lives only as long as the process.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: Mutex::new(MentionCache::new()),
            cache_path: None,
            ttl: Some(TimeDelta::days(DEFAULT_CACHE_TTL_DAYS)),
        }
    }

    /// A resolver backed by the cache file at `path`, loading it if present.
    pub fn with_cache_file<P: AsRef<Path>>(lookup: L, path: P) -> Result<Self, ResolverSetupError> {
        let path = path.as_ref().to_path_buf();
        let cache = load_cache(&path)?;
        debug!(path = %path.display(), entries = cache.len(), "Loaded mention cache");

        Ok(Self {
            cache: Mutex::new(cache),
            cache_path: Some(path),
            ..Self::new(lookup)
        })
    }

    /// How long a cached name stays fresh; `None` keeps entries forever.
    pub fn ttl(mut self, ttl: Option<TimeDelta>) -> Self {
        self.ttl = ttl;
        self
    }

    fn is_fresh(&self, entry: &CachedMention, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now.signed_duration_since(entry.cache_time) < ttl,
            None => true,
        }
    }

    fn persist(&self, cache: &MentionCache) {
        let Some(path) = &self.cache_path else {
            return;
        };

        let encoded = match serde_json::to_string(cache) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "Failed to encode mention cache");
                return;
            }
        };

        if let Err(e) = std::fs::write(path, encoded) {
            error!(path = %path.display(), error = %e, "Failed to write mention cache");
        }
    }
}

impl<L: UserLookup> MentionResolver for CachingResolver<L> {
    fn resolve(&self, id: &str) -> Result<String, ResolveError> {
        let now = Utc::now();
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(id).filter(|entry| self.is_fresh(entry, now)) {
                return Ok(entry.username.clone());
            }
        }

        let username = self.lookup.lookup(id)?;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(
            id.to_string(),
            CachedMention {
                username: username.clone(),
                cache_time: now,
            },
        );
        self.persist(&cache);

        Ok(username)
    }
}

fn load_cache(path: &Path) -> Result<MentionCache, ResolverSetupError> {
    if !path.exists() {
        return Ok(MentionCache::new());
    }

    let data = std::fs::read_to_string(path).map_err(|source| ResolverSetupError::CacheRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| ResolverSetupError::CacheDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Wraps `lookup` in a cache, persisted when `cache_path` is given.
pub fn caching_resolver<L: UserLookup>(
    lookup: L,
    cache_path: Option<&Path>,
    ttl: Option<TimeDelta>,
) -> Result<CachingResolver<L>, ResolverSetupError> {
    let resolver = match cache_path {
        Some(path) => CachingResolver::with_cache_file(lookup, path)?,
        None => {
            warn!("No cache path provided, mention details will not be persisted across runs");
            CachingResolver::new(lookup)
        }
    };

    Ok(resolver.ttl(ttl))
}
