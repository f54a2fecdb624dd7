//! Shared, pooled HTTP client handle and its configuration.
//!
//! A [`SharedFetch`] is created once per installer command and handed to every
//! [`FetchRequest`](super::FetchRequest) it issues, so connections are pooled
//! across requests. Builders that are not given a handle create a scoped one
//! that lives for exactly one terminal operation.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, FETCH_SESSION_HEADER, MAX_TIMEOUT_SECS,
    POOL_IDLE_TIMEOUT_SECS, RESPONSE_TIMEOUT_SECS,
};
use super::error::FetchError;
use super::request::FetchRequest;
use crate::user_agent;

/// Client configuration for a [`SharedFetch`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum wait between reads of a response, in seconds.
    pub response_timeout_secs: u64,
    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
    /// Headers sent with every request issued through the handle.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            response_timeout_secs: RESPONSE_TIMEOUT_SECS,
            pool_idle_timeout_secs: POOL_IDLE_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl FetchOptions {
    /// Loads options from `FETCH_*` environment variables over the defaults.
    ///
    /// Recognized: `FETCH_CONNECT_TIMEOUT_SECS`, `FETCH_RESPONSE_TIMEOUT_SECS`,
    /// `FETCH_POOL_IDLE_TIMEOUT_SECS`, `FETCH_MAX_REDIRECTS`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] for unparseable or out-of-range values.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, FetchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let read = |name: &str| -> Result<Option<u64>, FetchError> {
            let Some(raw) = lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
            else {
                return Ok(None);
            };
            raw.parse::<u64>().map(Some).map_err(|_| {
                FetchError::configuration(format!(
                    "invalid value for `{name}`: {raw:?} is not a whole number"
                ))
            })
        };

        if let Some(secs) = read("FETCH_CONNECT_TIMEOUT_SECS")? {
            options.connect_timeout_secs = secs;
        }
        if let Some(secs) = read("FETCH_RESPONSE_TIMEOUT_SECS")? {
            options.response_timeout_secs = secs;
        }
        if let Some(secs) = read("FETCH_POOL_IDLE_TIMEOUT_SECS")? {
            options.pool_idle_timeout_secs = secs;
        }
        if let Some(hops) = read("FETCH_MAX_REDIRECTS")? {
            options.max_redirects = usize::try_from(hops).map_err(|_| {
                FetchError::configuration(format!("invalid value for `FETCH_MAX_REDIRECTS`: {hops}"))
            })?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Validates option ranges.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when a timeout is zero or above
    /// one hour, or an extra header cannot be encoded.
    pub fn validate(&self) -> Result<(), FetchError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("response_timeout_secs", self.response_timeout_secs)?;
        validate_timeout_secs("pool_idle_timeout_secs", self.pool_idle_timeout_secs)?;
        extra_header_map(&self.extra_headers)?;
        Ok(())
    }

    /// Adds a header sent with every request through the handle.
    #[must_use]
    pub fn with_extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response (read) timeout.
    #[must_use]
    pub fn with_response_timeout_secs(mut self, secs: u64) -> Self {
        self.response_timeout_secs = secs;
        self
    }

    /// Sets the redirect limit.
    #[must_use]
    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }
}

fn validate_timeout_secs(name: &str, secs: u64) -> Result<(), FetchError> {
    if (1..=MAX_TIMEOUT_SECS).contains(&secs) {
        Ok(())
    } else {
        Err(FetchError::configuration(format!(
            "invalid value for `{name}`: {secs}. Expected range: 1..={MAX_TIMEOUT_SECS}"
        )))
    }
}

fn extra_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::invalid_header(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| FetchError::invalid_header(name.clone()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// A pooled HTTP client bound to one user-agent identity.
///
/// Cloning is cheap and clones share the same connection pool, so one handle
/// can serve many sequential or concurrent fetches. The pool is released when
/// the last clone is dropped.
#[derive(Clone)]
pub struct SharedFetch {
    inner: Arc<SharedInner>,
}

struct SharedInner {
    client: Client,
    user_agent: String,
    session_id: Uuid,
    max_redirects: usize,
}

impl fmt::Debug for SharedFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedFetch")
            .field("user_agent", &self.inner.user_agent)
            .field("session_id", &self.inner.session_id)
            .field("max_redirects", &self.inner.max_redirects)
            .finish_non_exhaustive()
    }
}

impl SharedFetch {
    /// Creates a handle whose requests identify themselves as `command`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when the options are invalid or
    /// the HTTP client cannot be built.
    #[instrument(level = "debug", skip(options))]
    pub fn new(command: &str, options: &FetchOptions) -> Result<Self, FetchError> {
        options.validate()?;
        let user_agent = user_agent::user_agent_for_command(command);
        let session_id = Uuid::new_v4();

        let mut default_headers = extra_header_map(&options.extra_headers)?;
        let session_value = HeaderValue::from_str(&session_id.to_string())
            .map_err(|_| FetchError::invalid_header(FETCH_SESSION_HEADER))?;
        default_headers.insert(FETCH_SESSION_HEADER, session_value);

        // Redirects are followed by the request layer so the chain stays visible.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .read_timeout(Duration::from_secs(options.response_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(options.pool_idle_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .user_agent(user_agent.clone())
            .default_headers(default_headers)
            .build()
            .map_err(|e| FetchError::configuration(format!("failed to build HTTP client: {e}")))?;

        debug!(%session_id, user_agent = %user_agent, "created shared fetch client");
        Ok(Self {
            inner: Arc::new(SharedInner {
                client,
                user_agent,
                session_id,
                max_redirects: options.max_redirects,
            }),
        })
    }

    /// Creates a handle with default options.
    ///
    /// # Errors
    ///
    /// Same as [`SharedFetch::new`].
    pub fn with_defaults(command: &str) -> Result<Self, FetchError> {
        Self::new(command, &FetchOptions::default())
    }

    /// Starts a request builder that reuses this handle.
    #[must_use]
    pub fn fetch(&self, uri: Url) -> FetchRequest {
        FetchRequest::new(uri).use_shared_fetch(self.clone())
    }

    /// The User-Agent sent by this handle.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    /// Identifier sent in the `x-fetch-session` header.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Redirect hops followed per request.
    #[must_use]
    pub fn max_redirects(&self) -> usize {
        self.inner.max_redirects
    }

    /// The underlying reqwest client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }
}

/// A client for one terminal operation: either the caller's handle or a
/// scoped one released when the operation ends, on every exit path.
pub(crate) enum ClientScope<'a> {
    Borrowed(&'a SharedFetch),
    Scoped(SharedFetch),
}

impl Deref for ClientScope<'_> {
    type Target = SharedFetch;

    fn deref(&self) -> &SharedFetch {
        match self {
            Self::Borrowed(shared) => shared,
            Self::Scoped(shared) => shared,
        }
    }
}

impl Drop for ClientScope<'_> {
    fn drop(&mut self) {
        if let Self::Scoped(shared) = self {
            debug!(session_id = %shared.session_id(), "releasing scoped fetch client");
        }
    }
}
