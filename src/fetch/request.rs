//! The base request builder shared by every terminal fetch variant.
//!
//! A [`FetchRequest`] carries the target URI and the request configuration.
//! Configuration methods only mutate local state; nothing touches the network
//! until a terminal builder created from it runs.

use std::future::Future;
use std::path::PathBuf;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, Response};
use tracing::warn;
use url::Url;

use super::content_type::{matches_any, mime_base, response_mime_bases};
use super::directory::DirectoryDownload;
use super::error::FetchError;
use super::file::FileDownload;
use super::redirect::{self, Followed};
use super::shared::{ClientScope, SharedFetch};
use crate::user_agent;

/// Fluent builder for one fetch of `uri`.
///
/// # Example
///
/// ```no_run
/// use mc_fetch::fetch::FetchRequest;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let path = FetchRequest::parse("https://maven.example.com/loader/installer.jar")?
///     .user_agent_command("install-fabric")
///     .header("x-api-key", "secret")
///     .to_directory("/data")?
///     .skip_existing(true)
///     .execute()?;
/// println!("saved to {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    uri: Url,
    accept: Vec<String>,
    headers: Vec<(String, String)>,
    user_agent_command: Option<String>,
    shared: Option<SharedFetch>,
}

impl FetchRequest {
    /// Starts a request for `uri`.
    #[must_use]
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            accept: Vec::new(),
            headers: Vec::new(),
            user_agent_command: None,
            shared: None,
        }
    }

    /// Parses `uri` and starts a request for it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUri`] unless `uri` is an absolute http(s) URL.
    pub fn parse(uri: &str) -> Result<Self, FetchError> {
        let parsed = Url::parse(uri).map_err(|_| FetchError::invalid_uri(uri))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_uri(uri));
        }
        Ok(Self::new(parsed))
    }

    /// The target URI.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Replaces the accepted content types. An empty list accepts anything.
    #[must_use]
    pub fn accept_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept.clear();
        for content_type in types {
            self = self.accept_content_type(content_type);
        }
        self
    }

    /// Adds one accepted content type, keeping insertion order.
    #[must_use]
    pub fn accept_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into().trim().to_string();
        let base = mime_base(&content_type);
        if !content_type.is_empty() && !self.accept.iter().any(|t| mime_base(t) == base) {
            self.accept.push(content_type);
        }
        self
    }

    /// Accepted content types, in insertion order.
    #[must_use]
    pub fn accepted_content_types(&self) -> &[String] {
        &self.accept
    }

    /// Sets a header on every request. Names are case-insensitive; the last
    /// value set for a name wins.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            *existing = (name, value);
        } else {
            self.headers.push((name, value));
        }
        self
    }

    /// Names the installer command in the User-Agent of every request.
    #[must_use]
    pub fn user_agent_command(mut self, command: impl Into<String>) -> Self {
        self.user_agent_command = Some(command.into());
        self
    }

    /// Reuses a caller-owned client handle instead of creating a scoped one.
    #[must_use]
    pub fn use_shared_fetch(mut self, shared: SharedFetch) -> Self {
        self.shared = Some(shared);
        self
    }

    /// The caller-supplied client handle, if any.
    #[must_use]
    pub fn shared_fetch(&self) -> Option<&SharedFetch> {
        self.shared.as_ref()
    }

    /// Downloads into `directory`, naming the file from the response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when `directory` is not an
    /// existing directory.
    pub fn to_directory(self, directory: impl Into<PathBuf>) -> Result<DirectoryDownload, FetchError> {
        DirectoryDownload::new(self, directory.into())
    }

    /// Downloads to exactly `file`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when the parent of `file` is not
    /// an existing directory.
    pub fn to_file(self, file: impl Into<PathBuf>) -> Result<FileDownload, FetchError> {
        FileDownload::new(self, file.into())
    }

    /// Runs `use_client` against the pooled client for this request.
    ///
    /// Without a caller-supplied handle a scoped one is created for this call
    /// and released when it returns, whether it succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns the error from creating the scoped handle, or from `use_client`.
    pub async fn with_client<F, Fut, T>(&self, use_client: F) -> Result<T, FetchError>
    where
        F: FnOnce(SharedFetch) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let scope = self.client_scope()?;
        use_client(SharedFetch::clone(&scope)).await
    }

    pub(crate) fn client_scope(&self) -> Result<ClientScope<'_>, FetchError> {
        match &self.shared {
            Some(shared) => Ok(ClientScope::Borrowed(shared)),
            None => {
                let command = self
                    .user_agent_command
                    .as_deref()
                    .unwrap_or(user_agent::DEFAULT_COMMAND);
                SharedFetch::with_defaults(command).map(ClientScope::Scoped)
            }
        }
    }

    /// Headers applied to every outgoing request.
    ///
    /// Custom headers are inserted last so they overwrite Accept and
    /// User-Agent.
    pub(crate) fn request_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut map = HeaderMap::new();
        if !self.accept.is_empty() {
            let value = HeaderValue::from_str(&self.accept.join(", "))
                .map_err(|_| FetchError::invalid_header(ACCEPT.as_str()))?;
            map.insert(ACCEPT, value);
        }
        if let Some(command) = &self.user_agent_command {
            let value = HeaderValue::from_str(&user_agent::user_agent_for_command(command))
                .map_err(|_| FetchError::invalid_header(USER_AGENT.as_str()))?;
            map.insert(USER_AGENT, value);
        }
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FetchError::invalid_header(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| FetchError::invalid_header(name.clone()))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    pub(crate) async fn send(
        &self,
        shared: &SharedFetch,
        method: Method,
        headers: &HeaderMap,
    ) -> Result<Followed, FetchError> {
        redirect::send_following_redirects(shared, method, &self.uri, headers).await
    }

    /// Fails with [`FetchError::FailedRequest`] for any non-2xx response.
    pub(crate) fn ensure_success(
        &self,
        response: &Response,
        phase: &'static str,
    ) -> Result<(), FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        warn!(
            uri = %self.uri,
            status = status.as_u16(),
            phase,
            "request failed"
        );
        Err(FetchError::failed_request(
            status.as_u16(),
            self.uri.as_str(),
            phase,
        ))
    }

    /// Checks a content-bearing response against the accepted types.
    pub(crate) fn check_content_type(&self, response: &Response) -> Result<(), FetchError> {
        let actual = response_mime_bases(response.headers());
        if matches_any(&self.accept, &actual) {
            Ok(())
        } else {
            Err(FetchError::content_type_mismatch(
                self.uri.as_str(),
                self.accept.clone(),
                actual,
            ))
        }
    }

    /// Checks a HEAD probe; probes that declare no Content-Type pass.
    pub(crate) fn check_probe_content_type(&self, response: &Response) -> Result<(), FetchError> {
        if response_mime_bases(response.headers()).is_empty() {
            return Ok(());
        }
        self.check_content_type(response)
    }
}
