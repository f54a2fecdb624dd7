//! Redirect following with an observable redirect chain.
//!
//! The pooled client never follows redirects itself; requests go through
//! [`send_following_redirects`] so directory downloads can name files after the
//! last URL that redirected.

use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, LOCATION, PROXY_AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, trace};
use url::Url;

use super::error::FetchError;
use super::shared::SharedFetch;

/// A final response plus the URLs that redirected on the way to it.
#[derive(Debug)]
pub(crate) struct Followed {
    /// The first non-redirect response.
    pub response: Response,
    /// URLs that answered with a redirect, in request order.
    pub redirects: Vec<Url>,
}

/// Sends `method` to `uri`, following redirects up to the handle's limit.
///
/// Credentials in `headers` are dropped once a redirect changes host or port.
pub(crate) async fn send_following_redirects(
    shared: &SharedFetch,
    method: Method,
    uri: &Url,
    headers: &HeaderMap,
) -> Result<Followed, FetchError> {
    let mut current = uri.clone();
    let mut headers = headers.clone();
    let mut redirects = Vec::new();

    loop {
        trace!(%method, url = %current, "sending request");
        let response = shared
            .client()
            .request(method.clone(), current.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(uri.as_str(), e))?;

        let Some(next) = redirect_target(&current, &response) else {
            return Ok(Followed {
                response,
                redirects,
            });
        };

        if redirects.len() >= shared.max_redirects() {
            return Err(FetchError::too_many_redirects(
                uri.as_str(),
                shared.max_redirects(),
            ));
        }

        debug!(
            status = response.status().as_u16(),
            from = %current,
            to = %next,
            "following redirect"
        );
        if next.host_str() != current.host_str()
            || next.port_or_known_default() != current.port_or_known_default()
        {
            for sensitive in [AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION] {
                headers.remove(sensitive);
            }
        }
        redirects.push(std::mem::replace(&mut current, next));
    }
}

/// The absolute Location of a redirect response, if it is one we follow.
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    if !matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    match current.join(location) {
        Ok(next) => Some(next),
        Err(e) => {
            debug!(%location, error = %e, "ignoring unparseable redirect location");
            None
        }
    }
}
