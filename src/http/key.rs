use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Query parameters that identify a campaign rather than a page.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("failed to parse URL `{url}`: {reason}")]
    Parse { url: String, reason: String },

    #[error("unsupported URL scheme `{0}`")]
    Scheme(String),

    #[error("URL `{0}` has no host")]
    MissingHost(String),
}

/// Normalized form of a target URL, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Normalizes `raw` into a key.
    ///
    /// Only `http` and `https` are accepted. The host is lower-cased, the
    /// fragment and tracking parameters are removed, remaining query pairs are
    /// sorted and a trailing slash is dropped from non-root paths.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        Self::parse_target(raw).map(|(key, _)| key)
    }

    /// Like [`parse`](Self::parse), but also returns the URL to request:
    /// the caller's URL with only the fragment removed, so the query reaches
    /// the site exactly as written.
    pub fn parse_target(raw: &str) -> Result<(Self, Url), KeyError> {
        let mut url = Url::parse(raw.trim()).map_err(|e| KeyError::Parse {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(KeyError::Scheme(url.scheme().to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(KeyError::MissingHost(raw.to_string()));
        }

        url.set_fragment(None);
        let target = url.clone();

        let path = url.path().to_string();
        if path.len() > 1 && path.ends_with('/') {
            url.set_path(path.trim_end_matches('/'));
        }

        if url.query().is_some() {
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| !is_tracking_param(k))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            pairs.sort();

            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(pairs);
            }
        }

        Ok((Self(url.into()), target))
    }

    /// Wraps a string that could not be normalized, so failures can still
    /// name their target.
    pub fn raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_tracking_param(name: &str) -> bool {
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name)
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
