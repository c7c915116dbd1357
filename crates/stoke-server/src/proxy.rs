//! Request proxying to a backend declared in project metadata.

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Method, Uri};

/// Errors raised while preparing proxy rules.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Proxy target is not a valid URL: {0}")]
    Invalid(String),

    #[error("Proxy target must start with http:// or https://: {0}")]
    UnsupportedScheme(String),
}

/// Validated proxy rules built from the `proxy` field in package.json.
#[derive(Debug, Clone)]
pub struct ProxyRules {
    scheme: Scheme,
    authority: Authority,
}

impl ProxyRules {
    /// Validate a raw proxy target string.
    pub fn from_target(raw: &str) -> Result<Self, ProxyError> {
        let uri: Uri = raw
            .parse()
            .map_err(|_| ProxyError::Invalid(raw.to_string()))?;

        let scheme = match uri.scheme_str() {
            Some("http") => Scheme::HTTP,
            Some("https") => Scheme::HTTPS,
            _ => return Err(ProxyError::UnsupportedScheme(raw.to_string())),
        };

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| ProxyError::Invalid(raw.to_string()))?;

        Ok(Self { scheme, authority })
    }

    /// Map a request URI onto the proxy target, keeping path and query.
    pub fn rewrite(&self, uri: &Uri) -> Uri {
        let mut parts = uri.clone().into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(parts).unwrap_or_else(|_| uri.clone())
    }

    /// Target as shown in diagnostics.
    pub fn describe(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }
}

/// Whether a request that matched no static file should go to the backend.
///
/// GET requests that accept text/html are presumed to be app navigation and
/// stay with the dev server; everything else is forwarded.
pub fn should_proxy(method: &Method, accept: Option<&str>) -> bool {
    *method != Method::GET || accept.map_or(true, |a| !a.contains("text/html"))
}
