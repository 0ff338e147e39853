//! Composite repository ids and credentialed clone URLs.
//!
//! The composite id is the join key every downstream plugin uses to refer to "this
//! repository", so its format must never drift: `<source>:<type>:<connection>:<native id>`.

use url::{ParseError, Url};

use crate::error::CompileError;

/// Scheme borrowed to parse scheme-less clone URLs as network-path references.
const NETWORK_PATH_SCHEME: &str = "netpath";

pub fn repository_id(source: &str, type_tag: &str, connection_id: u64, native_id: u64) -> String {
    format!("{source}:{type_tag}:{connection_id}:{native_id}")
}

/// Embeds `username:token` as the userinfo of `clone_url`.
///
/// Absolute URLs keep their scheme. A URL without a scheme is treated as a network-path
/// reference and serialized with a leading `//`, so `HttpUrlToRepo` becomes
/// `//git:<token>@HttpUrlToRepo`. Userinfo is percent-encoded.
pub fn credentialed_clone_url(
    clone_url: &str,
    username: &str,
    token: &str,
) -> Result<String, CompileError> {
    let trimmed = clone_url.trim();
    if trimmed.is_empty() {
        return Err(invalid(clone_url, "clone URL is empty"));
    }

    match Url::parse(trimmed) {
        Ok(mut url) => {
            embed_credentials(&mut url, username, token).map_err(|reason| invalid(clone_url, reason))?;
            Ok(url.to_string())
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            let reference = trimmed.strip_prefix("//").unwrap_or(trimmed);
            let mut url = Url::parse(&format!("{NETWORK_PATH_SCHEME}://{reference}"))
                .map_err(|e| invalid(clone_url, e.to_string()))?;
            embed_credentials(&mut url, username, token).map_err(|reason| invalid(clone_url, reason))?;
            let serialized = url.to_string();
            Ok(serialized[NETWORK_PATH_SCHEME.len() + 1..].to_string())
        }
        Err(e) => Err(invalid(clone_url, e.to_string())),
    }
}

fn embed_credentials(url: &mut Url, username: &str, token: &str) -> Result<(), &'static str> {
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host to authenticate against");
    }
    url.set_username(username)
        .map_err(|_| "URL cannot carry credentials")?;
    url.set_password(Some(token))
        .map_err(|_| "URL cannot carry credentials")?;
    Ok(())
}

fn invalid(url: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}
