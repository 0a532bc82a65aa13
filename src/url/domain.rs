use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain key from a raw URL string
///
/// The key is the lowercase host, followed by `:port` when the URL names a
/// non-default port. Two URLs with the same key are treated as the same
/// remote server for politeness purposes, whatever their scheme or path.
///
/// Only `http` and `https` URLs with a host are accepted. Input cells that were
/// not valid UTF-8 reach this point lossily decoded and are rejected on the
/// replacement character.
///
/// # Examples
///
/// ```
/// use final_hop::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.COM/path").unwrap(), "example.com");
/// assert_eq!(extract_domain("http://example.com:8080/").unwrap(), "example.com:8080");
/// assert_eq!(extract_domain("http://example.com:80/").unwrap(), "example.com");
/// assert!(extract_domain("not a url").is_err());
/// ```
pub fn extract_domain(url_str: &str) -> UrlResult<String> {
    if url_str.contains(char::REPLACEMENT_CHARACTER) {
        return Err(UrlError::InvalidEncoding);
    }

    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?
        .to_lowercase();

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
