use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UrlError {
    /// The URL string could not be parsed even after sanitizing.
    #[error("Invalid feed URL: {0}")]
    Invalid(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Sanitizes a user-entered feed URL for subscription.
///
/// Trims surrounding whitespace and prepends `https://` when no scheme is
/// present, so "example.com/feed.xml" subscribes cleanly. The result is
/// validated as a parseable http(s) URL.
pub fn sanitize_feed_url(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate)?;
    match url.scheme() {
        "http" | "https" => Ok(url.into()),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_owned())),
    }
}
