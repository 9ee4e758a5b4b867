//! Small collaborators the feed pipeline depends on.
//!
//! - **Hashing**: stable 64-bit ids derived from URLs
//! - **HTML processing**: plain-text extraction for item subtitles
//! - **Dates**: parsing feed date strings to epoch millis, and formatting
//! - **URLs**: feed URL sanitizing for subscriptions

mod hash;
mod html;
mod time;
mod url;

pub use hash::stable_id;
pub use html::extract_text;
pub use time::{format_date, now_millis, parse_date_millis};
pub use url::{sanitize_feed_url, UrlError};
