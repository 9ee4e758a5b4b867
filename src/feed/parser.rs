use feed_rs::parser;
use thiserror::Error;

/// Feed XML could not be understood as RSS or Atom.
#[derive(Debug, Error)]
#[error("Parse error: {0}")]
pub struct ParseError(String);

/// A parsed feed channel: the feed-level fields the pipeline cares about,
/// plus its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChannel {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub items: Vec<ParsedItem>,
}

/// A single raw entry out of a channel.
///
/// Everything is optional here; the save stage decides what is usable.
/// `pub_date` is carried as a date string (RFC 3339) and parsed to millis by
/// the save stage's date collaborator, so items with an unparseable date end
/// up stored without a timestamp rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub pub_date: Option<String>,
    pub comments_url: Option<String>,
}

/// Parses RSS/Atom bytes into a [`ParsedChannel`].
pub fn parse_channel(bytes: &[u8]) -> Result<ParsedChannel, ParseError> {
    let feed = parser::parse(bytes).map_err(|e| ParseError(e.to_string()))?;

    let logo_url = feed
        .logo
        .as_ref()
        .map(|image| image.uri.clone())
        .or_else(|| feed.icon.as_ref().map(|image| image.uri.clone()));

    let items = feed.entries.into_iter().map(map_entry).collect();

    Ok(ParsedChannel {
        title: feed.title.map(|t| t.content),
        link: feed.links.first().map(|l| l.href.clone()),
        description: feed.description.map(|t| t.content),
        logo_url,
        items,
    })
}

fn map_entry(entry: feed_rs::model::Entry) -> ParsedItem {
    let link = entry.links.first().map(|l| l.href.clone());

    // Atom threading extension; plain RSS <comments> is not surfaced by
    // feed-rs, so those stay None.
    let comments_url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("replies"))
        .map(|l| l.href.clone());

    let image_url = entry
        .media
        .iter()
        .flat_map(|media| media.thumbnails.iter().map(|t| t.image.uri.clone()))
        .next()
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|media| media.content.iter().filter_map(|c| c.url.as_ref()))
                .next()
                .map(|url| url.to_string())
        });

    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body));

    let pub_date = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339());

    ParsedItem {
        title: entry.title.map(|t| t.content),
        link,
        description,
        image_url,
        pub_date,
        comments_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example Blog</title>
    <link>https://example.com</link>
    <description>News from Example</description>
    <item>
      <title>First post</title>
      <link>https://example.com/posts/1</link>
      <description>&lt;p&gt;Hello&lt;/p&gt;</description>
      <pubDate>Wed, 01 May 2024 12:00:00 GMT</pubDate>
      <media:thumbnail url="http://example.com/thumb.png"/>
    </item>
    <item>
      <link>https://example.com/posts/2</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example</id>
  <updated>2024-05-01T12:00:00Z</updated>
  <entry>
    <id>urn:example:1</id>
    <title>Entry one</title>
    <link href="https://example.com/1"/>
    <link rel="replies" href="https://example.com/1/comments"/>
    <summary>Summary text</summary>
    <updated>2024-05-01T12:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_channel_fields() {
        let channel = parse_channel(RSS.as_bytes()).unwrap();
        assert_eq!(channel.title.as_deref(), Some("Example Blog"));
        assert_eq!(channel.link.as_deref(), Some("https://example.com"));
        assert_eq!(channel.description.as_deref(), Some("News from Example"));
        assert_eq!(channel.items.len(), 2);
    }

    #[test]
    fn test_parse_rss_item_fields() {
        let channel = parse_channel(RSS.as_bytes()).unwrap();
        let item = &channel.items[0];
        assert_eq!(item.title.as_deref(), Some("First post"));
        assert_eq!(item.link.as_deref(), Some("https://example.com/posts/1"));
        assert_eq!(item.image_url.as_deref(), Some("http://example.com/thumb.png"));
        assert!(item.pub_date.is_some());
    }

    #[test]
    fn test_parse_rss_item_without_title() {
        let channel = parse_channel(RSS.as_bytes()).unwrap();
        let item = &channel.items[1];
        assert_eq!(item.title, None);
        assert_eq!(item.link.as_deref(), Some("https://example.com/posts/2"));
    }

    #[test]
    fn test_parse_atom_with_comments_link() {
        let channel = parse_channel(ATOM.as_bytes()).unwrap();
        assert_eq!(channel.title.as_deref(), Some("Atom Example"));
        let item = &channel.items[0];
        assert_eq!(item.title.as_deref(), Some("Entry one"));
        assert_eq!(
            item.comments_url.as_deref(),
            Some("https://example.com/1/comments")
        );
        assert_eq!(item.description.as_deref(), Some("Summary text"));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_channel(b"<not really xml").is_err());
    }
}
