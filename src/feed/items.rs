use crate::storage::{FeedItem, FeedSource};
use crate::util::{extract_text, format_date, parse_date_millis, stable_id};

use super::parser::{ParsedChannel, ParsedItem};

/// Converts a parsed channel's entries into storable feed items.
///
/// Entries missing a title or a link cannot be displayed or deduplicated,
/// so they are dropped with a debug log rather than failing the channel.
pub(crate) fn map_feed_items(channel: &ParsedChannel, source: &FeedSource) -> Vec<FeedItem> {
    channel
        .items
        .iter()
        .filter_map(|item| map_feed_item(item, source))
        .collect()
}

fn map_feed_item(item: &ParsedItem, source: &FeedSource) -> Option<FeedItem> {
    let (Some(title), Some(url)) = (item.title.as_deref(), item.link.as_deref()) else {
        tracing::debug!(source = %source.url, ?item, "Skipping item without title or link");
        return None;
    };

    let pub_date_millis = item.pub_date.as_deref().and_then(parse_date_millis);

    let subtitle = item
        .description
        .as_deref()
        .map(extract_text)
        .filter(|text| !text.is_empty());

    Some(FeedItem {
        id: stable_id(url),
        url: url.to_string(),
        title: title.to_string(),
        subtitle,
        content: None,
        image_url: item.image_url.as_deref().map(upgrade_to_https),
        feed_source: source.clone(),
        is_read: false,
        is_bookmarked: false,
        pub_date_millis,
        date_string: pub_date_millis.and_then(format_date),
        comments_url: item.comments_url.clone(),
    })
}

/// Feed images are routinely served over plain http even when the host
/// supports TLS; upgrade the scheme so clients never load mixed content.
fn upgrade_to_https(url: &str) -> String {
    if url.starts_with("http:") {
        url.replacen("http:", "https:", 1)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_source() -> FeedSource {
        FeedSource {
            id: stable_id("https://example.com/feed.xml"),
            url: "https://example.com/feed.xml".to_string(),
            title: "Example".to_string(),
            category: None,
            logo_url: None,
            last_sync_timestamp: None,
        }
    }

    fn channel_with(items: Vec<ParsedItem>) -> ParsedChannel {
        ParsedChannel {
            title: Some("Example".to_string()),
            link: None,
            description: None,
            logo_url: None,
            items,
        }
    }

    #[test]
    fn test_item_missing_title_is_skipped() {
        let channel = channel_with(vec![ParsedItem {
            link: Some("https://example.com/1".to_string()),
            ..Default::default()
        }]);
        assert!(map_feed_items(&channel, &test_source()).is_empty());
    }

    #[test]
    fn test_item_missing_link_is_skipped() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("No link".to_string()),
            ..Default::default()
        }]);
        assert!(map_feed_items(&channel, &test_source()).is_empty());
    }

    #[test]
    fn test_http_image_upgraded_to_https() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            image_url: Some("http://example.com/a.png".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_https_image_left_alone() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            image_url: Some("https://example.com/a.png".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_unparseable_date_stored_without_timestamp() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            pub_date: Some("not a date".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        assert_eq!(items[0].pub_date_millis, None);
        assert_eq!(items[0].date_string, None);
    }

    #[test]
    fn test_valid_date_parsed_and_formatted() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            pub_date: Some("2024-05-01T12:00:00Z".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        assert_eq!(items[0].pub_date_millis, Some(1_714_564_800_000));
        assert_eq!(items[0].date_string.as_deref(), Some("2024-05-01 12:00"));
    }

    #[test]
    fn test_html_description_becomes_plain_subtitle() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            description: Some("<p>Plain <i>enough</i> text</p>".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        let subtitle = items[0].subtitle.as_deref().unwrap();
        assert!(subtitle.contains("text"));
        assert!(!subtitle.contains('<'));
    }

    #[test]
    fn test_item_id_is_stable_url_hash() {
        let channel = channel_with(vec![ParsedItem {
            title: Some("Post".to_string()),
            link: Some("https://example.com/1".to_string()),
            ..Default::default()
        }]);
        let items = map_feed_items(&channel, &test_source());
        assert_eq!(items[0].id, stable_id("https://example.com/1"));
    }
}
