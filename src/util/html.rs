/// Rendering width passed to html2text. Subtitles are single-paragraph
/// text, so the width only affects where soft line breaks land; they are
/// collapsed to spaces below.
const RENDER_WIDTH: usize = 400;

/// Extracts readable plain text from an HTML fragment.
///
/// Used to derive item subtitles from feed descriptions, which are usually
/// HTML. Tags are dropped, entities are decoded, and whitespace is collapsed
/// to single spaces. Returns an empty string when the input renders to
/// nothing (or fails to parse at all).
pub fn extract_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), RENDER_WIDTH).unwrap_or_default();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
