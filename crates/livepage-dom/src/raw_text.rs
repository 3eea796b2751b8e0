//! Raw-text element bodies.
//!
//! `tl` tokenizes the body of `<script>` and `<style>` like ordinary markup,
//! so a `<` in a script opens a tag and swallows the following siblings.
//! [`extract`] cuts those bodies out of the source before `tl` sees it and
//! leaves the body's index in their place; the tree conversion puts them back.

/// Elements whose body is text taken verbatim: no tags, no entities.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose body has no tags but does decode entities.
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

/// Returns true if text inside `tag` is written out without escaping.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Returns true if `tag` is a raw-text or escapable raw-text element.
pub(crate) fn has_text_body(tag: &str) -> bool {
    is_raw_text_element(tag) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Source with raw-text bodies replaced by their index, plus the bodies.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Extracted {
    pub(crate) html: String,
    pub(crate) bodies: Vec<String>,
}

impl Extracted {
    /// Body referenced by the placeholder `index`.
    pub(crate) fn body(&self, index: &str) -> Option<&str> {
        let index: usize = index.trim().parse().ok()?;
        self.bodies.get(index).map(String::as_str)
    }
}

/// Cut every raw-text element body out of `html`.
///
/// Empty bodies leave nothing behind. A body without its end tag runs to the
/// end of the input, and the end tag is added.
pub(crate) fn extract(html: &str) -> Extracted {
    let mut extracted = Extracted {
        html: String::with_capacity(html.len()),
        bodies: Vec::new(),
    };
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        let (before, from_lt) = rest.split_at(lt);
        extracted.html.push_str(before);

        if from_lt.starts_with("<!--") {
            let end = from_lt.find("-->").map_or(from_lt.len(), |i| i + 3);
            let (comment, after) = from_lt.split_at(end);
            extracted.html.push_str(comment);
            rest = after;
            continue;
        }

        let Some(tag) = text_body_tag_at(from_lt) else {
            extracted.html.push('<');
            rest = &from_lt[1..];
            continue;
        };

        let (start_tag, after) = from_lt.split_at(start_tag_len(from_lt));
        extracted.html.push_str(start_tag);
        let (body, remainder) = after.split_at(end_tag_offset(after, tag).unwrap_or(after.len()));
        if !body.is_empty() {
            extracted.html.push_str(&extracted.bodies.len().to_string());
            extracted.bodies.push(body.to_owned());
        }
        if remainder.is_empty() {
            extracted.html.push_str("</");
            extracted.html.push_str(tag);
            extracted.html.push('>');
        }
        rest = remainder;
    }

    extracted.html.push_str(rest);
    extracted
}

/// Byte that may follow a tag name.
fn ends_tag_name(byte: Option<&u8>) -> bool {
    byte.is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
}

/// The raw-text element whose start tag begins `source`, if any.
fn text_body_tag_at(source: &str) -> Option<&'static str> {
    let bytes = source.as_bytes();
    RAW_TEXT_ELEMENTS
        .iter()
        .chain(ESCAPABLE_RAW_TEXT_ELEMENTS)
        .copied()
        .find(|tag| {
            bytes
                .get(1..=tag.len())
                .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
                && ends_tag_name(bytes.get(tag.len() + 1))
        })
}

/// Length of the start tag at the beginning of `source`, `>` included.
fn start_tag_len(source: &str) -> usize {
    let mut quote = None;
    for (i, byte) in source.bytes().enumerate() {
        match (quote, byte) {
            (None, b'"' | b'\'') => quote = Some(byte),
            (Some(q), _) if q == byte => quote = None,
            (None, b'>') => return i + 1,
            _ => {}
        }
    }
    source.len()
}

/// Offset of the `</tag` closing the body that starts `source`.
fn end_tag_offset(source: &str, tag: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    source.match_indices("</").map(|(i, _)| i).find(|&i| {
        bytes
            .get(i + 2..i + 2 + tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
            && ends_tag_name(bytes.get(i + 2 + tag.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_script_body() {
        let extracted = extract("<p>a</p><script>if (a < b) { go(); }</script><p>b</p>");

        assert_eq!(extracted.html, "<p>a</p><script>0</script><p>b</p>");
        assert_eq!(extracted.bodies, vec!["if (a < b) { go(); }".to_owned()]);
        assert_eq!(extracted.body("0"), Some("if (a < b) { go(); }"));
    }

    #[test]
    fn test_extract_keeps_start_tag_attributes() {
        let extracted = extract(
            r#"<script type="application/json" data-x="a>b" id="MetaData">{"k": "<v>"}</script>"#,
        );

        assert_eq!(
            extracted.html,
            r#"<script type="application/json" data-x="a>b" id="MetaData">0</script>"#
        );
        assert_eq!(extracted.bodies, vec![r#"{"k": "<v>"}"#.to_owned()]);
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let extracted = extract("<STYLE>a > b {}</Style >x");

        assert_eq!(extracted.html, "<STYLE>0</Style >x");
        assert_eq!(extracted.bodies, vec!["a > b {}".to_owned()]);
    }

    #[test]
    fn test_extract_ignores_other_end_tags_in_body() {
        let extracted = extract("<script>document.write('</div></scripts>')</script>");

        assert_eq!(
            extracted.bodies,
            vec!["document.write('</div></scripts>')".to_owned()]
        );
    }

    #[test]
    fn test_extract_leaves_lookalike_tags() {
        let html = "<scripts>x</scripts><titles>y</titles>";

        let extracted = extract(html);

        assert_eq!(extracted.html, html);
        assert!(extracted.bodies.is_empty());
    }

    #[test]
    fn test_extract_skips_comments() {
        let html = "<!-- <script> --><p>x</p>";

        assert_eq!(extract(html).html, html);
    }

    #[test]
    fn test_extract_empty_body_and_unclosed() {
        let extracted = extract("<script src=\"/a.js\"></script><style>p {}");

        assert_eq!(
            extracted.html,
            "<script src=\"/a.js\"></script><style>0</style>"
        );
        assert_eq!(extracted.bodies, vec!["p {}".to_owned()]);
    }

    #[test]
    fn test_text_body_classification() {
        assert!(is_raw_text_element("script"));
        assert!(!is_raw_text_element("title"));
        assert!(has_text_body("textarea"));
        assert!(!has_text_body("div"));
    }
}
