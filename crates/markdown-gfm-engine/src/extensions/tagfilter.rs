use super::SyntaxExtension;

/// Marks raw HTML tags that renderers must escape instead of passing
/// through.
pub struct TagFilter;

impl TagFilter {
    pub const DISALLOWED: [&'static str; 9] = [
        "title",
        "textarea",
        "style",
        "xmp",
        "iframe",
        "noembed",
        "noframes",
        "script",
        "plaintext",
    ];

    /// Whether `tag` opens or closes the element `name`: `<name` or
    /// `</name` (ASCII case-insensitive) followed by whitespace, `>` or `/>`.
    fn is_tag(tag: &[u8], name: &str) -> bool {
        if tag.len() < 3 || tag[0] != b'<' {
            return false;
        }
        let start = if tag[1] == b'/' { 2 } else { 1 };
        let end = start + name.len();
        let Some(found) = tag.get(start..end) else {
            return false;
        };
        if !found.eq_ignore_ascii_case(name.as_bytes()) {
            return false;
        }
        match tag.get(end) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == 0x0b => true,
            Some(b'/') => tag.get(end + 1) == Some(&b'>'),
            _ => false,
        }
    }
}

impl SyntaxExtension for TagFilter {
    fn name(&self) -> &str {
        "tagfilter"
    }

    fn filter_html_tag(&self, tag: &[u8]) -> bool {
        !Self::DISALLOWED.iter().any(|name| Self::is_tag(tag, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extensions::{Extension, RenderFormat, render_for_test},
        options::Options,
        parsing::parse_document_with,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<script>", false)]
    #[case("</SCRIPT>", false)]
    #[case("<title x=1>", false)]
    #[case("<xmp/>", false)]
    #[case("<style\n>", false)]
    #[case("<scripts>", true)]
    #[case("<script", true)]
    #[case("<em>", true)]
    #[case("<iframe/x>", true)]
    #[case("script>", true)]
    fn disallowed_tags(#[case] tag: &str, #[case] allowed: bool) {
        assert_eq!(TagFilter.filter_html_tag(tag.as_bytes()), allowed, "{tag}");
    }

    #[test]
    fn renderer_escapes_filtered_inline_html() {
        let doc = parse_document_with(
            b"a <script>x</script> <b>y</b>",
            Options::empty(),
            vec![Extension::TagFilter],
        );
        assert_eq!(
            render_for_test(&doc, RenderFormat::Html, Options::empty(), &[Extension::TagFilter]),
            "<p>a &lt;script>x&lt;/script> <b>y</b></p>\n"
        );
    }

    #[test]
    fn parsing_is_unchanged() {
        let input = b"<title>t</title>\n\n<textarea>\n";
        let with = parse_document_with(input, Options::empty(), vec![Extension::TagFilter]);
        let without = parse_document_with(input, Options::empty(), Vec::new());
        assert_eq!(with.dump(), without.dump());
    }
}
