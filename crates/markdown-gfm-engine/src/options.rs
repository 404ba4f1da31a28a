use bitflags::bitflags;

bitflags! {
    /// Parse options.
    ///
    /// Bits that only change how a tree is written out (`SOURCEPOS`,
    /// `HARDBREAKS`, `NOBREAKS`, `UNSAFE`, `GITHUB_PRE_LANG`,
    /// `TABLE_PREFER_STYLE_ATTRIBUTES`) are carried for renderers and the
    /// extension render hooks; the parser ignores them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Options: u32 {
        /// Record source positions on rendered elements.
        const SOURCEPOS = 1 << 1;
        /// Render soft breaks as hard breaks.
        const HARDBREAKS = 1 << 2;
        /// Render soft breaks as spaces.
        const NOBREAKS = 1 << 4;
        /// Replace invalid UTF-8 with U+FFFD while reading lines.
        const VALIDATE_UTF8 = 1 << 9;
        /// Curly quotes, en/em dashes and ellipses.
        const SMART = 1 << 10;
        const GITHUB_PRE_LANG = 1 << 11;
        /// Accept more tag shapes as raw HTML.
        const LIBERAL_HTML_TAG = 1 << 12;
        /// `[^label]` references and `[^label]:` definitions.
        const FOOTNOTES = 1 << 13;
        /// Only `~~` delimits strikethrough.
        const STRIKETHROUGH_DOUBLE_TILDE = 1 << 14;
        const TABLE_PREFER_STYLE_ATTRIBUTES = 1 << 15;
        /// Keep the whole info string after the first word.
        const FULL_INFO_STRING = 1 << 16;
        /// Let renderers emit raw HTML and dangerous URLs.
        const UNSAFE = 1 << 17;
    }
}
