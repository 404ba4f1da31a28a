//! # Syntax Extensions
//!
//! Pluggable syntaxes that hook into both parsing phases without touching the
//! base grammar.
//!
//! ## Modules
//!
//! - **`table`**: pipe tables (`table`)
//! - **`strikethrough`**: `~text~` / `~~text~~` (`strikethrough`)
//! - **`autolink`**: bare `www.`, `scheme://` and e-mail links (`autolink`)
//! - **`tagfilter`**: disallowed raw HTML tags (`tagfilter`)
//! - **`tasklist`**: `- [ ]` / `- [x]` list items (`tasklist`)
//!
//! ## Design
//!
//! Every hook lives on the [`SyntaxExtension`] trait with a no-op default, so
//! an extension implements only what it needs. Built-ins are variants of the
//! closed [`Extension`] enum; anything registered from outside the crate rides
//! in [`Extension::Custom`].
//!
//! The registry is process-wide and holds factories. Built-ins are installed
//! exactly once on first access. A parser attaches its own ordered list of
//! extensions; the inline trigger characters derived from that list belong
//! to the parse, never to global state.

pub mod autolink;
pub mod strikethrough;
pub mod table;
pub mod tagfilter;
pub mod tasklist;

use std::{
    fmt,
    rc::Rc,
    sync::{Arc, LazyLock, Mutex, PoisonError},
};

use crate::{
    node::{Arena, Node, NodeId, NodeKind},
    options::Options,
    parsing::{
        Parser,
        inline::{DelimId, Subject},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    #[error("unknown extension: {0}")]
    Unknown(String),
}

/// Output formats a renderer may ask an extension to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderFormat {
    Html,
    CommonMark,
    Plaintext,
    Latex,
    Man,
    Xml,
}

/// Hook points an extension may implement.
///
/// Block hooks receive the current line with its trailing newline; inline
/// hooks receive the subject of the block being parsed. Every default is a
/// no-op that leaves the base grammar in charge.
pub trait SyntaxExtension {
    fn name(&self) -> &str;

    /// Bytes that stop plain-text scanning so that [`match_inline`] sees them.
    ///
    /// [`match_inline`]: SyntaxExtension::match_inline
    fn special_chars(&self) -> &[u8] {
        &[]
    }

    /// Whether the special characters are emphasis-like and should be looked
    /// through when classifying `*` and `_` runs.
    fn emphasis(&self) -> bool {
        false
    }

    /// Tries to open a block at the parser's current position. Returns the
    /// new container, or `None` to let the next extension try.
    fn try_open_block(
        &self,
        _parser: &mut Parser,
        _indented: bool,
        _container: NodeId,
        _line: &[u8],
    ) -> Option<NodeId> {
        None
    }

    /// Whether an open block owned by this extension continues on `line`.
    fn last_block_matches(&self, _parser: &mut Parser, _line: &[u8], _container: NodeId) -> bool {
        false
    }

    /// Tries to parse an inline starting at the subject's position. The
    /// returned node is appended to `parent`.
    fn match_inline(&self, _subject: &mut Subject<'_>, _parent: NodeId, _c: u8) -> Option<NodeId> {
        None
    }

    /// Resolves a matched delimiter pair whose character this extension owns.
    /// Returns the next closer to examine.
    fn insert_inline_from_delim(
        &self,
        _subject: &mut Subject<'_>,
        _opener: DelimId,
        _closer: DelimId,
    ) -> Option<DelimId> {
        None
    }

    /// Overrides the containment rule for a node this extension owns.
    fn can_contain(&self, _node: &Node, _child: NodeKind) -> Option<bool> {
        None
    }

    /// Overrides whether an owned node's content is inline-parsed.
    fn contains_inlines(&self, _node: &Node) -> Option<bool> {
        None
    }

    fn type_string(&self, _node: &Node) -> Option<&'static str> {
        None
    }

    /// Returns `false` to have renderers escape a raw HTML tag.
    fn filter_html_tag(&self, _tag: &[u8]) -> bool {
        true
    }

    /// Runs over the finished tree.
    fn postprocess(&self, _arena: &mut Arena, _root: NodeId, _options: Options) {}

    /// Renders an owned node. Returns `false` to fall back to the renderer.
    fn render(
        &self,
        _format: RenderFormat,
        _arena: &Arena,
        _node: NodeId,
        _entering: bool,
        _options: Options,
        _out: &mut String,
    ) -> bool {
        false
    }

    /// Whether `c` must be backslash-escaped when writing `node` as CommonMark.
    fn commonmark_escape(&self, _node: &Node, _c: u8) -> bool {
        false
    }
}

/// An attachable extension: one of the built-ins or an external one.
#[derive(Clone)]
pub enum Extension {
    Table,
    Strikethrough,
    Autolink,
    TagFilter,
    TaskList,
    Custom(Rc<dyn SyntaxExtension>),
}

impl Extension {
    /// Looks `name` up in the registry.
    pub fn from_name(name: &str) -> Result<Self, ExtensionError> {
        find_extension(name).ok_or_else(|| ExtensionError::Unknown(name.to_string()))
    }

    /// Whether two handles refer to the same extension.
    pub fn same(&self, other: &Extension) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    fn hooks(&self) -> &dyn SyntaxExtension {
        match self {
            Self::Table => &table::Table,
            Self::Strikethrough => &strikethrough::Strikethrough,
            Self::Autolink => &autolink::Autolink,
            Self::TagFilter => &tagfilter::TagFilter,
            Self::TaskList => &tasklist::TaskList,
            Self::Custom(ext) => ext.as_ref(),
        }
    }
}

impl SyntaxExtension for Extension {
    fn name(&self) -> &str {
        self.hooks().name()
    }

    fn special_chars(&self) -> &[u8] {
        self.hooks().special_chars()
    }

    fn emphasis(&self) -> bool {
        self.hooks().emphasis()
    }

    fn try_open_block(
        &self,
        parser: &mut Parser,
        indented: bool,
        container: NodeId,
        line: &[u8],
    ) -> Option<NodeId> {
        self.hooks().try_open_block(parser, indented, container, line)
    }

    fn last_block_matches(&self, parser: &mut Parser, line: &[u8], container: NodeId) -> bool {
        self.hooks().last_block_matches(parser, line, container)
    }

    fn match_inline(&self, subject: &mut Subject<'_>, parent: NodeId, c: u8) -> Option<NodeId> {
        self.hooks().match_inline(subject, parent, c)
    }

    fn insert_inline_from_delim(
        &self,
        subject: &mut Subject<'_>,
        opener: DelimId,
        closer: DelimId,
    ) -> Option<DelimId> {
        self.hooks().insert_inline_from_delim(subject, opener, closer)
    }

    fn can_contain(&self, node: &Node, child: NodeKind) -> Option<bool> {
        self.hooks().can_contain(node, child)
    }

    fn contains_inlines(&self, node: &Node) -> Option<bool> {
        self.hooks().contains_inlines(node)
    }

    fn type_string(&self, node: &Node) -> Option<&'static str> {
        self.hooks().type_string(node)
    }

    fn filter_html_tag(&self, tag: &[u8]) -> bool {
        self.hooks().filter_html_tag(tag)
    }

    fn postprocess(&self, arena: &mut Arena, root: NodeId, options: Options) {
        self.hooks().postprocess(arena, root, options)
    }

    fn render(
        &self,
        format: RenderFormat,
        arena: &Arena,
        node: NodeId,
        entering: bool,
        options: Options,
        out: &mut String,
    ) -> bool {
        self.hooks()
            .render(format, arena, node, entering, options, out)
    }

    fn commonmark_escape(&self, node: &Node, c: u8) -> bool {
        self.hooks().commonmark_escape(node, c)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension({})", self.name())
    }
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

/// Builds a fresh extension handle each time one is attached.
pub type Factory = Arc<dyn Fn() -> Extension + Send + Sync>;

struct Registered {
    name: String,
    factory: Factory,
}

static REGISTRY: LazyLock<Mutex<Vec<Registered>>> = LazyLock::new(|| {
    let builtins: [(&str, fn() -> Extension); 5] = [
        ("table", || Extension::Table),
        ("strikethrough", || Extension::Strikethrough),
        ("autolink", || Extension::Autolink),
        ("tagfilter", || Extension::TagFilter),
        ("tasklist", || Extension::TaskList),
    ];
    log::debug!("registering {} core extensions", builtins.len());
    Mutex::new(
        builtins
            .into_iter()
            .map(|(name, f)| Registered {
                name: name.to_string(),
                factory: Arc::new(f),
            })
            .collect(),
    )
});

/// Adds an external extension factory under `name`. A later registration
/// with the same name shadows earlier ones.
pub fn register_extension(name: &str, factory: Factory) {
    let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    registry.push(Registered {
        name: name.to_string(),
        factory,
    });
}

pub fn find_extension(name: &str) -> Option<Extension> {
    let registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    registry
        .iter()
        .rev()
        .find(|r| r.name == name)
        .map(|r| (r.factory)())
}

/// Names of every registered extension, in registration order.
pub fn list_extensions() -> Vec<String> {
    let registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    registry.iter().map(|r| r.name.clone()).collect()
}

/// The five GitHub-flavored extensions in their canonical attachment order.
pub fn core_extensions() -> Vec<Extension> {
    vec![
        Extension::Table,
        Extension::Strikethrough,
        Extension::Autolink,
        Extension::TagFilter,
        Extension::TaskList,
    ]
}

/// Whether renderers should emit the raw HTML `tag` unescaped.
pub fn html_tag_allowed(extensions: &[Extension], tag: &[u8]) -> bool {
    extensions.iter().all(|ext| ext.filter_html_tag(tag))
}

/// Newline unless the output is empty or already ends a line.
pub(crate) fn html_cr(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// ` data-sourcepos="l:c-l:c"` when source positions are requested.
pub(crate) fn html_sourcepos(arena: &Arena, node: NodeId, options: Options, out: &mut String) {
    if options.contains(Options::SOURCEPOS) {
        let n = &arena[node];
        out.push_str(&format!(
            " data-sourcepos=\"{}:{}-{}:{}\"",
            n.start_line, n.start_column, n.end_line, n.end_column
        ));
    }
}

/// Minimal HTML writer over the base node kinds that hands extension-owned
/// nodes to their render hook. Raw HTML goes through `filters`.
#[cfg(test)]
pub(crate) fn render_for_test(
    doc: &crate::parsing::ParsedDoc,
    format: RenderFormat,
    options: Options,
    filters: &[Extension],
) -> String {
    use crate::node::{EventType, NodeValue};

    let arena = &doc.arena;
    let text = |bytes: &[u8]| html_escape::encode_text(&String::from_utf8_lossy(bytes)).into_owned();
    let mut out = String::new();
    for (event, node) in doc.iter() {
        let entering = event == EventType::Enter;
        if let Some(ext) = arena.extension(node) {
            if ext.render(format, arena, node, entering, options, &mut out) {
                continue;
            }
        }
        match (&arena[node].value, entering) {
            (NodeValue::Paragraph, true) => {
                html_cr(&mut out);
                out.push_str("<p>");
            }
            (NodeValue::Paragraph, false) => out.push_str("</p>\n"),
            (NodeValue::List(_), true) => {
                html_cr(&mut out);
                out.push_str("<ul>\n");
            }
            (NodeValue::List(_), false) => out.push_str("</ul>\n"),
            (NodeValue::Item(_), true) => out.push_str("<li>"),
            (NodeValue::Item(_), false) => out.push_str("</li>\n"),
            (NodeValue::Emph, true) => out.push_str("<em>"),
            (NodeValue::Emph, false) => out.push_str("</em>"),
            (NodeValue::Link(link), true) => {
                out.push_str(&format!("<a href=\"{}\">", link.url.to_string_lossy()));
            }
            (NodeValue::Link(_), false) => out.push_str("</a>"),
            (NodeValue::Text(lit), _) => out.push_str(&text(lit.as_bytes())),
            (NodeValue::Code(lit), _) => {
                out.push_str(&format!("<code>{}</code>", text(lit.as_bytes())));
            }
            (NodeValue::SoftBreak, _) => out.push('\n'),
            (NodeValue::HtmlInline(lit), _) => {
                let raw = lit.to_string_lossy();
                if html_tag_allowed(filters, lit.as_bytes()) {
                    out.push_str(&raw);
                } else {
                    out.push_str("&lt;");
                    out.push_str(raw.get(1..).unwrap_or_default());
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Shout;

    impl SyntaxExtension for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn special_chars(&self) -> &[u8] {
            b"!"
        }
    }

    #[test]
    fn builtins_are_registered_once() {
        let names = list_extensions();
        for builtin in ["table", "strikethrough", "autolink", "tagfilter", "tasklist"] {
            assert_eq!(names.iter().filter(|n| *n == builtin).count(), 1, "{builtin}");
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            Extension::from_name("nope").unwrap_err(),
            ExtensionError::Unknown("nope".into())
        );
    }

    #[test]
    fn custom_extensions_dispatch_dynamically() {
        register_extension("shout", Arc::new(|| Extension::Custom(Rc::new(Shout))));
        let ext = Extension::from_name("shout").unwrap();
        assert_eq!(ext.name(), "shout");
        assert_eq!(ext.special_chars(), b"!");
        assert!(ext.filter_html_tag(b"<b>"));
    }

    #[test]
    fn handles_compare_by_identity() {
        assert_eq!(Extension::Table, Extension::Table);
        assert_ne!(Extension::Table, Extension::TaskList);
        let a = Extension::Custom(Rc::new(Shout));
        let b = Extension::Custom(Rc::new(Shout));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn tagfilter_vetoes_through_the_list() {
        let exts = core_extensions();
        assert!(!html_tag_allowed(&exts, b"<script>"));
        assert!(html_tag_allowed(&exts, b"<em>"));
        assert!(html_tag_allowed(&[], b"<script>"));
    }
}
