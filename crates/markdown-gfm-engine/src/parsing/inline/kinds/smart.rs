use crate::{buffer::Buffer, node::NodeId, parsing::inline::Subject};

/// Typographic replacements made under `Options::SMART`.
pub struct SmartPunct;

impl SmartPunct {
    pub const LEFT_SINGLE_QUOTE: &'static str = "\u{2018}";
    pub const RIGHT_SINGLE_QUOTE: &'static str = "\u{2019}";
    pub const LEFT_DOUBLE_QUOTE: &'static str = "\u{201c}";
    pub const RIGHT_DOUBLE_QUOTE: &'static str = "\u{201d}";
    pub const EM_DASH: &'static str = "\u{2014}";
    pub const EN_DASH: &'static str = "\u{2013}";
    pub const ELLIPSIS: &'static str = "\u{2026}";

    /// A run of hyphens. Smart runs become em and en dashes, preferring
    /// all-em, then all-en, then ems followed by one or two ens.
    pub fn hyphen(subj: &mut Subject<'_>, smart: bool) -> NodeId {
        let start = subj.pos;
        subj.advance();
        if !smart || subj.peek() != b'-' {
            return subj.make_text(start, start, "-".into());
        }
        while subj.peek() == b'-' {
            subj.advance();
        }
        let (em, en) = Self::dashes(subj.pos - start);
        let mut buf = Buffer::with_capacity((em + en) * 3);
        for _ in 0..em {
            buf.puts(Self::EM_DASH);
        }
        for _ in 0..en {
            buf.puts(Self::EN_DASH);
        }
        subj.make_text(start, subj.pos - 1, buf.detach())
    }

    /// Em and en dash counts for a run of `n >= 2` hyphens.
    fn dashes(n: usize) -> (usize, usize) {
        if n % 3 == 0 {
            (n / 3, 0)
        } else if n % 2 == 0 {
            (0, n / 2)
        } else if n % 3 == 2 {
            ((n - 2) / 3, 1)
        } else {
            ((n - 4) / 3, 2)
        }
    }

    /// `...` becomes an ellipsis under smart punctuation.
    pub fn period(subj: &mut Subject<'_>, smart: bool) -> NodeId {
        let start = subj.pos;
        subj.advance();
        if !smart || subj.peek() != b'.' {
            return subj.make_text(start, start, ".".into());
        }
        subj.advance();
        if subj.peek() == b'.' {
            subj.advance();
            return subj.make_text(start, start + 2, Self::ELLIPSIS.into());
        }
        subj.make_text(start, start + 1, "..".into())
    }
}
