use std::{fmt, ops::Range, rc::Rc};

/// A slice of text carried by a node.
///
/// `View` shares a detached block buffer with every other node sliced from
/// it; cloning a view never copies bytes. `Owned` is an independent
/// allocation.
#[derive(Clone)]
pub enum Chunk {
    View { source: Rc<[u8]>, range: Range<usize> },
    Owned(Box<[u8]>),
}

impl Chunk {
    pub fn empty() -> Self {
        Self::Owned(Box::default())
    }

    /// Zero-copy view of `source[range]`.
    pub fn view(source: &Rc<[u8]>, range: Range<usize>) -> Self {
        debug_assert!(range.end <= source.len());
        Self::View {
            source: Rc::clone(source),
            range,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::View { source, range } => &source[range.clone()],
            Self::Owned(bytes) => bytes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Turns a view into an owned copy; owned chunks are left alone.
    pub fn materialize(&mut self) {
        if let Self::View { .. } = self {
            *self = Self::Owned(self.as_bytes().into());
        }
    }

    /// Narrows the chunk to `range` (relative to the current contents).
    pub fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Self::View { source, range: r } => Self::View {
                source: Rc::clone(source),
                range: r.start + range.start..r.start + range.end,
            },
            Self::Owned(bytes) => Self::Owned(bytes[range].into()),
        }
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes.into_boxed_slice())
    }
}

impl From<&[u8]> for Chunk {
    fn from(bytes: &[u8]) -> Self {
        Self::Owned(bytes.into())
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Chunk {}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}
