//! # Inline Kinds
//!
//! One handler per inline construct that is decided the moment its first
//! byte is seen. Each type owns the bytes that trigger it.
//!
//! ## Types
//!
//! - **`CodeSpan`**: `` TICK = b'`' `` - raw zone, nothing inside is parsed
//! - **`Escape`**: `BACKSLASH = b'\\'` - escaped punctuation, hard breaks
//! - **`Entity`**: `AMPERSAND = b'&'` - named and numeric references
//! - **`PointyBrace`**: `OPEN = b'<'` - autolinks and raw HTML
//! - **`LineBreak`**: line ends inside a paragraph
//! - **`SmartPunct`**: dashes and ellipses under `Options::SMART`; also
//!   holds the curly quote glyphs used by emphasis processing
//!
//! Brackets and delimiter runs are not here: they cannot be decided locally
//! and live on the subject's stacks instead.

pub mod code_span;
pub mod entity;
pub mod escape;
pub mod line_break;
pub mod pointy_brace;
pub mod smart;

pub use code_span::CodeSpan;
pub use entity::Entity;
pub use escape::Escape;
pub use line_break::LineBreak;
pub use pointy_brace::PointyBrace;
pub use smart::SmartPunct;
