//! # Snapshot Testing Support
//!
//! Utilities for testing the parser via tree dumps and invariant checks.
//!
//! ## Modules
//!
//! - **`dump`**: renders a tree to an indented, stable text form, one node
//!   per line with its kind and key payload, for `pretty_assertions` and
//!   `insta` comparisons
//! - **`invariants`**: structural checks (parent and sibling links agree,
//!   every child is one its parent may contain, no adjacent text siblings)
//!
//! Parsing behaviour is pinned by these dumps rather than by a separate
//! grammar: a test states the input and the exact tree it must produce.

pub mod dump;
pub mod invariants;

pub use dump::dump;
pub use invariants::check as invariants;
