//! Small pure helpers shared across the crate.

mod text;

pub use text::{html_to_markup, html_to_text, truncate_chars};
