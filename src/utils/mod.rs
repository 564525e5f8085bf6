//! # Utilities
//!
//! - `text` - letter detection, whitespace collapsing, word boundaries

pub mod text;

// Re-export commonly used items for convenience
pub use text::{
    capitalize_first, collapse_whitespace, has_letter, has_spacing_run, is_bounded_match,
    is_word_char, letters_only, normalize_nbsp, split_outer_whitespace, static_regex, NBSP,
};
