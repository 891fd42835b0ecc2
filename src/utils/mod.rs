//! Utility functions and helpers for caplink
//!
//! This module provides URI template handling and small text normalization
//! helpers used on the generation path.

pub mod text;
pub mod uri;

// Re-export commonly used utilities
pub use text::strip_code_fence;
pub use uri::{extract_template_params, template_covers, uri_scheme, validate_uri};
