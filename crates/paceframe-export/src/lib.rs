//! paceframe-export: Pure format serializers (sans-IO)
//!
//! Converts finished poster canvases into output bytes. Currently
//! supports PNG. Future formats: JPEG, PDF print sheets.

pub mod png;

pub use png::{ExportError, to_png};
