//! shapeid-export: Pure format serializers (sans-IO)
//!
//! Converts frame detections into output formats. Currently supports an
//! annotated SVG overlay.

pub mod svg;

pub use svg::{SvgMetadata, build_path_data, to_svg};
