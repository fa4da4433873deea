//! Font pipeline for FerrousEngine: TrueType outlines in, MTSDF atlas and
//! binary font asset out.
//!
//! ```text
//! TrueTypeFont ─► Glyph ─► Contour ─► coloured edges ─► distance field
//!                                                         │
//!                        GuillotinePacker positions ─► FontAtlas ─► FontAsset
//! ```

pub mod asset;
pub mod atlas;
pub mod binary_reader;
pub mod config;
pub mod contour;
pub mod error;
pub mod font;
pub mod msdf;
pub mod outline;
pub mod packer;
pub mod tables;

// re-export the types most callers need
pub use asset::FontAsset;
pub use atlas::{AtlasGlyph, FontAtlas};
pub use config::PackSettings;
pub use contour::{try_build_contours, Contour, EdgeSegment};
pub use error::{FontError, Result};
pub use font::{LineMetrics, TrueTypeFont};
pub use outline::{Bounds, Glyph, GlyphParser, Point};
pub use packer::{pack_smallest, GuillotinePacker, PackItem, PackedPosition};
