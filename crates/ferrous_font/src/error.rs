use thiserror::Error;

/// Errors produced while reading a font or building its atlas.
///
/// Packing a glyph set into a too-small atlas is *not* an error; the packer
/// reports it with `None` and the sizing loop simply retries. Only running
/// past the configured maximum edge surfaces as [`FontError::AtlasOverflow`].
#[derive(Debug, Error)]
pub enum FontError {
    #[error("i/o error while reading font data: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("font has no '{0}' table")]
    MissingTable(String),
    #[error("malformed font data: {0}")]
    Format(String),
    #[error("unsupported font feature: {0}")]
    Unsupported(String),
    #[error("glyph index {index} out of range (font has {count} glyphs)")]
    GlyphOutOfRange { index: u16, count: u16 },
    #[error("glyphs do not fit in an atlas of {max_edge}x{max_edge} pixels")]
    AtlasOverflow { max_edge: u32 },
    #[error("invalid pack settings: {0}")]
    Config(String),
}

impl FontError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        FontError::Format(msg.into())
    }

    /// Maps `UnexpectedEof` i/o errors to a descriptive variant naming the
    /// structure that was being read; everything else stays an `Io` error.
    pub(crate) fn eof(what: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FontError::UnexpectedEof(what)
            } else {
                FontError::Io(e)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FontError>;
