use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while walking a color glyph's paint graph.
///
/// Any of these aborts the glyph being drawn; whatever was already issued
/// to the canvas stays there.
#[derive(Error, Debug)]
pub enum PaintError {
    #[error("a fill requires an enclosing glyph path")]
    NoActivePath,
    #[error("layer index {index} is out of bounds for a layer list of {len}")]
    LayerOutOfBounds { index: usize, len: usize },
    #[error("no COLRv1 base glyph named '{0}'")]
    MissingColrGlyph(SmolStr),
    #[error("palette {0} does not exist")]
    MissingPalette(usize),
    #[error("color index {index} is out of bounds for palette {palette} of {len} colors")]
    ColorIndexOutOfBounds {
        index: u16,
        palette: usize,
        len: usize,
    },
    #[error("variation index 0x{0:08x} is out of bounds for the variation store")]
    BadVariationIndex(u32),
    #[error("variation index 0x{0:08x} cannot be resolved without a variation store")]
    MissingVariationStore(u32),
    #[error("paint nesting exceeded {0} levels")]
    PaintTooDeep(usize),
}

/// Errors encountered while rendering a glyph run to an output surface.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Paint(#[from] PaintError),
    #[error("the glyph run produced no visible bounds")]
    NothingToRender,
    #[error("the combination of bounds and font size was too small to produce anything")]
    TooSmall,
    #[error("error encoding bitmap to png: {0}")]
    PngEncodingError(#[from] png::EncodingError),
}
