//! Record parsing and chunk-boundary reconciliation for export streams.
//!
//! An export arrives as ordered text chunks whose boundaries fall anywhere,
//! including mid-field inside a quoted value. [`parser`] turns text into
//! cells; [`Reconciler`] stitches rows split across chunk boundaries so that
//! every logical record is produced exactly once.

pub mod parser;
mod reconcile;

pub use reconcile::Reconciler;

/// An ordered, fixed-arity sequence of cell values.
pub type Row = Vec<String>;

/// One ordered segment of an export's byte stream.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Zero-based position among `total` chunks.
    pub ordinal: usize,
    /// Total chunk count for the export.
    pub total: usize,
    /// Raw UTF-8 payload.
    pub text: String,
}

impl Chunk {
    pub fn new(ordinal: usize, total: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            total,
            text: text.into(),
        }
    }
}
