use thiserror::Error;

/// Errors surfaced to callers of the palette store.
///
/// Storage failures never appear here; they are logged and absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// The requested palette id is not in the catalog.
    #[error("unknown palette id `{0}`")]
    InvalidPaletteId(String),
}
