//! Error types for markup parsing.

/// Error returned when template markup cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Markup is not well-formed enough to tokenize.
    #[error("markup parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}
