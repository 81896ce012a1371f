#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IoError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("start offset {offset} is past the end of a {len}-byte array")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("malformed modified UTF-8 at byte {0}")]
    MalformedUtf(usize),
}
