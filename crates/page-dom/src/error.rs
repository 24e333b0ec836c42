use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    /// The node is not part of the tree, or no longer is
    #[error("node is not attached to the document")]
    Detached,

    /// Offsets fall outside the text node
    #[error("range {start}..{end} is outside a text of {len} characters")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    /// The operation would produce a tree the content model rejects
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),

    /// Operation needs a different node type
    #[error("expected {expected} node")]
    WrongNodeType { expected: &'static str },

    /// Error raised by the browser DOM
    #[error("platform DOM error: {0}")]
    Platform(String),
}
