use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// Reasons a single logical literal is not highlighted.
///
/// These are local to one literal: the tagger records them and moves on to the next literal.
pub enum LiteralError {
    #[error("literal head is not a recognized string literal opening")]
    /// The classifier could not determine the literal kind.
    MalformedLiteralHead,

    #[error("malformed escape sequence at offset {offset}")]
    /// An unrecognized or truncated escape sequence.
    MalformedEscape {
        /// Offset of the introducing character, relative to the literal content.
        offset: usize,
    },

    #[error("literal has no content after trimming its delimiters")]
    /// Nothing is left once the delimiters are removed.
    EmptyAfterTrim,

    #[error("interpolation hole boundary could not be resolved")]
    /// The stitcher found an inconsistent hole; the current fragment was used as the edge.
    UnresolvableSplit,
}

#[derive(Debug, Error)]
/// Errors produced while loading highlighting configuration.
pub enum ConfigError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for `enabled_by_default`: {0}")]
    /// A configuration value could not be interpreted.
    InvalidEnabledValue(String),
}
