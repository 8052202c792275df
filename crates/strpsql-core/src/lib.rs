#![warn(missing_docs)]
//! `strpsql-core` - highlighting of PostgreSQL embedded in C# string literals.
//!
//! A highlighting request takes an immutable [`TextSnapshot`], the host's lexical tags for it
//! ([`HostTags`]) and a requested range, and returns [`SqlTag`]s in snapshot coordinates:
//!
//! 1. string fragments are stitched into logical literals across interpolation holes
//!    ([`stitch`]);
//! 2. directive comments decide which literals are enabled ([`regions`]);
//! 3. the literal head is classified and delimiters are trimmed ([`literal`]);
//! 4. content is unescaped into canonical text plus an offset table ([`escape`]);
//! 5. the canonical text is lexed by a [`SqlLexer`] and tokens are projected back, split at
//!    escape sequences ([`remap`]).
//!
//! [`StringSqlTagger`] runs the whole pipeline.

mod error;

pub mod config;
pub mod escape;
pub mod lexer;
pub mod literal;
pub mod range;
pub mod regions;
pub mod remap;
pub mod snapshot;
pub mod stitch;
pub mod tagger;

pub use config::HighlightConfig;
pub use error::{ConfigError, LiteralError};
pub use escape::{Correction, Unescaped, unescape};
pub use lexer::{SqlLexer, SqlToken, SqlTokenCategory};
pub use literal::{DelimiterStyle, LiteralClassifier, LiteralHead, LiteralKind, PrefixMarker};
pub use range::{NormalizedRanges, SourceRange};
pub use regions::{Directive, EnabledRegions};
pub use remap::{SqlTag, remap_tokens};
pub use snapshot::{HostTag, HostTagKind, HostTags, TextSnapshot};
pub use stitch::{Stitched, collect_literals, stitch_literal};
pub use tagger::{LogicalLiteral, StringSqlTagger, TagReport};
