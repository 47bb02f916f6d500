//! Error kinds (§7). Only `InvalidScore` is fatal; everything else is
//! recovered locally by the caller and logged through `logger`.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid score: {0}")]
    InvalidScore(String),

    #[error("palette exhausted, falling back to the transition-text slot")]
    PaletteExhausted,

    #[error("no glyph for character {0:?}, substituting space")]
    GlyphMissing(char),

    #[error("reference CD+G prelude unreadable, synthesizing default prelude: {0}")]
    ReferencePreludeUnreadable(String),

    #[error("padding would exceed the 1.1x guard limit, further padding suppressed")]
    GuardLimitReached,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
