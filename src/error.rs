//! Central error types for the Fast Infoset decoder.
//!
//! Jeder Fehler gehört zu genau einer [`ErrorCategory`]. Die Kategorie entscheidet,
//! ob der Decoder nach dem Fehler zurückgesetzt wird (Malformed, Transport) oder
//! unverändert weiterbenutzt werden kann (Usage).

use core::fmt;
use std::borrow::Cow;
use std::io;

use crate::event::EventKind;

/// Grobe Einteilung der Fehler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The input violates the Fast Infoset format. Fatal for the current document.
    Malformed,
    /// Reading from the underlying source failed. Fatal for the current document.
    Transport,
    /// The caller used the cursor in a way incompatible with its position.
    Usage,
}

/// All errors surfaced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Generic structural violation with a human-readable reason.
    MalformedInput(Cow<'static, str>),
    /// The byte source ended in the middle of a production.
    UnexpectedEndOfInput,
    /// The underlying reader failed.
    Transport {
        /// Kind des ursprünglichen `io::Error`.
        kind: io::ErrorKind,
        /// Nachricht des ursprünglichen `io::Error`.
        message: String,
    },
    /// A tag byte that no production accepts in the current context.
    InvalidTag {
        /// Das gelesene Byte.
        byte: u8,
        /// Wo das Byte gelesen wurde (z.B. "element content").
        context: &'static str,
    },
    /// An index refers past the end of a vocabulary table.
    IndexOutOfRange {
        /// Name der Tabelle.
        table: &'static str,
        /// Der (0-basierte) Index.
        index: usize,
        /// Anzahl der Einträge zum Zeitpunkt des Zugriffs.
        len: usize,
    },
    /// The same qualified name occurs twice among the attributes of one element.
    DuplicateAttribute(String),
    /// The same prefix is declared twice on one element.
    DuplicateNamespaceDeclaration(String),
    /// A qualified name refers to a prefix that is not bound to its namespace.
    NameNotInScope(String),
    /// Encoding algorithm id 10..=31 or an algorithm that is not allowed here.
    ReservedAlgorithm(u32),
    /// A restricted alphabet id that is neither built in nor in the vocabulary.
    UnknownAlphabet(u32),
    /// Decoded characters are not valid UTF-8/UTF-16 or not XML characters.
    InvalidCharacter(Cow<'static, str>),
    /// An accessor was called while the cursor is on an incompatible event.
    IllegalCursorState {
        /// Was der Aufrufer erwartet hat.
        expected: Cow<'static, str>,
        /// Aktuelles Event.
        found: EventKind,
    },
    /// `advance()` was called after END_DOCUMENT without `reset()`.
    NoMoreEvents,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            Self::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            Self::Transport { kind, message } => write!(f, "transport failure ({kind:?}): {message}"),
            Self::InvalidTag { byte, context } => {
                write!(f, "malformed input: illegal byte 0x{byte:02X} in {context}")
            }
            Self::IndexOutOfRange { table, index, len } => {
                write!(f, "malformed input: {table} index {index} out of range (table has {len} entries)")
            }
            Self::DuplicateAttribute(name) => write!(f, "malformed input: duplicate attribute '{name}'"),
            Self::DuplicateNamespaceDeclaration(prefix) => {
                if prefix.is_empty() {
                    write!(f, "malformed input: default namespace declared twice on one element")
                } else {
                    write!(f, "malformed input: prefix '{prefix}' declared twice on one element")
                }
            }
            Self::NameNotInScope(name) => {
                write!(f, "malformed input: qualified name '{name}' not in scope")
            }
            Self::ReservedAlgorithm(id) => {
                write!(f, "malformed input: encoding algorithm {id} is reserved or not permitted here")
            }
            Self::UnknownAlphabet(id) => write!(f, "malformed input: unknown restricted alphabet {id}"),
            Self::InvalidCharacter(msg) => write!(f, "malformed input: invalid character data: {msg}"),
            Self::IllegalCursorState { expected, found } => {
                write!(f, "illegal cursor state: expected {expected}, cursor is on {found}")
            }
            Self::NoMoreEvents => write!(f, "illegal cursor state: no more events (END_DOCUMENT reached)"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Self::UnexpectedEndOfInput;
        }
        Self::Transport {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl Error {
    /// Erstellt einen `MalformedInput` Fehler.
    pub fn malformed(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Erstellt einen `IllegalCursorState` Fehler.
    pub fn illegal_state(expected: impl Into<Cow<'static, str>>, found: EventKind) -> Self {
        Self::IllegalCursorState {
            expected: expected.into(),
            found,
        }
    }

    /// Ordnet den Fehler einer Kategorie zu.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::IllegalCursorState { .. } | Self::NoMoreEvents => ErrorCategory::Usage,
            _ => ErrorCategory::Malformed,
        }
    }

    /// `true` wenn der Fehler das aktuelle Dokument unbrauchbar macht.
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Usage
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
