//! Cursor event model.
//!
//! Ein [`EventKind`] beschreibt die Position des Cursors. Die Daten des aktuellen
//! Events liegen im Decoder und werden über die Accessoren von
//! [`Cursor`](crate::Cursor) gelesen. Die Content-Structs in diesem Modul sind die
//! Informationen, die länger leben als ein Event (z.B. Notations aus dem
//! Document Information Item).

use core::fmt;
use std::rc::Rc;

/// The kinds of events a cursor can be positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartDocument,
    EndDocument,
    StartElement,
    EndElement,
    Characters,
    /// Character content encoded with the built-in CDATA algorithm.
    Cdata,
    Comment,
    ProcessingInstruction,
    /// Unexpanded entity reference (never resolved by the decoder).
    EntityReference,
    /// Document type declaration (identifiers only).
    Dtd,
}

impl EventKind {
    /// StAX-style upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartDocument => "START_DOCUMENT",
            Self::EndDocument => "END_DOCUMENT",
            Self::StartElement => "START_ELEMENT",
            Self::EndElement => "END_ELEMENT",
            Self::Characters => "CHARACTERS",
            Self::Cdata => "CDATA",
            Self::Comment => "COMMENT",
            Self::ProcessingInstruction => "PROCESSING_INSTRUCTION",
            Self::EntityReference => "ENTITY_REFERENCE",
            Self::Dtd => "DTD",
        }
    }

    /// Events that carry character data via `text()`.
    pub fn has_text(self) -> bool {
        matches!(self, Self::Characters | Self::Cdata | Self::Comment)
    }

    /// Events that carry a qualified name.
    pub fn has_name(self) -> bool {
        matches!(self, Self::StartElement | Self::EndElement)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing instruction (target + data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub target: Rc<str>,
    pub data: Rc<str>,
}

/// Notation information item from the document header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notation {
    pub name: Rc<str>,
    pub system_id: Option<Rc<str>>,
    pub public_id: Option<Rc<str>>,
}

/// Unparsed entity information item from the document header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsedEntity {
    pub name: Rc<str>,
    pub system_id: Rc<str>,
    pub public_id: Option<Rc<str>>,
    pub notation_name: Rc<str>,
}

/// Document type declaration. Only identifiers and contained PIs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTypeDeclaration {
    pub system_id: Option<Rc<str>>,
    pub public_id: Option<Rc<str>>,
    pub instructions: Vec<ProcessingInstruction>,
}

/// Unexpanded entity reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    pub name: Rc<str>,
    pub system_id: Option<Rc<str>>,
    pub public_id: Option<Rc<str>>,
}
