//! finset – Fast Infoset (ITU-T X.891) streaming pull decoder
//!
//! Der Decoder liest ein Fast-Infoset-Dokument Item für Item und stellt es
//! über den StAX-artigen [`Cursor`] bereit. Es wird nie ein Baum aufgebaut.
//!
//! # Beispiel
//!
//! ```
//! use finset::{Cursor, Decoder, EventKind};
//!
//! // <doc id="7"/>
//! let bytes = [
//!     0xE0, 0x00, 0x00, 0x01, 0x00,
//!     0x7C, 0x02, b'd', b'o', b'c', // Element "doc" mit Attributen
//!     0x78, 0x01, b'i', b'd',       // Attribut "id"
//!     0x00, b'7',                   // Wert "7"
//!     0xFF,                         // Ende Attribute und Element
//!     0xF0,                         // Ende Dokument
//! ];
//! let mut decoder = Decoder::from_slice(&bytes);
//! assert_eq!(decoder.advance().unwrap(), EventKind::StartElement);
//! assert_eq!(decoder.attribute_value(None, "id").unwrap(), Some("7"));
//! assert_eq!(decoder.advance().unwrap(), EventKind::EndElement);
//! assert_eq!(decoder.advance().unwrap(), EventKind::EndDocument);
//! ```

pub mod algorithm;
pub mod alphabet;
pub mod attributes;
pub mod byte_cursor;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod event;
pub mod namespace;
pub mod options;
pub mod qname;
pub mod string_table;
pub mod xml_writer;

pub use error::{Error, ErrorCategory, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent, für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

// Public API: Decoder
pub use decoder::{Cursor, Decoder};
pub use byte_cursor::{ByteCursor, ByteSource};
pub use options::DecoderOptions;

// Public API: Events und Namen
pub use attributes::Attribute;
pub use event::{
    DocumentTypeDeclaration, EntityReference, EventKind, Notation, ProcessingInstruction,
    UnparsedEntity,
};
pub use namespace::{NamespaceBinding, NamespaceResolver};
pub use qname::QualifiedName;

// Public API: Vokabular und Algorithmen
pub use algorithm::{AlgorithmRegistry, AlgorithmValue, BuiltInAlgorithm, EncodingAlgorithm};
pub use string_table::{StringTables, Vocabulary};
