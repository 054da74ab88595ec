//! Fast Infoset Konstanten (ITU-T X.891, Anhang C).
//!
//! Bitmasken der Tag-Bytes, Grenzen der Integer-/Längen-Kodierungen und die
//! vordefinierten Einträge der Vokabular-Tabellen.

// ============================================================================
// Header
// ============================================================================

/// Binary header (identification + version 1).
pub const BINARY_HEADER: [u8; 4] = [0xE0, 0x00, 0x00, 0x01];
/// Older, pre-standard header (version 0), still accepted.
pub const BINARY_HEADER_V0: [u8; 4] = [0xE0, 0x00, 0x00, 0x00];
/// Start of an optional XML declaration in front of the binary header.
pub const XML_DECLARATION_START: &[u8] = b"<?xml";
/// Upper bound of an XML declaration in front of the binary header.
pub const XML_DECLARATION_MAX_LENGTH: usize = 128;

// Document information item, optional components
pub const DOCUMENT_ADDITIONAL_DATA_FLAG: u8 = 0x40;
pub const DOCUMENT_INITIAL_VOCABULARY_FLAG: u8 = 0x20;
pub const DOCUMENT_NOTATIONS_FLAG: u8 = 0x10;
pub const DOCUMENT_UNPARSED_ENTITIES_FLAG: u8 = 0x08;
pub const DOCUMENT_CHARACTER_ENCODING_SCHEME: u8 = 0x04;
pub const DOCUMENT_STANDALONE_FLAG: u8 = 0x02;
pub const DOCUMENT_VERSION_FLAG: u8 = 0x01;

// Initial vocabulary, first byte
pub const INITIAL_VOCABULARY_EXTERNAL_VOCABULARY_FLAG: u8 = 0x10;
pub const INITIAL_VOCABULARY_RESTRICTED_ALPHABETS_FLAG: u8 = 0x08;
pub const INITIAL_VOCABULARY_ENCODING_ALGORITHMS_FLAG: u8 = 0x04;
pub const INITIAL_VOCABULARY_PREFIXES_FLAG: u8 = 0x02;
pub const INITIAL_VOCABULARY_NAMESPACE_NAMES_FLAG: u8 = 0x01;
// Initial vocabulary, second byte
pub const INITIAL_VOCABULARY_LOCAL_NAMES_FLAG: u8 = 0x80;
pub const INITIAL_VOCABULARY_OTHER_NCNAMES_FLAG: u8 = 0x40;
pub const INITIAL_VOCABULARY_OTHER_URIS_FLAG: u8 = 0x20;
pub const INITIAL_VOCABULARY_ATTRIBUTE_VALUES_FLAG: u8 = 0x10;
pub const INITIAL_VOCABULARY_CONTENT_CHARACTER_CHUNKS_FLAG: u8 = 0x08;
pub const INITIAL_VOCABULARY_OTHER_STRINGS_FLAG: u8 = 0x04;
pub const INITIAL_VOCABULARY_ELEMENT_NAME_SURROGATES_FLAG: u8 = 0x02;
pub const INITIAL_VOCABULARY_ATTRIBUTE_NAME_SURROGATES_FLAG: u8 = 0x01;

// Name surrogate flags
pub const NAME_SURROGATE_PREFIX_FLAG: u8 = 0x02;
pub const NAME_SURROGATE_NAME_FLAG: u8 = 0x01;

// Notations / unparsed entities
pub const NOTATIONS: u8 = 0xC0;
pub const NOTATIONS_MASK: u8 = 0xFC;
pub const NOTATIONS_SYSTEM_IDENTIFIER_FLAG: u8 = 0x02;
pub const NOTATIONS_PUBLIC_IDENTIFIER_FLAG: u8 = 0x01;
pub const UNPARSED_ENTITIES: u8 = 0xD0;
pub const UNPARSED_ENTITIES_MASK: u8 = 0xFE;
pub const UNPARSED_ENTITIES_PUBLIC_IDENTIFIER_FLAG: u8 = 0x01;

// ============================================================================
// Structure
// ============================================================================

pub const TERMINATOR: u8 = 0xF0;
pub const DOUBLE_TERMINATOR: u8 = 0xFF;

pub const ELEMENT_ATTRIBUTE_FLAG: u8 = 0x40;
pub const ELEMENT_NAMESPACES_FLAG: u8 = 0x38;
pub const ELEMENT_LITERAL_QNAME_FLAG: u8 = 0x3C;
pub const ELEMENT_PREFIX_FLAG: u8 = 0x02;
pub const ELEMENT_NAMESPACE_NAME_FLAG: u8 = 0x01;

pub const NAMESPACE_ATTRIBUTE: u8 = 0xCC;
pub const NAMESPACE_ATTRIBUTE_MASK: u8 = 0xFC;
pub const NAMESPACE_ATTRIBUTE_PREFIX_NAME_MASK: u8 = 0x03;

pub const ATTRIBUTE_LITERAL_QNAME_FLAG: u8 = 0x78;

pub const PROCESSING_INSTRUCTION: u8 = 0xE1;
pub const COMMENT: u8 = 0xE2;
pub const DOCUMENT_TYPE_DECLARATION: u8 = 0xC4;
pub const DOCUMENT_TYPE_DECLARATION_MASK: u8 = 0xFC;
pub const DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG: u8 = 0x02;
pub const DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG: u8 = 0x01;
pub const UNEXPANDED_ENTITY_REFERENCE: u8 = 0xC8;
pub const UNEXPANDED_ENTITY_REFERENCE_MASK: u8 = 0xFC;
pub const UNEXPANDED_ENTITY_SYSTEM_IDENTIFIER_FLAG: u8 = 0x02;
pub const UNEXPANDED_ENTITY_PUBLIC_IDENTIFIER_FLAG: u8 = 0x01;

// ============================================================================
// Character chunks (Kodierung ab dem 3. Bit)
// ============================================================================

pub const CHARACTER_CHUNK: u8 = 0x80;
pub const CHARACTER_CHUNK_ADD_TO_TABLE_FLAG: u8 = 0x10;
pub const CHARACTER_CHUNK_ENCODING_MASK: u8 = 0x0C;
pub const CHARACTER_CHUNK_UTF_8: u8 = 0x00;
pub const CHARACTER_CHUNK_UTF_16: u8 = 0x04;
pub const CHARACTER_CHUNK_RESTRICTED_ALPHABET: u8 = 0x08;
pub const CHARACTER_CHUNK_ENCODING_ALGORITHM: u8 = 0x0C;

// ============================================================================
// Non-identifying strings (Kodierung ab dem 1. oder 3. Bit)
// ============================================================================

pub const NISTRING_ADD_TO_TABLE_FLAG: u8 = 0x40;
pub const NISTRING_ENCODING_MASK: u8 = 0x30;
pub const NISTRING_UTF_8: u8 = 0x00;
pub const NISTRING_UTF_16: u8 = 0x10;
pub const NISTRING_RESTRICTED_ALPHABET: u8 = 0x20;
pub const NISTRING_ENCODING_ALGORITHM: u8 = 0x30;
pub const NISTRING_EMPTY_STRING: u8 = 0xFF;

// ============================================================================
// Integer-Grenzen (C.25 - C.29)
// ============================================================================

pub const INTEGER_2ND_BIT_SMALL_LIMIT: usize = 64;
pub const INTEGER_2ND_BIT_MEDIUM_LIMIT: usize = 8256;
pub const INTEGER_3RD_BIT_SMALL_LIMIT: usize = 32;
pub const INTEGER_3RD_BIT_MEDIUM_LIMIT: usize = 2080;
pub const INTEGER_3RD_BIT_LARGE_LIMIT: usize = 526_368;
pub const INTEGER_4TH_BIT_SMALL_LIMIT: usize = 16;
pub const INTEGER_4TH_BIT_MEDIUM_LIMIT: usize = 1040;
pub const INTEGER_4TH_BIT_LARGE_LIMIT: usize = 263_184;

// Octet string lengths (C.22 - C.24)
pub const OCTET_STRING_LENGTH_2ND_BIT_SMALL_LIMIT: usize = 65;
pub const OCTET_STRING_LENGTH_2ND_BIT_MEDIUM_LIMIT: usize = 321;
pub const OCTET_STRING_LENGTH_5TH_BIT_SMALL_LIMIT: usize = 9;
pub const OCTET_STRING_LENGTH_5TH_BIT_MEDIUM_LIMIT: usize = 265;
pub const OCTET_STRING_LENGTH_7TH_BIT_SMALL_LIMIT: usize = 3;
pub const OCTET_STRING_LENGTH_7TH_BIT_MEDIUM_LIMIT: usize = 259;

// ============================================================================
// Vordefinierte Vokabular-Einträge
// ============================================================================

pub const XML_PREFIX: &str = "xml";
pub const XMLNS_PREFIX: &str = "xmlns";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Default character encoding scheme when the header carries none.
pub const DEFAULT_ENCODING: &str = "UTF-8";

// Built-in restricted alphabets
pub const NUMERIC_ALPHABET_INDEX: u32 = 0;
pub const DATE_TIME_ALPHABET_INDEX: u32 = 1;
pub const RESTRICTED_ALPHABET_APPLICATION_START: u32 = 16;
pub const NUMERIC_ALPHABET: &str = "0123456789-+.E ";
pub const DATE_TIME_ALPHABET: &str = "0123456789-:TZ ";

// Built-in encoding algorithms
pub const HEXADECIMAL: u32 = 0;
pub const BASE64: u32 = 1;
pub const SHORT: u32 = 2;
pub const INT: u32 = 3;
pub const LONG: u32 = 4;
pub const BOOLEAN: u32 = 5;
pub const FLOAT: u32 = 6;
pub const DOUBLE: u32 = 7;
pub const UUID: u32 = 8;
pub const CDATA: u32 = 9;
pub const LAST_BUILT_IN_ALGORITHM: u32 = CDATA;
pub const ENCODING_ALGORITHM_APPLICATION_START: u32 = 32;

/// URIs der eingebauten Algorithmen (für `algorithm_uri()`).
pub const BUILT_IN_ALGORITHM_NAMES: [&str; 10] = [
    "hexadecimal",
    "base64",
    "short",
    "int",
    "long",
    "boolean",
    "float",
    "double",
    "uuid",
    "cdata",
];
