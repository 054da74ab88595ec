//! Fast Infoset Decoder (X.891 Abschnitt 7, Anhang C).
//!
//! Pull-Decoder: jedes [`advance`](crate::Cursor::advance) liest genau ein
//! Information Item und positioniert den Cursor darauf. Ein Double Terminator
//! schließt zwei Ebenen, das zweite END_ELEMENT wird aber erst beim nächsten
//! Aufruf geliefert.
//!
//! # Beispiel
//!
//! ```
//! use finset::{Cursor, Decoder, EventKind};
//!
//! // <a>hi</a>
//! let bytes = [
//!     0xE0, 0x00, 0x00, 0x01, 0x00, // Header, keine optionalen Teile
//!     0x3C, 0x00, b'a',             // Element mit literalem Namen "a"
//!     0x81, b'h', b'i',             // Character Chunk "hi"
//!     0xF0, 0xF0,                   // Ende Element, Ende Dokument
//! ];
//! let mut decoder = Decoder::from_slice(&bytes);
//! assert_eq!(decoder.advance().unwrap(), EventKind::StartElement);
//! assert_eq!(decoder.local_name().unwrap(), "a");
//! assert_eq!(decoder.element_text().unwrap(), "hi");
//! assert_eq!(decoder.advance().unwrap(), EventKind::EndDocument);
//! ```

mod cursor;
mod element;
mod header;
mod strings;

pub use cursor::Cursor;

use std::cell::{Cell, OnceCell};
use std::io::Read;
use std::ops::Range;
use std::rc::Rc;

use log::{debug, trace};

use crate::algorithm::Base64Tale;
use crate::attributes::{Attribute, DuplicateAttributeVerifier};
use crate::byte_cursor::{ByteCursor, ByteSource};
use crate::constants::DEFAULT_ENCODING;
use crate::error::{Error, Result};
use crate::event::{
    DocumentTypeDeclaration, EntityReference, EventKind, Notation, ProcessingInstruction,
    UnparsedEntity,
};
use crate::namespace::NamespaceScopeStack;
use crate::options::DecoderOptions;
use crate::qname::QualifiedName;
use crate::string_table::StringTables;

// ============================================================================
// Zustand
// ============================================================================

/// Interner Zustand zwischen zwei `advance()`-Aufrufen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Header noch nicht gelesen.
    StartDocument,
    Content,
    /// 0xFF im Attributteil: das Element ist schon geschlossen.
    TerminateElement,
    /// Zweite Ebene eines Double Terminators steht aus.
    DoubleTerminate,
    EndDocument,
}

/// Offenes Element.
#[derive(Debug, Clone)]
struct ElementFrame {
    name: Rc<QualifiedName>,
    /// Bindings, die dieses Element deklariert hat.
    namespaces: Range<usize>,
}

/// Wo der Text des aktuellen Events liegt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Text {
    None,
    Scratch,
    /// Bereich im Puffer der Content-Chunk-Tabelle.
    Content { start: usize, len: usize },
    /// Bereich im Puffer der Other-String-Tabelle.
    OtherString { start: usize, len: usize },
    Algorithm,
}

#[derive(Debug)]
enum AlgorithmBytes {
    /// Bereich im Puffer der Byte-Quelle, gültig bis zum nächsten Nachladen.
    Borrowed(Range<usize>),
    Owned(Vec<u8>),
}

/// Algorithmus-kodierter Character Chunk.
#[derive(Debug)]
struct AlgorithmData {
    id: u32,
    /// URI aus der Algorithmus-Tabelle (nur Ids >= 32).
    uri: Option<Rc<str>>,
    bytes: AlgorithmBytes,
    /// Folgt direkt ein weiterer base64-Chunk?
    base64_follows: bool,
    text: OnceCell<String>,
}

// ============================================================================
// Decoder
// ============================================================================

/// Streaming pull decoder for one Fast Infoset byte stream.
///
/// Der Decoder ist an eine Byte-Quelle gebunden und dekodiert beliebig viele
/// hintereinander liegende Dokumente: nach END_DOCUMENT setzt
/// [`reset`](Self::reset) auf das nächste Dokument auf.
pub struct Decoder<S> {
    source: S,
    options: DecoderOptions,
    tables: StringTables,
    namespaces: NamespaceScopeStack,
    verifier: DuplicateAttributeVerifier,
    state: State,
    event: EventKind,
    stack: Vec<ElementFrame>,
    /// Name des aktuellen START_ELEMENT/END_ELEMENT.
    name: Option<Rc<QualifiedName>>,
    /// Bindings des aktuellen Elements (Deklaration bzw. Ende des Scopes).
    current_namespaces: Range<usize>,
    /// Scope, der beim nächsten `advance()` entfernt wird.
    pending_pop: Option<usize>,
    attributes: Vec<Attribute>,
    text: Text,
    scratch: String,
    pi: Option<ProcessingInstruction>,
    entity: Option<EntityReference>,
    dtd: Option<DocumentTypeDeclaration>,
    algorithm: Option<AlgorithmData>,
    tale: Cell<Base64Tale>,
    empty: Rc<str>,
    // Document Information Item
    format_version: u8,
    encoding: Rc<str>,
    standalone: Option<bool>,
    xml_version: Option<Rc<str>>,
    notations: Vec<Notation>,
    unparsed_entities: Vec<UnparsedEntity>,
}

impl<'a> Decoder<ByteCursor<&'a [u8]>> {
    /// Decoder über einem Byte-Slice.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<R: Read> Decoder<ByteCursor<R>> {
    /// Erstellt einen Decoder mit Default-Optionen.
    pub fn new(reader: R) -> Self {
        Self::from_source(ByteCursor::new(reader), DecoderOptions::default())
    }

    /// Erstellt einen Decoder mit den angegebenen Optionen.
    ///
    /// # Errors
    ///
    /// `MalformedInput` wenn die Optionen ungültig sind.
    pub fn with_options(reader: R, options: DecoderOptions) -> Result<Self> {
        options.validate()?;
        let source = ByteCursor::with_capacity(reader, options.buffer_size());
        Ok(Self::from_source(source, options))
    }

    /// Switches to a new reader and returns to start-of-document.
    pub fn set_input(&mut self, reader: R) {
        let source = ByteCursor::with_capacity(reader, self.options.buffer_size());
        self.set_source(source);
    }
}

impl<S: ByteSource> Decoder<S> {
    /// Decoder über einer beliebigen [`ByteSource`].
    pub fn from_source(source: S, options: DecoderOptions) -> Self {
        let mut tables = StringTables::new();
        if let Some(max) = options.maximum_table_entries() {
            tables.set_maximum_entries(max);
        }
        Self {
            source,
            options,
            tables,
            namespaces: NamespaceScopeStack::new(),
            verifier: DuplicateAttributeVerifier::new(),
            state: State::StartDocument,
            event: EventKind::StartDocument,
            stack: Vec::new(),
            name: None,
            current_namespaces: 0..0,
            pending_pop: None,
            attributes: Vec::new(),
            text: Text::None,
            scratch: String::new(),
            pi: None,
            entity: None,
            dtd: None,
            algorithm: None,
            tale: Cell::new(Base64Tale::default()),
            empty: "".into(),
            format_version: 1,
            encoding: DEFAULT_ENCODING.into(),
            standalone: None,
            xml_version: None,
            notations: Vec::new(),
            unparsed_entities: Vec::new(),
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Read access to the vocabulary tables of the current document.
    pub fn tables(&self) -> &StringTables {
        &self.tables
    }

    /// Absolute byte position in the input.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Replaces the byte source and returns to start-of-document.
    pub fn set_source(&mut self, source: S) {
        self.source = source;
        self.reset();
    }

    /// Liest den Header, falls noch nicht geschehen.
    ///
    /// Wird vom ersten `advance()` automatisch aufgerufen; explizit nur nötig,
    /// um die Document-Informationen vor dem ersten Event zu lesen.
    pub fn read_header(&mut self) -> Result<()> {
        if self.state != State::StartDocument {
            return Ok(());
        }
        match self.decode_header() {
            Ok(()) => {
                self.state = State::Content;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Returns to start-of-document on the same byte source.
    ///
    /// Tabellen, Namespace-Scope und Document-Informationen werden gelöscht;
    /// das nächste `advance()` erwartet einen neuen Header.
    pub fn reset(&mut self) {
        self.clear_event();
        self.tale.set(Base64Tale::default());
        self.tables.clear();
        self.namespaces.clear();
        self.verifier.clear();
        self.stack.clear();
        self.pending_pop = None;
        self.state = State::StartDocument;
        self.event = EventKind::StartDocument;
        self.format_version = 1;
        self.encoding = DEFAULT_ENCODING.into();
        self.standalone = None;
        self.xml_version = None;
        self.notations.clear();
        self.unparsed_entities.clear();
    }

    /// Reset nach einem Decode-Fehler.
    pub fn reset_on_error(&mut self) {
        debug!("resetting decoder at byte {} after error", self.source.position());
        self.reset();
    }

    // ========================================================================
    // Event-Schleife
    // ========================================================================

    pub(crate) fn advance_event(&mut self) -> Result<EventKind> {
        match self.step() {
            Ok(kind) => {
                self.event = kind;
                trace!("{kind} (depth {}, byte {})", self.stack.len(), self.source.position());
                Ok(kind)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fatale Fehler setzen den Decoder zurück, Usage-Fehler nicht.
    fn fail(&mut self, e: Error) -> Error {
        if e.is_fatal() {
            debug!("decode error: {e}");
            self.reset_on_error();
        }
        e
    }

    fn step(&mut self) -> Result<EventKind> {
        match self.state {
            State::StartDocument => {
                self.decode_header()?;
                self.state = State::Content;
            }
            State::EndDocument => return Err(Error::NoMoreEvents),
            _ => {}
        }
        self.clear_event();
        if let Some(start) = self.pending_pop.take() {
            self.namespaces.pop_to(start);
        }
        match self.state {
            State::TerminateElement => {
                self.state = State::Content;
                return self.end_element();
            }
            State::DoubleTerminate => {
                self.state = State::Content;
                if self.stack.is_empty() {
                    return Ok(self.end_document());
                }
                return self.end_element();
            }
            _ => {}
        }

        let b = self.source.read()?;
        match b {
            0x00..=0x7F => self.element(b),
            0x80..=0xBF => {
                self.require_element("character content", b)?;
                self.character_chunk(b)
            }
            0xC4..=0xC7 => self.document_type_declaration(b),
            0xC8..=0xCB => {
                self.require_element("entity reference", b)?;
                self.entity_reference(b)
            }
            0xE1 => self.processing_instruction(),
            0xE2 => self.comment(),
            0xF0 => self.terminator(false),
            0xFF => self.terminator(true),
            _ => Err(Error::InvalidTag { byte: b, context: "content" }),
        }
    }

    /// Item darf nur innerhalb eines Elements stehen.
    fn require_element(&self, context: &'static str, byte: u8) -> Result<()> {
        if self.stack.is_empty() {
            debug!("{context} at document level");
            return Err(Error::InvalidTag { byte, context: "document children" });
        }
        Ok(())
    }

    /// Verwirft die Daten des vorigen Events.
    fn clear_event(&mut self) {
        let keep_tale = self.algorithm.as_ref().is_some_and(|a| {
            a.id == crate::constants::BASE64 && a.base64_follows && a.text.get().is_some()
        });
        if !keep_tale {
            let mut tale = self.tale.get();
            tale.clear();
            self.tale.set(tale);
        }
        self.name = None;
        self.current_namespaces = 0..0;
        self.attributes.clear();
        self.text = Text::None;
        self.pi = None;
        self.entity = None;
        self.dtd = None;
        self.algorithm = None;
    }

    fn terminator(&mut self, double: bool) -> Result<EventKind> {
        if self.stack.is_empty() {
            return Ok(self.end_document());
        }
        if double {
            self.state = State::DoubleTerminate;
        }
        self.end_element()
    }

    fn end_element(&mut self) -> Result<EventKind> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::malformed("end of element without open element"))?;
        self.pending_pop = Some(frame.namespaces.start);
        self.current_namespaces = frame.namespaces;
        self.name = Some(frame.name);
        Ok(EventKind::EndElement)
    }

    fn end_document(&mut self) -> EventKind {
        self.state = State::EndDocument;
        EventKind::EndDocument
    }

    /// Kopiert geliehene Algorithmus-Bytes, bevor ein Lookahead nachladen könnte.
    fn retain_algorithm_range(&mut self, lookahead: usize) {
        if self.source.buffered() >= lookahead {
            return;
        }
        if let Some(data) = &mut self.algorithm {
            if let AlgorithmBytes::Borrowed(range) = &data.bytes {
                let owned = self.source.slice(range.clone()).to_vec();
                data.bytes = AlgorithmBytes::Owned(owned);
            }
        }
    }

    fn algorithm_slice<'s>(&'s self, data: &'s AlgorithmData) -> &'s [u8] {
        match &data.bytes {
            AlgorithmBytes::Borrowed(range) => self.source.slice(range.clone()),
            AlgorithmBytes::Owned(bytes) => bytes,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
