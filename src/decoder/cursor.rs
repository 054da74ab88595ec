//! StAX-artige Sicht auf den Decoder.
//!
//! Alle Accessoren lesen nur den Zustand des aktuellen Events. Geliehene
//! Werte (`&str`, `&[u8]`) leben höchstens bis zum nächsten `advance()`,
//! das `&mut self` verlangt.

use crate::algorithm::{AlgorithmValue, BuiltInAlgorithm, EncodingAlgorithm};
use crate::attributes::Attribute;
use crate::byte_cursor::ByteSource;
use crate::constants::{BASE64, BUILT_IN_ALGORITHM_NAMES, CDATA};
use crate::error::{Error, Result};
use crate::event::{EventKind, Notation, ProcessingInstruction, UnparsedEntity};
use crate::namespace::{NamespaceBinding, NamespaceResolver};
use crate::qname::QualifiedName;

use super::strings::algorithm_to_text;
use super::{AlgorithmData, Decoder, State, Text};

/// Cursor over the information items of a Fast Infoset document.
pub trait Cursor {
    /// Moves to the next event and returns its kind.
    ///
    /// # Errors
    ///
    /// Malformed- und Transport-Fehler setzen den Decoder zurück;
    /// nach END_DOCUMENT liefert der Aufruf [`Error::NoMoreEvents`].
    fn advance(&mut self) -> Result<EventKind>;

    fn event_kind(&self) -> EventKind;

    /// Local name of the current element or entity reference.
    fn local_name(&self) -> Result<&str>;

    /// `None` when the current name has no namespace.
    fn namespace_uri(&self) -> Result<Option<&str>>;

    /// Prefix, empty when absent.
    fn prefix(&self) -> Result<&str>;

    fn name(&self) -> Result<&QualifiedName>;

    fn attribute_count(&self) -> Result<usize>;

    fn attribute_at(&self, index: usize) -> Result<&Attribute>;

    /// Value of the attribute `{namespace}local_name`, `None` matches no namespace.
    fn attribute_value(&self, namespace: Option<&str>, local_name: &str) -> Result<Option<&str>> {
        for i in 0..self.attribute_count()? {
            let attribute = self.attribute_at(i)?;
            if attribute.local_name() == local_name && attribute.namespace_uri() == namespace {
                return Ok(Some(attribute.value()));
            }
        }
        Ok(None)
    }

    /// Character data of CHARACTERS, CDATA or COMMENT.
    fn text(&self) -> Result<&str>;

    /// Backing buffer of the text; the text is `text_start()..text_start() + text_length()`.
    fn text_chars(&self) -> Result<&str>;

    fn text_start(&self) -> Result<usize>;

    /// Length of the text in UTF-8 bytes.
    fn text_length(&self) -> Result<usize>;

    /// Namespace declarations of the current START_ELEMENT (or going out of scope at END_ELEMENT).
    fn namespace_count(&self) -> Result<usize>;

    fn namespace_at(&self, index: usize) -> Result<&NamespaceBinding>;

    /// Namespace currently bound to `prefix` (`""` = default namespace).
    fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str>;

    fn namespace_context(&self) -> &dyn NamespaceResolver;

    fn pi_target(&self) -> Result<&str>;

    fn pi_data(&self) -> Result<&str>;

    /// Number of open elements; START_ELEMENT and its END_ELEMENT report the same depth.
    fn depth(&self) -> usize;

    /// Kind of the next event without consuming it. `None` after END_DOCUMENT or at end of input.
    fn peek_next_event_kind(&mut self) -> Result<Option<EventKind>>;

    /// Checks kind, namespace and local name of the current event.
    fn require(&self, kind: EventKind, namespace: Option<&str>, local_name: Option<&str>) -> Result<()> {
        let found = self.event_kind();
        if found != kind {
            return Err(Error::illegal_state(kind.as_str(), found));
        }
        if let Some(namespace) = namespace {
            if self.namespace_uri()?.unwrap_or("") != namespace {
                return Err(Error::illegal_state(format!("namespace '{namespace}'"), found));
            }
        }
        if let Some(local_name) = local_name {
            if self.local_name()? != local_name {
                return Err(Error::illegal_state(format!("local name '{local_name}'"), found));
            }
        }
        Ok(())
    }

    /// Reads the text content of a text-only element.
    ///
    /// Startet auf START_ELEMENT und endet auf dem zugehörigen END_ELEMENT.
    /// Kommentare, PIs und Entity References werden übersprungen.
    fn element_text(&mut self) -> Result<String> {
        let found = self.event_kind();
        if found != EventKind::StartElement {
            return Err(Error::illegal_state("START_ELEMENT", found));
        }
        let mut content = String::new();
        loop {
            match self.advance()? {
                EventKind::Characters | EventKind::Cdata => content.push_str(self.text()?),
                EventKind::Comment | EventKind::ProcessingInstruction | EventKind::EntityReference => {}
                EventKind::EndElement => return Ok(content),
                other => return Err(Error::illegal_state("text-only element content", other)),
            }
        }
    }

    /// Advances to the next START_ELEMENT or END_ELEMENT.
    ///
    /// Whitespace, Kommentare und PIs werden übersprungen.
    fn skip_to_tag(&mut self) -> Result<EventKind> {
        loop {
            match self.advance()? {
                kind @ (EventKind::StartElement | EventKind::EndElement) => return Ok(kind),
                EventKind::Characters | EventKind::Cdata if is_whitespace(self.text()?) => {}
                EventKind::Comment | EventKind::ProcessingInstruction => {}
                other => return Err(Error::illegal_state("START_ELEMENT or END_ELEMENT", other)),
            }
        }
    }
}

fn is_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

impl<S: ByteSource> Cursor for Decoder<S> {
    fn advance(&mut self) -> Result<EventKind> {
        self.advance_event()
    }

    fn event_kind(&self) -> EventKind {
        self.event
    }

    fn local_name(&self) -> Result<&str> {
        match self.event {
            EventKind::StartElement | EventKind::EndElement => Ok(&self.current_name()?.local_name),
            EventKind::EntityReference => Ok(&self.current_entity()?.name),
            other => Err(Error::illegal_state("START_ELEMENT, END_ELEMENT or ENTITY_REFERENCE", other)),
        }
    }

    fn namespace_uri(&self) -> Result<Option<&str>> {
        match self.event {
            EventKind::StartElement | EventKind::EndElement => {
                let uri = &*self.current_name()?.namespace_uri;
                Ok(Some(uri).filter(|u| !u.is_empty()))
            }
            EventKind::EntityReference => Ok(None),
            other => Err(Error::illegal_state("START_ELEMENT, END_ELEMENT or ENTITY_REFERENCE", other)),
        }
    }

    fn prefix(&self) -> Result<&str> {
        match self.event {
            EventKind::StartElement | EventKind::EndElement => Ok(&self.current_name()?.prefix),
            EventKind::EntityReference => Ok(""),
            other => Err(Error::illegal_state("START_ELEMENT, END_ELEMENT or ENTITY_REFERENCE", other)),
        }
    }

    fn name(&self) -> Result<&QualifiedName> {
        self.current_name()
    }

    fn attribute_count(&self) -> Result<usize> {
        self.expect(EventKind::StartElement)?;
        Ok(self.attributes.len())
    }

    fn attribute_at(&self, index: usize) -> Result<&Attribute> {
        self.expect(EventKind::StartElement)?;
        self.attributes.get(index).ok_or_else(|| {
            Error::illegal_state(format!("attribute index below {}", self.attributes.len()), self.event)
        })
    }

    fn text(&self) -> Result<&str> {
        self.expect_text()?;
        match self.text {
            Text::None | Text::Scratch => Ok(&self.scratch),
            Text::Content { start, len } => Ok(&self.tables.content_chunks.buffer()[start..start + len]),
            Text::OtherString { start, len } => Ok(&self.tables.other_strings.buffer()[start..start + len]),
            Text::Algorithm => self.algorithm_text(),
        }
    }

    fn text_chars(&self) -> Result<&str> {
        self.expect_text()?;
        match self.text {
            Text::Content { .. } => Ok(self.tables.content_chunks.buffer()),
            Text::OtherString { .. } => Ok(self.tables.other_strings.buffer()),
            _ => self.text(),
        }
    }

    fn text_start(&self) -> Result<usize> {
        self.expect_text()?;
        match self.text {
            Text::Content { start, .. } | Text::OtherString { start, .. } => Ok(start),
            _ => Ok(0),
        }
    }

    fn text_length(&self) -> Result<usize> {
        match self.text {
            Text::Content { len, .. } | Text::OtherString { len, .. } => {
                self.expect_text()?;
                Ok(len)
            }
            _ => Ok(self.text()?.len()),
        }
    }

    fn namespace_count(&self) -> Result<usize> {
        self.expect_element()?;
        Ok(self.current_namespaces.len())
    }

    fn namespace_at(&self, index: usize) -> Result<&NamespaceBinding> {
        self.expect_element()?;
        let bindings = self.namespaces.bindings(self.current_namespaces.start, self.current_namespaces.end);
        bindings.get(index).ok_or_else(|| {
            Error::illegal_state(format!("namespace index below {}", bindings.len()), self.event)
        })
    }

    fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.resolve_prefix(prefix)
    }

    fn namespace_context(&self) -> &dyn NamespaceResolver {
        &self.namespaces
    }

    fn pi_target(&self) -> Result<&str> {
        Ok(&self.current_pi()?.target)
    }

    fn pi_data(&self) -> Result<&str> {
        Ok(&self.current_pi()?.data)
    }

    fn depth(&self) -> usize {
        match self.event {
            EventKind::EndElement => self.stack.len() + 1,
            _ => self.stack.len(),
        }
    }

    fn peek_next_event_kind(&mut self) -> Result<Option<EventKind>> {
        match self.state {
            State::StartDocument => self.read_header()?,
            State::EndDocument => return Ok(None),
            State::TerminateElement => return Ok(Some(EventKind::EndElement)),
            State::DoubleTerminate => {
                let kind = if self.stack.is_empty() { EventKind::EndDocument } else { EventKind::EndElement };
                return Ok(Some(kind));
            }
            State::Content => {}
        }
        self.retain_algorithm_range(2);
        let Some(b) = self.source.try_peek()? else {
            return Ok(None);
        };
        let kind = match b {
            0x00..=0x7F => EventKind::StartElement,
            0x80..=0xBF | 0xC8..=0xCB if self.stack.is_empty() => {
                return Err(Error::InvalidTag { byte: b, context: "document children" });
            }
            0x8C..=0x8F | 0x9C..=0x9F => {
                let b2 = self.source.peek2()?;
                if (u32::from(b & 0x03) << 6) | u32::from(b2 >> 2) == CDATA {
                    EventKind::Cdata
                } else {
                    EventKind::Characters
                }
            }
            0x80..=0xB8 => EventKind::Characters,
            0xC4..=0xC7 => EventKind::Dtd,
            0xC8..=0xCB => EventKind::EntityReference,
            0xE1 => EventKind::ProcessingInstruction,
            0xE2 => EventKind::Comment,
            0xF0 | 0xFF if self.stack.is_empty() => EventKind::EndDocument,
            0xF0 | 0xFF => EventKind::EndElement,
            _ => return Err(Error::InvalidTag { byte: b, context: "content" }),
        };
        Ok(Some(kind))
    }
}

// ============================================================================
// Weitere Accessoren
// ============================================================================

impl<S: ByteSource> Decoder<S> {
    fn expect(&self, kind: EventKind) -> Result<()> {
        if self.event != kind {
            return Err(Error::illegal_state(kind.as_str(), self.event));
        }
        Ok(())
    }

    fn expect_element(&self) -> Result<()> {
        if !self.event.has_name() {
            return Err(Error::illegal_state("START_ELEMENT or END_ELEMENT", self.event));
        }
        Ok(())
    }

    fn expect_text(&self) -> Result<()> {
        if !self.event.has_text() {
            return Err(Error::illegal_state("CHARACTERS, CDATA or COMMENT", self.event));
        }
        Ok(())
    }

    fn current_name(&self) -> Result<&QualifiedName> {
        match (&self.name, self.event.has_name()) {
            (Some(name), true) => Ok(name),
            _ => Err(Error::illegal_state("START_ELEMENT or END_ELEMENT", self.event)),
        }
    }

    fn current_pi(&self) -> Result<&ProcessingInstruction> {
        self.pi
            .as_ref()
            .ok_or_else(|| Error::illegal_state("PROCESSING_INSTRUCTION", self.event))
    }

    fn current_entity(&self) -> Result<&crate::event::EntityReference> {
        self.entity
            .as_ref()
            .ok_or_else(|| Error::illegal_state("ENTITY_REFERENCE", self.event))
    }

    fn current_algorithm(&self) -> Result<&AlgorithmData> {
        self.algorithm
            .as_ref()
            .ok_or_else(|| Error::illegal_state("algorithm-encoded character data", self.event))
    }

    /// Text der Algorithmus-Daten, beim ersten Zugriff erzeugt.
    pub(super) fn algorithm_text(&self) -> Result<&str> {
        let data = self.current_algorithm()?;
        if let Some(text) = data.text.get() {
            return Ok(text.as_str());
        }
        let bytes = self.algorithm_slice(data);
        let mut text = String::new();
        if data.id == BASE64 {
            let mut tale = self.tale.get();
            tale.encode_chunk(bytes, data.base64_follows, &mut text);
            self.tale.set(tale);
        } else {
            algorithm_to_text(&self.tables, &self.options, data.id, bytes, &mut text)?;
        }
        Ok(data.text.get_or_init(|| text).as_str())
    }

    // --- Algorithmus-Daten ---

    /// Encoding algorithm id of the current character data.
    pub fn algorithm_id(&self) -> Option<u32> {
        self.algorithm.as_ref().map(|a| a.id)
    }

    /// URI of the current algorithm; built-ins report their name.
    pub fn algorithm_uri(&self) -> Option<&str> {
        let data = self.algorithm.as_ref()?;
        match &data.uri {
            Some(uri) => Some(uri),
            None => BUILT_IN_ALGORITHM_NAMES.get(data.id as usize).copied(),
        }
    }

    /// Raw octets of the current algorithm data.
    pub fn algorithm_bytes(&self) -> Option<&[u8]> {
        self.algorithm.as_ref().map(|a| self.algorithm_slice(a))
    }

    /// Kopie der Rohbytes, die über das nächste `advance()` hinaus lebt.
    pub fn retain_algorithm_bytes(&self) -> Option<Vec<u8>> {
        self.algorithm_bytes().map(<[u8]>::to_vec)
    }

    /// Typed value of the current algorithm data.
    ///
    /// Application algorithms without registered codec decode to
    /// [`AlgorithmValue::Opaque`].
    pub fn algorithm_value(&self) -> Result<AlgorithmValue> {
        let data = self.current_algorithm()?;
        let bytes = self.algorithm_slice(data);
        if let Some(built_in) = BuiltInAlgorithm::from_id(data.id) {
            return built_in.decode(bytes);
        }
        match data.uri.as_deref().and_then(|uri| self.options.algorithms().get(uri)) {
            Some(codec) => codec.decode(bytes),
            None => Ok(AlgorithmValue::Opaque(bytes.to_vec())),
        }
    }

    // --- Document Information ---

    /// Character encoding scheme from the header, `UTF-8` by default.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    pub fn xml_version(&self) -> Option<&str> {
        self.xml_version.as_deref()
    }

    /// Fast Infoset version from the binary header (0 for the pre-standard header).
    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub fn notations(&self) -> &[Notation] {
        &self.notations
    }

    pub fn unparsed_entities(&self) -> &[UnparsedEntity] {
        &self.unparsed_entities
    }

    // --- DTD und Entity References ---

    pub fn dtd_system_id(&self) -> Result<Option<&str>> {
        Ok(self.current_dtd()?.system_id.as_deref())
    }

    pub fn dtd_public_id(&self) -> Result<Option<&str>> {
        Ok(self.current_dtd()?.public_id.as_deref())
    }

    /// Processing instructions inside the document type declaration.
    pub fn dtd_instructions(&self) -> Result<&[ProcessingInstruction]> {
        Ok(&self.current_dtd()?.instructions)
    }

    pub fn entity_system_id(&self) -> Result<Option<&str>> {
        Ok(self.current_entity()?.system_id.as_deref())
    }

    pub fn entity_public_id(&self) -> Result<Option<&str>> {
        Ok(self.current_entity()?.public_id.as_deref())
    }

    fn current_dtd(&self) -> Result<&crate::event::DocumentTypeDeclaration> {
        self.dtd.as_ref().ok_or_else(|| Error::illegal_state("DTD", self.event))
    }
}
