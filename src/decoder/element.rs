//! Element, Attribute und Character Content (X.891 Anhang C.3 - C.18).

use std::cell::OnceCell;
use std::ops::Range;
use std::rc::Rc;

use log::trace;

use crate::alphabet;
use crate::attributes::Attribute;
use crate::byte_cursor::ByteSource;
use crate::constants::{
    BASE64, CDATA, CHARACTER_CHUNK_ADD_TO_TABLE_FLAG, CHARACTER_CHUNK_ENCODING_MASK,
    CHARACTER_CHUNK_RESTRICTED_ALPHABET, CHARACTER_CHUNK_UTF_16, CHARACTER_CHUNK_UTF_8,
    DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG, DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG,
    DOUBLE_TERMINATOR, ELEMENT_ATTRIBUTE_FLAG, ELEMENT_NAMESPACES_FLAG,
    INTEGER_2ND_BIT_MEDIUM_LIMIT, INTEGER_2ND_BIT_SMALL_LIMIT, INTEGER_3RD_BIT_LARGE_LIMIT,
    INTEGER_3RD_BIT_MEDIUM_LIMIT, INTEGER_3RD_BIT_SMALL_LIMIT, INTEGER_4TH_BIT_LARGE_LIMIT,
    INTEGER_4TH_BIT_MEDIUM_LIMIT, INTEGER_4TH_BIT_SMALL_LIMIT, NAMESPACE_ATTRIBUTE,
    NAMESPACE_ATTRIBUTE_MASK, NAMESPACE_ATTRIBUTE_PREFIX_NAME_MASK, PROCESSING_INSTRUCTION,
    TERMINATOR, UNEXPANDED_ENTITY_PUBLIC_IDENTIFIER_FLAG,
    UNEXPANDED_ENTITY_SYSTEM_IDENTIFIER_FLAG,
};
use crate::error::{Error, Result};
use crate::event::{DocumentTypeDeclaration, EntityReference, EventKind, ProcessingInstruction};
use crate::qname::QualifiedName;

use super::header::name_index;
use super::strings::{utf16, utf8, NonIdentifying};
use super::{AlgorithmBytes, AlgorithmData, Decoder, ElementFrame, State, Text};

impl<S: ByteSource> Decoder<S> {
    // ========================================================================
    // Element Information Item (C.3)
    // ========================================================================

    pub(super) fn element(&mut self, b: u8) -> Result<EventKind> {
        let has_attributes = b & ELEMENT_ATTRIBUTE_FLAG != 0;
        let start = self.namespaces.len();
        let name = if b & !ELEMENT_ATTRIBUTE_FLAG == ELEMENT_NAMESPACES_FLAG {
            self.namespace_attributes()?;
            let b = self.source.read()?;
            if b & ELEMENT_ATTRIBUTE_FLAG != 0 || b & 0x80 != 0 || b == ELEMENT_NAMESPACES_FLAG {
                return Err(Error::InvalidTag { byte: b, context: "element after namespace attributes" });
            }
            self.element_name(b)?
        } else {
            self.element_name(b & !ELEMENT_ATTRIBUTE_FLAG)?
        };
        let end = self.namespaces.len();
        self.start_element(name, has_attributes, start..end)
    }

    /// Elementname ab dem 3. Bit, `b` ohne Attribut-Flag.
    fn element_name(&mut self, b: u8) -> Result<Rc<QualifiedName>> {
        let index = match b {
            0x00..=0x1F => usize::from(b),
            0x20..=0x27 => ((usize::from(b & 0x07) << 8) | self.next()?) + INTEGER_3RD_BIT_SMALL_LIMIT,
            0x28..=0x2F => {
                let high = usize::from(b & 0x07) << 16;
                (high | (self.next()? << 8) | self.next()?) + INTEGER_3RD_BIT_MEDIUM_LIMIT
            }
            0x30 => {
                let high = (self.next()? & 0x0F) << 16;
                (high | (self.next()? << 8) | self.next()?) + INTEGER_3RD_BIT_LARGE_LIMIT
            }
            0x3C..=0x3F => {
                let name = Rc::new(self.literal_qname(b & 0x03)?);
                self.tables.element_names.add(Rc::clone(&name));
                return Ok(name);
            }
            _ => return Err(Error::InvalidTag { byte: b, context: "element" }),
        };
        self.tables.element_names.get(index).map(Rc::clone)
    }

    /// Literaler Qualified Name; Prefix und Namespace nur als Index.
    fn literal_qname(&mut self, pn: u8) -> Result<QualifiedName> {
        let (prefix, prefix_index, namespace, namespace_index) = match pn {
            0 => (Rc::clone(&self.empty), 0, Rc::clone(&self.empty), 0),
            1 => {
                let (i, namespace) = self.decode_namespace_name(false, false)?;
                (Rc::clone(&self.empty), 0, namespace, name_index(i))
            }
            2 => return Err(Error::malformed("literal qualified name with prefix but without namespace name")),
            _ => {
                let (p, prefix) = self.decode_prefix(false, true)?;
                let (n, namespace) = self.decode_namespace_name(false, true)?;
                (prefix, name_index(p), namespace, name_index(n))
            }
        };
        let local = self.identifying_string(|t| &mut t.local_names)?;
        Ok(QualifiedName::new(prefix, namespace, local, prefix_index, namespace_index))
    }

    /// Namespace Attributes (C.12), abgeschlossen durch 0xF0.
    fn namespace_attributes(&mut self) -> Result<()> {
        self.namespaces.begin_declarations();
        loop {
            let b = self.source.read()?;
            if b & NAMESPACE_ATTRIBUTE_MASK != NAMESPACE_ATTRIBUTE {
                if b != TERMINATOR {
                    return Err(Error::InvalidTag { byte: b, context: "namespace attributes" });
                }
                return Ok(());
            }
            let (slot, prefix, value, uri) = match b & NAMESPACE_ATTRIBUTE_PREFIX_NAME_MASK {
                // xmlns=""
                0 => (0, Rc::clone(&self.empty), 0, Rc::clone(&self.empty)),
                1 => {
                    let (n, uri) = self.decode_namespace_name(true, false)?;
                    (0, Rc::clone(&self.empty), name_index(n), uri)
                }
                // xmlns:p=""
                2 => {
                    let (p, prefix) = self.decode_prefix(true, false)?;
                    (p + 1, prefix, 0, Rc::clone(&self.empty))
                }
                _ => {
                    let (p, prefix) = self.decode_prefix(true, true)?;
                    let (n, uri) = self.decode_namespace_name(true, true)?;
                    (p + 1, prefix, name_index(n), uri)
                }
            };
            trace!("namespace declaration '{prefix}' -> '{uri}'");
            self.namespaces.declare(slot, prefix, value, uri)?;
        }
    }

    fn start_element(
        &mut self,
        name: Rc<QualifiedName>,
        has_attributes: bool,
        namespaces: Range<usize>,
    ) -> Result<EventKind> {
        if !self.namespaces.is_in_scope(name.prefix_index, name.namespace_index) {
            return Err(Error::NameNotInScope(name.raw.to_string()));
        }
        if has_attributes {
            self.attributes_of_element()?;
        }
        self.stack.push(ElementFrame { name: Rc::clone(&name), namespaces: namespaces.clone() });
        self.name = Some(name);
        self.current_namespaces = namespaces;
        Ok(EventKind::StartElement)
    }

    // ========================================================================
    // Attribute Information Items (C.4)
    // ========================================================================

    fn attributes_of_element(&mut self) -> Result<()> {
        self.verifier.begin_element();
        loop {
            let b = self.source.read()?;
            let name = match b {
                0x00..=0x3F => self.tables.attribute_names.get(usize::from(b)).map(Rc::clone)?,
                0x40..=0x5F => {
                    let index = ((usize::from(b & 0x1F) << 8) | self.next()?) + INTEGER_2ND_BIT_SMALL_LIMIT;
                    self.tables.attribute_names.get(index).map(Rc::clone)?
                }
                0x60..=0x6F => {
                    let high = usize::from(b & 0x0F) << 16;
                    let index = (high | (self.next()? << 8) | self.next()?) + INTEGER_2ND_BIT_MEDIUM_LIMIT;
                    self.tables.attribute_names.get(index).map(Rc::clone)?
                }
                0x78..=0x7B => {
                    let name = Rc::new(self.literal_qname(b & 0x03)?);
                    self.tables.attribute_names.add(Rc::clone(&name));
                    name
                }
                TERMINATOR => return Ok(()),
                DOUBLE_TERMINATOR => {
                    self.state = State::TerminateElement;
                    return Ok(());
                }
                _ => return Err(Error::InvalidTag { byte: b, context: "attributes" }),
            };
            if name.has_prefix() && !self.namespaces.is_in_scope(name.prefix_index, name.namespace_index) {
                return Err(Error::NameNotInScope(name.raw.to_string()));
            }
            self.verifier.check(&name)?;
            let (value, algorithm) = self.decode_attribute_value()?;
            self.attributes.push(Attribute { name, value, algorithm });
        }
    }

    // ========================================================================
    // Character Information Items (C.7, C.15)
    // ========================================================================

    pub(super) fn character_chunk(&mut self, b: u8) -> Result<EventKind> {
        if b >= 0xA0 {
            return self.indexed_character_chunk(b);
        }
        let add = b & CHARACTER_CHUNK_ADD_TO_TABLE_FLAG != 0;
        match b & CHARACTER_CHUNK_ENCODING_MASK {
            CHARACTER_CHUNK_UTF_8 => {
                let len = self.length_on_seventh_bit(b)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                self.scratch.push_str(utf8(self.source.slice(range))?);
            }
            CHARACTER_CHUNK_UTF_16 => {
                let len = self.length_on_seventh_bit(b)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                utf16(self.source.slice(range), &mut self.scratch)?;
            }
            CHARACTER_CHUNK_RESTRICTED_ALPHABET => {
                let b2 = self.source.read()?;
                let id = (u32::from(b & 0x03) << 6) | u32::from(b2 >> 2);
                let len = self.length_on_seventh_bit(b2)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                alphabet::decode(id, &self.tables.restricted_alphabets, self.source.slice(range), &mut self.scratch)?;
            }
            _ => return self.algorithm_chunk(b, add),
        }
        if add {
            self.tables.content_chunks.add(&self.scratch);
        }
        self.text = Text::Scratch;
        Ok(EventKind::Characters)
    }

    fn indexed_character_chunk(&mut self, b: u8) -> Result<EventKind> {
        let index = match b {
            0xA0..=0xAF => usize::from(b & 0x0F),
            0xB0..=0xB3 => ((usize::from(b & 0x03) << 8) | self.next()?) + INTEGER_4TH_BIT_SMALL_LIMIT,
            0xB4..=0xB7 => {
                let high = usize::from(b & 0x03) << 16;
                (high | (self.next()? << 8) | self.next()?) + INTEGER_4TH_BIT_MEDIUM_LIMIT
            }
            0xB8 => {
                let high = (self.next()? & 0x0F) << 16;
                (high | (self.next()? << 8) | self.next()?) + INTEGER_4TH_BIT_LARGE_LIMIT
            }
            _ => return Err(Error::InvalidTag { byte: b, context: "character chunk index" }),
        };
        let (start, len) = self.tables.content_chunks.range(index)?;
        self.text = Text::Content { start, len };
        Ok(EventKind::Characters)
    }

    fn algorithm_chunk(&mut self, b: u8, add: bool) -> Result<EventKind> {
        let b2 = self.source.read()?;
        let id = (u32::from(b & 0x03) << 6) | u32::from(b2 >> 2);
        let len = self.length_on_seventh_bit(b2)?;
        let range = self.source.take(len)?;
        let uri = self.check_algorithm(id, self.source.slice(range.clone()))?;
        let kind = if id == CDATA { EventKind::Cdata } else { EventKind::Characters };

        self.algorithm = Some(AlgorithmData {
            id,
            uri,
            bytes: AlgorithmBytes::Borrowed(range),
            base64_follows: false,
            text: OnceCell::new(),
        });
        if id == BASE64 {
            self.retain_algorithm_range(2);
            let follows = self.base64_follows()?;
            if let Some(data) = &mut self.algorithm {
                data.base64_follows = follows;
            }
        }
        self.text = Text::Algorithm;
        if add {
            // Tabelleneintrag braucht den Text sofort, inklusive Rest des vorigen base64-Chunks.
            let converted = self.algorithm_text()?.to_owned();
            self.tables.content_chunks.add(&converted);
        }
        Ok(kind)
    }

    // ========================================================================
    // Comment, PI, Entity Reference, DTD (C.5, C.6, C.8, C.9)
    // ========================================================================

    pub(super) fn comment(&mut self) -> Result<EventKind> {
        match self.non_identifying_string()? {
            NonIdentifying::Literal { add } => {
                if add {
                    self.tables.other_strings.add(&self.scratch);
                }
                self.text = Text::Scratch;
            }
            NonIdentifying::Index(i) => {
                let (start, len) = self.tables.other_strings.range(i)?;
                self.text = Text::OtherString { start, len };
            }
            NonIdentifying::Empty => {
                self.scratch.clear();
                self.text = Text::Scratch;
            }
            NonIdentifying::Algorithm { id, .. } => return Err(Error::ReservedAlgorithm(id)),
        }
        Ok(EventKind::Comment)
    }

    pub(super) fn processing_instruction(&mut self) -> Result<EventKind> {
        self.pi = Some(self.decode_processing_instruction()?);
        Ok(EventKind::ProcessingInstruction)
    }

    fn decode_processing_instruction(&mut self) -> Result<ProcessingInstruction> {
        let target = self.identifying_string(|t| &mut t.other_ncnames)?;
        let data = self.other_string()?;
        Ok(ProcessingInstruction { target, data })
    }

    pub(super) fn entity_reference(&mut self, b: u8) -> Result<EventKind> {
        let name = self.identifying_string(|t| &mut t.other_ncnames)?;
        let system_id = if b & UNEXPANDED_ENTITY_SYSTEM_IDENTIFIER_FLAG != 0 {
            Some(self.identifying_string(|t| &mut t.other_uris)?)
        } else {
            None
        };
        let public_id = if b & UNEXPANDED_ENTITY_PUBLIC_IDENTIFIER_FLAG != 0 {
            Some(self.identifying_string(|t| &mut t.other_uris)?)
        } else {
            None
        };
        self.entity = Some(EntityReference { name, system_id, public_id });
        Ok(EventKind::EntityReference)
    }

    pub(super) fn document_type_declaration(&mut self, b: u8) -> Result<EventKind> {
        if !self.stack.is_empty() {
            return Err(Error::InvalidTag { byte: b, context: "element content" });
        }
        let mut dtd = DocumentTypeDeclaration::default();
        if b & DOCUMENT_TYPE_SYSTEM_IDENTIFIER_FLAG != 0 {
            dtd.system_id = Some(self.identifying_string(|t| &mut t.other_uris)?);
        }
        if b & DOCUMENT_TYPE_PUBLIC_IDENTIFIER_FLAG != 0 {
            dtd.public_id = Some(self.identifying_string(|t| &mut t.other_uris)?);
        }
        loop {
            match self.source.read()? {
                PROCESSING_INSTRUCTION => {
                    let pi = self.decode_processing_instruction()?;
                    dtd.instructions.push(pi);
                }
                TERMINATOR => break,
                other => return Err(Error::InvalidTag { byte: other, context: "document type declaration" }),
            }
        }
        self.dtd = Some(dtd);
        Ok(EventKind::Dtd)
    }
}
