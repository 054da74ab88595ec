//! Header und Document Information Item (X.891 Abschnitt 12, C.1 - C.2).

use std::rc::Rc;

use log::{debug, trace};

use crate::byte_cursor::ByteSource;
use crate::constants::{
    BINARY_HEADER, BINARY_HEADER_V0, DOCUMENT_ADDITIONAL_DATA_FLAG,
    DOCUMENT_CHARACTER_ENCODING_SCHEME, DOCUMENT_INITIAL_VOCABULARY_FLAG,
    DOCUMENT_NOTATIONS_FLAG, DOCUMENT_STANDALONE_FLAG, DOCUMENT_UNPARSED_ENTITIES_FLAG,
    DOCUMENT_VERSION_FLAG, INITIAL_VOCABULARY_ATTRIBUTE_NAME_SURROGATES_FLAG,
    INITIAL_VOCABULARY_ATTRIBUTE_VALUES_FLAG, INITIAL_VOCABULARY_CONTENT_CHARACTER_CHUNKS_FLAG,
    INITIAL_VOCABULARY_ELEMENT_NAME_SURROGATES_FLAG, INITIAL_VOCABULARY_ENCODING_ALGORITHMS_FLAG,
    INITIAL_VOCABULARY_EXTERNAL_VOCABULARY_FLAG, INITIAL_VOCABULARY_LOCAL_NAMES_FLAG,
    INITIAL_VOCABULARY_NAMESPACE_NAMES_FLAG, INITIAL_VOCABULARY_OTHER_NCNAMES_FLAG,
    INITIAL_VOCABULARY_OTHER_STRINGS_FLAG, INITIAL_VOCABULARY_OTHER_URIS_FLAG,
    INITIAL_VOCABULARY_PREFIXES_FLAG, INITIAL_VOCABULARY_RESTRICTED_ALPHABETS_FLAG,
    NAME_SURROGATE_NAME_FLAG, NAME_SURROGATE_PREFIX_FLAG, NOTATIONS, NOTATIONS_MASK,
    NOTATIONS_PUBLIC_IDENTIFIER_FLAG, NOTATIONS_SYSTEM_IDENTIFIER_FLAG, TERMINATOR,
    UNPARSED_ENTITIES, UNPARSED_ENTITIES_MASK, UNPARSED_ENTITIES_PUBLIC_IDENTIFIER_FLAG,
    XML_DECLARATION_MAX_LENGTH, XML_DECLARATION_START,
};
use crate::error::{Error, Result};
use crate::event::{Notation, UnparsedEntity};
use crate::qname::QualifiedName;
use crate::string_table::StringTable;

use super::strings::{NonIdentifying, TableSelector};
use super::Decoder;

impl<S: ByteSource> Decoder<S> {
    /// Header inklusive Document Information Item.
    pub(super) fn decode_header(&mut self) -> Result<()> {
        self.skip_xml_declaration()?;
        let magic = self.source.take(4)?;
        self.format_version = match self.source.slice(magic) {
            m if m == BINARY_HEADER => 1,
            m if m == BINARY_HEADER_V0 => 0,
            _ => return Err(Error::malformed("not a Fast Infoset document (bad identification)")),
        };

        let dii = self.source.read()?;
        if dii & 0x80 != 0 {
            return Err(Error::InvalidTag { byte: dii, context: "document information" });
        }
        if dii & DOCUMENT_ADDITIONAL_DATA_FLAG != 0 {
            self.additional_data()?;
        }
        if dii & DOCUMENT_INITIAL_VOCABULARY_FLAG != 0 {
            self.initial_vocabulary()?;
        }
        if dii & DOCUMENT_NOTATIONS_FLAG != 0 {
            self.notations_in_header()?;
        }
        if dii & DOCUMENT_UNPARSED_ENTITIES_FLAG != 0 {
            self.unparsed_entities_in_header()?;
        }
        if dii & DOCUMENT_CHARACTER_ENCODING_SCHEME != 0 {
            self.encoding = self.octet_string_utf8()?;
        }
        if dii & DOCUMENT_STANDALONE_FLAG != 0 {
            self.standalone = Some(self.source.read()? > 0);
        }
        if dii & DOCUMENT_VERSION_FLAG != 0 {
            self.xml_version = Some(self.other_string()?);
        }
        debug!(
            "header: version {}, encoding {}, {} element names, {} attribute names",
            self.format_version,
            self.encoding,
            self.tables.element_names.len(),
            self.tables.attribute_names.len()
        );
        Ok(())
    }

    /// Überspringt `<?xml ... ?>` vor dem binären Header.
    fn skip_xml_declaration(&mut self) -> Result<()> {
        if self.source.peek()? != b'<' {
            return Ok(());
        }
        let mut declaration = Vec::with_capacity(XML_DECLARATION_MAX_LENGTH);
        while !declaration.ends_with(b"?>") {
            if declaration.len() >= XML_DECLARATION_MAX_LENGTH {
                return Err(Error::malformed("XML declaration in front of the header too long"));
            }
            declaration.push(self.source.read()?);
        }
        if !declaration.starts_with(XML_DECLARATION_START)
            || memchr::memmem::find(&declaration, b"finf").is_none()
        {
            return Err(Error::malformed("XML declaration does not announce Fast Infoset"));
        }
        trace!("skipped XML declaration ({} bytes)", declaration.len());
        Ok(())
    }

    /// Zusätzliche Daten werden gelesen und verworfen.
    fn additional_data(&mut self) -> Result<()> {
        let count = self.sequence_length()?;
        for _ in 0..count {
            let id = self.octet_string_utf8()?;
            let b = self.source.read()? & 0x7F;
            let len = self.length_on_second_bit(b)?;
            self.source.take(len)?;
            trace!("skipped additional data '{id}' ({len} bytes)");
        }
        Ok(())
    }

    // ========================================================================
    // Initial Vocabulary (C.2.5)
    // ========================================================================

    fn initial_vocabulary(&mut self) -> Result<()> {
        let b1 = self.source.read()?;
        let b2 = self.source.read()?;

        if b1 & INITIAL_VOCABULARY_EXTERNAL_VOCABULARY_FLAG != 0 {
            let uri = self.octet_string_utf8()?;
            let vocabulary = self
                .options
                .external_vocabulary(&uri)
                .map(Rc::clone)
                .ok_or_else(|| Error::malformed(format!("external vocabulary '{uri}' is not registered")))?;
            self.tables.import(&vocabulary);
            debug!("imported external vocabulary '{uri}'");
        }

        let lists: [(bool, TableSelector); 8] = [
            (b1 & INITIAL_VOCABULARY_RESTRICTED_ALPHABETS_FLAG != 0, |t| &mut t.restricted_alphabets),
            (b1 & INITIAL_VOCABULARY_ENCODING_ALGORITHMS_FLAG != 0, |t| &mut t.encoding_algorithms),
            (b1 & INITIAL_VOCABULARY_PREFIXES_FLAG != 0, |t| &mut t.prefixes),
            (b1 & INITIAL_VOCABULARY_NAMESPACE_NAMES_FLAG != 0, |t| &mut t.namespace_names),
            (b2 & INITIAL_VOCABULARY_LOCAL_NAMES_FLAG != 0, |t| &mut t.local_names),
            (b2 & INITIAL_VOCABULARY_OTHER_NCNAMES_FLAG != 0, |t| &mut t.other_ncnames),
            (b2 & INITIAL_VOCABULARY_OTHER_URIS_FLAG != 0, |t| &mut t.other_uris),
            (b2 & INITIAL_VOCABULARY_ATTRIBUTE_VALUES_FLAG != 0, |t| &mut t.attribute_values),
        ];
        for (present, table) in lists {
            if present {
                self.string_list(table)?;
            }
        }
        if b2 & INITIAL_VOCABULARY_CONTENT_CHARACTER_CHUNKS_FLAG != 0 {
            let count = self.sequence_length()?;
            for _ in 0..count {
                self.literal_only("content character chunk")?;
                self.tables.content_chunks.add(&self.scratch);
            }
        }
        if b2 & INITIAL_VOCABULARY_OTHER_STRINGS_FLAG != 0 {
            let count = self.sequence_length()?;
            for _ in 0..count {
                self.literal_only("other string")?;
                self.tables.other_strings.add(&self.scratch);
            }
        }
        if b2 & INITIAL_VOCABULARY_ELEMENT_NAME_SURROGATES_FLAG != 0 {
            self.name_surrogates(false)?;
        }
        if b2 & INITIAL_VOCABULARY_ATTRIBUTE_NAME_SURROGATES_FLAG != 0 {
            self.name_surrogates(true)?;
        }
        Ok(())
    }

    fn string_list(&mut self, table: TableSelector) -> Result<()> {
        let count = self.sequence_length()?;
        for _ in 0..count {
            let value = self.octet_string_utf8()?;
            let target: &mut StringTable = table(&mut self.tables);
            target.add(value);
        }
        Ok(())
    }

    /// Initiale Content Chunks und Other Strings müssen Literale sein.
    fn literal_only(&mut self, what: &'static str) -> Result<()> {
        match self.non_identifying_string()? {
            NonIdentifying::Literal { .. } => Ok(()),
            NonIdentifying::Empty => {
                self.scratch.clear();
                Ok(())
            }
            _ => Err(Error::malformed(format!("initial vocabulary {what} must be a literal"))),
        }
    }

    /// Name Surrogates: (Prefix?, Namespace?, Local Name) als Indizes.
    fn name_surrogates(&mut self, attributes: bool) -> Result<()> {
        let count = self.sequence_length()?;
        for _ in 0..count {
            let flags = self.source.read()?;
            let (prefix, prefix_index) = if flags & NAME_SURROGATE_PREFIX_FLAG != 0 {
                let i = self.index_on_second_bit()?;
                (self.tables.prefix(i)?, name_index(i))
            } else {
                (Rc::clone(&self.empty), 0)
            };
            let (namespace, namespace_index) = if flags & NAME_SURROGATE_NAME_FLAG != 0 {
                let i = self.index_on_second_bit()?;
                (self.tables.namespace_name(i)?, name_index(i))
            } else {
                (Rc::clone(&self.empty), 0)
            };
            if prefix_index > 0 && namespace_index == 0 {
                return Err(Error::malformed("name surrogate with prefix but without namespace name"));
            }
            let local_index = self.index_on_second_bit()?;
            let local = Rc::clone(self.tables.local_names.get(local_index)?);
            let name = Rc::new(QualifiedName::new(prefix, namespace, local, prefix_index, namespace_index));
            if attributes {
                self.tables.attribute_names.add(name);
            } else {
                self.tables.element_names.add(name);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Notations und Unparsed Entities (C.2.8, C.2.9)
    // ========================================================================

    fn notations_in_header(&mut self) -> Result<()> {
        loop {
            let b = self.source.read()?;
            if b == TERMINATOR {
                return Ok(());
            }
            if b & NOTATIONS_MASK != NOTATIONS {
                return Err(Error::InvalidTag { byte: b, context: "notations" });
            }
            let name = self.identifying_string(|t| &mut t.other_ncnames)?;
            let system_id = if b & NOTATIONS_SYSTEM_IDENTIFIER_FLAG != 0 {
                Some(self.identifying_string(|t| &mut t.other_uris)?)
            } else {
                None
            };
            let public_id = if b & NOTATIONS_PUBLIC_IDENTIFIER_FLAG != 0 {
                Some(self.identifying_string(|t| &mut t.other_uris)?)
            } else {
                None
            };
            self.notations.push(Notation { name, system_id, public_id });
        }
    }

    fn unparsed_entities_in_header(&mut self) -> Result<()> {
        loop {
            let b = self.source.read()?;
            if b == TERMINATOR {
                return Ok(());
            }
            if b & UNPARSED_ENTITIES_MASK != UNPARSED_ENTITIES {
                return Err(Error::InvalidTag { byte: b, context: "unparsed entities" });
            }
            let name = self.identifying_string(|t| &mut t.other_ncnames)?;
            let system_id = self.identifying_string(|t| &mut t.other_uris)?;
            let public_id = if b & UNPARSED_ENTITIES_PUBLIC_IDENTIFIER_FLAG != 0 {
                Some(self.identifying_string(|t| &mut t.other_uris)?)
            } else {
                None
            };
            let notation_name = self.identifying_string(|t| &mut t.other_ncnames)?;
            self.unparsed_entities.push(UnparsedEntity { name, system_id, public_id, notation_name });
        }
    }
}

/// Gespeicherter Namensindex ("plus eins") für einen Wire-Index.
pub(super) fn name_index(wire: usize) -> u32 {
    u32::try_from(wire).map_or(u32::MAX, |i| i.saturating_add(1))
}
