//! Strings, Längen und Indizes (X.891 Anhang C.13 - C.29).

use std::ops::Range;
use std::rc::Rc;

use crate::algorithm::{BuiltInAlgorithm, EncodingAlgorithm};
use crate::alphabet;
use crate::byte_cursor::ByteSource;
use crate::constants::{
    BASE64, CDATA, ENCODING_ALGORITHM_APPLICATION_START, INTEGER_2ND_BIT_MEDIUM_LIMIT,
    INTEGER_2ND_BIT_SMALL_LIMIT, NISTRING_ADD_TO_TABLE_FLAG, NISTRING_EMPTY_STRING,
    NISTRING_ENCODING_MASK, NISTRING_RESTRICTED_ALPHABET, NISTRING_UTF_16, NISTRING_UTF_8,
    OCTET_STRING_LENGTH_2ND_BIT_MEDIUM_LIMIT, OCTET_STRING_LENGTH_2ND_BIT_SMALL_LIMIT,
    OCTET_STRING_LENGTH_5TH_BIT_MEDIUM_LIMIT, OCTET_STRING_LENGTH_5TH_BIT_SMALL_LIMIT,
    OCTET_STRING_LENGTH_7TH_BIT_MEDIUM_LIMIT, OCTET_STRING_LENGTH_7TH_BIT_SMALL_LIMIT,
    XMLNS_NAMESPACE, XMLNS_PREFIX, XML_NAMESPACE, XML_PREFIX,
};
use crate::error::{Error, Result};
use crate::options::DecoderOptions;
use crate::string_table::{StringTable, StringTables};

use super::Decoder;

/// Ergebnis eines Non-Identifying String.
pub(super) enum NonIdentifying {
    /// Zeichen liegen in `scratch`.
    Literal { add: bool },
    Algorithm { add: bool, id: u32, range: Range<usize> },
    Index(usize),
    Empty,
}

/// Auswahl einer String-Tabelle für Identifying Strings.
pub(super) type TableSelector = fn(&mut StringTables) -> &mut StringTable;

pub(super) fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::InvalidCharacter(format!("invalid UTF-8: {e}").into()))
}

/// UTF-16BE, unpaarige Surrogates sind ein Fehler.
pub(super) fn utf16(bytes: &[u8], out: &mut String) -> Result<()> {
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidCharacter("UTF-16 octet string of odd length".into()));
    }
    let units = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
    for c in char::decode_utf16(units) {
        let c = c.map_err(|e| Error::InvalidCharacter(format!("unpaired surrogate 0x{:04X}", e.unpaired_surrogate()).into()))?;
        out.push(c);
    }
    Ok(())
}

/// Converts algorithm data to characters.
///
/// Ids >= 32 werden über die Algorithmus-Tabelle des Dokuments aufgelöst;
/// ohne registrierten Codec wird base64 ausgegeben.
pub(super) fn algorithm_to_text(
    tables: &StringTables,
    options: &DecoderOptions,
    id: u32,
    bytes: &[u8],
    out: &mut String,
) -> Result<()> {
    if let Some(built_in) = BuiltInAlgorithm::from_id(id) {
        return built_in.to_text(bytes, out);
    }
    let uri = algorithm_uri(tables, id)?;
    match options.algorithms().get(&uri) {
        Some(codec) => codec.to_text(bytes, out),
        None => BuiltInAlgorithm::Base64.to_text(bytes, out),
    }
}

/// URI for an application algorithm id, `ReservedAlgorithm` for 10..=31.
pub(super) fn algorithm_uri(tables: &StringTables, id: u32) -> Result<Rc<str>> {
    if id < ENCODING_ALGORITHM_APPLICATION_START {
        return Err(Error::ReservedAlgorithm(id));
    }
    let index = (id - ENCODING_ALGORITHM_APPLICATION_START) as usize;
    tables
        .encoding_algorithms
        .get(index)
        .map(Rc::clone)
        .map_err(|_| Error::malformed(format!("encoding algorithm {id} has no URI in the vocabulary")))
}

impl<S: ByteSource> Decoder<S> {
    #[inline]
    pub(super) fn next(&mut self) -> Result<usize> {
        Ok(usize::from(self.source.read()?))
    }

    /// Zwei Folgebytes, big-endian.
    #[inline]
    fn next_u16(&mut self) -> Result<usize> {
        Ok((self.next()? << 8) | self.next()?)
    }

    fn large_length(&mut self, limit: usize) -> Result<usize> {
        let v = self.source.read_u32()?;
        usize::try_from(v)
            .ok()
            .and_then(|v| v.checked_add(limit))
            .ok_or_else(|| Error::malformed("octet string length overflows"))
    }

    // ========================================================================
    // Integer
    // ========================================================================

    /// Index ab dem 2. Bit (C.25), `b` ist das erste Byte inklusive Bit 1.
    pub(super) fn identifying_index(&mut self, b: u8) -> Result<usize> {
        match b {
            0x80..=0xBF => Ok(usize::from(b & 0x3F)),
            0xC0..=0xDF => {
                Ok(((usize::from(b & 0x1F) << 8) | self.next()?) + INTEGER_2ND_BIT_SMALL_LIMIT)
            }
            0xE0..=0xEF => {
                Ok(((usize::from(b & 0x0F) << 16) | self.next_u16()?) + INTEGER_2ND_BIT_MEDIUM_LIMIT)
            }
            _ => Err(Error::InvalidTag { byte: b, context: "index" }),
        }
    }

    /// Index ab dem 2. Bit, das erste Bit ist Padding.
    pub(super) fn index_on_second_bit(&mut self) -> Result<usize> {
        let b = self.source.read()? | 0x80;
        self.identifying_index(b)
    }

    /// Länge einer Sequenz (C.21).
    pub(super) fn sequence_length(&mut self) -> Result<usize> {
        let b = self.source.read()?;
        if b < 0x80 {
            return Ok(usize::from(b) + 1);
        }
        if b & 0x70 != 0 {
            return Err(Error::InvalidTag { byte: b, context: "sequence length" });
        }
        Ok(((usize::from(b & 0x0F) << 16) | self.next_u16()?) + 129)
    }

    // ========================================================================
    // Längen
    // ========================================================================

    /// Länge eines Octet String ab dem 2. Bit (C.22).
    pub(super) fn length_on_second_bit(&mut self, b: u8) -> Result<usize> {
        match b {
            0x00..=0x3F => Ok(usize::from(b) + 1),
            0x40 => Ok(self.next()? + OCTET_STRING_LENGTH_2ND_BIT_SMALL_LIMIT),
            0x60 => self.large_length(OCTET_STRING_LENGTH_2ND_BIT_MEDIUM_LIMIT),
            _ => Err(Error::InvalidTag { byte: b, context: "octet string length" }),
        }
    }

    /// Länge ab dem 5. Bit (C.23), nur die unteren 4 Bit von `b` zählen.
    pub(super) fn length_on_fifth_bit(&mut self, b: u8) -> Result<usize> {
        match b & 0x0F {
            n @ 0x00..=0x07 => Ok(usize::from(n) + 1),
            0x08 => Ok(self.next()? + OCTET_STRING_LENGTH_5TH_BIT_SMALL_LIMIT),
            0x0C => self.large_length(OCTET_STRING_LENGTH_5TH_BIT_MEDIUM_LIMIT),
            _ => Err(Error::InvalidTag { byte: b, context: "octet string length" }),
        }
    }

    /// Länge ab dem 7. Bit (C.24), nur die unteren 2 Bit von `b` zählen.
    pub(super) fn length_on_seventh_bit(&mut self, b: u8) -> Result<usize> {
        match b & 0x03 {
            n @ (0x00 | 0x01) => Ok(usize::from(n) + 1),
            0x02 => Ok(self.next()? + OCTET_STRING_LENGTH_7TH_BIT_SMALL_LIMIT),
            _ => self.large_length(OCTET_STRING_LENGTH_7TH_BIT_MEDIUM_LIMIT),
        }
    }

    // ========================================================================
    // Identifying Strings (C.13)
    // ========================================================================

    /// Literal, dessen erstes Byte `b` schon gelesen ist.
    pub(super) fn identifying_literal(&mut self, b: u8) -> Result<Rc<str>> {
        let len = self.length_on_second_bit(b)?;
        let range = self.source.take(len)?;
        Ok(utf8(self.source.slice(range))?.into())
    }

    /// Octet String ab dem 2. Bit als UTF-8 (Header-Felder).
    pub(super) fn octet_string_utf8(&mut self) -> Result<Rc<str>> {
        let b = self.source.read()? & 0x7F;
        self.identifying_literal(b)
    }

    /// Literal oder Index in die gewählte Tabelle; Literale werden immer hinzugefügt.
    pub(super) fn identifying_string(&mut self, table: TableSelector) -> Result<Rc<str>> {
        let b = self.source.read()?;
        if b & 0x80 == 0 {
            let value = self.identifying_literal(b)?;
            table(&mut self.tables).add(Rc::clone(&value));
            return Ok(value);
        }
        let index = self.identifying_index(b)?;
        table(&mut self.tables).get(index).map(Rc::clone)
    }

    /// Prefix, liefert (Wire-Index, Prefix).
    ///
    /// Index 0 (`xml`) ist nur mit Namespace erlaubt, und dieser muss ebenfalls
    /// Index 0 sein.
    pub(super) fn decode_prefix(&mut self, literal: bool, namespace_present: bool) -> Result<(usize, Rc<str>)> {
        let b = self.source.read()?;
        if b & 0x80 == 0 {
            if !literal {
                return Err(Error::malformed("prefix of a literal qualified name must be an index"));
            }
            let value = self.identifying_literal(b)?;
            if &*value == XML_PREFIX || &*value == XMLNS_PREFIX {
                return Err(Error::malformed(format!("literal prefix '{value}' is not allowed")));
            }
            let index = self.tables.add_prefix(Rc::clone(&value));
            return Ok((index, value));
        }
        let index = self.identifying_index(b)?;
        if index == 0 && (!namespace_present || self.source.peek()? != 0x80) {
            return Err(Error::malformed("the xml prefix requires the XML namespace"));
        }
        Ok((index, self.tables.prefix(index)?))
    }

    /// Namespace-Name, liefert (Wire-Index, URI).
    pub(super) fn decode_namespace_name(&mut self, literal: bool, prefix_present: bool) -> Result<(usize, Rc<str>)> {
        let b = self.source.read()?;
        if b & 0x80 == 0 {
            if !literal {
                return Err(Error::malformed("namespace name of a literal qualified name must be an index"));
            }
            let value = self.identifying_literal(b)?;
            if &*value == XML_NAMESPACE || &*value == XMLNS_NAMESPACE {
                return Err(Error::malformed(format!("literal namespace name '{value}' is not allowed")));
            }
            let index = self.tables.add_namespace_name(Rc::clone(&value));
            return Ok((index, value));
        }
        let index = self.identifying_index(b)?;
        if index == 0 && !prefix_present {
            return Err(Error::malformed("the XML namespace requires the xml prefix"));
        }
        Ok((index, self.tables.namespace_name(index)?))
    }

    // ========================================================================
    // Non-Identifying Strings (C.14, C.19)
    // ========================================================================

    /// Non-Identifying String ab dem 1. Bit.
    pub(super) fn non_identifying_string(&mut self) -> Result<NonIdentifying> {
        let b = self.source.read()?;
        if b == NISTRING_EMPTY_STRING {
            return Ok(NonIdentifying::Empty);
        }
        if b & 0x80 != 0 {
            return Ok(NonIdentifying::Index(self.identifying_index(b)?));
        }
        let add = b & NISTRING_ADD_TO_TABLE_FLAG != 0;
        match b & NISTRING_ENCODING_MASK {
            NISTRING_UTF_8 => {
                let len = self.length_on_fifth_bit(b)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                self.scratch.push_str(utf8(self.source.slice(range))?);
            }
            NISTRING_UTF_16 => {
                let len = self.length_on_fifth_bit(b)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                utf16(self.source.slice(range), &mut self.scratch)?;
            }
            NISTRING_RESTRICTED_ALPHABET => {
                let b2 = self.source.read()?;
                let id = (u32::from(b & 0x0F) << 4) | u32::from(b2 >> 4);
                let len = self.length_on_fifth_bit(b2)?;
                let range = self.source.take(len)?;
                self.scratch.clear();
                alphabet::decode(id, &self.tables.restricted_alphabets, self.source.slice(range), &mut self.scratch)?;
            }
            _ => {
                let b2 = self.source.read()?;
                let id = (u32::from(b & 0x0F) << 4) | u32::from(b2 >> 4);
                let len = self.length_on_fifth_bit(b2)?;
                let range = self.source.take(len)?;
                return Ok(NonIdentifying::Algorithm { add, id, range });
            }
        }
        Ok(NonIdentifying::Literal { add })
    }

    /// Non-Identifying String aus der Other-String-Tabelle (PI-Daten, Version).
    ///
    /// Encoding Algorithms sind hier nicht erlaubt.
    pub(super) fn other_string(&mut self) -> Result<Rc<str>> {
        match self.non_identifying_string()? {
            NonIdentifying::Literal { add } => {
                if add {
                    self.tables.other_strings.add(&self.scratch);
                }
                Ok(self.scratch.as_str().into())
            }
            NonIdentifying::Index(i) => Ok(self.tables.other_strings.get(i)?.into()),
            NonIdentifying::Empty => Ok(Rc::clone(&self.empty)),
            NonIdentifying::Algorithm { id, .. } => Err(Error::ReservedAlgorithm(id)),
        }
    }

    /// Attributwert; Algorithmus-Daten werden sofort in Text umgewandelt.
    pub(super) fn decode_attribute_value(&mut self) -> Result<(Rc<str>, Option<u32>)> {
        match self.non_identifying_string()? {
            NonIdentifying::Literal { add } => {
                let value: Rc<str> = self.scratch.as_str().into();
                if add {
                    self.tables.attribute_values.add(Rc::clone(&value));
                }
                Ok((value, None))
            }
            NonIdentifying::Algorithm { add, id, range } => {
                if id == CDATA {
                    return Err(Error::ReservedAlgorithm(id));
                }
                self.scratch.clear();
                algorithm_to_text(&self.tables, &self.options, id, self.source.slice(range), &mut self.scratch)?;
                let value: Rc<str> = self.scratch.as_str().into();
                if add {
                    self.tables.attribute_values.add(Rc::clone(&value));
                }
                Ok((value, Some(id)))
            }
            NonIdentifying::Index(i) => Ok((Rc::clone(self.tables.attribute_values.get(i)?), None)),
            NonIdentifying::Empty => Ok((Rc::clone(&self.empty), None)),
        }
    }

    /// Checks algorithm data during decoding: built-ins by content, others by URI.
    pub(super) fn check_algorithm(&self, id: u32, bytes: &[u8]) -> Result<Option<Rc<str>>> {
        match BuiltInAlgorithm::from_id(id) {
            Some(built_in) => built_in.validate(bytes).map(|()| None),
            None => algorithm_uri(&self.tables, id).map(Some),
        }
    }

    /// Folgt als nächstes ein base64-kodierter Character Chunk?
    pub(super) fn base64_follows(&mut self) -> Result<bool> {
        let Some(b) = self.source.try_peek()? else {
            return Ok(false);
        };
        // CII mit Encoding Algorithm: 100a 11ii
        if b & 0xEC != 0x8C {
            return Ok(false);
        }
        match self.source.peek2() {
            Ok(b2) => Ok(((u32::from(b & 0x03) << 6) | u32::from(b2 >> 2)) == BASE64),
            Err(Error::UnexpectedEndOfInput) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
