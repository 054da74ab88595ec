//! Decoder configuration.

use std::rc::Rc;

use crate::FastHashMap;
use crate::algorithm::{AlgorithmRegistry, EncodingAlgorithm};
use crate::byte_cursor::DEFAULT_BUFFER_SIZE;
use crate::string_table::Vocabulary;
use crate::{Error, Result};

/// Options controlling a [`Decoder`](crate::Decoder).
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    pub(crate) buffer_size: usize,
    pub(crate) maximum_table_entries: Option<usize>,
    pub(crate) algorithms: AlgorithmRegistry,
    pub(crate) external_vocabularies: FastHashMap<Rc<str>, Rc<Vocabulary>>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            maximum_table_entries: None,
            algorithms: AlgorithmRegistry::new(),
            external_vocabularies: FastHashMap::default(),
        }
    }
}

impl DecoderOptions {
    // --- Getter ---

    /// Number of bytes requested from the reader per refill.
    pub fn buffer_size(&self) -> usize { self.buffer_size }
    /// Upper bound for the attribute-value, content-chunk and other-string tables, `None` = unbounded.
    pub fn maximum_table_entries(&self) -> Option<usize> { self.maximum_table_entries }
    /// Application encoding algorithms by URI.
    pub fn algorithms(&self) -> &AlgorithmRegistry { &self.algorithms }
    /// Registered external vocabulary for `uri`.
    pub fn external_vocabulary(&self, uri: &str) -> Option<&Rc<Vocabulary>> { self.external_vocabularies.get(uri) }

    // --- Builder-Setter (Fluent API) ---

    /// Setzt die Puffergröße.
    pub fn with_buffer_size(mut self, size: usize) -> Self { self.buffer_size = size; self }
    /// Begrenzt die Tabellengröße.
    pub fn with_maximum_table_entries(mut self, max: usize) -> Self { self.maximum_table_entries = Some(max); self }
    /// Registriert einen Algorithmus.
    pub fn with_algorithm(mut self, uri: impl Into<Rc<str>>, codec: Rc<dyn EncodingAlgorithm>) -> Self {
        self.algorithms.register(uri, codec);
        self
    }
    /// Registriert ein externes Vokabular.
    pub fn with_external_vocabulary(mut self, uri: impl Into<Rc<str>>, vocabulary: Vocabulary) -> Self {
        self.register_external_vocabulary(uri, vocabulary);
        self
    }

    // --- Mutable Setter ---

    /// Registers an application encoding algorithm. Returns the previous codec.
    pub fn register_algorithm(
        &mut self,
        uri: impl Into<Rc<str>>,
        codec: Rc<dyn EncodingAlgorithm>,
    ) -> Option<Rc<dyn EncodingAlgorithm>> {
        self.algorithms.register(uri, codec)
    }

    /// Registers an external vocabulary referenced from document headers.
    pub fn register_external_vocabulary(&mut self, uri: impl Into<Rc<str>>, vocabulary: Vocabulary) {
        self.external_vocabularies.insert(uri.into(), Rc::new(vocabulary));
    }

    /// Setzt die Puffergröße.
    pub fn set_buffer_size(&mut self, size: usize) { self.buffer_size = size; }
    /// Setzt die Tabellengrenze.
    pub fn set_maximum_table_entries(&mut self, max: Option<usize>) { self.maximum_table_entries = max; }

    /// Checks the option values.
    ///
    /// # Errors
    ///
    /// `MalformedInput` wenn `buffer_size` oder `maximum_table_entries` 0 ist.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::malformed("buffer size must be greater than zero"));
        }
        if self.maximum_table_entries == Some(0) {
            return Err(Error::malformed("maximum table entries must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::BuiltInAlgorithm;

    #[test]
    fn defaults() {
        let o = DecoderOptions::default();
        assert_eq!(o.buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(o.maximum_table_entries(), None);
        assert!(o.algorithms().is_empty());
        assert!(o.validate().is_ok());
    }

    #[test]
    fn builder() {
        let mut v = Vocabulary::new();
        v.add_element_name("", "", "root");
        let o = DecoderOptions::default()
            .with_buffer_size(64)
            .with_maximum_table_entries(10)
            .with_algorithm("urn:hex", Rc::new(BuiltInAlgorithm::Hexadecimal))
            .with_external_vocabulary("urn:voc", v);
        assert_eq!(o.buffer_size(), 64);
        assert_eq!(o.maximum_table_entries(), Some(10));
        assert!(o.algorithms().get("urn:hex").is_some());
        assert_eq!(o.external_vocabulary("urn:voc").unwrap().element_names().len(), 1);
        assert!(o.external_vocabulary("urn:other").is_none());
    }

    #[test]
    fn validate_rejects_zero() {
        assert!(DecoderOptions::default().with_buffer_size(0).validate().is_err());
        assert!(DecoderOptions::default().with_maximum_table_entries(0).validate().is_err());
    }
}
