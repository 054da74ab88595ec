//! Vocabulary tables (X.891 Abschnitt 8).
//!
//! Jede Tabelle ist append-only während eines Dokuments und wird über einen
//! 0-basierten Index adressiert. Gelöscht wird nur komplett, beim Reset bzw.
//! nach einem Decode-Fehler.
//!
//! Sonderfälle:
//! - Prefix- und Namespace-Name-Tabelle haben einen impliziten Eintrag 0
//!   (`xml` bzw. der XML-Namespace). Wire-Index `k >= 1` adressiert den k-ten
//!   hinzugefügten Eintrag.
//! - Content-Chunks und "other strings" liegen zusammenhängend in einem
//!   String-Puffer; ein Eintrag ist (offset, len).

use std::rc::Rc;

use log::{trace, warn};

use crate::constants::{XML_NAMESPACE, XML_PREFIX};
use crate::qname::QualifiedName;
use crate::{Error, Result};

/// Index-addressed append-only table.
#[derive(Debug, Clone)]
pub struct Table<T> {
    name: &'static str,
    entries: Vec<T>,
    maximum: usize,
}

/// Table of strings.
pub type StringTable = Table<Rc<str>>;
/// Table of qualified names (element and attribute names).
pub type QNameTable = Table<Rc<QualifiedName>>;

impl<T: Clone> Table<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, entries: Vec::new(), maximum: usize::MAX }
    }

    /// Returns the entry at `index` or a `IndexOutOfRange` fault.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        self.entries.get(index).ok_or(Error::IndexOutOfRange {
            table: self.name,
            index,
            len: self.entries.len(),
        })
    }

    /// Appends an entry. Returns its index, or `None` if the table is full.
    pub fn add(&mut self, value: T) -> Option<usize> {
        if self.entries.len() >= self.maximum {
            warn!("{} table full ({} entries), entry dropped", self.name, self.maximum);
            return None;
        }
        self.entries.push(value);
        trace!("{} table: added entry {}", self.name, self.entries.len() - 1);
        Some(self.entries.len() - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn set_maximum(&mut self, maximum: usize) {
        self.maximum = maximum;
    }
}

/// Character data table backed by one contiguous string buffer.
#[derive(Debug, Clone)]
pub struct ContentTable {
    name: &'static str,
    buffer: String,
    /// (offset, len) in Bytes.
    entries: Vec<(usize, usize)>,
    maximum: usize,
}

impl ContentTable {
    pub fn new(name: &'static str) -> Self {
        Self { name, buffer: String::new(), entries: Vec::new(), maximum: usize::MAX }
    }

    /// Appends `text`. Returns its index, or `None` if the table is full.
    pub fn add(&mut self, text: &str) -> Option<usize> {
        if self.entries.len() >= self.maximum {
            warn!("{} table full ({} entries), entry dropped", self.name, self.maximum);
            return None;
        }
        let offset = self.buffer.len();
        self.buffer.push_str(text);
        self.entries.push((offset, text.len()));
        Some(self.entries.len() - 1)
    }

    /// Returns `(offset, len)` of entry `index` inside [`buffer`](Self::buffer).
    #[inline]
    pub fn range(&self, index: usize) -> Result<(usize, usize)> {
        self.entries.get(index).copied().ok_or(Error::IndexOutOfRange {
            table: self.name,
            index,
            len: self.entries.len(),
        })
    }

    pub fn get(&self, index: usize) -> Result<&str> {
        let (offset, len) = self.range(index)?;
        Ok(&self.buffer[offset..offset + len])
    }

    /// The contiguous backing buffer.
    #[inline]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.entries.clear();
    }

    pub(crate) fn set_maximum(&mut self, maximum: usize) {
        self.maximum = maximum;
    }
}

/// Externally defined vocabulary, registered by URI on
/// [`DecoderOptions`](crate::DecoderOptions).
///
/// Namen werden über [`add_element_name`](Self::add_element_name) bzw.
/// [`add_attribute_name`](Self::add_attribute_name) angelegt; fehlende Prefixe,
/// Namespaces und Local Names werden dabei automatisch ergänzt.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub restricted_alphabets: Vec<Rc<str>>,
    pub encoding_algorithms: Vec<Rc<str>>,
    pub prefixes: Vec<Rc<str>>,
    pub namespace_names: Vec<Rc<str>>,
    pub local_names: Vec<Rc<str>>,
    pub other_ncnames: Vec<Rc<str>>,
    pub other_uris: Vec<Rc<str>>,
    pub attribute_values: Vec<Rc<str>>,
    pub content_chunks: Vec<Rc<str>>,
    pub other_strings: Vec<Rc<str>>,
    element_names: Vec<QualifiedName>,
    attribute_names: Vec<QualifiedName>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element_name(&mut self, prefix: &str, namespace: &str, local: &str) -> &mut Self {
        let name = self.make_name(prefix, namespace, local);
        self.element_names.push(name);
        self
    }

    pub fn add_attribute_name(&mut self, prefix: &str, namespace: &str, local: &str) -> &mut Self {
        let name = self.make_name(prefix, namespace, local);
        self.attribute_names.push(name);
        self
    }

    pub fn element_names(&self) -> &[QualifiedName] {
        &self.element_names
    }

    pub fn attribute_names(&self) -> &[QualifiedName] {
        &self.attribute_names
    }

    fn make_name(&mut self, prefix: &str, namespace: &str, local: &str) -> QualifiedName {
        let prefix_index: u32 = match prefix {
            "" => 0,
            XML_PREFIX => 1,
            p => plus_two(position_or_push(&mut self.prefixes, p)),
        };
        let namespace_index: u32 = match namespace {
            "" => 0,
            XML_NAMESPACE => 1,
            n => plus_two(position_or_push(&mut self.namespace_names, n)),
        };
        position_or_push(&mut self.local_names, local);
        QualifiedName::new(prefix.into(), namespace.into(), local.into(), prefix_index, namespace_index)
    }
}

/// Gespeicherter Index hinter dem impliziten `xml`-Eintrag.
fn plus_two(position: usize) -> u32 {
    u32::try_from(position).map_or(u32::MAX, |i| i.saturating_add(2))
}

fn position_or_push(list: &mut Vec<Rc<str>>, value: &str) -> usize {
    match list.iter().position(|e| &**e == value) {
        Some(i) => i,
        None => {
            list.push(value.into());
            list.len() - 1
        }
    }
}

/// All vocabulary tables of one document.
#[derive(Debug, Clone)]
pub struct StringTables {
    pub element_names: QNameTable,
    pub attribute_names: QNameTable,
    pub attribute_values: StringTable,
    pub content_chunks: ContentTable,
    pub local_names: StringTable,
    /// Hinzugefügte Prefixe; `xml` ist implizit und nicht enthalten.
    pub prefixes: StringTable,
    /// Hinzugefügte Namespace-Namen; der XML-Namespace ist implizit.
    pub namespace_names: StringTable,
    pub other_ncnames: StringTable,
    pub other_uris: StringTable,
    pub other_strings: ContentTable,
    pub restricted_alphabets: StringTable,
    pub encoding_algorithms: StringTable,
    xml_prefix: Rc<str>,
    xml_namespace: Rc<str>,
}

impl Default for StringTables {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTables {
    pub fn new() -> Self {
        Self {
            element_names: Table::new("element name"),
            attribute_names: Table::new("attribute name"),
            attribute_values: Table::new("attribute value"),
            content_chunks: ContentTable::new("content character chunk"),
            local_names: Table::new("local name"),
            prefixes: Table::new("prefix"),
            namespace_names: Table::new("namespace name"),
            other_ncnames: Table::new("other NCName"),
            other_uris: Table::new("other URI"),
            other_strings: ContentTable::new("other string"),
            restricted_alphabets: Table::new("restricted alphabet"),
            encoding_algorithms: Table::new("encoding algorithm"),
            xml_prefix: XML_PREFIX.into(),
            xml_namespace: XML_NAMESPACE.into(),
        }
    }

    /// Caps the value tables at `maximum` entries.
    ///
    /// Namens-Tabellen bleiben unbegrenzt: ein verworfener Name würde alle
    /// folgenden Indizes verschieben.
    pub fn set_maximum_entries(&mut self, maximum: usize) {
        self.attribute_values.set_maximum(maximum);
        self.content_chunks.set_maximum(maximum);
        self.other_strings.set_maximum(maximum);
    }

    /// Prefix for a wire index (0 = `xml`).
    pub fn prefix(&self, index: usize) -> Result<Rc<str>> {
        if index == 0 {
            return Ok(Rc::clone(&self.xml_prefix));
        }
        self.prefixes.get(index - 1).map(Rc::clone)
    }

    /// Namespace name for a wire index (0 = XML namespace).
    pub fn namespace_name(&self, index: usize) -> Result<Rc<str>> {
        if index == 0 {
            return Ok(Rc::clone(&self.xml_namespace));
        }
        self.namespace_names.get(index - 1).map(Rc::clone)
    }

    /// Adds a prefix and returns its wire index (`>= 1`).
    pub fn add_prefix(&mut self, prefix: Rc<str>) -> usize {
        self.prefixes.add(prefix);
        self.prefixes.len()
    }

    /// Adds a namespace name and returns its wire index (`>= 1`).
    pub fn add_namespace_name(&mut self, name: Rc<str>) -> usize {
        self.namespace_names.add(name);
        self.namespace_names.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.element_names.clear();
        self.attribute_names.clear();
        self.attribute_values.clear();
        self.content_chunks.clear();
        self.local_names.clear();
        self.prefixes.clear();
        self.namespace_names.clear();
        self.other_ncnames.clear();
        self.other_uris.clear();
        self.other_strings.clear();
        self.restricted_alphabets.clear();
        self.encoding_algorithms.clear();
    }

    /// Appends the contents of an external vocabulary.
    ///
    /// Erwartet leere Tabellen: die Indizes der Namen in `vocabulary` beziehen
    /// sich auf die Positionen innerhalb des Vokabulars.
    pub fn import(&mut self, vocabulary: &Vocabulary) {
        fn extend(table: &mut StringTable, items: &[Rc<str>]) {
            for item in items {
                table.add(Rc::clone(item));
            }
        }
        extend(&mut self.restricted_alphabets, &vocabulary.restricted_alphabets);
        extend(&mut self.encoding_algorithms, &vocabulary.encoding_algorithms);
        extend(&mut self.prefixes, &vocabulary.prefixes);
        extend(&mut self.namespace_names, &vocabulary.namespace_names);
        extend(&mut self.local_names, &vocabulary.local_names);
        extend(&mut self.other_ncnames, &vocabulary.other_ncnames);
        extend(&mut self.other_uris, &vocabulary.other_uris);
        extend(&mut self.attribute_values, &vocabulary.attribute_values);
        for chunk in &vocabulary.content_chunks {
            self.content_chunks.add(chunk);
        }
        for s in &vocabulary.other_strings {
            self.other_strings.add(s);
        }
        for name in &vocabulary.element_names {
            self.element_names.add(Rc::new(name.clone()));
        }
        for name in &vocabulary.attribute_names {
            self.attribute_names.add(Rc::new(name.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_add_and_get() {
        let mut t: StringTable = Table::new("local name");
        assert_eq!(t.add("a".into()), Some(0));
        assert_eq!(t.add("b".into()), Some(1));
        assert_eq!(&**t.get(1).unwrap(), "b");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn index_out_of_range_is_error() {
        let t: StringTable = Table::new("local name");
        let err = t.get(3).unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { table: "local name", index: 3, len: 0 });
    }

    /// Über dem Maximum werden Einträge verworfen, nicht gepanict.
    #[test]
    fn maximum_drops_entries() {
        let mut t: StringTable = Table::new("attribute value");
        t.set_maximum(1);
        assert_eq!(t.add("x".into()), Some(0));
        assert_eq!(t.add("y".into()), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn content_table_is_contiguous() {
        let mut t = ContentTable::new("content character chunk");
        t.add("hello");
        t.add("wörld");
        assert_eq!(t.buffer(), "hellowörld");
        assert_eq!(t.range(1).unwrap(), (5, 6));
        assert_eq!(t.get(1).unwrap(), "wörld");
        t.clear();
        assert!(t.is_empty());
        assert!(t.get(0).is_err());
    }

    #[test]
    fn implicit_xml_entries() {
        let mut tables = StringTables::new();
        assert_eq!(&*tables.prefix(0).unwrap(), "xml");
        assert_eq!(&*tables.namespace_name(0).unwrap(), XML_NAMESPACE);
        assert!(tables.prefix(1).is_err());
        assert_eq!(tables.add_prefix("p".into()), 1);
        assert_eq!(&*tables.prefix(1).unwrap(), "p");
        assert_eq!(tables.add_namespace_name("u".into()), 1);
        assert_eq!(&*tables.namespace_name(1).unwrap(), "u");
    }

    #[test]
    fn import_vocabulary() {
        let mut v = Vocabulary::new();
        v.add_element_name("p", "urn:x", "item")
            .add_element_name("", "", "root")
            .add_attribute_name("xml", XML_NAMESPACE, "lang");
        v.attribute_values.push("yes".into());

        let mut tables = StringTables::new();
        tables.import(&v);
        assert_eq!(tables.element_names.len(), 2);
        let item = tables.element_names.get(0).unwrap();
        assert_eq!(&*item.raw, "p:item");
        assert_eq!(item.prefix_index, 2);
        assert_eq!(item.namespace_index, 2);
        assert_eq!(&*tables.prefix(1).unwrap(), "p");
        assert_eq!(&*tables.namespace_name(1).unwrap(), "urn:x");
        assert_eq!(tables.local_names.len(), 3);
        assert_eq!(tables.attribute_names.get(0).unwrap().prefix_index, 1);
        assert_eq!(tables.element_names.get(1).unwrap().prefix_index, 0);
        assert_eq!(&**tables.attribute_values.get(0).unwrap(), "yes");

        tables.clear();
        assert!(tables.element_names.is_empty());
        assert!(tables.prefixes.is_empty());
    }

    /// Jeder neue Prefix bekommt den nächsten Index hinter `xml`.
    #[test]
    fn vocabulary_name_indices() {
        let mut v = Vocabulary::new();
        v.add_element_name("p", "urn:p", "a")
            .add_element_name("q", "urn:q", "b")
            .add_element_name("p", "urn:p", "c");
        let indices: Vec<(u32, u32)> =
            v.element_names().iter().map(|n| (n.prefix_index, n.namespace_index)).collect();
        assert_eq!(indices, [(2, 2), (3, 3), (2, 2)]);
    }

    #[test]
    fn maximum_applies_to_value_tables_only() {
        let mut tables = StringTables::new();
        tables.set_maximum_entries(1);
        tables.attribute_values.add("a".into());
        assert_eq!(tables.attribute_values.add("b".into()), None);
        assert_eq!(tables.other_strings.add("c"), Some(0));
        assert_eq!(tables.other_strings.add("d"), None);
        tables.local_names.add("x".into());
        assert_eq!(tables.local_names.add("y".into()), Some(1));
    }
}
