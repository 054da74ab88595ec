//! Qualified names.
//!
//! Ein [`QualifiedName`] wird einmal konstruiert und danach nur noch als
//! `Rc<QualifiedName>` geteilt: die Name-Tabellen geben bei Index-Zugriffen
//! immer dieselbe Instanz zurück.
//!
//! Prefix- und Namespace-Index werden "plus eins" gespeichert:
//! `0` bedeutet kein Prefix bzw. kein Namespace, `1` steht für `xml` bzw. den
//! XML-Namespace, `k + 1` für den k-ten Eintrag der jeweiligen Tabelle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ahash::AHasher;

use crate::constants::{XML_NAMESPACE, XML_PREFIX};

/// Qualified name of an element, attribute or name surrogate.
#[derive(Clone)]
pub struct QualifiedName {
    /// Prefix, empty for none.
    pub prefix: Rc<str>,
    /// Namespace name, empty for none.
    pub namespace_uri: Rc<str>,
    pub local_name: Rc<str>,
    /// `prefix:local_name` or `local_name`.
    pub raw: Rc<str>,
    /// Prefix-Tabellenindex + 1, auch der Slot im Namespace-Scope.
    pub prefix_index: u32,
    /// Namespace-Tabellenindex + 1.
    pub namespace_index: u32,
    /// Vorberechneter Hash von (namespace_uri, local_name).
    identity: u64,
}

impl QualifiedName {
    /// Constructs a name. `prefix_index`/`namespace_index` are "plus one" values.
    pub fn new(
        prefix: Rc<str>,
        namespace_uri: Rc<str>,
        local_name: Rc<str>,
        prefix_index: u32,
        namespace_index: u32,
    ) -> Self {
        let raw: Rc<str> = if prefix.is_empty() {
            Rc::clone(&local_name)
        } else {
            format!("{prefix}:{local_name}").into()
        };
        let identity = compute_identity(&namespace_uri, &local_name);
        Self { prefix, namespace_uri, local_name, raw, prefix_index, namespace_index, identity }
    }

    /// Name without prefix and namespace.
    pub fn local(local_name: impl Into<Rc<str>>) -> Self {
        Self::new("".into(), "".into(), local_name.into(), 0, 0)
    }

    /// Name in the XML namespace with the `xml` prefix (e.g. `xml:lang`).
    pub fn xml(local_name: impl Into<Rc<str>>) -> Self {
        Self::new(XML_PREFIX.into(), XML_NAMESPACE.into(), local_name.into(), 1, 1)
    }

    #[inline]
    pub fn has_prefix(&self) -> bool {
        self.prefix_index != 0
    }

    #[inline]
    pub fn has_namespace(&self) -> bool {
        self.namespace_index != 0
    }

    /// Hash of namespace + local name, used for duplicate detection.
    #[inline]
    pub fn identity(&self) -> u64 {
        self.identity
    }
}

/// Berechnet den Identity-Hash (namespace + local_name).
pub(crate) fn compute_identity(namespace_uri: &str, local_name: &str) -> u64 {
    let mut hasher = AHasher::default();
    namespace_uri.hash(&mut hasher);
    local_name.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifiedName")
            .field("prefix", &self.prefix)
            .field("namespace_uri", &self.namespace_uri)
            .field("local_name", &self.local_name)
            .field("prefix_index", &self.prefix_index)
            .field("namespace_index", &self.namespace_index)
            .finish()
    }
}

/// Two names are equal if namespace and local name match, regardless of prefix.
impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.namespace_uri == other.namespace_uri
            && self.local_name == other.local_name
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
