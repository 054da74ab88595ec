//! Namespace scope stack.
//!
//! Bindings werden pro Element als zusammenhängender Lauf gepusht und beim
//! Schließen des Elements als Ganzes entfernt. Der aktuelle Zustand liegt
//! slot-indiziert in `in_scope`:
//!
//! | Slot  | Bedeutung                  |
//! |-------|----------------------------|
//! | 0     | Default-Namespace          |
//! | 1     | `xml` (immer gebunden)     |
//! | k + 1 | Prefix mit Wire-Index k    |
//!
//! Der Wert eines Slots ist Namespace-Index + 1 (0 = ungebunden), also genau
//! das, was ein [`QualifiedName`](crate::QualifiedName) in
//! `namespace_index` trägt. Die In-Scope-Prüfung eines per Index dekodierten
//! Namens ist damit ein einziger Vergleich.

use std::rc::Rc;

use crate::constants::{XMLNS_NAMESPACE, XMLNS_PREFIX, XML_NAMESPACE, XML_PREFIX};
use crate::{Error, Result};

/// Read access to the namespace context.
pub trait NamespaceResolver {
    /// Namespace bound to `prefix` (`""` = default namespace).
    fn resolve_prefix(&self, prefix: &str) -> Option<&str>;

    /// Some prefix currently bound to `uri`.
    fn resolve_uri(&self, uri: &str) -> Option<&str>;

    /// All currently visible `(prefix, uri)` pairs, innermost first.
    fn in_scope_prefixes(&self) -> Vec<(Rc<str>, Rc<str>)>;
}

/// One namespace declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    /// Prefix, empty for the default namespace.
    pub prefix: Rc<str>,
    /// Namespace name, empty for an undeclaration.
    pub uri: Rc<str>,
    pub declaration_id: u32,
    slot: usize,
    namespace_index: u32,
    previous: u32,
}

impl NamespaceBinding {
    #[inline]
    pub fn is_undeclaration(&self) -> bool {
        self.uri.is_empty()
    }
}

/// Slot-indexed prefix → namespace bindings with scope push/pop.
#[derive(Debug, Clone)]
pub struct NamespaceScopeStack {
    in_scope: Vec<u32>,
    /// Declaration-Id der letzten Deklaration je Slot.
    declared_in: Vec<u32>,
    bindings: Vec<NamespaceBinding>,
    current_declaration: u32,
}

impl Default for NamespaceScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceScopeStack {
    pub fn new() -> Self {
        Self {
            in_scope: vec![0, 1],
            declared_in: vec![0, 0],
            bindings: Vec::new(),
            current_declaration: 0,
        }
    }

    /// Starts the declarations of a new element.
    pub fn begin_declarations(&mut self) {
        self.current_declaration += 1;
        if self.current_declaration == u32::MAX {
            self.declared_in.iter_mut().for_each(|d| *d = 0);
            self.current_declaration = 1;
        }
    }

    /// Declares `slot` → `namespace_index` (plus one, 0 undeclares).
    ///
    /// Muss nach [`begin_declarations`](Self::begin_declarations) aufgerufen werden.
    pub fn declare(
        &mut self,
        slot: usize,
        prefix: Rc<str>,
        namespace_index: u32,
        uri: Rc<str>,
    ) -> Result<()> {
        if slot == 1 && namespace_index != 1 {
            return Err(Error::malformed("the xml prefix cannot be bound to another namespace"));
        }
        if slot >= self.in_scope.len() {
            self.in_scope.resize(slot + 1, 0);
            self.declared_in.resize(slot + 1, 0);
        }
        if self.declared_in[slot] == self.current_declaration {
            return Err(Error::DuplicateNamespaceDeclaration(prefix.to_string()));
        }
        self.declared_in[slot] = self.current_declaration;
        let previous = self.in_scope[slot];
        self.in_scope[slot] = namespace_index;
        self.bindings.push(NamespaceBinding {
            prefix,
            uri,
            declaration_id: self.current_declaration,
            slot,
            namespace_index,
            previous,
        });
        Ok(())
    }

    /// `true` if `slot` is currently bound to `namespace_index` (plus one).
    #[inline]
    pub fn is_in_scope(&self, slot: u32, namespace_index: u32) -> bool {
        self.in_scope.get(slot as usize).copied().unwrap_or(0) == namespace_index
    }

    /// Number of bindings on the stack (used as scope markers).
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in `start..end`.
    pub fn bindings(&self, start: usize, end: usize) -> &[NamespaceBinding] {
        &self.bindings[start.min(self.bindings.len())..end.min(self.bindings.len())]
    }

    /// Removes all bindings above `start`, restoring the enclosing scope.
    pub fn pop_to(&mut self, start: usize) {
        while self.bindings.len() > start {
            if let Some(binding) = self.bindings.pop() {
                self.in_scope[binding.slot] = binding.previous;
            }
        }
    }

    /// Wipes every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.in_scope.clear();
        self.in_scope.extend_from_slice(&[0, 1]);
        self.declared_in.clear();
        self.declared_in.extend_from_slice(&[0, 0]);
        self.current_declaration = 0;
    }

    #[inline]
    fn is_active(&self, binding: &NamespaceBinding) -> bool {
        self.in_scope[binding.slot] == binding.namespace_index
            && self
                .bindings
                .iter()
                .rev()
                .find(|b| b.slot == binding.slot)
                .is_some_and(|b| std::ptr::eq(b, binding))
    }

    #[cfg(test)]
    pub(crate) fn force_declaration_counter(&mut self, value: u32) {
        self.current_declaration = value;
    }
}

impl NamespaceResolver for NamespaceScopeStack {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        match prefix {
            XML_PREFIX => return Some(XML_NAMESPACE),
            XMLNS_PREFIX => return Some(XMLNS_NAMESPACE),
            _ => {}
        }
        self.bindings
            .iter()
            .rev()
            .find(|b| &*b.prefix == prefix)
            .map(|b| &*b.uri)
            .filter(|uri| !uri.is_empty())
    }

    fn resolve_uri(&self, uri: &str) -> Option<&str> {
        match uri {
            "" => return None,
            XML_NAMESPACE => return Some(XML_PREFIX),
            XMLNS_NAMESPACE => return Some(XMLNS_PREFIX),
            _ => {}
        }
        self.bindings
            .iter()
            .rev()
            .find(|b| &*b.uri == uri && self.is_active(b))
            .map(|b| &*b.prefix)
    }

    fn in_scope_prefixes(&self) -> Vec<(Rc<str>, Rc<str>)> {
        self.bindings
            .iter()
            .rev()
            .filter(|b| !b.is_undeclaration() && self.is_active(b))
            .map(|b| (Rc::clone(&b.prefix), Rc::clone(&b.uri)))
            .collect()
    }
}
