//! Attribute records and duplicate detection.

use std::rc::Rc;

use crate::qname::QualifiedName;
use crate::{Error, Result};

/// Anzahl der Hash-Buckets (Zweierpotenz).
const MAP_SIZE: usize = 64;

/// A decoded attribute of the current START_ELEMENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Rc<QualifiedName>,
    pub value: Rc<str>,
    /// Encoding algorithm id if the value was algorithm-encoded.
    pub algorithm: Option<u32>,
}

impl Attribute {
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    /// `None` for attributes without namespace.
    #[inline]
    pub fn namespace_uri(&self) -> Option<&str> {
        Some(&*self.name.namespace_uri).filter(|ns| !ns.is_empty())
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.name.prefix
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

struct Entry {
    iteration: u32,
    name: Rc<QualifiedName>,
}

/// Detects repeated attribute names within one element.
///
/// Einträge werden nicht pro Element gelöscht. Stattdessen trägt jeder Eintrag
/// die Iteration, in der er geschrieben wurde; nur Einträge der aktuellen
/// Iteration zählen. Erreicht der Zähler `u32::MAX`, werden alle Buckets
/// geleert und der Zähler beginnt wieder bei 1.
pub struct DuplicateAttributeVerifier {
    buckets: Vec<Vec<Entry>>,
    current_iteration: u32,
}

impl Default for DuplicateAttributeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateAttributeVerifier {
    pub fn new() -> Self {
        Self {
            buckets: (0..MAP_SIZE).map(|_| Vec::new()).collect(),
            current_iteration: 0,
        }
    }

    /// Starts checking the attributes of a new element.
    pub fn begin_element(&mut self) {
        self.current_iteration += 1;
        if self.current_iteration == u32::MAX {
            self.buckets.iter_mut().for_each(Vec::clear);
            self.current_iteration = 1;
        }
    }

    /// Records `name`, failing if it already occurred on this element.
    pub fn check(&mut self, name: &Rc<QualifiedName>) -> Result<()> {
        let current = self.current_iteration;
        let bucket = &mut self.buckets[(name.identity() as usize) & (MAP_SIZE - 1)];
        let mut free = None;
        for (i, entry) in bucket.iter().enumerate() {
            if entry.iteration == current {
                if Rc::ptr_eq(&entry.name, name) || *entry.name == **name {
                    return Err(Error::DuplicateAttribute(name.raw.to_string()));
                }
            } else if free.is_none() {
                free = Some(i);
            }
        }
        let entry = Entry { iteration: current, name: Rc::clone(name) };
        match free {
            Some(i) => bucket[i] = entry,
            None => bucket.push(entry),
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.current_iteration = 0;
    }

    #[cfg(test)]
    fn force_iteration(&mut self, value: u32) {
        self.current_iteration = value;
    }
}
