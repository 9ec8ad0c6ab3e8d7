//! Record under construction
//!
//! A [`Stanza`] is the mutable side of a [`Record`]: grammars push values into
//! it line by line, and it enforces the single-value rule of each grammar.
//! Multi-line fields are assembled in named pending buffers until their
//! terminator shows up.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::FormatError;
use crate::record::{DbRef, Link, Record};
use crate::tokens;

/// What happens when a single-valued field gets a second, different value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonPolicy {
    /// Abort the run
    Fatal,
    /// Turn the field into a list attribute holding every value
    FoldIntoList,
}

/// Accumulation state for one record; `S` is grammar-specific scratch state
#[derive(Debug)]
pub struct Stanza<S> {
    record: Record,
    policy: SingletonPolicy,
    pending: BTreeMap<&'static str, String>,
    folded: BTreeSet<String>,
    pub state: S,
}

impl<S: Default> Stanza<S> {
    pub fn new(policy: SingletonPolicy) -> Self {
        Self {
            record: Record::default(),
            policy,
            pending: BTreeMap::new(),
            folded: BTreeSet::new(),
            state: S::default(),
        }
    }
}

impl<S> Stanza<S> {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn set_id(&mut self, id: &str) -> Result<(), FormatError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(());
        }
        match self.record.id.clone() {
            None => {
                self.record.id = Some(id.to_string());
                Ok(())
            },
            Some(existing) if existing == id => Ok(()),
            Some(existing) => {
                self.conflict("id", &existing, id)?;
                // the identifier itself never changes
                self.fold_values("id", existing, id.to_string());
                Ok(())
            },
        }
    }

    /// Set an entity-table column
    pub fn set_column(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormatError> {
        let value = value.into();
        match self.record.columns.get(name).cloned() {
            None => {
                self.record.columns.insert(name.to_string(), value);
                Ok(())
            },
            Some(existing) if existing == value => Ok(()),
            Some(existing) => {
                self.conflict(name, &existing, &value)?;
                self.fold_values(name, existing, value);
                Ok(())
            },
        }
    }

    /// Set a single-valued attribute
    pub fn set_scalar(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormatError> {
        let value = value.into();
        if self.folded.contains(name) {
            self.push_list(name, value);
            return Ok(());
        }
        match self.record.scalars.get(name).cloned() {
            None => {
                self.record.scalars.insert(name.to_string(), value);
                Ok(())
            },
            Some(existing) if existing == value => Ok(()),
            Some(existing) => {
                self.conflict(name, &existing, &value)?;
                self.record.scalars.remove(name);
                self.fold_values(name, existing, value);
                Ok(())
            },
        }
    }

    pub fn push_list(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.record
            .lists
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    pub fn push_accession(&mut self, accession: impl Into<String>) {
        self.record.accessions.push(accession.into());
    }

    pub fn push_db_ref(&mut self, db_ref: DbRef) {
        self.record.db_refs.push(db_ref);
    }

    pub fn push_link(&mut self, link: Link) {
        self.record.links.push(link);
    }

    /// Add a fragment to the pending text of `key`
    pub fn append(&mut self, key: &'static str, fragment: &str) {
        tokens::join_continuation(self.pending.entry(key).or_default(), fragment);
    }

    /// Take the pending text of `key` once it ends with `terminator`
    pub fn take_closed(&mut self, key: &'static str, terminator: &str) -> Option<String> {
        let closed = self
            .pending
            .get(key)
            .is_some_and(|text| tokens::is_closed(text, terminator));
        if closed {
            self.pending.remove(key)
        } else {
            None
        }
    }

    /// Take whatever is pending for `key`, closed or not
    pub fn take_pending(&mut self, key: &'static str) -> Option<String> {
        self.pending.remove(key).filter(|text| !text.is_empty())
    }

    fn conflict(&self, field: &str, existing: &str, conflicting: &str) -> Result<(), FormatError> {
        match self.policy {
            SingletonPolicy::Fatal => Err(FormatError::SingletonConflict {
                record: self.record.label().to_string(),
                field: field.to_string(),
                existing: existing.to_string(),
                conflicting: conflicting.to_string(),
            }),
            SingletonPolicy::FoldIntoList => Ok(()),
        }
    }

    fn fold_values(&mut self, name: &str, existing: String, value: String) {
        if self.folded.insert(name.to_string()) {
            self.push_list(name, existing);
        }
        self.push_list(name, value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn stanza(policy: SingletonPolicy) -> Stanza<()> {
        Stanza::new(policy)
    }

    #[test]
    fn test_repeated_identical_scalar_is_fine() {
        let mut s = stanza(SingletonPolicy::Fatal);
        s.set_scalar("organism", "Homo sapiens").unwrap();
        s.set_scalar("organism", "Homo sapiens").unwrap();
        assert_eq!(s.record().scalars["organism"], "Homo sapiens");
    }

    #[test]
    fn test_fatal_policy_rejects_conflict() {
        let mut s = stanza(SingletonPolicy::Fatal);
        s.set_id("CYC_HUMAN").unwrap();
        s.set_column("taxon_id", "9606").unwrap();
        let err = s.set_column("taxon_id", "10090").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("CYC_HUMAN"));
    }

    #[test]
    fn test_fold_policy_moves_scalar_to_list() {
        let mut s = stanza(SingletonPolicy::FoldIntoList);
        s.set_scalar("description", "First").unwrap();
        s.set_scalar("description", "Second").unwrap();
        s.set_scalar("description", "Third").unwrap();
        let record = s.into_record();
        assert!(!record.scalars.contains_key("description"));
        assert_eq!(record.list("description"), ["First", "Second", "Third"]);
    }

    #[test]
    fn test_fold_policy_keeps_first_identifier() {
        let mut s = stanza(SingletonPolicy::FoldIntoList);
        s.set_id("1.1.1.1").unwrap();
        s.set_id("1.1.1.2").unwrap();
        let record = s.into_record();
        assert_eq!(record.id.as_deref(), Some("1.1.1.1"));
        assert_eq!(record.list("id"), ["1.1.1.1", "1.1.1.2"]);
    }

    #[test]
    fn test_pending_text() {
        let mut s = stanza(SingletonPolicy::Fatal);
        s.append("OS", "Rattus norvegicus");
        assert_eq!(s.take_closed("OS", "."), None);
        s.append("OS", "(Rat).");
        assert_eq!(s.take_closed("OS", ".").as_deref(), Some("Rattus norvegicus (Rat)."));
        assert_eq!(s.take_pending("OS"), None);
    }
}
