//! The in-memory record model
//!
//! A [`Record`] is what one stanza of a flat file accumulates into. It is
//! format-neutral: each grammar decides which of its fields become entity
//! columns, scalars, lists or cross-references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One frozen flat-file entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary identifier; `None` when the start line carried none
    pub id: Option<String>,

    /// Fixed top-level values stored as entity-table columns
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, String>,

    /// Accession numbers in file order (first is primary)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_refs: Vec<DbRef>,

    /// Sub-records shared between entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    /// Single-valued attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scalars: BTreeMap<String, String>,

    /// Multi-valued attributes, duplicates kept until emission
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<String, Vec<String>>,
}

impl Record {
    /// Identifier for diagnostics, `none found` when absent
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(crate::error::NO_IDENTIFIER)
    }

    pub fn primary_accession(&self) -> Option<&str> {
        self.accessions.first().map(String::as_str)
    }

    pub fn list(&self, name: &str) -> &[String] {
        self.lists.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Reference into an external database: `DR   PDB; 1ABC; X-ray; 2.0 A.`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbRef {
    pub database: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A cross-reference row that several records may point at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Link {
    /// Binary interaction between two accessions
    Interaction {
        accession_a: String,
        accession_b: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        experiments: Option<u32>,
    },
    /// Alternative product declared in a protein entry
    Isoform {
        iso_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<String>,
    },
    /// Protein an enzyme entry points at: `P07327, ADH1A_HUMAN;`
    Protein {
        accession: String,
        entry_name: String,
    },
}

impl Link {
    /// Build an interaction with its endpoints in canonical order, so that
    /// (X, Y) and (Y, X) share one key
    pub fn interaction(a: &str, b: &str, experiments: Option<u32>) -> Self {
        let (accession_a, accession_b) = if a <= b { (a, b) } else { (b, a) };
        Link::Interaction {
            accession_a: accession_a.to_string(),
            accession_b: accession_b.to_string(),
            experiments,
        }
    }

    /// Natural key identifying the shared row across records
    pub fn natural_key(&self) -> String {
        match self {
            Link::Interaction {
                accession_a,
                accession_b,
                ..
            } => format!("interaction\t{accession_a}\t{accession_b}"),
            Link::Isoform { iso_id, .. } => format!("isoform\t{iso_id}"),
            Link::Protein { accession, .. } => format!("protein\t{accession}"),
        }
    }
}
