//! Relational emission
//!
//! Turns a frozen [`Record`] into the statements that create its rows, in a
//! fixed order: entry row, accessions and database references, shared
//! cross-references with their link rows, scalar attributes, list
//! attributes. Lookup rows for freshly interned names and values are placed
//! immediately before the first row that references them.
//!
//! The emitter produces statements only. Transactions are the controller's
//! business, see [`crate::transaction`].

use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::context::ParserContext;
use crate::error::EmitError;
use crate::record::{DbRef, Link, Record};
use crate::schema::{ColumnKind, LinkKind, Schema};
use crate::statement::{Insert, SqlValue, Statement};

pub struct Emitter {
    schema: &'static Schema,
}

impl Emitter {
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Statements for one record, or `None` when the organism filter leaves
    /// it without any protein cross-reference
    pub fn emit(
        &self,
        ctx: &mut ParserContext<'_>,
        record: &Record,
    ) -> Result<Option<Vec<Statement>>, EmitError> {
        let Some(links) = self.filter_links(ctx, record) else {
            debug!(record = %record.label(), "no cross-reference matches the organism filter, skipping");
            return Ok(None);
        };

        let id = record
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(EmitError::MissingIdentifier)?;
        if ctx.is_emitted(id) {
            return Err(EmitError::DuplicateIdentifier(id.to_string()));
        }

        let mut out = Vec::new();
        out.push(self.entry_row(id, record)?);

        // Accessions and database references
        let mut seen_accessions = HashSet::new();
        for (position, accession) in record.accessions.iter().enumerate() {
            let value_id = intern_value(ctx, &mut out, accession);
            if !seen_accessions.insert(value_id) {
                continue;
            }
            out.push(
                Insert::new(self.schema.accessions())
                    .value("entry_id", SqlValue::text(id))
                    .value("position", SqlValue::Integer(position as i64 + 1))
                    .value("value_id", SqlValue::id(value_id))
                    .into(),
            );
        }

        let mut seen_refs = HashSet::new();
        for db_ref in &record.db_refs {
            self.db_ref_row(ctx, &mut out, &mut seen_refs, id, db_ref);
        }

        // Shared cross-references
        let mut seen_links = HashSet::new();
        for link in links.iter() {
            self.link_rows(ctx, &mut out, &mut seen_links, id, link);
        }

        for (name, value) in &record.scalars {
            let name_id = intern_name(ctx, &mut out, name);
            let value_id = intern_value(ctx, &mut out, value);
            out.push(
                Insert::new(self.schema.attributes())
                    .value("entry_id", SqlValue::text(id))
                    .value("name_id", SqlValue::id(name_id))
                    .value("value_id", SqlValue::id(value_id))
                    .into(),
            );
        }

        for (name, values) in &record.lists {
            let name_id = intern_name(ctx, &mut out, name);
            let mut seen = HashSet::new();
            for value in values {
                let value_id = intern_value(ctx, &mut out, value);
                if !seen.insert(value_id) {
                    trace!(record = %id, attribute = %name, value = %value, "collapsing repeated list value");
                    continue;
                }
                out.push(
                    Insert::new(self.schema.list_attributes())
                        .value("entry_id", SqlValue::text(id))
                        .value("name_id", SqlValue::id(name_id))
                        .value("value_id", SqlValue::id(value_id))
                        .into(),
                );
            }
        }

        ctx.mark_emitted(id);
        Ok(Some(out))
    }

    /// Links that survive the organism filter; `None` drops the whole record
    fn filter_links<'r>(&self, ctx: &ParserContext<'_>, record: &'r Record) -> Option<Cow<'r, [Link]>> {
        let filter = match ctx.config().organism_filter.as_ref() {
            Some(filter) if self.schema.filterable => filter,
            _ => return Some(Cow::Borrowed(record.links.as_slice())),
        };

        let kept: Vec<Link> = record
            .links
            .iter()
            .filter(|link| match link {
                Link::Protein { entry_name, .. } => filter.matches_entry_name(entry_name),
                _ => true,
            })
            .cloned()
            .collect();

        let any_protein = kept.iter().any(|l| matches!(l, Link::Protein { .. }));
        any_protein.then_some(Cow::Owned(kept))
    }

    fn entry_row(&self, id: &str, record: &Record) -> Result<Statement, EmitError> {
        let mut insert = Insert::new(self.schema.entries()).value("id", SqlValue::text(id));

        for column in self.schema.columns {
            let value = match (record.columns.get(column.name), column.kind) {
                (None, _) => SqlValue::Null,
                (Some(text), ColumnKind::Text) => SqlValue::text(text.as_str()),
                (Some(text), ColumnKind::Integer) => {
                    let number = text.trim().parse::<i64>().map_err(|_| EmitError::InvalidColumn {
                        column: column.name,
                        value: text.clone(),
                    })?;
                    SqlValue::Integer(number)
                },
            };
            insert = insert.value(column.name, value);
        }

        for name in record.columns.keys() {
            if self.schema.column(name).is_none() {
                debug!(record = %id, column = %name, "ignoring value for unknown column");
            }
        }

        Ok(insert.into())
    }

    fn db_ref_row(
        &self,
        ctx: &mut ParserContext<'_>,
        out: &mut Vec<Statement>,
        seen: &mut HashSet<(u64, u64)>,
        id: &str,
        db_ref: &DbRef,
    ) {
        let database_id = intern_name(ctx, out, &db_ref.database);
        let value_id = intern_value(ctx, out, &db_ref.identifier);
        if !seen.insert((database_id, value_id)) {
            return;
        }
        let detail_id = db_ref
            .detail
            .as_deref()
            .map(|detail| intern_value(ctx, out, detail));

        out.push(
            Insert::new(self.schema.db_refs())
                .value("entry_id", SqlValue::text(id))
                .value("database_id", SqlValue::id(database_id))
                .value("value_id", SqlValue::id(value_id))
                .value("detail_id", SqlValue::from(detail_id))
                .into(),
        );
    }

    fn link_rows(
        &self,
        ctx: &mut ParserContext<'_>,
        out: &mut Vec<Statement>,
        seen: &mut HashSet<u64>,
        id: &str,
        link: &Link,
    ) {
        let kind = link_kind(link);
        let shared = ctx.shared.intern(&link.natural_key());

        if shared.fresh {
            let row = Insert::new(kind.shared_table()).value("id", SqlValue::id(shared.id));
            let row = match link {
                Link::Interaction {
                    accession_a,
                    accession_b,
                    ..
                } => row
                    .value("accession_a", SqlValue::text(accession_a.as_str()))
                    .value("accession_b", SqlValue::text(accession_b.as_str())),
                Link::Isoform {
                    iso_id,
                    name,
                    sequence,
                } => row
                    .value("iso_id", SqlValue::text(iso_id.as_str()))
                    .value("name", optional_text(name))
                    .value("sequence", optional_text(sequence)),
                Link::Protein {
                    accession,
                    entry_name,
                } => row
                    .value("accession", SqlValue::text(accession.as_str()))
                    .value("entry_name", SqlValue::text(entry_name.as_str())),
            };
            out.push(row.ignore_conflicts().into());
        }

        if !seen.insert(shared.id) {
            return;
        }

        let mut row = Insert::new(self.schema.link_table(kind))
            .value("entry_id", SqlValue::text(id))
            .value(kind.key_column(), SqlValue::id(shared.id));
        if let Link::Interaction { experiments, .. } = link {
            row = row.value("experiments", SqlValue::from(experiments.map(u64::from)));
        }
        out.push(row.into());
    }
}

fn link_kind(link: &Link) -> LinkKind {
    match link {
        Link::Interaction { .. } => LinkKind::Interactions,
        Link::Isoform { .. } => LinkKind::Isoforms,
        Link::Protein { .. } => LinkKind::ProteinRefs,
    }
}

fn optional_text(value: &Option<String>) -> SqlValue {
    value
        .as_deref()
        .map(SqlValue::text)
        .unwrap_or(SqlValue::Null)
}

fn intern_name(ctx: &mut ParserContext<'_>, out: &mut Vec<Statement>, name: &str) -> u64 {
    let interned = ctx.interner.names.intern(name);
    if interned.fresh {
        out.push(
            Insert::new("attribute_names")
                .value("id", SqlValue::id(interned.id))
                .value("name", SqlValue::text(name))
                .ignore_conflicts()
                .into(),
        );
    }
    interned.id
}

fn intern_value(ctx: &mut ParserContext<'_>, out: &mut Vec<Statement>, value: &str) -> u64 {
    let interned = ctx.interner.values.intern(value);
    if interned.fresh {
        out.push(
            Insert::new("attribute_values")
                .value("id", SqlValue::id(interned.id))
                .value("value", SqlValue::text(value))
                .ignore_conflicts()
                .into(),
        );
    }
    interned.id
}
