//! Relational layout of each grammar
//!
//! Both grammars share the lookup tables and the cross-reference tables; each
//! has its own entry, accession, attribute and link tables under a prefix.
//! Table names are derived here and nowhere else.

/// SQL type of an entity column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

impl ColumnKind {
    fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "BIGINT",
        }
    }
}

/// Fixed top-level attribute stored directly on the entry row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Integer,
        }
    }
}

/// Shared cross-reference tables a grammar links to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Interactions,
    Isoforms,
    ProteinRefs,
}

impl LinkKind {
    /// Name of the shared table
    pub fn shared_table(self) -> &'static str {
        match self {
            LinkKind::Interactions => "interactions",
            LinkKind::Isoforms => "isoforms",
            LinkKind::ProteinRefs => "protein_refs",
        }
    }

    /// Column of the link table that points at the shared row
    pub fn key_column(self) -> &'static str {
        match self {
            LinkKind::Interactions => "interaction_id",
            LinkKind::Isoforms => "isoform_id",
            LinkKind::ProteinRefs => "protein_ref_id",
        }
    }

    fn shared_ddl(self) -> &'static str {
        match self {
            LinkKind::Interactions => {
                "CREATE TABLE IF NOT EXISTS interactions (\
                 id BIGINT PRIMARY KEY, \
                 accession_a TEXT NOT NULL, \
                 accession_b TEXT NOT NULL, \
                 UNIQUE (accession_a, accession_b))"
            },
            LinkKind::Isoforms => {
                "CREATE TABLE IF NOT EXISTS isoforms (\
                 id BIGINT PRIMARY KEY, \
                 iso_id TEXT NOT NULL UNIQUE, \
                 name TEXT, \
                 sequence TEXT)"
            },
            LinkKind::ProteinRefs => {
                "CREATE TABLE IF NOT EXISTS protein_refs (\
                 id BIGINT PRIMARY KEY, \
                 accession TEXT NOT NULL UNIQUE, \
                 entry_name TEXT NOT NULL)"
            },
        }
    }
}

/// Table layout of one grammar
#[derive(Debug)]
pub struct Schema {
    pub prefix: &'static str,
    pub columns: &'static [Column],
    pub links: &'static [LinkKind],
    /// Whether the organism filter applies to this grammar's protein links
    pub filterable: bool,
}

impl Schema {
    pub fn entries(&self) -> String {
        format!("{}_entries", self.prefix)
    }

    pub fn accessions(&self) -> String {
        format!("{}_accessions", self.prefix)
    }

    pub fn db_refs(&self) -> String {
        format!("{}_db_refs", self.prefix)
    }

    pub fn attributes(&self) -> String {
        format!("{}_attributes", self.prefix)
    }

    pub fn list_attributes(&self) -> String {
        format!("{}_list_attributes", self.prefix)
    }

    pub fn link_table(&self, kind: LinkKind) -> String {
        format!("{}_{}", self.prefix, kind.shared_table())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `CREATE TABLE IF NOT EXISTS` statements, parents before children
    pub fn ddl(&self) -> Vec<String> {
        let entries = self.entries();
        let entry_fk = format!("entry_id TEXT NOT NULL REFERENCES {entries} (id)");

        let mut out = vec![
            "CREATE TABLE IF NOT EXISTS attribute_names (\
             id BIGINT PRIMARY KEY, \
             name TEXT NOT NULL UNIQUE)"
                .to_string(),
            "CREATE TABLE IF NOT EXISTS attribute_values (\
             id BIGINT PRIMARY KEY, \
             value TEXT NOT NULL UNIQUE)"
                .to_string(),
        ];

        let columns: String = self
            .columns
            .iter()
            .map(|c| format!(", {} {}", c.name, c.kind.sql_type()))
            .collect();
        out.push(format!(
            "CREATE TABLE IF NOT EXISTS {entries} (id TEXT PRIMARY KEY{columns})"
        ));

        out.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({entry_fk}, \
             position INTEGER NOT NULL, \
             value_id BIGINT NOT NULL REFERENCES attribute_values (id), \
             PRIMARY KEY (entry_id, value_id))",
            self.accessions()
        ));
        out.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({entry_fk}, \
             database_id BIGINT NOT NULL REFERENCES attribute_names (id), \
             value_id BIGINT NOT NULL REFERENCES attribute_values (id), \
             detail_id BIGINT REFERENCES attribute_values (id), \
             PRIMARY KEY (entry_id, database_id, value_id))",
            self.db_refs()
        ));
        out.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({entry_fk}, \
             name_id BIGINT NOT NULL REFERENCES attribute_names (id), \
             value_id BIGINT NOT NULL REFERENCES attribute_values (id), \
             UNIQUE (entry_id, name_id))",
            self.attributes()
        ));
        out.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({entry_fk}, \
             name_id BIGINT NOT NULL REFERENCES attribute_names (id), \
             value_id BIGINT NOT NULL REFERENCES attribute_values (id), \
             PRIMARY KEY (entry_id, name_id, value_id))",
            self.list_attributes()
        ));

        for &kind in self.links {
            out.push(kind.shared_ddl().to_string());
            let extra = match kind {
                LinkKind::Interactions => ", experiments INTEGER",
                _ => "",
            };
            out.push(format!(
                "CREATE TABLE IF NOT EXISTS {} ({entry_fk}, \
                 {key} BIGINT NOT NULL REFERENCES {shared} (id){extra}, \
                 PRIMARY KEY (entry_id, {key}))",
                self.link_table(kind),
                key = kind.key_column(),
                shared = kind.shared_table(),
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_SCHEMA: Schema = Schema {
        prefix: "thing",
        columns: &[Column::text("status"), Column::integer("taxon_id")],
        links: &[LinkKind::Interactions],
        filterable: false,
    };

    #[test]
    fn test_table_names() {
        assert_eq!(TEST_SCHEMA.entries(), "thing_entries");
        assert_eq!(TEST_SCHEMA.link_table(LinkKind::Interactions), "thing_interactions");
        assert_eq!(TEST_SCHEMA.column("taxon_id").map(|c| c.kind), Some(ColumnKind::Integer));
        assert!(TEST_SCHEMA.column("missing").is_none());
    }

    #[test]
    fn test_ddl_orders_parents_first() {
        let ddl = TEST_SCHEMA.ddl();
        let position = |needle: &str| ddl.iter().position(|s| s.contains(needle));

        assert!(ddl[2].contains("thing_entries (id TEXT PRIMARY KEY, status TEXT, taxon_id BIGINT)"));
        assert!(position("EXISTS interactions").lt(&position("EXISTS thing_interactions")));
        assert!(ddl
            .iter()
            .any(|s| s.contains("experiments INTEGER, PRIMARY KEY (entry_id, interaction_id)")));
    }
}
