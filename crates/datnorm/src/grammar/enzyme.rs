//! ENZYME nomenclature flat-file grammar
//!
//! ```text
//! ID   1.1.1.1
//! DE   Alcohol dehydrogenase.
//! AN   Aldehyde reductase.
//! CA   (1) A primary alcohol + NAD(+) = an aldehyde + NADH.
//! CF   Zn(2+) or Fe cation.
//! CC   -!- Acts on primary or secondary alcohols or hemi-acetals.
//! PR   PROSITE; PDOC00058;
//! DR   P07327, ADH1A_HUMAN;  P28469, ADH1A_MACMU;
//! //
//! ```
//!
//! A repeated `ID` or `DE` with a different value is not an error: both
//! values are kept as a list attribute of the same name.

use crate::error::FormatError;
use crate::line::TagCode;
use crate::record::{DbRef, Link};
use crate::schema::{Column, LinkKind, Schema};
use crate::stanza::{SingletonPolicy, Stanza};
use crate::tokens::{join_continuation, split_items, strip_period};

use super::{accumulate, Grammar};

pub static SCHEMA: Schema = Schema {
    prefix: "enzyme",
    columns: &[Column::text("status")],
    links: &[LinkKind::ProteinRefs],
    filterable: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnzymeTag {
    Id,
    De,
    An,
    Ca,
    Cf,
    Cc,
    Pr,
    Dr,
}

impl TagCode for EnzymeTag {
    const WIDTH: usize = 2;
    const PAYLOAD_COLUMN: usize = 5;

    fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "ID" => EnzymeTag::Id,
            "DE" => EnzymeTag::De,
            "AN" => EnzymeTag::An,
            "CA" => EnzymeTag::Ca,
            "CF" => EnzymeTag::Cf,
            "CC" => EnzymeTag::Cc,
            "PR" => EnzymeTag::Pr,
            "DR" => EnzymeTag::Dr,
            _ => return None,
        })
    }

    fn code(self) -> &'static str {
        match self {
            EnzymeTag::Id => "ID",
            EnzymeTag::De => "DE",
            EnzymeTag::An => "AN",
            EnzymeTag::Ca => "CA",
            EnzymeTag::Cf => "CF",
            EnzymeTag::Cc => "CC",
            EnzymeTag::Pr => "PR",
            EnzymeTag::Dr => "DR",
        }
    }

    fn is_start(self) -> bool {
        self == EnzymeTag::Id
    }
}

#[derive(Debug, Default)]
pub struct EnzymeState {
    /// Text of the open `-!-` comment block
    comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnzymeGrammar;

type EnzymeStanza = Stanza<EnzymeState>;

impl Grammar for EnzymeGrammar {
    type Tag = EnzymeTag;
    type State = EnzymeState;

    fn name(&self) -> &'static str {
        "enzyme"
    }

    fn policy(&self) -> SingletonPolicy {
        SingletonPolicy::FoldIntoList
    }

    fn schema(&self) -> &'static Schema {
        &SCHEMA
    }

    fn accept(
        &self,
        stanza: &mut EnzymeStanza,
        tag: EnzymeTag,
        payload: &str,
        _continuation: bool,
    ) -> Result<(), FormatError> {
        match tag {
            EnzymeTag::Id => {
                let id = payload.trim();
                if id.is_empty() {
                    return Err(FormatError::malformed("ID", "missing EC number"));
                }
                stanza.set_id(id)
            },
            EnzymeTag::De => match accumulate(stanza, "DE", payload, ".") {
                Some(text) => finish_de(stanza, &text),
                None => Ok(()),
            },
            EnzymeTag::An => {
                if let Some(text) = accumulate(stanza, "AN", payload, ".") {
                    stanza.push_list("alternative_name", strip_period(&text));
                }
                Ok(())
            },
            EnzymeTag::Ca => {
                if let Some(text) = accumulate(stanza, "CA", payload, ".") {
                    finish_ca(stanza, &text);
                }
                Ok(())
            },
            EnzymeTag::Cf => {
                if let Some(text) = accumulate(stanza, "CF", payload, ".") {
                    finish_cf(stanza, &text);
                }
                Ok(())
            },
            EnzymeTag::Cc => {
                parse_cc(stanza, payload);
                Ok(())
            },
            EnzymeTag::Pr => parse_pr(stanza, payload),
            EnzymeTag::Dr => {
                for link in parse_dr(payload)? {
                    stanza.push_link(link);
                }
                Ok(())
            },
        }
    }

    fn close(&self, stanza: &mut EnzymeStanza) -> Result<(), FormatError> {
        finish_comment(stanza);

        if let Some(text) = stanza.take_pending("DE") {
            finish_de(stanza, &text)?;
        }
        if let Some(text) = stanza.take_pending("AN") {
            stanza.push_list("alternative_name", strip_period(&text));
        }
        if let Some(text) = stanza.take_pending("CA") {
            finish_ca(stanza, &text);
        }
        if let Some(text) = stanza.take_pending("CF") {
            finish_cf(stanza, &text);
        }
        Ok(())
    }
}

fn finish_de(stanza: &mut EnzymeStanza, text: &str) -> Result<(), FormatError> {
    let description = strip_period(text);

    let status = if description.starts_with("Deleted entry") {
        "deleted"
    } else if let Some(targets) = description.strip_prefix("Transferred entry:") {
        for target in targets.split(',').flat_map(|part| part.split(" and ")) {
            stanza.push_list("transferred_to", target.trim());
        }
        "transferred"
    } else {
        "active"
    };

    stanza.set_column("status", status)?;
    stanza.set_scalar("description", description)
}

/// Strip the `(n)` numbering of multi-reaction entries
fn finish_ca(stanza: &mut EnzymeStanza, text: &str) {
    let mut reaction = strip_period(text);
    if let Some(rest) = reaction.strip_prefix('(') {
        if let Some((number, after)) = rest.split_once(')') {
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                reaction = after.trim_start();
            }
        }
    }
    stanza.push_list("catalytic_activity", reaction);
}

fn finish_cf(stanza: &mut EnzymeStanza, text: &str) {
    for cofactor in split_items(text, ';', Some('.')) {
        stanza.push_list("cofactor", cofactor);
    }
}

fn parse_cc(stanza: &mut EnzymeStanza, payload: &str) {
    let line = payload.trim();
    if let Some(text) = line.strip_prefix("-!-") {
        finish_comment(stanza);
        stanza.state.comment = Some(text.trim().to_string());
    } else if let Some(comment) = stanza.state.comment.as_mut() {
        join_continuation(comment, line);
    }
}

fn finish_comment(stanza: &mut EnzymeStanza) {
    if let Some(comment) = stanza.state.comment.take() {
        stanza.push_list("comment", comment);
    }
}

fn parse_pr(stanza: &mut EnzymeStanza, payload: &str) -> Result<(), FormatError> {
    match split_items(payload, ';', None).as_slice() {
        [database, identifier, ..] => {
            stanza.push_db_ref(DbRef {
                database: database.clone(),
                identifier: identifier.clone(),
                detail: None,
            });
            Ok(())
        },
        _ => Err(FormatError::malformed("PR", format!("expected 'DB; ID;' in '{payload}'"))),
    }
}

/// `P07327, ADH1A_HUMAN;  P28469, ADH1A_MACMU;`
fn parse_dr(payload: &str) -> Result<Vec<Link>, FormatError> {
    split_items(payload, ';', None)
        .iter()
        .map(|pair| {
            let (accession, entry_name) = pair
                .split_once(',')
                .ok_or_else(|| FormatError::malformed("DR", format!("expected 'accession, name' in '{pair}'")))?;
            Ok(Link::Protein {
                accession: accession.trim().to_string(),
                entry_name: entry_name.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::accumulator::Records;
    use crate::record::Record;
    use std::convert::Infallible;

    fn parse(text: &str) -> Vec<Record> {
        let lines = text
            .lines()
            .map(|l| Ok::<_, Infallible>(l.to_string()))
            .collect::<Vec<_>>();
        Records::new(EnzymeGrammar, lines.into_iter())
            .collect::<crate::error::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_full_entry() {
        let records = parse(
            "\
ID   1.1.1.1
DE   Alcohol dehydrogenase.
AN   Aldehyde reductase.
CA   (1) A primary alcohol + NAD(+) = an aldehyde + NADH.
CA   (2) A secondary alcohol + NAD(+) = a ketone +
CA   NADH.
CF   Zn(2+); Fe cation.
CC   -!- Acts on primary or secondary alcohols or hemi-acetals with very
CC       broad specificity.
CC   -!- The animal, but not the yeast, enzyme acts also on cyclic
CC       secondary alcohols.
PR   PROSITE; PDOC00058;
DR   P07327, ADH1A_HUMAN;  P28469, ADH1A_MACMU;
DR   Q5RBP7, ADH1A_PONAB;
//
",
        );
        let r = &records[0];

        assert_eq!(r.id.as_deref(), Some("1.1.1.1"));
        assert_eq!(r.columns["status"], "active");
        assert_eq!(r.scalars["description"], "Alcohol dehydrogenase");
        assert_eq!(r.list("alternative_name"), ["Aldehyde reductase"]);
        assert_eq!(
            r.list("catalytic_activity"),
            [
                "A primary alcohol + NAD(+) = an aldehyde + NADH",
                "A secondary alcohol + NAD(+) = a ketone + NADH"
            ]
        );
        assert_eq!(r.list("cofactor"), ["Zn(2+)", "Fe cation"]);
        assert_eq!(r.list("comment").len(), 2);
        assert_eq!(
            r.list("comment")[0],
            "Acts on primary or secondary alcohols or hemi-acetals with very broad specificity."
        );
        assert_eq!(r.db_refs[0].identifier, "PDOC00058");
        assert_eq!(r.links.len(), 3);
        assert_eq!(
            r.links[1],
            Link::Protein {
                accession: "P28469".into(),
                entry_name: "ADH1A_MACMU".into()
            }
        );
    }

    #[test]
    fn test_transferred_entry() {
        let records = parse("ID   1.1.1.5\nDE   Transferred entry: 1.1.1.198, 1.1.1.227 and\nDE   1.1.1.228.\n//\n");
        let r = &records[0];
        assert_eq!(r.columns["status"], "transferred");
        assert_eq!(r.list("transferred_to"), ["1.1.1.198", "1.1.1.227", "1.1.1.228"]);
    }

    #[test]
    fn test_deleted_entry() {
        let records = parse("ID   1.1.1.74\nDE   Deleted entry.\n//\n");
        assert_eq!(records[0].columns["status"], "deleted");
    }

    #[test]
    fn test_repeated_description_folds() {
        let records = parse("ID   2.7.7.7\nDE   First name.\nDE   Second name.\n//\n");
        let r = &records[0];
        assert!(!r.scalars.contains_key("description"));
        assert_eq!(r.list("description"), ["First name", "Second name"]);
    }

    #[test]
    fn test_malformed_dr_line_is_dropped() {
        let records = parse("ID   1.1.1.1\nDR   P07327 ADH1A_HUMAN;\nDR   P28469, ADH1A_MACMU;\n//\n");
        assert_eq!(records[0].links.len(), 1);
    }
}
