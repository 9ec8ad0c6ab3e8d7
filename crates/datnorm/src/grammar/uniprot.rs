//! UniProtKB flat-file grammar
//!
//! ```text
//! ID   CYC_HUMAN               Reviewed;         105 AA.
//! AC   P99999; B2R4Y5;
//! DT   21-JUL-1986, integrated into UniProtKB/Swiss-Prot.
//! DE   RecName: Full=Cytochrome c;
//! OS   Homo sapiens (Human).
//! OX   NCBI_TaxID=9606;
//! CC   -!- INTERACTION:
//! CC       P99999; Q9Y6K9: IKBKG; NbExp=3; IntAct=EBI-1, EBI-2;
//! SQ   SEQUENCE   105 AA;  11749 MW;  C1B2A4D2B8D4A4F3 CRC64;
//!      MGDVEKGKKI FVQKCAQCHT VEKGGKHKTG PNLHGLFGRK TGQAPGYSYT
//! //
//! ```
//!
//! Entry name, entity columns and scalars are single-valued; a second,
//! different value aborts the run.

use crate::error::FormatError;
use crate::line::TagCode;
use crate::record::{DbRef, Link};
use crate::schema::{Column, LinkKind, Schema};
use crate::stanza::{SingletonPolicy, Stanza};
use crate::tokens::{self, join_continuation, key_value, split_items, strip_evidence, strip_period};

use super::{accumulate, Grammar};

pub static SCHEMA: Schema = Schema {
    prefix: "protein",
    columns: &[
        Column::text("status"),
        Column::integer("taxon_id"),
        Column::integer("sequence_length"),
        Column::integer("molecular_weight"),
        Column::text("crc64"),
    ],
    links: &[LinkKind::Interactions, LinkKind::Isoforms],
    filterable: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniProtTag {
    Id,
    Ac,
    Dt,
    De,
    Gn,
    Os,
    Og,
    Oc,
    Ox,
    Oh,
    Rx,
    Rt,
    Cc,
    Dr,
    Pe,
    Kw,
    Ft,
    Sq,
}

impl TagCode for UniProtTag {
    const WIDTH: usize = 2;
    const PAYLOAD_COLUMN: usize = 5;

    fn from_code(code: &str) -> Option<Self> {
        use UniProtTag::*;
        Some(match code {
            "ID" => Id,
            "AC" => Ac,
            "DT" => Dt,
            "DE" => De,
            "GN" => Gn,
            "OS" => Os,
            "OG" => Og,
            "OC" => Oc,
            "OX" => Ox,
            "OH" => Oh,
            "RX" => Rx,
            "RT" => Rt,
            "CC" => Cc,
            "DR" => Dr,
            "PE" => Pe,
            "KW" => Kw,
            "FT" => Ft,
            "SQ" => Sq,
            _ => return None,
        })
    }

    fn code(self) -> &'static str {
        use UniProtTag::*;
        match self {
            Id => "ID",
            Ac => "AC",
            Dt => "DT",
            De => "DE",
            Gn => "GN",
            Os => "OS",
            Og => "OG",
            Oc => "OC",
            Ox => "OX",
            Oh => "OH",
            Rx => "RX",
            Rt => "RT",
            Cc => "CC",
            Dr => "DR",
            Pe => "PE",
            Kw => "KW",
            Ft => "FT",
            Sq => "SQ",
        }
    }

    fn is_start(self) -> bool {
        self == UniProtTag::Id
    }
}

/// Section of the DE block the current name belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum DeSection {
    #[default]
    None,
    RecName,
    AltName,
    SubName,
    Flags,
}

#[derive(Debug, Default)]
struct CommentBlock {
    topic: String,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
struct Feature {
    key: String,
    location: String,
    description: String,
    qualifiers: String,
}

#[derive(Debug, Default)]
pub struct UniProtState {
    section: DeSection,
    /// Inside a `Contains:` / `Includes:` group
    nested: bool,
    comment: Option<CommentBlock>,
    copyright: bool,
    feature: Option<Feature>,
    sequence: String,
}

/// Fields accumulated across lines before they are parsed
const PENDING_FIELDS: [(&str, UniProtTag); 7] = [
    ("DE", UniProtTag::De),
    ("GN", UniProtTag::Gn),
    ("OS", UniProtTag::Os),
    ("OG", UniProtTag::Og),
    ("OC", UniProtTag::Oc),
    ("RT", UniProtTag::Rt),
    ("KW", UniProtTag::Kw),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct UniProtGrammar;

type UniProtStanza = Stanza<UniProtState>;

impl Grammar for UniProtGrammar {
    type Tag = UniProtTag;
    type State = UniProtState;

    fn name(&self) -> &'static str {
        "uniprot"
    }

    fn policy(&self) -> SingletonPolicy {
        SingletonPolicy::Fatal
    }

    fn schema(&self) -> &'static Schema {
        &SCHEMA
    }

    fn accept(
        &self,
        stanza: &mut UniProtStanza,
        tag: UniProtTag,
        payload: &str,
        continuation: bool,
    ) -> Result<(), FormatError> {
        match tag {
            UniProtTag::Id => parse_id(stanza, payload),
            UniProtTag::Ac => {
                for accession in split_items(payload, ';', None) {
                    stanza.push_accession(accession);
                }
                Ok(())
            },
            UniProtTag::Dt => parse_dt(stanza, payload),
            UniProtTag::De => {
                let line = payload.trim();
                if line == "Contains:" || line == "Includes:" {
                    stanza.state.nested = true;
                    return Ok(());
                }
                match accumulate(stanza, "DE", line, ";") {
                    Some(text) => finish_de(stanza, &text),
                    None => Ok(()),
                }
            },
            UniProtTag::Gn => {
                // `and` separates genes; every value goes to the same lists
                if payload.trim() == "and" {
                    return Ok(());
                }
                match accumulate(stanza, "GN", payload, ";") {
                    Some(text) => finish_gn(stanza, &text),
                    None => Ok(()),
                }
            },
            UniProtTag::Os => match accumulate(stanza, "OS", payload, ".") {
                Some(text) => finish_os(stanza, &text),
                None => Ok(()),
            },
            UniProtTag::Og => {
                if let Some(text) = accumulate(stanza, "OG", payload, ".") {
                    finish_og(stanza, &text);
                }
                Ok(())
            },
            UniProtTag::Oc => {
                if let Some(text) = accumulate(stanza, "OC", payload, ".") {
                    finish_oc(stanza, &text);
                }
                Ok(())
            },
            UniProtTag::Ox => parse_ox(stanza, payload),
            UniProtTag::Oh => parse_oh(stanza, payload),
            UniProtTag::Rx => {
                parse_rx(stanza, payload);
                Ok(())
            },
            UniProtTag::Rt => {
                if let Some(text) = accumulate(stanza, "RT", payload, "\";") {
                    finish_rt(stanza, &text);
                }
                Ok(())
            },
            UniProtTag::Cc => parse_cc(stanza, payload),
            UniProtTag::Dr => parse_dr(stanza, payload),
            UniProtTag::Pe => parse_pe(stanza, payload),
            UniProtTag::Kw => {
                if let Some(text) = accumulate(stanza, "KW", payload, ".") {
                    finish_kw(stanza, &text);
                }
                Ok(())
            },
            UniProtTag::Ft => parse_ft(stanza, payload),
            UniProtTag::Sq if continuation => {
                stanza
                    .state
                    .sequence
                    .extend(payload.chars().filter(|c| !c.is_whitespace()));
                Ok(())
            },
            UniProtTag::Sq => parse_sq(stanza, payload),
        }
    }

    fn close(&self, stanza: &mut UniProtStanza) -> Result<(), FormatError> {
        finish_comment(stanza)?;
        finish_feature(stanza);

        for (key, tag) in PENDING_FIELDS {
            let Some(text) = stanza.take_pending(key) else {
                continue;
            };
            match tag {
                UniProtTag::De => finish_legacy_de(stanza, &text)?,
                UniProtTag::Gn => finish_gn(stanza, &text)?,
                UniProtTag::Os => finish_os(stanza, &text)?,
                UniProtTag::Og => finish_og(stanza, &text),
                UniProtTag::Oc => finish_oc(stanza, &text),
                UniProtTag::Rt => finish_rt(stanza, &text),
                _ => finish_kw(stanza, &text),
            }
        }

        let sequence = std::mem::take(&mut stanza.state.sequence);
        if !sequence.is_empty() {
            stanza.set_scalar("sequence", sequence)?;
        }
        Ok(())
    }
}

fn parse_id(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let mut parts = payload.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| FormatError::malformed("ID", "missing entry name"))?;
    stanza.set_id(name)?;
    if let Some(status) = parts.next() {
        stanza.set_column("status", status.trim_end_matches(';'))?;
    }
    Ok(())
}

fn parse_dt(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let (date, event) = payload
        .split_once(',')
        .ok_or_else(|| FormatError::malformed("DT", format!("no event in '{payload}'")))?;
    let date = tokens::parse_date(date)?.format("%Y-%m-%d").to_string();
    let event = strip_period(event);

    if event.starts_with("integrated into") {
        return stanza.set_scalar("integrated", date);
    }
    let versioned = [
        ("sequence version", "sequence_updated", "sequence_version"),
        ("entry version", "entry_updated", "entry_version"),
    ];
    for (prefix, date_name, version_name) in versioned {
        if let Some(version) = event.strip_prefix(prefix) {
            stanza.set_scalar(date_name, date)?;
            return stanza.set_scalar(version_name, version.trim());
        }
    }
    Err(FormatError::malformed("DT", format!("unknown event '{event}'")))
}

fn finish_de(stanza: &mut UniProtStanza, text: &str) -> Result<(), FormatError> {
    let text = strip_evidence(text);
    let text = text.trim_end_matches(';').trim();

    let sections = [
        ("RecName:", DeSection::RecName),
        ("AltName:", DeSection::AltName),
        ("SubName:", DeSection::SubName),
        ("Flags:", DeSection::Flags),
    ];
    let mut rest = text;
    for (header, section) in sections {
        if let Some(after) = text.strip_prefix(header) {
            stanza.state.section = section;
            rest = after.trim();
            break;
        }
    }

    if stanza.state.section == DeSection::Flags {
        for flag in split_items(rest, ';', None) {
            stanza.push_list("flag", flag);
        }
        return Ok(());
    }

    let (key, value) =
        key_value(rest).ok_or_else(|| FormatError::malformed("DE", format!("expected Key=value, got '{rest}'")))?;
    let nested = stanza.state.nested;
    match (stanza.state.section, key) {
        (_, "Full") if nested => stanza.push_list("component_name", value),
        (DeSection::RecName, "Full") => stanza.set_scalar("recommended_name", value)?,
        (DeSection::AltName, "Full") => stanza.push_list("alternative_name", value),
        (DeSection::SubName, "Full") => stanza.push_list("submitted_name", value),
        (_, "Short") => stanza.push_list("short_name", value),
        (_, "EC") => stanza.push_list("ec_number", value),
        (_, other) => stanza.push_list(&attribute_name(other), value),
    }
    Ok(())
}

/// Pre-2008 DE lines carry a bare name closed by a period
fn finish_legacy_de(stanza: &mut UniProtStanza, text: &str) -> Result<(), FormatError> {
    if stanza.record().scalars.contains_key("recommended_name") {
        return Err(FormatError::malformed("DE", format!("unterminated '{text}'")));
    }
    stanza.set_scalar("recommended_name", strip_period(&strip_evidence(text)))
}

fn finish_gn(stanza: &mut UniProtStanza, text: &str) -> Result<(), FormatError> {
    let text = strip_evidence(text);
    for item in split_items(&text, ';', None) {
        let (key, values) =
            key_value(&item).ok_or_else(|| FormatError::malformed("GN", format!("expected Key=value, got '{item}'")))?;
        let name = match key {
            "Name" => "gene_name",
            "Synonyms" => "gene_synonym",
            "OrderedLocusNames" => "ordered_locus_name",
            "ORFNames" => "orf_name",
            other => return Err(FormatError::malformed("GN", format!("unknown key '{other}'"))),
        };
        for value in split_items(values, ',', None) {
            stanza.push_list(name, value);
        }
    }
    Ok(())
}

fn finish_os(stanza: &mut UniProtStanza, text: &str) -> Result<(), FormatError> {
    stanza.set_scalar("organism", strip_period(&strip_evidence(text)))
}

fn finish_og(stanza: &mut UniProtStanza, text: &str) {
    stanza.push_list("organelle", strip_period(&strip_evidence(text)));
}

fn finish_oc(stanza: &mut UniProtStanza, text: &str) {
    for taxon in split_items(text, ';', Some('.')) {
        stanza.push_list("lineage", taxon);
    }
}

fn parse_ox(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let text = strip_evidence(payload);
    for item in split_items(&text, ';', None) {
        if let Some(("NCBI_TaxID", id)) = key_value(&item) {
            if id.parse::<u64>().is_err() {
                return Err(FormatError::malformed("OX", format!("invalid taxon id '{id}'")));
            }
            return stanza.set_column("taxon_id", id);
        }
    }
    Err(FormatError::malformed("OX", format!("no NCBI_TaxID in '{payload}'")))
}

fn parse_oh(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let text = strip_evidence(payload);
    let first = split_items(&text, ';', None).into_iter().next().unwrap_or_default();
    match key_value(&first) {
        Some(("NCBI_TaxID", id)) => {
            stanza.push_list("host_taxon", id);
            Ok(())
        },
        _ => Err(FormatError::malformed("OH", format!("no NCBI_TaxID in '{payload}'"))),
    }
}

fn parse_rx(stanza: &mut UniProtStanza, payload: &str) {
    for item in split_items(payload, ';', None) {
        if let Some((key, value)) = key_value(&item) {
            stanza.push_list(&attribute_name(key), value);
        }
    }
}

fn finish_rt(stanza: &mut UniProtStanza, text: &str) {
    let title = text.trim().trim_end_matches(';').trim_matches('"');
    stanza.push_list("citation_title", title);
}

fn parse_cc(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let line = payload.trim();

    if let Some(block) = line.strip_prefix("-!-") {
        finish_comment(stanza)?;
        let (topic, text) = block.split_once(':').unwrap_or((block, ""));
        let mut comment = CommentBlock {
            topic: topic.trim().to_string(),
            lines: Vec::new(),
        };
        if !text.trim().is_empty() {
            comment.lines.push(text.trim().to_string());
        }
        stanza.state.comment = Some(comment);
        stanza.state.copyright = false;
        return Ok(());
    }

    if line.starts_with("---") {
        finish_comment(stanza)?;
        stanza.state.copyright = true;
        return Ok(());
    }

    if stanza.state.copyright {
        return Ok(());
    }
    match stanza.state.comment.as_mut() {
        Some(comment) => {
            comment.lines.push(line.to_string());
            Ok(())
        },
        None => Err(FormatError::malformed("CC", "text outside of a comment block")),
    }
}

fn finish_comment(stanza: &mut UniProtStanza) -> Result<(), FormatError> {
    let Some(comment) = stanza.state.comment.take() else {
        return Ok(());
    };

    match comment.topic.as_str() {
        "INTERACTION" => {
            let own = stanza.record().primary_accession().map(str::to_string);
            for line in &comment.lines {
                // a bad pair does not invalidate the others
                if let Ok(link) = parse_interaction(line, own.as_deref()) {
                    stanza.push_link(link);
                }
            }
        },
        "ALTERNATIVE PRODUCTS" => {
            for link in parse_isoforms(&comment.lines) {
                stanza.push_link(link);
            }
        },
        topic => {
            let mut text = String::new();
            for line in &comment.lines {
                join_continuation(&mut text, line);
            }
            stanza.push_list(&attribute_name(topic), strip_evidence(&text));
        },
    }
    Ok(())
}

/// One line of an INTERACTION block, in either layout:
///
/// ```text
/// P99999; Q9Y6K9: IKBKG; NbExp=3; IntAct=EBI-1, EBI-2;
/// Q9W158:CG4612; NbExp=1; IntActId=EBI-1, EBI-2;
/// Self; NbExp=2; IntAct=EBI-3, EBI-3;
/// ```
fn parse_interaction(line: &str, own: Option<&str>) -> Result<Link, FormatError> {
    let items = split_items(line, ';', None);
    let experiments = items
        .iter()
        .filter_map(|item| key_value(item))
        .find(|(key, _)| *key == "NbExp")
        .and_then(|(_, n)| n.parse().ok());

    let partner_of = |item: &str| item.split(':').next().unwrap_or_default().trim().to_string();
    let missing_own = || FormatError::malformed("CC", "interaction without an accession");

    match items.as_slice() {
        [first, ..] if first == "Self" => {
            let own = own.ok_or_else(missing_own)?;
            Ok(Link::interaction(own, own, experiments))
        },
        [first, second, ..] if !second.contains('=') => {
            Ok(Link::interaction(first, &partner_of(second), experiments))
        },
        [first, ..] if !first.contains('=') => {
            let own = own.ok_or_else(missing_own)?;
            Ok(Link::interaction(own, &partner_of(first), experiments))
        },
        _ => Err(FormatError::malformed("CC", format!("unparsable interaction '{line}'"))),
    }
}

/// Isoforms of an ALTERNATIVE PRODUCTS block; each `Name=` opens a new one
fn parse_isoforms(lines: &[String]) -> Vec<Link> {
    let mut out = Vec::new();
    let mut name: Option<String> = None;
    let mut iso_id: Option<String> = None;
    let mut sequence: Option<String> = None;

    let mut flush = |name: &mut Option<String>, iso_id: &mut Option<String>, sequence: &mut Option<String>| {
        if let Some(iso_id) = iso_id.take() {
            out.push(Link::Isoform {
                iso_id,
                name: name.take(),
                sequence: sequence.take(),
            });
        }
        *name = None;
        *sequence = None;
    };

    for line in lines {
        for item in split_items(&strip_evidence(line), ';', None) {
            let Some((key, value)) = key_value(&item) else {
                continue;
            };
            match key {
                "Name" => {
                    flush(&mut name, &mut iso_id, &mut sequence);
                    name = Some(value.to_string());
                },
                "IsoId" => {
                    let first = value.split(',').next().unwrap_or_default().trim();
                    if !first.is_empty() {
                        iso_id = Some(first.to_string());
                    }
                },
                "Sequence" => sequence = Some(value.to_string()),
                _ => {},
            }
        }
    }
    flush(&mut name, &mut iso_id, &mut sequence);
    out
}

fn parse_dr(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let items = split_items(strip_period(payload), ';', None);
    match items.as_slice() {
        [database, identifier, detail @ ..] => {
            let detail = detail
                .iter()
                .filter(|d| d.as_str() != "-")
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            stanza.push_db_ref(DbRef {
                database: database.clone(),
                identifier: identifier.clone(),
                detail: (!detail.is_empty()).then_some(detail),
            });
            Ok(())
        },
        _ => Err(FormatError::malformed("DR", format!("expected 'DB; ID;' in '{payload}'"))),
    }
}

fn parse_pe(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let (level, _) = payload
        .split_once(':')
        .ok_or_else(|| FormatError::malformed("PE", format!("expected 'N: text' in '{payload}'")))?;
    stanza.set_scalar("protein_existence", level.trim())
}

fn finish_kw(stanza: &mut UniProtStanza, text: &str) {
    let text = strip_evidence(text);
    for keyword in split_items(&text, ';', Some('.')) {
        stanza.push_list("keyword", keyword);
    }
}

/// FT lines. A line whose payload starts with whitespace continues the
/// current feature (qualifiers or wrapped text); otherwise it opens one:
///
/// ```text
/// FT   CHAIN           2..105
/// FT                   /note="Cytochrome c"
/// FT   INIT_MET      1      1       Removed.
/// ```
fn parse_ft(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    if payload.starts_with(char::is_whitespace) {
        let feature = stanza
            .state
            .feature
            .as_mut()
            .ok_or_else(|| FormatError::malformed("FT", "qualifier without a feature"))?;
        if feature.qualifiers.is_empty() && !payload.trim_start().starts_with('/') {
            join_continuation(&mut feature.description, payload);
        } else {
            join_continuation(&mut feature.qualifiers, payload);
        }
        return Ok(());
    }

    finish_feature(stanza);

    let tokens: Vec<&str> = payload.split_whitespace().collect();
    let (key, rest) = tokens
        .split_first()
        .ok_or_else(|| FormatError::malformed("FT", "empty feature line"))?;

    let is_position = |t: &str| !t.is_empty() && t.trim_matches(['<', '>', '?']).chars().all(|c| c.is_ascii_digit());
    let feature = match rest {
        [from, to, description @ ..] if is_position(from) && is_position(to) => Feature {
            key: key.to_string(),
            location: if from == to {
                from.to_string()
            } else {
                format!("{from}..{to}")
            },
            description: description.join(" "),
            qualifiers: String::new(),
        },
        _ => Feature {
            key: key.to_string(),
            location: rest.join(" "),
            ..Feature::default()
        },
    };
    stanza.state.feature = Some(feature);
    Ok(())
}

fn finish_feature(stanza: &mut UniProtStanza) {
    let Some(feature) = stanza.state.feature.take() else {
        return;
    };

    let note = qualifier(&feature.qualifiers, "note")
        .unwrap_or_else(|| strip_period(&feature.description).to_string());
    let note = strip_evidence(&note);
    let value = if note.is_empty() {
        format!("{} {}", feature.key, feature.location)
    } else {
        format!("{} {}: {}", feature.key, feature.location, note)
    };
    stanza.push_list("feature", value.trim());
}

/// Value of `/name="..."` in joined qualifier text
fn qualifier(qualifiers: &str, name: &str) -> Option<String> {
    let marker = format!("/{name}=\"");
    let start = qualifiers.find(&marker)? + marker.len();
    let rest = &qualifiers[start..];
    let end = rest.find('"').unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn parse_sq(stanza: &mut UniProtStanza, payload: &str) -> Result<(), FormatError> {
    let mut columns = Vec::with_capacity(3);
    for item in split_items(payload, ';', None) {
        let words: Vec<&str> = item.split_whitespace().collect();
        let (column, value) = match words.as_slice() {
            ["SEQUENCE", length, "AA"] => ("sequence_length", *length),
            [weight, "MW"] => ("molecular_weight", *weight),
            [checksum, "CRC64"] => ("crc64", *checksum),
            _ => return Err(FormatError::malformed("SQ", format!("unexpected item '{item}'"))),
        };
        if column != "crc64" && value.parse::<u64>().is_err() {
            return Err(FormatError::malformed("SQ", format!("invalid {column} '{value}'")));
        }
        columns.push((column, value.to_string()));
    }

    // the whole line is checked before any column is set
    for (column, value) in columns {
        stanza.set_column(column, value)?;
    }
    Ok(())
}

/// `SUBCELLULAR LOCATION` -> `subcellular_location`, `CD_antigen` -> `cd_antigen`
fn attribute_name(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .replace([' ', '-', '/'], "_")
}
