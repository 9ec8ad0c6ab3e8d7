//! Property tests over whole runs

mod common;

use std::collections::HashSet;

use common::{inserts, lines};
use datnorm::grammar::EnzymeGrammar;
use datnorm::sink::MemorySink;
use datnorm::{normalize, NormalizerConfig};
use proptest::prelude::*;

const RECORD: &[&str] = &[
    "ID   1.1.1.1",
    "DE   Alcohol dehydrogenase.",
    "AN   Aldehyde reductase.",
    "CA   (1) A primary alcohol + NAD(+) = an aldehyde + NADH.",
    "CF   Zn(2+) or Fe cation.",
    "CC   -!- Acts on primary or secondary alcohols or hemi-acetals",
    "CC       with very broad specificity.",
    "PR   PROSITE; PDOC00058;",
    "DR   P07327, ADH1A_HUMAN;  P28469, ADH1A_MACMU;",
    "DR   P00325, ADH1B_HUMAN;",
    "//",
];

fn to_sql(text: &str) -> String {
    let mut sink = MemorySink::new();
    normalize(EnzymeGrammar, lines(text), &NormalizerConfig::default(), &mut sink).expect("Failed to normalize");
    sink.to_sql()
}

fn noise_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("XX   noise".to_string()),
        "[a-z ]{0,20}".prop_map(|s| format!("ZZ   {s}")),
        Just(String::new()),
    ]
}

proptest! {
    #[test]
    fn unrecognized_lines_do_not_change_output(
        noise in prop::collection::vec((0..RECORD.len(), noise_line()), 0..6)
    ) {
        let baseline = to_sql(&RECORD.join("\n"));

        let mut noisy: Vec<String> = RECORD.iter().map(|l| l.to_string()).collect();
        for (position, line) in noise {
            let position = position.min(noisy.len());
            noisy.insert(position, line);
        }

        prop_assert_eq!(to_sql(&noisy.join("\n")), baseline);
    }

    #[test]
    fn list_values_are_stored_once_per_record(
        cofactors in prop::collection::vec("[a-c]{1,2}", 1..8)
    ) {
        let text = format!("ID   9.9.9.9\nCF   {}.\n//\n", cofactors.join("; "));
        let mut sink = MemorySink::new();
        normalize(EnzymeGrammar, lines(&text), &NormalizerConfig::default(), &mut sink)
            .expect("Failed to normalize");

        let distinct: HashSet<_> = cofactors.iter().collect();
        prop_assert_eq!(
            inserts(&sink.statements, "enzyme_list_attributes").len(),
            distinct.len()
        );
    }
}
