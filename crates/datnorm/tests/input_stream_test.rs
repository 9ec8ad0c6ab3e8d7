//! Normalizing straight from files: gzip inputs, several inputs, file output

mod common;

use std::fs::File;
use std::io::Write;

use common::{fixture_path, fixture_text};
use datnorm::grammar::EnzymeGrammar;
use datnorm::sink::SqlTextSink;
use datnorm::{normalize, NormalizerConfig};
use datnorm_common::stream::{InputSource, LineStream, OutputTarget};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

fn gzip_fixture(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("enzyme.dat.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(fixture_text("enzyme").as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn normalize_to_file(inputs: &[InputSource], output: &std::path::Path) -> datnorm::RunStats {
    let lines = LineStream::open(inputs).expect("Failed to open inputs");
    let out = OutputTarget::Path(output.to_path_buf()).create().unwrap();
    let mut sink = SqlTextSink::new(out);
    normalize(EnzymeGrammar, lines, &NormalizerConfig::default(), &mut sink).expect("Failed to normalize")
}

#[test]
fn test_gzip_input_matches_plain_input() {
    let dir = TempDir::new().unwrap();
    let gz = gzip_fixture(&dir);
    let plain_out = dir.path().join("plain.sql");
    let gz_out = dir.path().join("gz.sql");

    let plain_stats = normalize_to_file(&[InputSource::Path(fixture_path("enzyme"))], &plain_out);
    let gz_stats = normalize_to_file(&[InputSource::Path(gz)], &gz_out);

    assert_eq!(plain_stats.committed, 4);
    assert_eq!(gz_stats.committed, plain_stats.committed);
    assert_eq!(
        std::fs::read_to_string(&plain_out).unwrap(),
        std::fs::read_to_string(&gz_out).unwrap()
    );
}

#[test]
fn test_inputs_are_read_back_to_back() {
    let dir = TempDir::new().unwrap();
    let extra = dir.path().join("extra.dat");
    std::fs::write(&extra, "ID   9.9.9.9\nDE   Extra enzyme.\n//\n").unwrap();
    let output = dir.path().join("out.sql");

    let stats = normalize_to_file(
        &[InputSource::Path(fixture_path("enzyme")), InputSource::Path(extra)],
        &output,
    );

    assert_eq!(stats.committed, 5);
    let sql = std::fs::read_to_string(&output).unwrap();
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"));
    assert!(sql.contains("'9.9.9.9'"));
    assert!(sql.trim_end().ends_with("COMMIT;"));
}

#[test]
fn test_missing_input_fails_before_any_output() {
    let dir = TempDir::new().unwrap();
    let result = LineStream::open(&[InputSource::Path(dir.path().join("absent.dat"))]);
    assert!(result.is_err());
}
