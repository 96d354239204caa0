use std::fs::File;

use recon_ingest::CsvIngester;

#[test]
fn ingests_fixture_file_and_counts_invalid_rows() {
    let file = File::open(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample_batch.csv")).unwrap();
    let mut ingester = CsvIngester::new(file).unwrap();
    let rows: Vec<_> = ingester.by_ref().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(ingester.invalid_row_count(), 1);
}
