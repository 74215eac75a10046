//! Tests for the database row source, using an in-memory row client.

use anyhow::Result;
use textbeam::io::db::render_row;
use textbeam::testing::*;
use textbeam::*;

fn row(cols: &[Option<&str>]) -> Row {
    cols.iter().map(|c| c.map(str::to_string)).collect()
}

#[test]
fn one_chunk_per_row_joined_by_spaces() -> Result<()> {
    let client = StaticRowClient::rows(vec![
        row(&[Some("Ada"), Some("Lovelace"), Some("1815")]),
        row(&[Some("Alan\tTuring")]),
    ]);
    let source = DatabaseSource::new(client, "SELECT * FROM people");
    let chunks = source.read()?.collect::<textbeam::Result<Vec<_>>>()?;
    assert_eq!(chunks, vec!["Ada Lovelace 1815", "Alan\tTuring"]);
    Ok(())
}

#[test]
fn null_columns_render_empty() {
    assert_eq!(render_row(&row(&[Some("a"), None, Some("b")])), "a  b");
    assert_eq!(render_row(&row(&[None])), "");
    assert_eq!(render_row(&[]), "");
}

#[test]
fn zero_rows_produce_header_only_document() -> Result<()> {
    let (doc, report) = run_to_memory(
        DatabaseSource::new(StaticRowClient::rows(Vec::new()), "SELECT 1 WHERE false"),
        Runner::parallel(Some(2)),
        OutputStrategy::Reread,
    )?;
    assert_eq!(doc.text(), "");
    assert!(doc.statistics.is_empty());
    assert_eq!(report.metrics.chunks, 0);
    assert_eq!(report.metrics.bytes_written, 20);
    Ok(())
}

#[test]
fn connection_error_aborts_run() -> Result<()> {
    let dir = TempDirPath::new()?;
    let target = dir.file_path("out.txt");
    let source = DatabaseSource::new(StaticRowClient::unreachable("connection refused"), "SELECT 1");

    let err = Pipeline::new(source, FileSink::new(&target).with_echo(false))
        .run()
        .unwrap_err();

    match err {
        Error::Connection(msg) => assert!(msg.contains("connection refused")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!target.exists());
    Ok(())
}

#[test]
fn describe_names_the_endpoint() {
    let source = DatabaseSource::new(StaticRowClient::rows(Vec::new()), "SELECT 1");
    assert_eq!(source.describe(), "query on static://rows");
    assert_eq!(source.query(), "SELECT 1");
}
