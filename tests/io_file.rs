//! Tests for the memory-mapped file source.

use anyhow::Result;
use textbeam::testing::*;
use textbeam::*;

fn chunks_of(source: &FileSource) -> Result<Vec<String>> {
    Ok(source.read()?.collect::<textbeam::Result<Vec<_>>>()?)
}

#[test]
fn chunks_reassemble_to_file_contents() -> Result<()> {
    let text = "Grüße\taus Köln 😀 — €100\n".repeat(50);
    let input = text_file(&text)?;

    for size in [1, 2, 3, 5, 7, 64, 4096] {
        let source = FileSource::new(input.path()).with_chunk_size(size);
        let chunks = chunks_of(&source)?;
        assert_eq!(chunks.concat(), text, "chunk_size={size}");
        assert!(chunks.iter().all(|c| !c.is_empty()));
        if size >= 4 {
            assert!(chunks.iter().all(|c| c.len() <= size), "chunk_size={size}");
        }
    }
    Ok(())
}

#[test]
fn traversals_are_identical() -> Result<()> {
    let input = text_file("one\ttwo\tthree ŝ")?;
    let source = FileSource::new(input.path()).with_chunk_size(4);
    assert_eq!(chunks_of(&source)?, chunks_of(&source)?);
    Ok(())
}

#[test]
fn empty_file_yields_no_chunks() -> Result<()> {
    let input = TempFilePath::new()?;
    assert!(chunks_of(&FileSource::new(input.path()))?.is_empty());
    Ok(())
}

#[test]
fn missing_file_is_source_io_error() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("absent.txt");
    let Err(err) = FileSource::new(&path).read() else {
        panic!("reading a missing file must fail");
    };
    match err {
        Error::SourceIo { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn invalid_utf8_reports_absolute_offset() -> Result<()> {
    let mut bytes = b"abcdefgh".to_vec();
    bytes.push(0xFF);
    bytes.extend_from_slice(b"tail");
    let input = TempFilePath::with_contents(&bytes)?;
    let source = FileSource::new(input.path()).with_chunk_size(4);

    let items: Vec<_> = source.read()?.collect();
    assert_eq!(items.len(), 3, "two good chunks, then the error, then nothing");
    assert_eq!(items[0].as_ref().unwrap(), "abcd");
    assert_eq!(items[1].as_ref().unwrap(), "efgh");
    match &items[2] {
        Err(Error::Encoding { offset, .. }) => assert_eq!(*offset, 8),
        other => panic!("expected encoding error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn pipeline_output_does_not_depend_on_chunk_size() -> Result<()> {
    let text = "İstanbul\tΣΊΣΥΦΟΣ ǅ ÅNGSTRÖM\nthe END\t".repeat(20);
    let input = text_file(&text)?;

    let reference = run_to_memory(
        FileSource::new(input.path()),
        Runner::sequential(),
        OutputStrategy::Reread,
    )?
    .0;
    for size in [1, 3, 16, 257] {
        let (doc, _) = run_to_memory(
            FileSource::new(input.path()).with_chunk_size(size),
            Runner::parallel(Some(4)),
            OutputStrategy::Reassemble,
        )?;
        assert_eq!(doc.text(), reference.text(), "chunk_size={size}");
        assert_eq!(
            doc.statistics.iter().collect::<Vec<_>>(),
            reference.statistics.iter().collect::<Vec<_>>()
        );
    }
    Ok(())
}
