use anyhow::Result;
use std::time::Duration;
use textbeam::combiners::ByteCount;
use textbeam::testing::*;
use textbeam::*;

fn corpus() -> Vec<String> {
    (0..97)
        .map(|i| match i % 4 {
            0 => format!("Chunk {i}\tQUICK"),
            1 => "brown Fox ".to_string(),
            2 => format!("Ǆungla ÆØÅ {i}"),
            _ => "\t\t".to_string(),
        })
        .collect()
}

fn stats_pass(runner: &Runner, source: &VecSource) -> Result<textbeam::runner::Reduced<Statistics>> {
    Ok(runner.run::<_, Statistics, Statistics>(source, &TabLowercase, &AlphabetCount, true)?)
}

#[test]
fn parallel_matches_sequential_for_any_worker_count() -> Result<()> {
    let source = VecSource::new(corpus());
    let seq = stats_pass(&Runner::sequential(), &source)?;

    for workers in [1, 2, 3, 8, 16] {
        for depth in [1, 2, 64] {
            let runner = Runner::parallel(Some(workers)).with_queue_depth(depth);
            let par = stats_pass(&runner, &source)?;
            assert_eq!(
                par.output.iter().collect::<Vec<_>>(),
                seq.output.iter().collect::<Vec<_>>(),
                "workers={workers} depth={depth}"
            );
            assert_eq!(par.text, seq.text);
            assert_eq!(par.chunks, 97);
            assert_eq!(par.bytes_read, seq.bytes_read);
            assert_eq!(par.workers, workers);
        }
    }
    Ok(())
}

#[test]
fn out_of_order_completion_keeps_first_occurrence_order() -> Result<()> {
    // Longer chunks finish first, so the reducer sees later indices early.
    let source = VecSource::new(["zzz", "yy", "x", "wwww", "Zz"]);
    let sanitizer = Staggered::new(TabLowercase, Duration::from_millis(15));
    let runner = Runner::parallel(Some(5));

    let reduced = runner.run::<_, Statistics, Statistics>(&source, &sanitizer, &AlphabetCount, true)?;

    assert_eq!(
        reduced.output.iter().collect::<Vec<_>>(),
        vec![('z', 5), ('y', 2), ('x', 1), ('w', 4)]
    );
    assert_eq!(reduced.text, vec!["zzz", "yy", "x", "wwww", "zz"]);
    Ok(())
}

#[test]
fn empty_source_yields_identity() -> Result<()> {
    let source = VecSource::new(Vec::<String>::new());
    let reduced = stats_pass(&Runner::parallel(Some(4)), &source)?;
    assert!(reduced.output.is_empty());
    assert!(reduced.text.is_empty());
    assert_eq!(reduced.chunks, 0);
    Ok(())
}

#[test]
fn text_is_dropped_unless_requested() -> Result<()> {
    let source = VecSource::new(["A", "B"]);
    let reduced = Runner::parallel(Some(2)).run::<_, Statistics, Statistics>(
        &source,
        &TabLowercase,
        &AlphabetCount,
        false,
    )?;
    assert!(reduced.text.is_empty());
    assert_eq!(reduced.output.total(), 2);
    Ok(())
}

#[test]
fn other_combiners_run_on_the_same_engine() -> Result<()> {
    let source = VecSource::new(["a\tb", "c"]);
    let seq = Runner::sequential().run::<_, u64, u64>(&source, &TabLowercase, &ByteCount, false)?;
    let par =
        Runner::parallel(Some(3)).run::<_, u64, u64>(&source, &TabLowercase, &ByteCount, false)?;
    assert_eq!(seq.output, 7);
    assert_eq!(par.output, 7);
    Ok(())
}

#[test]
fn cancelled_run_returns_cancelled() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let source = VecSource::new(corpus());

    for runner in [Runner::sequential(), Runner::parallel(Some(4))] {
        let err = runner
            .with_cancel(cancel.clone())
            .run::<_, Statistics, Statistics>(&source, &TabLowercase, &AlphabetCount, false)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}

#[test]
fn cancelled_pipeline_writes_nothing() -> Result<()> {
    let cancel = CancelToken::new();
    cancel.cancel();
    let sink = MemorySink::new();

    let result = Pipeline::new(VecSource::new(["a", "b"]), sink.clone())
        .with_runner(Runner::parallel(Some(2)).with_cancel(cancel))
        .run();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(sink.captured().is_none());
    Ok(())
}

#[test]
fn source_error_propagates_after_drain() {
    for runner in [Runner::sequential(), Runner::parallel(Some(3)).with_queue_depth(1)] {
        let err = runner
            .run::<_, Statistics, Statistics>(
                &FailingSource::after(20),
                &TabLowercase,
                &AlphabetCount,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, Error::SourceIo { .. }), "{err}");
    }
}

#[test]
fn sequential_reports_one_worker() -> Result<()> {
    let source = VecSource::new(["x"]);
    let reduced = stats_pass(&Runner::sequential(), &source)?;
    assert_eq!(reduced.workers, 1);
    assert_eq!(Runner::sequential().mode, ExecMode::Sequential);
    Ok(())
}

#[test]
fn worker_panic_propagates_without_hanging() {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::mpsc;

    let source = VecSource::new((0..300).map(|i| format!("Chunk {i}")));
    let sanitizer = |s: &str| {
        assert_ne!(s, "Chunk 7", "sanitizer failure");
        s.to_lowercase()
    };
    let runner = Runner::parallel(Some(2)).with_queue_depth(1);

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            runner.run::<_, Statistics, Statistics>(&source, &sanitizer, &AlphabetCount, false)
        }));
        let _ = done_tx.send(outcome.is_err());
    });

    let panicked = done_rx
        .recv_timeout(Duration::from_secs(30))
        .expect("run returned instead of blocking on the full queue");
    assert!(panicked, "the worker panic is re-raised to the caller");
}
