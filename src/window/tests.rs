use super::{Window, WindowConfig, WindowError};

const RATE: u32 = 16_000;

fn config(chunk: f64, context: f64) -> WindowConfig {
    WindowConfig {
        chunk_size_sec: chunk,
        context_size_sec: context,
        ..WindowConfig::default()
    }
}

#[test]
fn full_context_spans_are_uniform() {
    let window = Window::new(&config(0.1, 1.0), RATE).unwrap();
    let total = window.total_samples();
    // Ten seconds of audio leaves plenty of room for full windows.
    let plan = window.plan(10 * RATE as usize).unwrap();

    assert!(!plan.snippet_times.is_empty());
    for span in &plan.snippet_times {
        assert_eq!(span.len(), total);
    }
}

#[test]
fn ends_strictly_increase_and_starts_are_clamped() {
    let mut cfg = config(0.1, 1.0);
    cfg.require_full_context = false;
    let window = Window::new(&cfg, RATE).unwrap();
    let total = window.total_samples();
    let plan = window.plan(5 * RATE as usize).unwrap();

    let mut prev_end = 0;
    for span in &plan.snippet_times {
        assert!(span.end > prev_end, "ends must strictly increase");
        prev_end = span.end;
        assert_eq!(span.start, span.end.saturating_sub(total));
    }
}

#[test]
fn batches_respect_cap_and_never_mix_spans() {
    let mut cfg = config(0.1, 1.0);
    cfg.require_full_context = false;
    cfg.batch_size = 4;
    let window = Window::new(&cfg, RATE).unwrap();
    let plan = window.plan(3 * RATE as usize).unwrap();

    for batch in &plan.batches {
        assert!(!batch.is_empty());
        assert!(batch.len() <= 4);
        let span_len = batch[0].len();
        assert!(batch.iter().all(|span| span.len() == span_len));
    }
    // Flattened batches reproduce snippet_times in order.
    let flattened: Vec<_> = plan.batches.iter().flatten().copied().collect();
    assert_eq!(flattened, plan.snippet_times);
}

#[test]
fn full_context_batches_split_consecutively() {
    let mut cfg = config(0.1, 1.0);
    cfg.batch_size = 8;
    let window = Window::new(&cfg, RATE).unwrap();
    let plan = window.plan(4 * RATE as usize).unwrap();

    let snippets = plan.snippet_times.len();
    assert_eq!(plan.batches.len(), snippets.div_ceil(8));
    for batch in &plan.batches[..plan.batches.len() - 1] {
        assert_eq!(batch.len(), 8);
    }
}

#[test]
fn skip_window_yields_single_full_span() {
    let mut cfg = config(0.1, 8.0);
    cfg.skip_window = true;
    cfg.batch_size = 32; // ignored: skip mode forces one snippet per batch
    let window = Window::new(&cfg, RATE).unwrap();
    let plan = window.plan(12_345).unwrap();

    assert_eq!(plan.snippet_times.len(), 1);
    assert_eq!(plan.snippet_times[0].start, 0);
    assert_eq!(plan.snippet_times[0].end, 12_345);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].len(), 1);
}

#[test]
fn exact_length_waveform_gives_one_window() {
    let window = Window::new(&config(0.1, 1.0), RATE).unwrap();
    let total = window.total_samples();
    let plan = window.plan(total).unwrap();

    assert_eq!(plan.snippet_times.len(), 1);
    assert_eq!(plan.snippet_times[0].start, 0);
    assert_eq!(plan.snippet_times[0].end, total);
}

#[test]
fn short_waveform_with_full_context_fails() {
    let window = Window::new(&config(0.1, 1.0), RATE).unwrap();
    let err = window.plan(window.total_samples() - 1).unwrap_err();
    match err {
        WindowError::NoSnippets { num_samples, .. } => {
            assert_eq!(num_samples, window.total_samples() - 1);
        }
        other => panic!("expected NoSnippets, got {other}"),
    }
}

#[test]
fn min_length_filter_can_empty_the_result() {
    let mut cfg = config(0.1, 1.0);
    cfg.min_length_samples = 10 * RATE as usize; // above every candidate span
    let window = Window::new(&cfg, RATE).unwrap();
    let err = window.plan(2 * RATE as usize).unwrap_err();
    assert!(matches!(err, WindowError::BelowMinLength { .. }));
}

#[test]
fn min_length_filter_drops_warmup_snippets() {
    let mut cfg = config(0.1, 1.0);
    cfg.require_full_context = false;
    cfg.min_length_samples = 8_000; // half a second: drops early warm-ups
    let window = Window::new(&cfg, RATE).unwrap();
    let plan = window.plan(3 * RATE as usize).unwrap();

    assert!(plan
        .snippet_times
        .iter()
        .all(|span| span.len() >= 8_000));
    // Snippets shorter than the floor existed before filtering.
    assert_eq!(plan.snippet_times[0].end, 8_000);
    assert!(window.chunk_samples() < 8_000);
}

#[test]
fn warmup_only_waveform_has_increasing_spans() {
    let mut cfg = config(0.1, 1.0);
    cfg.require_full_context = false;
    let window = Window::new(&cfg, RATE).unwrap();
    let total = window.total_samples();
    // Between one chunk and chunk+context: warm-up windows only.
    let num_samples = total - window.chunk_samples();
    let plan = window.plan(num_samples).unwrap();

    assert!(!plan.snippet_times.is_empty());
    let mut prev_len = 0;
    for span in &plan.snippet_times {
        assert!(span.len() < total);
        assert!(span.len() > prev_len, "warm-up spans strictly increase");
        assert!(span.end <= num_samples);
        prev_len = span.len();
    }
}

#[test]
fn warmup_and_full_windows_combine_in_order() {
    let mut cfg = config(0.5, 1.0);
    cfg.require_full_context = false;
    let window = Window::new(&cfg, RATE).unwrap();
    let total = window.total_samples();
    let plan = window.plan(4 * RATE as usize).unwrap();

    // Warm-ups first (spans below total), then full windows only.
    let first_full = plan
        .snippet_times
        .iter()
        .position(|span| span.len() == total)
        .expect("expected at least one full-context window");
    assert!(plan.snippet_times[..first_full]
        .iter()
        .all(|span| span.len() < total));
    assert!(plan.snippet_times[first_full..]
        .iter()
        .all(|span| span.len() == total));
}

#[test]
fn seconds_are_samples_over_rate() {
    let mut cfg = config(0.1, 1.0);
    cfg.require_full_context = false;
    let window = Window::new(&cfg, RATE).unwrap();
    let plan = window.plan(3 * RATE as usize).unwrap();

    assert_eq!(plan.snippet_times.len(), plan.snippet_times_sec.len());
    for (span, &(start_sec, end_sec)) in
        plan.snippet_times.iter().zip(&plan.snippet_times_sec)
    {
        assert!((start_sec - span.start as f64 / RATE as f64).abs() < 1e-12);
        assert!((end_sec - span.end as f64 / RATE as f64).abs() < 1e-12);
    }
}

#[test]
fn zero_sample_chunk_is_rejected() {
    let err = Window::new(&config(0.00001, 1.0), RATE).unwrap_err();
    assert!(matches!(err, WindowError::EmptyChunk { .. }));
}

#[test]
fn zero_batch_size_is_rejected() {
    let mut cfg = config(0.1, 1.0);
    cfg.batch_size = 0;
    let err = Window::new(&cfg, RATE).unwrap_err();
    assert!(matches!(err, WindowError::InvalidBatchSize));
}

#[test]
fn empty_waveform_in_skip_mode_fails() {
    let mut cfg = config(0.1, 1.0);
    cfg.skip_window = true;
    let window = Window::new(&cfg, RATE).unwrap();
    assert!(matches!(
        window.plan(0),
        Err(WindowError::NoSnippets { .. })
    ));
}

#[test]
fn config_deserializes_with_defaults() {
    let cfg: WindowConfig = serde_json::from_str("{\"chunk_size_sec\": 0.25}").unwrap();
    assert!((cfg.chunk_size_sec - 0.25).abs() < 1e-12);
    assert!((cfg.context_size_sec - 8.0).abs() < 1e-12);
    assert!(cfg.require_full_context);
    assert_eq!(cfg.batch_size, 1);
    assert!(!cfg.skip_window);
}
