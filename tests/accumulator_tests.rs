// Tests for chunk accumulation
//
// These tests verify batch boundaries, push-order reconstruction and
// sequence numbering of the in-memory accumulator.

use pcm_ingest::{Accumulator, FlushResult};

fn expect_flush(result: FlushResult) -> pcm_ingest::Flush {
    match result {
        FlushResult::Flushed(flush) => flush,
        FlushResult::Accepted { pending } => panic!("expected flush, {} chunks still pending", pending),
    }
}

#[test]
fn test_no_flush_before_threshold() {
    let mut acc = Accumulator::new(5);

    for i in 1..5 {
        let result = acc.push(vec![i as u8; 10]);
        assert_eq!(result, FlushResult::Accepted { pending: i });
        assert_eq!(acc.pending_count(), i);
    }

    assert_eq!(acc.pending_bytes(), 40);
    assert_eq!(acc.next_sequence(), 1, "No batch should have been numbered yet");
}

#[test]
fn test_flush_on_threshold_resets_state() {
    let mut acc = Accumulator::new(5);

    for _ in 0..4 {
        acc.push(vec![0u8; 8]);
    }
    let flush = expect_flush(acc.push(vec![0u8; 8]));

    assert_eq!(flush.sequence, 1);
    assert_eq!(flush.chunk_count, 5);
    assert_eq!(flush.data.len(), 40);
    assert_eq!(acc.pending_count(), 0, "Pending count resets after flush");
    assert_eq!(acc.pending_bytes(), 0);
    assert_eq!(acc.next_sequence(), 2);
}

#[test]
fn test_flush_preserves_push_order() {
    let mut acc = Accumulator::new(5);
    let lengths = [100usize, 200, 150, 50, 500];

    let mut expected = Vec::new();
    let mut last = None;
    for (i, len) in lengths.iter().enumerate() {
        // Distinct byte pattern per chunk so reordering would be visible
        let chunk: Vec<u8> = (0..*len).map(|j| (i * 31 + j) as u8).collect();
        expected.extend_from_slice(&chunk);
        last = Some(acc.push(chunk));
    }

    let flush = expect_flush(last.expect("pushed at least once"));
    assert_eq!(flush.data.len(), 1000);
    assert_eq!(flush.data, expected, "Flushed bytes must equal pushed bytes in order");
}

#[test]
fn test_every_multiple_of_threshold_flushes_once() {
    let mut acc = Accumulator::new(5);
    let mut flushes = Vec::new();

    for n in 1..=15 {
        match acc.push(vec![n as u8]) {
            FlushResult::Flushed(flush) => {
                assert_eq!(n % 5, 0, "Push {} should not flush", n);
                assert_eq!(acc.pending_count(), 0);
                flushes.push(flush);
            }
            FlushResult::Accepted { pending } => {
                assert_ne!(n % 5, 0, "Push {} should flush", n);
                assert_eq!(pending, n % 5);
            }
        }
    }

    let sequences: Vec<u64> = flushes.iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3], "Sequence numbers have no gaps or repeats");
    assert_eq!(flushes[1].data, vec![6, 7, 8, 9, 10]);
}

#[test]
fn test_empty_chunks_count_toward_threshold() {
    // Each request is one unit, regardless of payload size
    let mut acc = Accumulator::new(5);

    for _ in 0..4 {
        acc.push(Vec::<u8>::new());
    }
    assert_eq!(acc.pending_count(), 4);

    let flush = expect_flush(acc.push(Vec::<u8>::new()));
    assert_eq!(flush.chunk_count, 5);
    assert!(flush.data.is_empty(), "A batch of empty chunks flushes zero bytes");
}

#[test]
fn test_empty_chunks_mixed_with_data() {
    let mut acc = Accumulator::new(3);

    acc.push(vec![1u8, 2]);
    acc.push(Vec::<u8>::new());
    let flush = expect_flush(acc.push(vec![3u8]));

    assert_eq!(flush.data, vec![1, 2, 3]);
}

#[test]
fn test_resume_sequence() {
    let mut acc = Accumulator::starting_at(2, 7);

    acc.push(vec![0u8]);
    let flush = expect_flush(acc.push(vec![0u8]));

    assert_eq!(flush.sequence, 7);
    assert_eq!(acc.next_sequence(), 8);
}

#[test]
fn test_threshold_of_one_flushes_every_push() {
    let mut acc = Accumulator::new(1);

    assert_eq!(expect_flush(acc.push(vec![9u8])).sequence, 1);
    assert_eq!(expect_flush(acc.push(vec![9u8])).sequence, 2);
}

#[test]
fn test_default_threshold_is_five() {
    let acc = Accumulator::default();
    assert_eq!(acc.threshold(), 5);
    assert_eq!(acc.next_sequence(), 1);
}

#[test]
fn test_zero_threshold_behaves_like_one() {
    let mut acc = Accumulator::new(0);
    assert_eq!(acc.threshold(), 1);
    assert!(matches!(acc.push(vec![1u8]), FlushResult::Flushed(_)));
}
