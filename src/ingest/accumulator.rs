use bytes::Bytes;

/// Number of chunks per output file unless configured otherwise
pub const DEFAULT_THRESHOLD: usize = 5;

/// Outcome of a single `push`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushResult {
    /// Chunk buffered, threshold not reached yet
    Accepted {
        /// Chunks now pending
        pending: usize,
    },
    /// Threshold reached: all pending chunks concatenated in push order
    Flushed(Flush),
}

/// A completed batch, handed off for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    /// Sequence number of the output artifact (never reused)
    pub sequence: u64,
    /// Concatenated payload bytes
    pub data: Vec<u8>,
    /// Number of chunks that made up this batch
    pub chunk_count: usize,
}

/// Collects raw chunks until `threshold` of them arrived, then emits one combined batch
///
/// Not synchronized: callers share it behind a mutex so that
/// append + threshold check + reset happen as one step.
#[derive(Debug)]
pub struct Accumulator {
    threshold: usize,
    pending: Vec<Bytes>,
    next_sequence: u64,
}

impl Accumulator {
    /// Create an accumulator whose first flush gets sequence number 1
    pub fn new(threshold: usize) -> Self {
        Self::starting_at(threshold, 1)
    }

    /// Create an accumulator resuming numbering at `next_sequence`
    pub fn starting_at(threshold: usize, next_sequence: u64) -> Self {
        // 0 behaves like 1
        let threshold = threshold.max(1);

        Self {
            threshold,
            pending: Vec::with_capacity(threshold),
            next_sequence: next_sequence.max(1),
        }
    }

    /// Append a chunk; flush if the threshold is reached
    ///
    /// Empty chunks count toward the threshold like any other request.
    pub fn push(&mut self, chunk: impl Into<Bytes>) -> FlushResult {
        self.pending.push(chunk.into());

        if self.pending.len() < self.threshold {
            return FlushResult::Accepted {
                pending: self.pending.len(),
            };
        }

        let chunks = std::mem::replace(&mut self.pending, Vec::with_capacity(self.threshold));
        let total: usize = chunks.iter().map(Bytes::len).sum();

        let mut data = Vec::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        FlushResult::Flushed(Flush {
            sequence,
            data,
            chunk_count: chunks.len(),
        })
    }

    /// Chunks currently buffered
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Bytes currently buffered
    pub fn pending_bytes(&self) -> usize {
        self.pending.iter().map(Bytes::len).sum()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Sequence number the next flush will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
