//! Fixed-capacity circular storage of captured samples.

use crate::{data::units::Current, trigger::effect::BufferSpan};

/// Circular sample buffer addressed by absolute sample index.
///
/// Sample `i` lives in slot `i % capacity`; once more than `capacity` samples
/// were written the oldest ones are overwritten.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Box<[f32]>,
    written: u64,
}

impl SampleBuffer {
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample buffer needs at least one slot");

        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples written since creation.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn slot(&self, index: u64) -> usize {
        (index % self.capacity() as u64) as usize
    }

    /// Stores a sample and returns its absolute index.
    pub fn push(&mut self, value: Current) -> u64 {
        let index = self.written;
        let slot = self.slot(index);
        self.samples[slot] = value.0 as f32;
        self.written += 1;
        index
    }

    /// Samples covered by `span`, continuing at the head when it wraps.
    pub fn span(&self, span: BufferSpan) -> impl Iterator<Item = Current> + '_ {
        let len = span.len.min(self.capacity());
        let start = span.start % self.capacity();

        self.samples[start..]
            .iter()
            .chain(self.samples[..start].iter())
            .take(len)
            .map(|&v| Current(v as f64))
    }
}
