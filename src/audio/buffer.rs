use ringbuf::{traits::*, HeapRb};

/// Fixed-capacity sample history that overwrites its oldest samples
///
/// Holds the audio immediately preceding speech onset so the start of the
/// first word is not clipped.
pub struct AudioRingBuffer {
    buffer: HeapRb<f32>,
}

impl AudioRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: HeapRb::new(capacity.max(1)),
        }
    }

    /// Write samples, dropping the oldest ones once full
    pub fn write(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.buffer.push_overwrite(sample);
        }
    }

    /// Remove and return everything currently held, oldest first
    pub fn drain_all(&mut self) -> Vec<f32> {
        self.buffer.pop_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity().get()
    }
}
