/// Fixed-capacity staging buffer for interleaved `f32` frames.
///
/// Storage is allocated once, when the routing context binds a device, and
/// reused by every delivery. Writes never allocate and never apply partially:
/// a write larger than the capacity is refused and leaves the buffer as it was.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    samples: Vec<f32>,
    len: usize,
}

impl FrameBuffer {
    /// Allocate room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            len: 0,
        }
    }

    /// Copy `samples` in, replacing the previous contents.
    ///
    /// Returns `false` (and changes nothing) if they do not fit.
    #[must_use]
    pub fn write(&mut self, samples: &[f32]) -> bool {
        if samples.len() > self.samples.len() {
            return false;
        }
        self.samples[..samples.len()].copy_from_slice(samples);
        self.len = samples.len();
        true
    }

    /// The samples accepted by the last write.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.len]
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recorded byte size of the held samples.
    pub fn byte_size(&self) -> usize {
        self.len * std::mem::size_of::<f32>()
    }

    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }

    /// Free the storage entirely.
    pub fn release(&mut self) {
        self.samples = Vec::new();
        self.len = 0;
    }
}
