use core::cmp::min;

/// An owned, fixed-size linear buffer with a capacity known at compile time.
///
/// Writes past the capacity are dropped rather than reported as errors: a
/// frame that outgrows its buffer is truncated and the parser carries on
/// with the next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBuffer<const N: usize> {
    buffer: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBuffer<N> {
    /// Creates a new, empty `FixedBuffer`.
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Appends one byte, returns `false` if it did not fit.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len < N {
            self.buffer[self.len] = byte;
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Returns the number of bytes not copied over due to buffer size constraints.
    pub fn extend_from_slice(&mut self, other: &[u8]) -> usize {
        let available_space = N - self.len;
        let to_copy = min(other.len(), available_space);

        self.buffer[self.len..self.len + to_copy].copy_from_slice(&other[..to_copy]);
        self.len += to_copy;

        other.len() - to_copy // Remainder that didn't fit in the buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    /// Creates a new, empty `FixedBuffer`.
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::ops::Deref for FixedBuffer<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}
