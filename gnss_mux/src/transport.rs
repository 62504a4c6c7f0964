//! Seams between the protocol core and the board: the serial link and a
//! millisecond tick.

/// Byte link to the receiver
pub trait Transport {
    type Error;

    /// Writes the whole frame, blocking until it is handed to the link.
    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Reads whatever is available into `buf`, `Ok(0)` when nothing arrived.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send(bytes)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).recv(buf)
    }
}

/// Millisecond tick source. The counter wraps, elapsed time is computed
/// with wrapping subtraction.
pub trait Clock {
    fn now_ms(&self) -> u32;

    /// Suspends the caller, used by the blocking command variants between polls.
    fn delay_ms(&mut self, ms: u32);
}

pub(crate) fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(feature = "std")]
pub use self::std_clock::StdClock;

#[cfg(feature = "std")]
mod std_clock {
    use std::time::{Duration, Instant};

    /// [`Clock`](super::Clock) backed by [`Instant`] and `thread::sleep`
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        start: Instant,
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StdClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }
    }

    impl super::Clock for StdClock {
        fn now_ms(&self) -> u32 {
            self.start.elapsed().as_millis() as u32
        }

        fn delay_ms(&mut self, ms: u32) {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{cell::Cell, collections::VecDeque, rc::Rc};

    use super::{Clock, Transport};

    /// Records every sent frame, serves queued input, optionally fails sends.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        pub(crate) sent: Vec<Vec<u8>>,
        pub(crate) rx: VecDeque<u8>,
        pub(crate) fail_send: bool,
    }

    impl Transport for MockTransport {
        type Error = &'static str;

        fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.fail_send {
                return Err("link down");
            }
            self.sent.push(bytes.to_vec());
            Ok(())
        }

        fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx.len());
            for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *dst = src;
            }
            Ok(n)
        }
    }

    /// Clock that only moves when told to, or by `delay_ms`.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct ManualClock(pub(crate) Rc<Cell<u32>>);

    impl ManualClock {
        pub(crate) fn advance(&self, ms: u32) {
            self.0.set(self.0.get().wrapping_add(ms));
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }

        fn delay_ms(&mut self, ms: u32) {
            self.advance(ms);
        }
    }
}
