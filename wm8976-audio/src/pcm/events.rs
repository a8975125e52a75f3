//! Period-elapsed notifications from the DMA interrupt to the audio layer.
//!
//! The completion handler reports each finished period to a [`PeriodSink`].
//! A sink can be a closure, or a [`PeriodQueue`] that the owning task drains
//! outside interrupt context.
//!
//! # Queue contract
//!
//! - Only the DMA interrupt may call [`push()`](PeriodQueue::push) (the producer).
//! - Only ONE task may call [`pop()`](PeriodQueue::pop) (the consumer).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// What the stream should do after a period notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep streaming: load and start the next period.
    Continue,
    /// Stop the channel (underrun, end of data).
    Stop,
}

/// One finished period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodElapsed {
    /// Byte offset of the next period to play, already wrapped.
    pub offset: usize,
    /// Periods completed since the last `prepare`.
    pub count: u32,
}

/// Receiver of period notifications. Called from interrupt context.
pub trait PeriodSink {
    fn period_elapsed(&self, event: PeriodElapsed) -> Flow;
}

impl<F> PeriodSink for F
where
    F: Fn(PeriodElapsed) -> Flow,
{
    fn period_elapsed(&self, event: PeriodElapsed) -> Flow {
        self(event)
    }
}

// ── Queue ──────────────────────────────────────────────────────────────────

/// Lock-free single-producer single-consumer queue of period events.
///
/// Usable capacity is `N - 1`; one slot tells full from empty. A full
/// queue means the consumer fell behind by a whole ring of events; the
/// notification is dropped, counted and reported as [`Flow::Stop`].
pub struct PeriodQueue<const N: usize> {
    slots: [UnsafeCell<PeriodElapsed>; N],
    /// Write position (only modified by the producer).
    head: AtomicUsize,
    /// Read position (only modified by the consumer).
    tail: AtomicUsize,
    overruns: AtomicU32,
}

// SAFETY: slots are plain `Copy` data. The producer only writes the slot at
// `head` and the consumer only reads the slot at `tail`; the Release/Acquire
// pairs on the indices order those accesses.
unsafe impl<const N: usize> Sync for PeriodQueue<N> {}

impl<const N: usize> PeriodQueue<N> {
    const EMPTY: UnsafeCell<PeriodElapsed> = UnsafeCell::new(PeriodElapsed { offset: 0, count: 0 });

    /// Create an empty queue.
    pub const fn new() -> Self {
        assert!(N >= 2, "period queue needs at least 2 slots (1 usable)");
        Self {
            slots: [Self::EMPTY; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Enqueue an event (producer side). Returns it back if the queue is full.
    pub fn push(&self, event: PeriodElapsed) -> Result<(), PeriodElapsed> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return Err(event);
        }

        // SAFETY: sole producer; `next != tail` means the consumer is not
        // reading this slot.
        unsafe { *self.slots[head].get() = event };

        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest event (consumer side).
    pub fn pop(&self) -> Option<PeriodElapsed> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: sole consumer; `tail != head` means the slot was published.
        let event = unsafe { *self.slots[tail].get() };

        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(event)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    /// Events dropped because the queue was full.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for PeriodQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PeriodSink for PeriodQueue<N> {
    fn period_elapsed(&self, event: PeriodElapsed) -> Flow {
        match self.push(event) {
            Ok(()) => Flow::Continue,
            Err(dropped) => {
                // Single producer: load/store is enough, and works on cores
                // without atomic read-modify-write.
                let n = self.overruns.load(Ordering::Relaxed);
                self.overruns.store(n.wrapping_add(1), Ordering::Relaxed);
                log::warn!("period queue full, dropping period {}", dropped.count);
                Flow::Stop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    fn ev(count: u32) -> PeriodElapsed {
        PeriodElapsed {
            offset: count as usize * 2048,
            count,
        }
    }

    #[test]
    fn fifo_order() {
        let q: PeriodQueue<4> = PeriodQueue::new(); // capacity 3
        assert!(q.is_empty());
        q.push(ev(1)).unwrap();
        q.push(ev(2)).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(ev(1)));
        assert_eq!(q.pop(), Some(ev(2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn wraps_indices() {
        let q: PeriodQueue<3> = PeriodQueue::new(); // capacity 2
        for round in 0..10 {
            q.push(ev(round * 2)).unwrap();
            q.push(ev(round * 2 + 1)).unwrap();
            assert_eq!(q.push(ev(99)), Err(ev(99)));
            assert_eq!(q.pop(), Some(ev(round * 2)));
            assert_eq!(q.pop(), Some(ev(round * 2 + 1)));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn full_queue_requests_stop() {
        let q: PeriodQueue<2> = PeriodQueue::new(); // capacity 1
        assert_eq!(q.period_elapsed(ev(1)), Flow::Continue);
        assert_eq!(q.period_elapsed(ev(2)), Flow::Stop);
        assert_eq!(q.period_elapsed(ev(3)), Flow::Stop);
        assert_eq!(q.overruns(), 2);

        // The queued event is the first one.
        assert_eq!(q.pop(), Some(ev(1)));
        assert_eq!(q.period_elapsed(ev(4)), Flow::Continue);
    }

    #[test]
    fn closure_sink() {
        let seen = Cell::new(0u32);
        let sink = |e: PeriodElapsed| {
            seen.set(e.count);
            if e.count >= 3 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        };
        assert_eq!(sink.period_elapsed(ev(1)), Flow::Continue);
        assert_eq!(sink.period_elapsed(ev(3)), Flow::Stop);
        assert_eq!(seen.get(), 3);
    }
}
