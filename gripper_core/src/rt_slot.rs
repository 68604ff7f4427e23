//! Wait-free single-writer/single-reader value slot (triple buffer).
//!
//! The writer always replaces the slot's contents wholesale; the reader
//! always sees either the value published before a write or the fully
//! written value after it, never a mix. Neither side blocks, spins, or
//! allocates: three buffers rotate between the two sides through a single
//! atomic word packing the published buffer index and a "fresh" bit.
//!
//! Invariant: the writer's back buffer, the reader's front buffer, and the
//! published buffer are a permutation of {0, 1, 2} at all times, so neither
//! side ever touches a buffer the other side owns.

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const INDEX_MASK: usize = 0b011;
const FRESH_BIT: usize = 0b100;

struct Shared<T> {
    buffers: [UnsafeCell<T>; 3],
    /// Bits 0..=1: index of the most recently published buffer.
    /// Bit 2: set when that buffer has not been consumed yet.
    published: AtomicUsize,
}

// The atomic index protocol guarantees exclusive buffer access per side.
unsafe impl<T: Send> Sync for Shared<T> {}

/// Create a connected writer/reader pair, pre-filled with `initial`.
///
/// The reader returns `initial` until the first write is published.
pub fn rt_slot<T: Clone + Send>(initial: T) -> (SlotWriter<T>, SlotReader<T>) {
    let shared = Arc::new(Shared {
        buffers: [
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial),
        ],
        published: AtomicUsize::new(0),
    });
    (
        SlotWriter {
            shared: shared.clone(),
            back: 1,
        },
        SlotReader { shared, front: 2 },
    )
}

/// Non-RT half: publishes new values. Not clonable; single writer only.
pub struct SlotWriter<T> {
    shared: Arc<Shared<T>>,
    back: usize,
}

impl<T: Send> SlotWriter<T> {
    /// Replace the slot's contents. Wait-free, never allocates.
    pub fn publish(&mut self, value: T) {
        // The back buffer is exclusively ours until the swap below.
        unsafe {
            *self.shared.buffers[self.back].get() = value;
        }
        // Publish, and take ownership of whichever buffer was there.
        let prev = self
            .shared
            .published
            .swap(self.back | FRESH_BIT, Ordering::AcqRel);
        self.back = prev & INDEX_MASK;
    }
}

/// RT half: reads the most recently published value. Single reader only.
pub struct SlotReader<T> {
    shared: Arc<Shared<T>>,
    front: usize,
}

impl<T: Send> SlotReader<T> {
    /// Consume the pending publication, if any. Wait-free, never allocates.
    ///
    /// Returns `None` when nothing new was published since the last read;
    /// each publication is observed at most once.
    pub fn read(&mut self) -> Option<&T> {
        if self.shared.published.load(Ordering::Relaxed) & FRESH_BIT == 0 {
            return None;
        }
        // Hand our front buffer back and claim the fresh one. The swap
        // both consumes the fresh bit and transfers buffer ownership.
        let prev = self.shared.published.swap(self.front, Ordering::AcqRel);
        self.front = prev & INDEX_MASK;
        Some(unsafe { &*self.shared.buffers[self.front].get() })
    }

    /// The most recent value, whether or not it was already consumed.
    pub fn latest(&mut self) -> &T {
        if self.shared.published.load(Ordering::Relaxed) & FRESH_BIT != 0 {
            let prev = self.shared.published.swap(self.front, Ordering::AcqRel);
            self.front = prev & INDEX_MASK;
        }
        unsafe { &*self.shared.buffers[self.front].get() }
    }

    /// Whether an unconsumed write is pending.
    pub fn is_fresh(&self) -> bool {
        self.shared.published.load(Ordering::Relaxed) & FRESH_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::rt_slot;

    #[test]
    fn nothing_to_read_before_the_first_publication() {
        let (_w, mut r) = rt_slot(7_u64);
        assert!(r.read().is_none());
        assert_eq!(*r.latest(), 7, "latest still exposes the initial value");
    }

    #[test]
    fn latest_publication_wins() {
        let (mut w, mut r) = rt_slot(0_u64);
        w.publish(1);
        w.publish(2);
        w.publish(3);
        assert_eq!(r.read().copied(), Some(3));
        // Each publication is consumed at most once.
        assert!(r.read().is_none());
        assert_eq!(*r.latest(), 3);
        w.publish(4);
        assert_eq!(r.read().copied(), Some(4));
    }

    #[test]
    fn fresh_flag_tracks_unconsumed_publications() {
        let (mut w, mut r) = rt_slot(0_u32);
        assert!(!r.is_fresh());
        w.publish(1);
        assert!(r.is_fresh());
        let _ = r.read();
        assert!(!r.is_fresh());
    }

    #[test]
    fn interleaved_write_read_never_tears() {
        // Values where both halves must match; a torn read would mix pairs.
        #[derive(Clone, Copy, Debug, PartialEq)]
        struct Pair(u64, u64);

        let (mut w, mut r) = rt_slot(Pair(0, 0));
        let writer = std::thread::spawn(move || {
            for i in 1..=100_000_u64 {
                w.publish(Pair(i, i.wrapping_mul(31)));
            }
        });
        let reader = std::thread::spawn(move || {
            let mut last = 0;
            for _ in 0..100_000 {
                let p = *r.latest();
                assert_eq!(p.1, p.0.wrapping_mul(31), "torn read: {p:?}");
                assert!(p.0 >= last, "went backwards: {} < {last}", p.0);
                last = p.0;
            }
        });
        writer.join().expect("writer");
        reader.join().expect("reader");
    }
}
