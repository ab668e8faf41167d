//! Lock-free byte ring buffer.
//!
//! SPSC (single producer, single consumer) over caller-supplied storage.
//! The foreground owns one end, the SERCOM interrupt the other.
//!
//! Cursors run modulo `2 * capacity`, so full and empty are told apart
//! without a separate count field and without read-modify-write atomics
//! (Cortex-M0+ has none). Each side only ever stores its own cursor, and
//! the producer publishes its cursor after the slot write is committed.

use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

/// Byte ring buffer backed by external storage.
///
/// Capacity 0 (no storage attached) means buffering is disabled.
pub struct RingBuffer<'a> {
    storage: AtomicPtr<u8>,
    capacity: AtomicUsize,
    /// Producer cursor, in `0..2 * capacity`.
    head: AtomicUsize,
    /// Consumer cursor, in `0..2 * capacity`.
    tail: AtomicUsize,
    _storage: PhantomData<&'a mut [u8]>,
}

// SAFETY: One producer and one consumer, each storing only its own cursor.
// A slot is written by the producer before `head` is published (Release)
// and read by the consumer only after observing `head` (Acquire), so the
// two sides never touch the same slot at the same time.
unsafe impl Sync for RingBuffer<'_> {}
unsafe impl Send for RingBuffer<'_> {}

impl<'a> RingBuffer<'a> {
    /// Create a detached (disabled) buffer.
    pub const fn new() -> Self {
        Self {
            storage: AtomicPtr::new(ptr::null_mut()),
            capacity: AtomicUsize::new(0),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            _storage: PhantomData,
        }
    }

    /// Create a buffer over `storage`.
    pub fn with_storage(storage: &'a mut [u8]) -> Self {
        let mut ring = Self::new();
        ring.attach(storage);
        ring
    }

    /// Attach `storage`, discarding any queued bytes. An empty slice detaches.
    pub fn attach(&mut self, storage: &'a mut [u8]) {
        // SAFETY: `&mut self` excludes every other access.
        unsafe { self.attach_shared(storage) }
    }

    /// Detach storage, disabling the buffer.
    pub fn detach(&mut self) {
        self.attach(&mut []);
    }

    /// Attach through a shared reference.
    ///
    /// # Safety
    ///
    /// Neither end may be in use while this runs: the caller must have
    /// masked the interrupt that owns the other end.
    pub unsafe fn attach_shared(&self, storage: &'a mut [u8]) {
        // Cursors stay in `0..2 * capacity`.
        let capacity = storage.len().min(usize::MAX / 2);
        self.capacity.store(0, Ordering::Release);
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.storage.store(storage.as_mut_ptr(), Ordering::Relaxed);
        self.capacity.store(capacity, Ordering::Release);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// True when storage is attached.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.capacity() != 0
    }

    #[inline]
    fn distance(head: usize, tail: usize, capacity: usize) -> usize {
        if head >= tail {
            head - tail
        } else {
            head + 2 * capacity - tail
        }
    }

    #[inline]
    fn advance(cursor: usize, capacity: usize) -> usize {
        let next = cursor + 1;
        if next == 2 * capacity {
            0
        } else {
            next
        }
    }

    /// Enqueue one byte. Producer side only.
    ///
    /// Returns `false` when the buffer is full or disabled.
    #[inline]
    pub fn push(&self, byte: u8) -> bool {
        let capacity = self.capacity();
        if capacity == 0 {
            return false;
        }
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if Self::distance(head, tail, capacity) >= capacity {
            return false;
        }

        let idx = head % capacity;
        // SAFETY: `idx < capacity`, and the consumer does not read this slot
        // until `head` is published below.
        unsafe { self.storage.load(Ordering::Relaxed).add(idx).write_volatile(byte) };

        self.head.store(Self::advance(head, capacity), Ordering::Release);
        true
    }

    /// Dequeue one byte. Consumer side only.
    #[inline]
    pub fn pop(&self) -> Option<u8> {
        let capacity = self.capacity();
        if capacity == 0 {
            return None;
        }
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let idx = tail % capacity;
        // SAFETY: `idx < capacity`; the producer published this slot and will
        // not overwrite it until `tail` moves past it.
        let byte = unsafe { self.storage.load(Ordering::Relaxed).add(idx).read_volatile() };

        self.tail.store(Self::advance(tail, capacity), Ordering::Release);
        Some(byte)
    }

    /// Number of queued bytes.
    #[inline]
    pub fn len(&self) -> usize {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0;
        }
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail, capacity)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        let capacity = self.capacity();
        capacity != 0 && self.len() >= capacity
    }

    /// Free slots.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len()
    }
}

impl Default for RingBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}
