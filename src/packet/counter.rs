use std::sync::atomic::{AtomicU32, Ordering};

/// Running 32-bit value that signs outbound frames.
///
/// Starts at a random value unless given one, wraps from 0xFFFFFFFF to 0.
/// Shared between senders behind an `Arc`.
#[derive(Debug)]
pub struct FrameCounter {
    next: AtomicU32,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::with_start(rand::random())
    }

    pub fn with_start(start: u32) -> Self {
        FrameCounter {
            next: AtomicU32::new(start),
        }
    }

    /// Value the next frame will carry.
    pub fn get(&self) -> u32 {
        self.next.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: u32) {
        self.next.store(value, Ordering::SeqCst);
    }

    pub fn increment(&self) {
        self.next.fetch_add(1, Ordering::SeqCst);
    }

    /// Return the current value and advance by one.
    pub fn get_and_increment(&self) -> u32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}
