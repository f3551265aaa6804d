//! An optional, internally synchronized scratch-buffer cache. Strictly an allocation optimization for encoding nested
//! sub-messages to a temporary buffer before splicing them into the
//! parent; disabling it changes no observable behavior.

use std::sync::Mutex;

/// A process-wide-shareable pool of reusable `Vec<u8>` scratch buffers.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Borrows a scratch buffer, either reused (cleared) from the pool or
    /// freshly allocated.
    pub fn take(&self) -> Vec<u8> {
        self.buffers
            .lock()
            .expect("buffer pool mutex poisoned")
            .pop()
            .map(|mut buf| {
                buf.clear();
                buf
            })
            .unwrap_or_default()
    }

    /// Returns a scratch buffer to the pool for reuse.
    pub fn give_back(&self, buf: Vec<u8>) {
        self.buffers
            .lock()
            .expect("buffer pool mutex poisoned")
            .push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new()
    }
}
