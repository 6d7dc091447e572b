//! Reusable byte buffers
//!
//! Printing and decoding both need a scratch `Vec<u8>` per call. A
//! [`BufferPool`] hands those out behind a [`PooledBuffer`] guard which
//! puts the buffer back when dropped, so a buffer is returned on every
//! exit path including `?` early returns and unwinding.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Sizing limits for a [`BufferPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Capacity given to freshly allocated buffers.
    pub initial_capacity: usize,
    /// Maximum number of idle buffers kept for reuse.
    pub max_idle: usize,
    /// Buffers that grew beyond this capacity are freed instead of kept.
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 8 * 1024,
            max_idle: 64,
            max_retained_capacity: 4 * 1024 * 1024,
        }
    }
}

/// Thread-safe pool of byte buffers.
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    config: PoolConfig,
    allocated: AtomicUsize,
    acquired: AtomicUsize,
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            config,
            allocated: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
        }
    }

    /// Take an empty buffer out of the pool, allocating one if none is idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();

        let buf = match reused {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(self.config.initial_capacity)
            }
        };

        PooledBuffer { buf, pool: self }
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.config.max_retained_capacity {
            tracing::trace!(capacity = buf.capacity(), "dropping oversized pooled buffer");
            return;
        }

        let mut idle = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if idle.len() < self.config.max_idle {
            buf.clear();
            idle.push(buf);
        }
    }

    /// Current pool counters.
    pub fn stats(&self) -> PoolStats {
        let idle = self
            .idle
            .lock()
            .map(|idle| idle.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len());
        PoolStats {
            idle,
            allocated: self.allocated.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool counters, mostly useful in tests and debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers currently waiting for reuse.
    pub idle: usize,
    /// Buffers allocated over the pool's lifetime.
    pub allocated: usize,
    /// Number of `acquire` calls.
    pub acquired: usize,
}

/// Exclusive handle to a pooled buffer. Returns the buffer on drop.
pub struct PooledBuffer<'p> {
    buf: Vec<u8>,
    pool: &'p BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_reused() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"hello");
        }
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(pool.stats().allocated, 1);
        assert_eq!(pool.stats().acquired, 2);
    }

    #[test]
    fn test_concurrent_acquire_allocates_separate_buffers() {
        let pool = BufferPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.stats().allocated, 2);
        drop(a);
        drop(b);
        assert_eq!(pool.stats().idle, 2);
    }

    #[test]
    fn test_released_on_early_return() {
        fn fails(pool: &BufferPool) -> Result<(), &'static str> {
            let mut buf = pool.acquire();
            buf.push(1);
            Err::<(), _>("boom")?;
            Ok(())
        }

        let pool = BufferPool::new();
        assert!(fails(&pool).is_err());
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_oversized_buffers_are_dropped() {
        let pool = BufferPool::with_config(PoolConfig {
            initial_capacity: 4,
            max_idle: 4,
            max_retained_capacity: 16,
        });
        {
            let mut buf = pool.acquire();
            buf.resize(1024, 0);
        }
        assert_eq!(pool.stats().idle, 0);
    }

    #[test]
    fn test_idle_limit() {
        let pool = BufferPool::with_config(PoolConfig {
            max_idle: 1,
            ..PoolConfig::default()
        });
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.stats().idle, 1);
    }
}
