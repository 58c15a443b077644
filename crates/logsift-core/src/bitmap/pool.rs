//! Per-worker pools of scratch bitmaps and string buffers.
//!
//! Every thread keeps its own idle list, so acquiring and releasing never
//! takes a lock. Guards hand their object back on drop, which also runs
//! while unwinding.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::Bitmap;

const MAX_POOLED_BITMAPS: usize = 64;
const MAX_POOLED_BUFFERS: usize = 16;

thread_local! {
    static BITMAPS: RefCell<Vec<Bitmap>> = const { RefCell::new(Vec::new()) };
    static BUFFERS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Borrow a cleared bitmap of `len` bits from the current worker's pool.
pub fn acquire_bitmap(len: usize) -> PooledBitmap {
    let mut bm = BITMAPS
        .try_with(|pool| pool.try_borrow_mut().ok().and_then(|mut p| p.pop()))
        .ok()
        .flatten()
        .unwrap_or_default();
    bm.init(len);
    PooledBitmap { inner: bm }
}

/// Scoped bitmap borrowed from the pool.
#[derive(Debug)]
pub struct PooledBitmap {
    inner: Bitmap,
}

impl Deref for PooledBitmap {
    type Target = Bitmap;

    fn deref(&self) -> &Bitmap {
        &self.inner
    }
}

impl DerefMut for PooledBitmap {
    fn deref_mut(&mut self) -> &mut Bitmap {
        &mut self.inner
    }
}

impl Drop for PooledBitmap {
    fn drop(&mut self) {
        let bm = std::mem::take(&mut self.inner);
        let _ = BITMAPS.try_with(|pool| {
            if let Ok(mut pool) = pool.try_borrow_mut() {
                if pool.len() < MAX_POOLED_BITMAPS {
                    pool.push(bm);
                } else {
                    trace!(bits = bm.len(), "bitmap pool full, dropping bitmap");
                }
            }
        });
    }
}

struct ScratchBuffer {
    buf: String,
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        let _ = BUFFERS.try_with(|pool| {
            if let Ok(mut pool) = pool.try_borrow_mut() {
                if pool.len() < MAX_POOLED_BUFFERS {
                    pool.push(buf);
                }
            }
        });
    }
}

/// Run `f` with an empty string buffer borrowed from the current worker's
/// pool.
pub fn with_scratch_buffer<R>(f: impl FnOnce(&mut String) -> R) -> R {
    let buf = BUFFERS
        .try_with(|pool| pool.try_borrow_mut().ok().and_then(|mut p| p.pop()))
        .ok()
        .flatten()
        .unwrap_or_default();
    let mut scratch = ScratchBuffer { buf };
    scratch.buf.clear();
    f(&mut scratch.buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquired_bitmap_is_cleared() {
        {
            let mut bm = acquire_bitmap(100);
            bm.set_bits();
        }
        let bm = acquire_bitmap(50);
        assert_eq!(bm.len(), 50);
        assert!(bm.is_zero());
    }

    #[test]
    fn test_bitmap_returns_to_pool() {
        BITMAPS.with(|p| p.borrow_mut().clear());
        {
            let _a = acquire_bitmap(10);
            let _b = acquire_bitmap(10);
        }
        BITMAPS.with(|p| assert_eq!(p.borrow().len(), 2));
    }

    #[test]
    fn test_bitmap_returned_on_panic() {
        BITMAPS.with(|p| p.borrow_mut().clear());
        let result = std::panic::catch_unwind(|| {
            let _bm = acquire_bitmap(10);
            panic!("boom");
        });
        assert!(result.is_err());
        BITMAPS.with(|p| assert_eq!(p.borrow().len(), 1));
    }

    #[test]
    fn test_scratch_buffer_is_empty() {
        with_scratch_buffer(|buf| buf.push_str("leftover"));
        with_scratch_buffer(|buf| assert!(buf.is_empty()));
    }
}
