//! Row bitmaps.
//!
//! A `Bitmap` marks the rows of one block that are still candidates for a
//! query. Leaf filters narrow it with [`Bitmap::for_each_set_bit`], and
//! combinators merge scratch bitmaps borrowed from the per-worker pool.

mod pool;

pub use pool::{acquire_bitmap, with_scratch_buffer, PooledBitmap};

/// Fixed-length bit vector over the rows of a block.
///
/// Bits past `len` in the last word are always zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    words: Vec<u64>,
    len: usize,
}

impl Bitmap {
    /// Create a bitmap of `len` bits, all cleared.
    pub fn new(len: usize) -> Self {
        let mut bm = Self::default();
        bm.init(len);
        bm
    }

    /// Create a bitmap of `len` bits, all set.
    pub fn new_all_set(len: usize) -> Self {
        let mut bm = Self::new(len);
        bm.set_bits();
        bm
    }

    /// Resize to `len` bits and clear every bit, reusing the allocation.
    pub fn init(&mut self, len: usize) {
        let words_len = len.div_ceil(64);
        self.words.clear();
        self.words.resize(words_len, 0);
        self.len = len;
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the bitmap has zero bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clear every bit.
    pub fn reset_bits(&mut self) {
        self.words.fill(0);
    }

    /// Set every bit.
    pub fn set_bits(&mut self) {
        self.words.fill(u64::MAX);
        self.mask_tail();
    }

    /// Whether bit `idx` is set.
    pub fn is_set(&self, idx: usize) -> bool {
        assert!(idx < self.len, "bit index {idx} out of range 0..{}", self.len);
        self.words[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    /// Set bit `idx`.
    pub fn set(&mut self, idx: usize) {
        assert!(idx < self.len, "bit index {idx} out of range 0..{}", self.len);
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    /// Clear bit `idx`.
    pub fn clear(&mut self, idx: usize) {
        assert!(idx < self.len, "bit index {idx} out of range 0..{}", self.len);
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Whether no bit is set.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Whether every bit is set.
    pub fn is_all_set(&self) -> bool {
        let full_words = self.len / 64;
        if self.words[..full_words].iter().any(|&w| w != u64::MAX) {
            return false;
        }
        let tail_bits = self.len % 64;
        if tail_bits == 0 {
            return true;
        }
        self.words[full_words] == (1u64 << tail_bits) - 1
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Make this bitmap an exact copy of `src`.
    pub fn copy_from(&mut self, src: &Bitmap) {
        self.words.clear();
        self.words.extend_from_slice(&src.words);
        self.len = src.len;
    }

    /// Intersect with `other`.
    pub fn and(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
    }

    /// Union with `other`.
    pub fn or(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// Clear every bit that is set in `other`.
    pub fn and_not(&mut self, other: &Bitmap) {
        self.check_same_len(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !*b;
        }
    }

    /// Call `f` for every set bit in ascending order, clearing the bits for
    /// which `f` returns false.
    pub fn for_each_set_bit<F>(&mut self, mut f: F)
    where
        F: FnMut(usize) -> bool,
    {
        for (i, word) in self.words.iter_mut().enumerate() {
            let mut w = *word;
            while w != 0 {
                let j = w.trailing_zeros() as usize;
                w &= w - 1;
                if !f(i * 64 + j) {
                    *word &= !(1u64 << j);
                }
            }
        }
    }

    /// Iterate over the indexes of set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let j = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(i * 64 + j)
            })
        })
    }

    /// Collect the indexes of set bits.
    pub fn to_indices(&self) -> Vec<usize> {
        self.iter_ones().collect()
    }

    fn mask_tail(&mut self) {
        let tail_bits = self.len % 64;
        if tail_bits > 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail_bits) - 1;
            }
        }
    }

    fn check_same_len(&self, other: &Bitmap) {
        if self.len != other.len {
            panic!(
                "BUG: cannot merge bitmaps with distinct lengths; {} vs {}",
                self.len, other.len
            );
        }
    }
}
