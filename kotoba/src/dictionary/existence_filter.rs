//! 64ビットハッシュ値のブルームフィルタ
//!
//! 直列化形式（リトルエンディアン）:
//!
//! ```text
//! u32 m   ビットベクトルの長さ
//! u32 n   想定挿入数（記録のみ）
//! i32 k   ハッシュの回数（1..=7）
//! ceil(m / 32) 個の u32 ビットマップ
//! ```
//!
//! [`ExistenceFilter::create`]で作成したフィルタはビットマップを所有し、
//! [`ExistenceFilter::read`]で読み込んだフィルタは入力バッファを直接参照します。

use crate::errors::{KotobaError, Result};
use crate::utils::{read_u32_le, FromU32};

/// ヘッダの長さ（バイト）
pub const HEADER_SIZE: usize = 12;

const MIN_HASHES: i32 = 1;
const MAX_HASHES: i32 = 7;

// Each probe rotates the 64-bit hash by this many bits.
const ROTATE_BITS: u32 = 8;

// 2^21 bits per block.
const BLOCK_SHIFT: u32 = 21;
const BLOCK_BITS: u32 = 1 << BLOCK_SHIFT;
const BLOCK_MASK: u32 = BLOCK_BITS - 1;

/// 巨大な単一確保を避けるため、固定長のブロックに分けたビットマップ
#[derive(Clone, Debug)]
struct BlockBitmap {
    blocks: Vec<Box<[u32]>>,
}

impl BlockBitmap {
    fn new(num_bits: u32) -> Self {
        let mut blocks = vec![];
        let mut remaining = num_words(num_bits);
        while remaining > 0 {
            let words = remaining.min(usize::from_u32(BLOCK_BITS / 32));
            blocks.push(vec![0; words].into_boxed_slice());
            remaining -= words;
        }
        Self { blocks }
    }

    #[inline(always)]
    fn locate(index: u32) -> (usize, usize, u32) {
        let block = usize::from_u32(index >> BLOCK_SHIFT);
        let word = usize::from_u32((index & BLOCK_MASK) >> 5);
        (block, word, index & 31)
    }

    #[inline(always)]
    fn get(&self, index: u32) -> bool {
        let (block, word, bit) = Self::locate(index);
        self.blocks[block][word] & (1 << bit) != 0
    }

    #[inline(always)]
    fn set(&mut self, index: u32) {
        let (block, word, bit) = Self::locate(index);
        self.blocks[block][word] |= 1 << bit;
    }

    fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.blocks.iter().flat_map(|b| b.iter().copied())
    }
}

#[derive(Clone, Debug)]
enum Bitmap<'a> {
    Owned(BlockBitmap),
    Borrowed(&'a [u8]),
}

impl Bitmap<'_> {
    #[inline(always)]
    fn get(&self, index: u32) -> bool {
        match self {
            Self::Owned(b) => b.get(index),
            Self::Borrowed(bytes) => {
                let byte = bytes[usize::from_u32(index >> 3)];
                byte & (1 << (index & 7)) != 0
            }
        }
    }
}

#[inline(always)]
fn num_words(num_bits: u32) -> usize {
    usize::from_u32(num_bits.div_ceil(32))
}

/// ブルームフィルタ
///
/// [`exists`](Self::exists)は偽陽性を返すことがありますが、偽陰性は返しません。
#[derive(Clone, Debug)]
pub struct ExistenceFilter<'a> {
    m: u32,
    n: u32,
    k: i32,
    bitmap: Bitmap<'a>,
}

impl ExistenceFilter<'static> {
    /// ビットマップを所有する空のフィルタを作成します。
    ///
    /// # 引数
    ///
    /// * `m` - ビットベクトルの長さ
    /// * `n` - 想定挿入数（記録のみ）
    /// * `k` - ハッシュの回数
    ///
    /// # エラー
    ///
    /// `m`が0、または`k`が1..=7の範囲外の場合にエラーを返します。
    pub fn create(m: u32, n: u32, k: i32) -> Result<Self> {
        if m == 0 {
            return Err(KotobaError::invalid_argument("m", "m must be positive."));
        }
        if !(MIN_HASHES..=MAX_HASHES).contains(&k) {
            return Err(KotobaError::invalid_argument(
                "k",
                format!("k must be in [{MIN_HASHES}, {MAX_HASHES}], got {k}."),
            ));
        }
        Ok(Self {
            m,
            n,
            k,
            bitmap: Bitmap::Owned(BlockBitmap::new(m)),
        })
    }

    /// 容量と想定挿入数から最適なハッシュ回数を選んでフィルタを作成します。
    ///
    /// `k = round(m / n * ln 2)`を1..=7に丸めます。
    ///
    /// # エラー
    ///
    /// ビット数がu32に収まらない場合にエラーを返します。
    pub fn create_optimal(size_in_bytes: usize, estimated_insertions: u32) -> Result<Self> {
        let m = u32::try_from(size_in_bytes.saturating_mul(8))
            .map_err(|_| {
                KotobaError::invalid_argument("size_in_bytes", "The filter is too large.")
            })?
            .max(1);
        let n = estimated_insertions.max(1);
        let k = (f64::from(m) / f64::from(n) * std::f64::consts::LN_2).round();
        let k = (k as i32).clamp(MIN_HASHES, MAX_HASHES);
        Self::create(m, n, k)
    }
}

impl<'a> ExistenceFilter<'a> {
    /// 直列化されたフィルタを読み込みます。ビットマップはコピーせず参照します。
    ///
    /// # エラー
    ///
    /// ヘッダやビットマップが`data`に収まらない場合、`m`が0の場合、
    /// `k`が1..=7の範囲外の場合にエラーを返します。
    pub fn read(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(KotobaError::invalid_format(
                "existence_filter",
                format!("Header needs {HEADER_SIZE} bytes, got {}.", data.len()),
            ));
        }
        let header = |pos| read_u32_le(data, pos).unwrap_or_default();
        let m = header(0);
        let n = header(4);
        let k = header(8) as i32;
        if !(MIN_HASHES..=MAX_HASHES).contains(&k) {
            return Err(KotobaError::invalid_format(
                "existence_filter",
                format!("k must be in [{MIN_HASHES}, {MAX_HASHES}], got {k}."),
            ));
        }
        if m == 0 {
            return Err(KotobaError::invalid_format(
                "existence_filter",
                "m must be positive.",
            ));
        }
        let bitmap_len = num_words(m) * 4;
        let Some(bitmap) = data.get(HEADER_SIZE..HEADER_SIZE + bitmap_len) else {
            return Err(KotobaError::invalid_format(
                "existence_filter",
                format!(
                    "Bitmap needs {bitmap_len} bytes, got {}.",
                    data.len() - HEADER_SIZE
                ),
            ));
        };
        Ok(Self {
            m,
            n,
            k,
            bitmap: Bitmap::Borrowed(bitmap),
        })
    }

    /// ハッシュ値を挿入します。
    ///
    /// # エラー
    ///
    /// [`read`](Self::read)で読み込んだ読み取り専用のフィルタではエラーを返します。
    pub fn insert(&mut self, mut hash: u64) -> Result<()> {
        let Bitmap::Owned(bitmap) = &mut self.bitmap else {
            return Err(KotobaError::invalid_state(
                "Cannot insert into the filter",
                "the bitmap is borrowed from a serialized buffer",
            ));
        };
        for _ in 0..self.k {
            hash = hash.rotate_left(ROTATE_BITS);
            bitmap.set((hash % u64::from(self.m)) as u32);
        }
        Ok(())
    }

    /// ハッシュ値が挿入済みである可能性があるかどうかを返します。
    #[inline]
    pub fn exists(&self, mut hash: u64) -> bool {
        for _ in 0..self.k {
            hash = hash.rotate_left(ROTATE_BITS);
            if !self.bitmap.get((hash % u64::from(self.m)) as u32) {
                return false;
            }
        }
        true
    }

    /// ビットベクトルの長さを返します。
    pub const fn num_bits(&self) -> u32 {
        self.m
    }

    /// 想定挿入数を返します。
    pub const fn estimated_insertions(&self) -> u32 {
        self.n
    }

    /// ハッシュの回数を返します。
    pub const fn num_hashes(&self) -> i32 {
        self.k
    }

    /// 直列化後の長さ（バイト）を返します。
    pub fn serialized_size(&self) -> usize {
        HEADER_SIZE + num_words(self.m) * 4
    }

    /// フィルタを`buf`の先頭に直列化し、書き込んだバイト数を返します。
    ///
    /// # エラー
    ///
    /// `buf`が[`serialized_size`](Self::serialized_size)より短い場合にエラーを返します。
    pub fn write(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.serialized_size();
        let Some(out) = buf.get_mut(..size) else {
            return Err(KotobaError::invalid_argument(
                "buf",
                format!("The buffer needs {size} bytes, got {}.", buf.len()),
            ));
        };
        self.write_exact(out);
        Ok(size)
    }

    // `out` must be exactly `serialized_size()` bytes.
    fn write_exact(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.m.to_le_bytes());
        out[4..8].copy_from_slice(&self.n.to_le_bytes());
        out[8..12].copy_from_slice(&self.k.to_le_bytes());
        let body = &mut out[HEADER_SIZE..];
        match &self.bitmap {
            Bitmap::Owned(bitmap) => {
                for (dst, word) in body.chunks_exact_mut(4).zip(bitmap.words()) {
                    dst.copy_from_slice(&word.to_le_bytes());
                }
            }
            Bitmap::Borrowed(bytes) => body.copy_from_slice(bytes),
        }
    }

    /// フィルタを直列化したバイト列を返します。
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0; self.serialized_size()];
        self.write_exact(&mut buf);
        buf
    }
}

/// 誤り率`error_rate`で`num_elements`個の要素を格納するのに必要な最小のバイト数を返します。
///
/// ハッシュ回数k = 1..=7のそれぞれについて
/// `m = ceil(-k n / ln(1 - p^(1/k)))`を評価し、最小値を採用します。
///
/// # エラー
///
/// `error_rate`が(0, 1)の範囲外の場合にエラーを返します。
pub fn min_filter_size_in_bytes_for_error_rate(
    error_rate: f64,
    num_elements: usize,
) -> Result<usize> {
    if !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(KotobaError::invalid_argument(
            "error_rate",
            format!("error_rate must be in (0, 1), got {error_rate}."),
        ));
    }
    let n = num_elements as f64;
    let min_bits = (MIN_HASHES..=MAX_HASHES)
        .map(|k| {
            let k = f64::from(k);
            (-k * n / (1.0 - error_rate.powf(1.0 / k)).ln()).ceil()
        })
        .fold(f64::INFINITY, f64::min);
    Ok((min_bits / 8.0).ceil().max(1.0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    // SplitMix64 for deterministic pseudo-random hashes.
    fn hashes(seed: u64, count: usize) -> Vec<u64> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
                let mut z = state;
                z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
                z ^ (z >> 31)
            })
            .collect()
    }

    #[test]
    fn test_no_false_negatives() {
        let inserted = hashes(1, 1000);
        let mut filter = ExistenceFilter::create_optimal(2000, 1000).unwrap();
        for &h in &inserted {
            filter.insert(h).unwrap();
        }
        for &h in &inserted {
            assert!(filter.exists(h));
        }
    }

    #[test]
    fn test_false_positive_rate() {
        let error_rate = 0.01;
        let num_elements = 5000;
        let size = min_filter_size_in_bytes_for_error_rate(error_rate, num_elements).unwrap();
        let mut filter = ExistenceFilter::create_optimal(size, num_elements as u32).unwrap();
        for h in hashes(7, num_elements) {
            filter.insert(h).unwrap();
        }
        let probes = hashes(12345, 100_000);
        let false_positives = probes.iter().filter(|&&h| filter.exists(h)).count();
        let observed = false_positives as f64 / probes.len() as f64;
        assert!(observed < error_rate * 3.0, "observed rate {observed}");
    }

    #[test]
    fn test_create_optimal_params() {
        let filter = ExistenceFilter::create_optimal(100, 100).unwrap();
        assert_eq!(filter.num_bits(), 800);
        assert_eq!(filter.estimated_insertions(), 100);
        // 800 / 100 * ln 2 = 5.55
        assert_eq!(filter.num_hashes(), 6);

        let filter = ExistenceFilter::create_optimal(1, 1000).unwrap();
        assert_eq!(filter.num_hashes(), 1);

        let filter = ExistenceFilter::create_optimal(100_000, 1).unwrap();
        assert_eq!(filter.num_hashes(), 7);

        let filter = ExistenceFilter::create_optimal(0, 0).unwrap();
        assert_eq!(filter.num_bits(), 1);
    }

    #[test]
    fn test_create_invalid() {
        assert!(ExistenceFilter::create(0, 1, 3).is_err());
        assert!(ExistenceFilter::create(10, 1, 0).is_err());
        assert!(ExistenceFilter::create(10, 1, 8).is_err());
    }

    #[test]
    fn test_large_filter_spans_blocks() {
        let mut filter = ExistenceFilter::create(BLOCK_BITS * 2 + 100, 10, 3).unwrap();
        let inserted = hashes(3, 100);
        for &h in &inserted {
            filter.insert(h).unwrap();
        }
        let bytes = filter.to_bytes();
        let read = ExistenceFilter::read(&bytes).unwrap();
        for &h in &inserted {
            assert!(read.exists(h));
        }
    }

    #[test]
    fn test_write_read() {
        let mut filter = ExistenceFilter::create(1000, 50, 4).unwrap();
        let inserted = hashes(42, 50);
        for &h in &inserted {
            filter.insert(h).unwrap();
        }
        let mut buf = vec![0; filter.serialized_size()];
        assert_eq!(filter.write(&mut buf).unwrap(), HEADER_SIZE + 32 * 4);

        let read = ExistenceFilter::read(&buf).unwrap();
        assert_eq!(read.num_bits(), 1000);
        assert_eq!(read.estimated_insertions(), 50);
        assert_eq!(read.num_hashes(), 4);
        for h in hashes(99, 1000) {
            assert_eq!(read.exists(h), filter.exists(h));
        }
        assert_eq!(read.to_bytes(), buf);
        assert_eq!(filter.to_bytes(), buf);
    }

    #[test]
    fn test_write_buffer_too_small() {
        let filter = ExistenceFilter::create(64, 1, 1).unwrap();
        let mut buf = vec![0; filter.serialized_size() - 1];
        assert!(filter.write(&mut buf).is_err());
    }

    #[test]
    fn test_read_rejects_short_buffers() {
        let filter = ExistenceFilter::create(1000, 50, 4).unwrap();
        let bytes = filter.to_bytes();
        for len in 0..bytes.len() {
            assert!(ExistenceFilter::read(&bytes[..len]).is_err(), "len = {len}");
        }
    }

    #[test]
    fn test_read_rejects_invalid_k() {
        let filter = ExistenceFilter::create(64, 1, 1).unwrap();
        for k in [0i32, 8, -1, i32::MAX] {
            let mut bytes = filter.to_bytes();
            bytes[8..12].copy_from_slice(&k.to_le_bytes());
            assert!(ExistenceFilter::read(&bytes).is_err(), "k = {k}");
        }
    }

    #[test]
    fn test_read_rejects_huge_m() {
        let mut bytes = ExistenceFilter::create(64, 1, 1).unwrap().to_bytes();
        bytes[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(ExistenceFilter::read(&bytes).is_err());
    }

    #[test]
    fn test_insert_into_read_filter() {
        let bytes = ExistenceFilter::create(64, 1, 1).unwrap().to_bytes();
        let mut read = ExistenceFilter::read(&bytes).unwrap();
        assert!(read.insert(1).is_err());
    }

    #[test]
    fn test_min_filter_size() {
        let size = min_filter_size_in_bytes_for_error_rate(0.01, 1000).unwrap();
        // The optimum is about 9.6 bits per element.
        assert!((1150..=1250).contains(&size), "size = {size}");
        assert!(
            min_filter_size_in_bytes_for_error_rate(0.001, 1000).unwrap() > size
        );
        assert!(min_filter_size_in_bytes_for_error_rate(0.0, 1000).is_err());
        assert!(min_filter_size_in_bytes_for_error_rate(1.0, 1000).is_err());
    }
}
