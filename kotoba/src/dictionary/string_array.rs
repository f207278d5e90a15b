//! バイト列上の直列化された文字列配列
//!
//! レイアウト（リトルエンディアン）:
//!
//! ```text
//! u32 N
//! N × (u32 offset, u32 length)
//! N 個のNUL終端文字列（offset/lengthは終端を含まない）
//! ```
//!
//! 4バイトの0だけからなるバッファが空配列の正準形です。
//! 読み出しはすべてリトルエンディアンのバイト列として行うため、
//! バッファのアライメントは要求しません。

use std::iter::FusedIterator;
use std::ops::Range;

use crate::errors::{KotobaError, Result};
use crate::utils::{read_u32_le, FromU32};

static EMPTY_ARRAY: [u8; 4] = [0; 4];

const COUNT_SIZE: usize = 4;
const ENTRY_SIZE: usize = 8;

/// バイト列を直接参照する読み取り専用の文字列配列
#[derive(Clone, Copy, Debug)]
pub struct SerializedStringArray<'a> {
    data: &'a [u8],
}

impl Default for SerializedStringArray<'_> {
    fn default() -> Self {
        Self { data: &EMPTY_ARRAY }
    }
}

impl<'a> SerializedStringArray<'a> {
    /// 検証済みのバッファから配列を作成します。
    ///
    /// # エラー
    ///
    /// バッファが[`verify_data`](Self::verify_data)を満たさない場合にエラーを返します。
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if !Self::verify_data(data) {
            return Err(KotobaError::invalid_format(
                "string_array",
                "The buffer is not a valid serialized string array.",
            ));
        }
        Ok(Self { data })
    }

    /// バッファの構造を検証します。コピーは行いません。
    ///
    /// すべての (offset, length) が、NUL終端を含めてバッファ内を指し、
    /// 文字列本体がUTF-8であることを確認します。
    pub fn verify_data(data: &[u8]) -> bool {
        let Some(n) = read_u32_le(data, 0) else {
            log::debug!("[kotoba] string array is shorter than its count field");
            return false;
        };
        let n = usize::from_u32(n);
        let Some(header_end) = n
            .checked_mul(ENTRY_SIZE)
            .and_then(|x| x.checked_add(COUNT_SIZE))
        else {
            return false;
        };
        if data.len() < header_end {
            log::debug!(
                "[kotoba] string array header needs {header_end} bytes, got {}",
                data.len()
            );
            return false;
        }
        for i in 0..n {
            let pos = COUNT_SIZE + i * ENTRY_SIZE;
            let (Some(offset), Some(len)) = (read_u32_le(data, pos), read_u32_le(data, pos + 4))
            else {
                return false;
            };
            let offset = usize::from_u32(offset);
            let len = usize::from_u32(len);
            if offset < header_end {
                return false;
            }
            let Some(end) = offset.checked_add(len) else {
                return false;
            };
            if end >= data.len() || data[end] != 0 {
                return false;
            }
            if std::str::from_utf8(&data[offset..end]).is_err() {
                return false;
            }
        }
        true
    }

    /// バッファを検証し、成功した場合にのみ保持します。
    ///
    /// 失敗した場合は配列を空にして`false`を返します。
    pub fn init(&mut self, data: &'a [u8]) -> bool {
        if Self::verify_data(data) {
            self.data = data;
            true
        } else {
            self.clear();
            false
        }
    }

    /// 検証を行わずにバッファを保持します。
    ///
    /// 同じ検証済みバッファを複数の配列で共有する場合に使います。
    /// 不正なバッファを渡してもメモリ安全性は保たれ、壊れた要素は空文字列として読めます。
    pub fn set(&mut self, data: &'a [u8]) {
        debug_assert!(Self::verify_data(data));
        self.data = data;
    }

    /// 要素数を返します。
    #[inline(always)]
    pub fn size(&self) -> u32 {
        read_u32_le(self.data, 0).unwrap_or(0)
    }

    /// 要素数を`usize`で返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        usize::from_u32(self.size())
    }

    /// 配列が空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// `i`番目の文字列を返します。
    ///
    /// # パニック
    ///
    /// `i`が要素数以上の場合にパニックします。
    #[inline]
    pub fn get(&self, i: usize) -> &'a str {
        std::str::from_utf8(self.get_bytes(i)).unwrap_or_default()
    }

    /// `i`番目の文字列のバイト列を返します。
    #[inline]
    pub fn get_bytes(&self, i: usize) -> &'a [u8] {
        assert!(
            i < self.len(),
            "index out of bounds: the len is {} but the index is {i}",
            self.len()
        );
        let pos = COUNT_SIZE + i * ENTRY_SIZE;
        let (Some(offset), Some(len)) = (read_u32_le(self.data, pos), read_u32_le(self.data, pos + 4))
        else {
            return &[];
        };
        let offset = usize::from_u32(offset);
        offset
            .checked_add(usize::from_u32(len))
            .and_then(|end| self.data.get(offset..end))
            .unwrap_or_default()
    }

    /// 保持しているバッファを返します。
    #[inline(always)]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// 正準形の空配列に戻します。
    pub fn clear(&mut self) {
        self.data = &EMPTY_ARRAY;
    }

    /// 添字順に文字列を返すイテレータを取得します。
    pub fn iter(&self) -> Iter<'a> {
        Iter {
            array: *self,
            front: 0,
            back: self.len(),
        }
    }

    /// `pred`が`true`から`false`に変わる最初の添字を二分探索で返します。
    ///
    /// [`slice::partition_point`]と同じく、配列が`pred`で分割されていることを前提とします。
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&'a str) -> bool,
    {
        self.partition_point_bytes(|s| pred(std::str::from_utf8(s).unwrap_or_default()))
    }

    fn partition_point_bytes<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&'a [u8]) -> bool,
    {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.get_bytes(mid)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// `prefix`で始まる要素の添字範囲を返します。
    ///
    /// 配列はバイト列の辞書順で整列されている必要があります。
    /// 比較は両辺を`prefix`の長さに切り詰めて行います。
    pub fn equal_range_by_prefix(&self, prefix: &str) -> Range<usize> {
        let prefix = prefix.as_bytes();
        let truncate = |s: &'a [u8]| &s[..s.len().min(prefix.len())];
        let lo = self.partition_point_bytes(|s| truncate(s) < prefix);
        let hi = self.partition_point_bytes(|s| truncate(s) <= prefix);
        lo..hi
    }

    /// 文字列の列を直列化したバッファを作成します。
    ///
    /// 出力は[`new`](Self::new)や[`init`](Self::init)でそのまま読み戻せます。
    /// 全体の長さは4の倍数に切り上げられます。
    ///
    /// # エラー
    ///
    /// 要素数やオフセットがu32に収まらない場合にエラーを返します。
    pub fn serialize_to_buffer<I, S>(strings: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings: Vec<S> = strings.into_iter().collect();
        let header_end = COUNT_SIZE + ENTRY_SIZE * strings.len();
        let body_len: usize = strings.iter().map(|s| s.as_ref().len() + 1).sum();
        let total = (header_end + body_len).next_multiple_of(4);

        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(&u32::try_from(strings.len())?.to_le_bytes());
        let mut offset = header_end;
        for s in &strings {
            let len = s.as_ref().len();
            buf.extend_from_slice(&u32::try_from(offset)?.to_le_bytes());
            buf.extend_from_slice(&u32::try_from(len)?.to_le_bytes());
            offset += len + 1;
        }
        for s in &strings {
            buf.extend_from_slice(s.as_ref().as_bytes());
            buf.push(0);
        }
        buf.resize(total, 0);
        Ok(buf)
    }
}

impl<'a> IntoIterator for &SerializedStringArray<'a> {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// [`SerializedStringArray`]の添字順イテレータ
///
/// 要素の文字列を返します。両端からの走査と、`nth`/`nth_back`による定数時間の
/// ランダムアクセスに対応し、現在の添字は[`position`](Self::position)で得られます。
/// 添字に対する二分探索には[`SerializedStringArray::partition_point`]と
/// [`SerializedStringArray::equal_range_by_prefix`]を使います。
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    array: SerializedStringArray<'a>,
    front: usize,
    back: usize,
}

impl Iter<'_> {
    /// 次に返す要素の添字を返します。
    pub const fn position(&self) -> usize {
        self.front
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.front < self.back {
            let s = self.array.get(self.front);
            self.front += 1;
            Some(s)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a str> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<&'a str> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.array.get(self.back))
        } else {
            None
        }
    }

    fn nth_back(&mut self, n: usize) -> Option<&'a str> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
