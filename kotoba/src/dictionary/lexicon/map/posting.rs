//! ポスティングリスト
//!
//! 同じ文字列を持つエントリIDの集合を管理します。

use crate::errors::Result;
use crate::utils::FromU32;

/// ポスティングリスト
pub struct Postings {
    // Sets of ids are stored by interleaving their length and values.
    data: Vec<u32>,
}

impl Postings {
    /// 指定されたオフセットのIDイテレータを取得します。
    #[inline(always)]
    pub fn ids(&self, offset: u32) -> impl Iterator<Item = u32> + '_ {
        let i = usize::from_u32(offset);
        let len = usize::from_u32(self.data[i]);
        self.data[i + 1..i + 1 + len].iter().copied()
    }
}

/// ポスティングリストを構築するビルダー
#[derive(Default)]
pub struct PostingsBuilder {
    data: Vec<u32>,
}

impl PostingsBuilder {
    /// 新しいビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// IDリストを追加し、そのオフセットを返します。
    #[inline(always)]
    pub fn push(&mut self, ids: &[u32]) -> Result<u32> {
        let offset = u32::try_from(self.data.len())?;
        self.data.push(ids.len().try_into()?);
        self.data.extend_from_slice(ids);
        Ok(offset)
    }

    /// ポスティングリストを構築します。
    #[allow(clippy::missing_const_for_fn)]
    pub fn build(self) -> Postings {
        Postings { data: self.data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postings() {
        let mut b = PostingsBuilder::new();
        let a = b.push(&[3, 1]).unwrap();
        let c = b.push(&[]).unwrap();
        let d = b.push(&[7]).unwrap();
        let postings = b.build();
        assert_eq!(postings.ids(a).collect::<Vec<_>>(), [3, 1]);
        assert_eq!(postings.ids(c).count(), 0);
        assert_eq!(postings.ids(d).collect::<Vec<_>>(), [7]);
    }
}
