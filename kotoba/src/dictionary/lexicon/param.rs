//! 単語のパラメータ情報

use rkyv::{Archive, Deserialize, Serialize};

/// 単語のパラメータ（文脈IDとコスト）
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Archive, Serialize, Deserialize)]
pub struct WordParam {
    pub left_id: u16,
    pub right_id: u16,
    pub word_cost: u16,
}

impl WordParam {
    /// 新しい単語パラメータを作成します。
    #[inline(always)]
    pub const fn new(left_id: u16, right_id: u16, word_cost: u16) -> Self {
        Self {
            left_id,
            right_id,
            word_cost,
        }
    }
}
