//! 品詞IDの判定

/// 品詞IDに関する問い合わせを提供する構造体
///
/// 品詞IDの割り当ては辞書イメージを生成したツールが決めるため、
/// 必要なIDは構築時に渡します。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PosMatcher {
    zipcode_id: u16,
    suggestion_only_id: u16,
}

impl PosMatcher {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `zipcode_id` - 郵便番号に割り当てられた品詞ID
    /// * `suggestion_only_id` - サジェスト専用の品詞ID
    pub const fn new(zipcode_id: u16, suggestion_only_id: u16) -> Self {
        Self {
            zipcode_id,
            suggestion_only_id,
        }
    }

    /// 品詞IDが郵便番号を表すかどうかを返します。
    #[inline(always)]
    pub const fn is_zipcode(&self, id: u16) -> bool {
        id == self.zipcode_id
    }

    /// サジェスト専用の品詞IDを返します。
    #[inline(always)]
    pub const fn suggestion_only_word_id(&self) -> u16 {
        self.suggestion_only_id
    }
}
