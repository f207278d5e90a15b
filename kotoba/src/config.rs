//! 変換設定のスナップショット
//!
//! 辞書検索時のフィルタリング方針を決める設定値です。
//! 設定の永続化は扱わず、呼び出し側が検索ごとに値を渡します。

/// 辞書検索に影響する設定値
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// スペル補正候補を出すかどうか
    pub use_spelling_correction: bool,
    /// 郵便番号変換を行うかどうか
    pub use_zip_code_conversion: bool,
    /// 英字への翻字変換を行うかどうか
    pub use_t13n_conversion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_spelling_correction: true,
            use_zip_code_conversion: true,
            use_t13n_conversion: true,
        }
    }
}
