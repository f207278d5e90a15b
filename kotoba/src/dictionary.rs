//! かな漢字変換のための辞書モジュール。
//!
//! このモジュールは、読みから候補語を引くための辞書バックエンドと、
//! それらを束ねる[`CompositeDictionary`]を提供します。
//! 主な構成要素は以下の通りです:
//!
//! - [`SerializedStringArray`]: バイト列から直接読む文字列配列
//! - [`ExistenceFilter`]: 64ビットフィンガープリントのブルームフィルタ
//! - [`SuppressionDictionary`]: ユーザーが抑制した (読み, 表記) の集合
//! - [`SuffixDictionary`]: 二分探索による接尾辞の予測検索
//! - [`ValueDictionary`]: 圧縮トライによる英字候補の検索
//! - [`LexiconDictionary`]: ダブル配列トライによるシステム辞書相当のバックエンド
//! - [`MemoryUserDictionary`]: メモリ上のユーザー辞書
//!
//! すべての検索は[`Callback`]を介して結果を返します。
pub mod callback;
pub mod composite;
pub mod existence_filter;
pub mod lexicon;
pub mod string_array;
pub mod suffix;
pub mod suggestion_filter;
pub mod suppression;
pub mod user;
pub mod value;

use crate::config::Config;

pub use crate::dictionary::callback::{Callback, TokenCollector, TraversalResult};
pub use crate::dictionary::composite::CompositeDictionary;
pub use crate::dictionary::existence_filter::ExistenceFilter;
pub use crate::dictionary::lexicon::{LexiconDictionary, LexiconEntry};
pub use crate::dictionary::string_array::SerializedStringArray;
pub use crate::dictionary::suffix::{SuffixDictionary, SuffixDictionaryBuilder};
pub use crate::dictionary::suggestion_filter::SuggestionFilter;
pub use crate::dictionary::suppression::SuppressionDictionary;
pub use crate::dictionary::user::{MemoryUserDictionary, UserEntry};
pub use crate::dictionary::value::ValueDictionary;

/// 辞書バックエンドの共通インターフェース
///
/// 検索系のメソッドは、一致したエントリごとに`callback`を呼び出します。
/// 対応しない検索はデフォルト実装のまま何もしません。
pub trait Dictionary {
    /// 読みが`key`で始まるエントリを検索します。
    fn lookup_predictive(&self, key: &str, config: &Config, callback: &mut dyn Callback);

    /// 読みが`key`の接頭辞であるエントリを検索します。
    fn lookup_prefix(&self, key: &str, config: &Config, callback: &mut dyn Callback);

    /// 読みが`key`と一致するエントリを検索します。
    fn lookup_exact(&self, key: &str, config: &Config, callback: &mut dyn Callback);

    /// 表記で検索します（読みと表記の役割を入れ替えた検索）。
    fn lookup_reverse(&self, key: &str, config: &Config, callback: &mut dyn Callback);

    /// 読みが`key`と一致するエントリが存在するかどうかを返します。
    fn has_key(&self, key: &str) -> bool;

    /// 表記が`value`と一致するエントリが存在するかどうかを返します。
    fn has_value(&self, value: &str) -> bool;

    /// (読み, 表記) に付与されたコメントを返します。
    fn lookup_comment(&self, _key: &str, _value: &str, _config: &Config) -> Option<String> {
        None
    }

    /// 逆引き結果のキャッシュを事前に構築します。
    ///
    /// 正しさには影響しない助言的なフックです。
    fn populate_reverse_lookup_cache(&self, _text: &str) {}

    /// 逆引き結果のキャッシュを破棄します。
    fn clear_reverse_lookup_cache(&self) {}
}

/// ユーザー辞書のインターフェース
///
/// 通常の検索に加えて、ユーザーが抑制したエントリの問い合わせを提供します。
pub trait UserDictionary: Dictionary {
    /// (読み, 表記) が抑制されているかどうかを返します。
    fn is_suppressed_entry(&self, key: &str, value: &str) -> bool;
}
