//! # kotoba-dict
//!
//! かな漢字変換エンジンのための辞書検索ライブラリです。
//!
//! ## 概要
//!
//! 読みから候補語を引く複数の辞書バックエンドと、それらを束ねて
//! 設定やユーザーの抑制指定に従って候補をフィルタリングする合成辞書を提供します。
//! 辞書データの多くはバイト列から直接読む形式で、検証後はコピーせずに参照します。
//!
//! ## 主な機能
//!
//! - **文字列配列**: オフセット表付きの直列化された文字列配列と二分探索
//! - **ブルームフィルタ**: 64ビットフィンガープリントの存在判定
//! - **抑制辞書**: 検索スレッドをブロックしない再読み込み
//! - **接尾辞辞書・値辞書**: 前方一致による候補の予測
//! - **合成辞書**: 複数のバックエンドの結果を1つのコールバックに集約
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use kotoba_dict::dictionary::value::TrieIndex;
//! use kotoba_dict::dictionary::{
//!     LexiconDictionary, MemoryUserDictionary, SuppressionDictionary, TokenCollector,
//!     UserEntry, ValueDictionary,
//! };
//! use kotoba_dict::{CompositeDictionary, Config, Dictionary, PosMatcher};
//!
//! let lexicon_csv = "とうきょう,東京,1,1,3000\nきょうと,京都,1,1,3200";
//! let system = LexiconDictionary::from_reader(lexicon_csv.as_bytes())?;
//! let trie = TrieIndex::from_keys(["google", "golang"])?;
//! let pos_matcher = PosMatcher::new(100, 101);
//!
//! let user = MemoryUserDictionary::new(Arc::new(SuppressionDictionary::new()));
//! user.load([UserEntry::new("とうきょう", "TOKYO", 5)]);
//!
//! let dict = CompositeDictionary::new(
//!     Box::new(system),
//!     Box::new(ValueDictionary::new(&trie, &pos_matcher)),
//!     &user,
//!     pos_matcher,
//! );
//!
//! let mut collector = TokenCollector::new();
//! dict.lookup_exact("とうきょう", &Config::default(), &mut collector);
//! let values: Vec<_> = collector.tokens().iter().map(|t| t.value.as_str()).collect();
//! assert_eq!(values, ["東京", "TOKYO"]);
//!
//! let mut collector = TokenCollector::new();
//! dict.lookup_predictive("go", &Config::default(), &mut collector);
//! assert_eq!(collector.tokens().len(), 2);
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 変換設定
pub mod config;

/// 辞書データ構造と検索
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 品詞IDの判定
pub mod pos;

/// トークン型の定義
pub mod token;

/// 内部ユーティリティ関数
pub mod utils;


// Re-exports
pub use config::Config;
pub use dictionary::{CompositeDictionary, Dictionary, UserDictionary};
pub use errors::{KotobaError, Result};
pub use pos::PosMatcher;
pub use token::{Attributes, Token};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
