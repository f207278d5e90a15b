//! 値辞書
//!
//! 英字の表記そのものをキーとする圧縮トライから、入力中の英字に続く語を予測します。
//! 候補のトークンは検索時に合成され、読みと表記はどちらも復元した表記になります。

pub mod codec;
pub mod trie;

use std::collections::VecDeque;

use crate::config::Config;
use crate::dictionary::callback::visit_key;
use crate::dictionary::value::codec::{Utf8ValueCodec, ValueCodec};
use crate::dictionary::value::trie::LoudsTrie;
use crate::dictionary::{Callback, Dictionary, TraversalResult};
use crate::pos::PosMatcher;
use crate::token::Token;
use crate::utils::{ScriptType, script_type};

pub use crate::dictionary::value::trie::{ArchivedTrieIndex, TrieIndex};

/// 値辞書のトークンに付与するコスト
pub const VALUE_DICTIONARY_COST: u16 = 10000;

/// 値辞書
///
/// トライとコーデックは外部から与えます。
pub struct ValueDictionary<'a, T: ?Sized, C = Utf8ValueCodec> {
    trie: &'a T,
    codec: C,
    suggestion_only_id: u16,
}

impl<'a, T> ValueDictionary<'a, T, Utf8ValueCodec>
where
    T: LoudsTrie + ?Sized,
{
    /// UTF-8のキーを持つトライから作成します。
    pub fn new(trie: &'a T, pos_matcher: &PosMatcher) -> Self {
        Self::with_codec(trie, Utf8ValueCodec, pos_matcher)
    }
}

impl<'a, T, C> ValueDictionary<'a, T, C>
where
    T: LoudsTrie + ?Sized,
    C: ValueCodec,
{
    /// コーデックを指定して作成します。
    ///
    /// トークンの品詞IDには`pos_matcher`のサジェスト専用IDを使います。
    pub fn with_codec(trie: &'a T, codec: C, pos_matcher: &PosMatcher) -> Self {
        Self {
            trie,
            codec,
            suggestion_only_id: pos_matcher.suggestion_only_word_id(),
        }
    }

    /// 値辞書で検索できるキーかどうかを返します。
    ///
    /// 空のキーと、先頭がひらがな・カタカナ・漢字のキーは検索しません。
    pub fn is_valid_key(key: &str) -> bool {
        key.chars().next().is_some_and(|c| {
            !matches!(
                script_type(c),
                ScriptType::Hiragana | ScriptType::Katakana | ScriptType::Kanji
            )
        })
    }

    fn token(&self, value: &str) -> Token {
        Token::new(
            value,
            value,
            self.suggestion_only_id,
            self.suggestion_only_id,
            VALUE_DICTIONARY_COST,
        )
    }

    fn handle_terminal(&self, value: &str, callback: &mut dyn Callback) -> TraversalResult {
        visit_key(callback, value, [self.token(value)])
    }
}

impl<T, C> Dictionary for ValueDictionary<'_, T, C>
where
    T: LoudsTrie + ?Sized,
    C: ValueCodec,
{
    fn lookup_predictive(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        if !Self::is_valid_key(key) {
            return;
        }
        let mut encoded = vec![];
        self.codec.encode_value(key, &mut encoded);
        let Some(start) = self.trie.traverse(&encoded) else {
            return;
        };

        let mut queue = VecDeque::from([start]);
        let mut buf = vec![];
        while let Some(node) = queue.pop_front() {
            if self.trie.is_terminal(node) {
                buf.clear();
                self.trie.restore_key(node, &mut buf);
                if let Some(value) = self.codec.decode_value(&buf) {
                    match self.handle_terminal(&value, callback) {
                        TraversalResult::Done => return,
                        TraversalResult::Cull => continue,
                        TraversalResult::Continue | TraversalResult::NextKey => {}
                    }
                } else {
                    log::debug!("[kotoba] Skipped an undecodable value trie key");
                }
            }
            let mut child = self.trie.first_child(node);
            while let Some(c) = child {
                queue.push_back(c);
                child = self.trie.next_sibling(c);
            }
        }
    }

    fn lookup_prefix(&self, _key: &str, _config: &Config, _callback: &mut dyn Callback) {}

    fn lookup_exact(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        if !Self::is_valid_key(key) {
            return;
        }
        let mut encoded = vec![];
        self.codec.encode_value(key, &mut encoded);
        if let Some(node) = self.trie.traverse(&encoded)
            && self.trie.is_terminal(node)
        {
            self.handle_terminal(key, callback);
        }
    }

    fn lookup_reverse(&self, _key: &str, _config: &Config, _callback: &mut dyn Callback) {}

    fn has_key(&self, _key: &str) -> bool {
        false
    }

    fn has_value(&self, _value: &str) -> bool {
        false
    }
}
