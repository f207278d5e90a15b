//! メモリ上のユーザー辞書
//!
//! 単語リストは読みで整列した不変のスナップショットとして公開され、
//! [`MemoryUserDictionary::load`]で丸ごと差し替えられます。
//! 抑制指定のエントリは単語リストには入らず、共有の[`SuppressionDictionary`]に登録されます。

use std::io::{BufRead, Read};
use std::ops::Range;
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::dictionary::callback::visit_key;
use crate::dictionary::{Callback, Dictionary, SuppressionDictionary, TraversalResult, UserDictionary};
use crate::errors::{KotobaError, Result};
use crate::token::{Attributes, Token};
use crate::utils::parse_csv_row;

/// ユーザー辞書のトークンに付与するコスト
pub const USER_DICTIONARY_COST: u16 = 5000;

/// ユーザー辞書のエントリ
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserEntry {
    /// 読み
    pub key: String,
    /// 表記
    pub value: String,
    /// 品詞ID
    pub pos_id: u16,
    /// コメント
    pub comment: String,
    /// 抑制指定
    pub suppressed: bool,
}

impl UserEntry {
    /// 新しいエントリを作成します。
    pub fn new<K, V>(key: K, value: V, pos_id: u16) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
            pos_id,
            ..Self::default()
        }
    }

    /// コメントを設定したエントリを返します。
    #[must_use]
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = comment.into();
        self
    }

    /// 抑制指定のエントリを返します。
    #[must_use]
    pub fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }

    fn to_token(&self) -> Token {
        Token::new(
            self.key.as_str(),
            self.value.as_str(),
            self.pos_id,
            self.pos_id,
            USER_DICTIONARY_COST,
        )
        .with_attributes(Attributes::USER_DICTIONARY)
    }

    /// CSV形式のユーザー辞書を読み込みます。
    ///
    /// 各行は`読み,表記,品詞ID[,コメント[,抑制]]`の形式で、
    /// 抑制列が`1`または`true`の行は抑制指定になります。
    ///
    /// # エラー
    ///
    /// 列数が不足している行や、品詞IDを解釈できない行がある場合にエラーを返します。
    pub fn parse_csv<R>(rdr: R) -> Result<Vec<Self>>
    where
        R: Read,
    {
        let mut entries = vec![];
        for line in std::io::BufReader::new(rdr).lines() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields = parse_csv_row(&line);
            if fields.len() < 3 {
                let msg = format!("A csv row of user dictionary must have three items at least, {line:?}");
                return Err(KotobaError::invalid_format("user.csv", msg));
            }
            let mut entry = Self::new(fields[0].as_str(), fields[1].as_str(), fields[2].parse()?);
            if let Some(comment) = fields.get(3) {
                entry.comment = comment.clone();
            }
            entry.suppressed = matches!(fields.get(4).map(String::as_str), Some("1" | "true"));
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// メモリ上のユーザー辞書
#[derive(Debug)]
pub struct MemoryUserDictionary {
    // Sorted by key; entries with the same key keep their load order.
    words: RwLock<Arc<Vec<UserEntry>>>,
    suppression: Arc<SuppressionDictionary>,
}

impl MemoryUserDictionary {
    /// 抑制辞書を共有する空のユーザー辞書を作成します。
    pub fn new(suppression: Arc<SuppressionDictionary>) -> Self {
        Self {
            words: RwLock::default(),
            suppression,
        }
    }

    /// 共有している抑制辞書を返します。
    pub fn suppression_dictionary(&self) -> &Arc<SuppressionDictionary> {
        &self.suppression
    }

    /// エントリを読み込み、単語リストと抑制辞書を差し替えます。
    ///
    /// # パニック
    ///
    /// 抑制辞書が他のプロデューサーによってロックされている場合にパニックします。
    pub fn load<I>(&self, entries: I)
    where
        I: IntoIterator<Item = UserEntry>,
    {
        let mut words = vec![];
        self.suppression.lock();
        self.suppression.clear();
        for e in entries {
            if e.suppressed {
                self.suppression.add_entry(&e.key, &e.value);
            } else if e.key.is_empty() || e.value.is_empty() {
                log::warn!("[kotoba] Skipped a user entry with an empty key or value");
            } else {
                words.push(e);
            }
        }
        words.sort_by(|a, b| a.key.cmp(&b.key));
        log::debug!("[kotoba] Loaded {} user dictionary entries", words.len());
        match self.words.write() {
            Ok(mut published) => *published = Arc::new(words),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(words),
        }
        self.suppression.unlock();
    }

    /// 単語リストのエントリ数を返します。
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// 単語リストが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<Vec<UserEntry>> {
        match self.words.read() {
            Ok(words) => Arc::clone(&words),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn equal_range(words: &[UserEntry], key: &str) -> Range<usize> {
        let start = words.partition_point(|e| e.key.as_str() < key);
        let len = words[start..].partition_point(|e| e.key == key);
        start..start + len
    }

    fn emit(words: &[UserEntry], key: &str, callback: &mut dyn Callback) -> TraversalResult {
        visit_key(callback, key, words.iter().map(UserEntry::to_token))
    }
}

impl Dictionary for MemoryUserDictionary {
    /// 空のキーでは何も返しません。
    fn lookup_predictive(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        if key.is_empty() {
            return;
        }
        let words = self.snapshot();
        let start = words.partition_point(|e| e.key.as_str() < key);
        let len = words[start..].partition_point(|e| e.key.starts_with(key));
        let words = &words[start..start + len];

        let mut i = 0;
        while i < words.len() {
            let key = words[i].key.as_str();
            let group = Self::equal_range(&words[i..], key);
            let group = &words[i..i + group.end];
            i += group.len();
            match Self::emit(group, key, callback) {
                TraversalResult::Done => return,
                TraversalResult::Cull => {
                    while i < words.len() && words[i].key.starts_with(key) {
                        i += 1;
                    }
                }
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn lookup_prefix(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let words = self.snapshot();
        let ends = key
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect::<Vec<_>>();
        for end in ends {
            let prefix = &key[..end];
            let range = Self::equal_range(&words, prefix);
            if range.is_empty() {
                continue;
            }
            match Self::emit(&words[range], prefix, callback) {
                TraversalResult::Done | TraversalResult::Cull => return,
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn lookup_exact(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let words = self.snapshot();
        let range = Self::equal_range(&words, key);
        if !range.is_empty() {
            Self::emit(&words[range], key, callback);
        }
    }

    fn lookup_reverse(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let words = self.snapshot();
        for (i, c) in key.char_indices() {
            let value = &key[..i + c.len_utf8()];
            let matched: Vec<_> = words.iter().filter(|e| e.value == value).cloned().collect();
            if matched.is_empty() {
                continue;
            }
            match Self::emit(&matched, value, callback) {
                TraversalResult::Done | TraversalResult::Cull => return,
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn has_key(&self, key: &str) -> bool {
        !Self::equal_range(&self.snapshot(), key).is_empty()
    }

    fn has_value(&self, value: &str) -> bool {
        self.snapshot().iter().any(|e| e.value == value)
    }

    fn lookup_comment(&self, key: &str, value: &str, _config: &Config) -> Option<String> {
        let words = self.snapshot();
        words[Self::equal_range(&words, key)]
            .iter()
            .find(|e| e.value == value && !e.comment.is_empty())
            .map(|e| e.comment.clone())
    }
}

impl UserDictionary for MemoryUserDictionary {
    fn is_suppressed_entry(&self, key: &str, value: &str) -> bool {
        self.suppression.suppress_entry(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TokenCollector;

    fn user_dictionary() -> MemoryUserDictionary {
        let dic = MemoryUserDictionary::new(Arc::new(SuppressionDictionary::new()));
        dic.load([
            UserEntry::new("みらい", "未来", 7).with_comment("ミライ"),
            UserEntry::new("みらい", "ミライ", 7),
            UserEntry::new("み", "実", 3),
            UserEntry::new("みらいけい", "未来形", 7),
            UserEntry::new("ぐーぐる", "Google", 9).suppressed(),
        ]);
        dic
    }

    fn values<F>(f: F) -> Vec<String>
    where
        F: FnOnce(&mut TokenCollector),
    {
        let mut collector = TokenCollector::new();
        f(&mut collector);
        collector.into_tokens().into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn test_load() {
        let dic = user_dictionary();
        assert_eq!(dic.len(), 4);
        assert!(dic.is_suppressed_entry("ぐーぐる", "Google"));
        assert!(!dic.is_suppressed_entry("みらい", "未来"));
        assert!(!dic.has_key("ぐーぐる"));
    }

    #[test]
    fn test_reload_replaces_suppression() {
        let dic = user_dictionary();
        dic.load([UserEntry::new("あ", "亜", 1)]);
        assert_eq!(dic.len(), 1);
        assert!(!dic.is_suppressed_entry("ぐーぐる", "Google"));
        assert!(!dic.suppression_dictionary().is_locked());
    }

    #[test]
    fn test_lookups() {
        let dic = user_dictionary();
        let config = Config::default();
        assert_eq!(
            values(|c| dic.lookup_exact("みらい", &config, c)),
            ["未来", "ミライ"]
        );
        assert_eq!(
            values(|c| dic.lookup_prefix("みらいけいかく", &config, c)),
            ["実", "未来", "ミライ", "未来形"]
        );
        assert_eq!(
            values(|c| dic.lookup_predictive("みら", &config, c)),
            ["未来", "ミライ", "未来形"]
        );
        assert!(values(|c| dic.lookup_predictive("", &config, c)).is_empty());
        assert_eq!(
            values(|c| dic.lookup_reverse("未来形です", &config, c)),
            ["未来", "未来形"]
        );
    }

    #[test]
    fn test_token_contents() {
        let dic = user_dictionary();
        let mut collector = TokenCollector::new();
        dic.lookup_exact("み", &Config::default(), &mut collector);
        assert_eq!(
            collector.tokens(),
            [Token::new("み", "実", 3, 3, USER_DICTIONARY_COST)
                .with_attributes(Attributes::USER_DICTIONARY)]
        );
    }

    #[test]
    fn test_has_value_and_comment() {
        let dic = user_dictionary();
        assert!(dic.has_key("みらいけい"));
        assert!(dic.has_value("ミライ"));
        assert!(!dic.has_value("Google"));
        let config = Config::default();
        assert_eq!(dic.lookup_comment("みらい", "未来", &config).as_deref(), Some("ミライ"));
        assert_eq!(dic.lookup_comment("みらい", "ミライ", &config), None);
    }

    #[test]
    fn test_parse_csv() {
        let data = "\
# comment line
みらい,未来,7,ミライ
ぐーぐる,Google,9,,1
";
        let entries = UserEntry::parse_csv(data.as_bytes()).unwrap();
        assert_eq!(
            entries,
            [
                UserEntry::new("みらい", "未来", 7).with_comment("ミライ"),
                UserEntry::new("ぐーぐる", "Google", 9).suppressed(),
            ]
        );
        assert!(UserEntry::parse_csv("みらい,未来".as_bytes()).is_err());
        assert!(UserEntry::parse_csv("みらい,未来,x".as_bytes()).is_err());
    }
}
