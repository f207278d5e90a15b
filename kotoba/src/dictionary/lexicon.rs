//! 語彙辞書
//!
//! システム辞書に相当するメモリ上のバックエンドです。
//! エントリの集合から読みと表記の2つの[`WordMap`]を構築し、
//! 4種類の検索すべてに対応します。
//!
//! 直列化イメージはエントリのみをrkyv形式で保持し、
//! 読み込み時にトライを再構築します。

mod map;
mod param;

use std::io::{BufRead, Read, Write};
use std::sync::{Mutex, PoisonError};

use hashbrown::HashMap;
use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::config::Config;
use crate::dictionary::callback::visit_key;
use crate::dictionary::lexicon::map::WordMap;
use crate::dictionary::lexicon::map::trie::TrieMatch;
use crate::dictionary::{Callback, Dictionary, TraversalResult};
use crate::errors::{KotobaError, Result};
use crate::token::{Attributes, Token};
use crate::utils::{FromU32, parse_csv_row};

pub use crate::dictionary::lexicon::param::WordParam;

/// 語彙辞書イメージを識別するマジックバイト
pub const LEXICON_MAGIC: &[u8] = b"KotobaLexicon 0.1\n";

const LEXICON_MAGIC_LEN: usize = LEXICON_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize =
    (RKYV_ALIGNMENT - (LEXICON_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;

/// 語彙辞書のエントリ
#[derive(Debug, Clone, Eq, PartialEq, Archive, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// 読み
    pub key: String,
    /// 表記
    pub value: String,
    /// 文脈IDとコスト
    pub param: WordParam,
    /// 属性
    pub attributes: Attributes,
}

impl LexiconEntry {
    /// 属性なしのエントリを作成します。
    pub fn new<K, V>(key: K, value: V, left_id: u16, right_id: u16, word_cost: u16) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
            param: WordParam::new(left_id, right_id, word_cost),
            attributes: Attributes::NONE,
        }
    }

    /// 属性を設定したエントリを返します。
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    fn to_token(&self) -> Token {
        Token::new(
            self.key.as_str(),
            self.value.as_str(),
            self.param.left_id,
            self.param.right_id,
            self.param.word_cost,
        )
        .with_attributes(self.attributes)
    }
}

/// 語彙辞書
pub struct LexiconDictionary {
    entries: Vec<LexiconEntry>,
    keys: WordMap,
    values: WordMap,
    // Suffix of the populated text -> value matches.
    reverse_cache: Mutex<HashMap<String, Vec<TrieMatch>>>,
}

impl LexiconDictionary {
    /// エントリの集合から辞書を構築します。
    ///
    /// # エラー
    ///
    /// トライの構築に失敗した場合にエラーを返します。
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = LexiconEntry>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let keys = WordMap::new(entries.iter().map(|e| &e.key))?;
        let values = WordMap::new(entries.iter().map(|e| &e.value))?;
        Ok(Self {
            entries,
            keys,
            values,
            reverse_cache: Mutex::default(),
        })
    }

    /// CSV形式の辞書ファイルから辞書を構築します。
    ///
    /// 各行は`読み,表記,左文脈ID,右文脈ID,コスト[,属性]`の形式です。
    /// 表記が空の場合は読みと同じ表記とみなします。
    ///
    /// # エラー
    ///
    /// 列数が不足している行や、数値として解釈できない列がある場合にエラーを返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let entries = Self::parse_csv(rdr, "lexicon.csv")?;
        Self::from_entries(entries)
    }

    pub(crate) fn parse_csv<R>(rdr: R, name: &'static str) -> Result<Vec<LexiconEntry>>
    where
        R: Read,
    {
        let mut entries = vec![];
        for line in std::io::BufReader::new(rdr).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields = parse_csv_row(&line);
            if fields.len() < 5 {
                let msg = format!("A csv row of lexicon must have five items at least, {line:?}");
                return Err(KotobaError::invalid_format(name, msg));
            }
            if fields[0].is_empty() {
                log::warn!("[kotoba] Skipped an empty key, {line:?}");
                continue;
            }
            let value = if fields[1].is_empty() {
                fields[0].clone()
            } else {
                fields[1].clone()
            };
            let attributes = match fields.get(5) {
                Some(bits) if !bits.is_empty() => Attributes::from_bits(bits.parse()?),
                _ => Attributes::NONE,
            };
            entries.push(
                LexiconEntry::new(
                    fields[0].clone(),
                    value,
                    fields[2].parse()?,
                    fields[3].parse()?,
                    fields[4].parse()?,
                )
                .with_attributes(attributes),
            );
        }
        Ok(entries)
    }

    /// エントリ数を返します。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// エントリがないかどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エントリのスライスを返します。
    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// 辞書イメージを書き出します。
    ///
    /// # エラー
    ///
    /// 書き込みまたは直列化に失敗した場合にエラーを返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(LEXICON_MAGIC)?;
        wtr.write_all(&[0xFF; PADDING_LEN])?;
        let bytes = rkyv::to_bytes::<Error>(&self.entries).map_err(|e| {
            KotobaError::invalid_state("rkyv serialization failed".to_string(), e.to_string())
        })?;
        wtr.write_all(&bytes)?;
        Ok(())
    }

    /// 辞書イメージを読み込みます。
    ///
    /// # エラー
    ///
    /// マジックバイトが一致しない場合や、イメージの検証に失敗した場合にエラーを返します。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0; LEXICON_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if magic != LEXICON_MAGIC {
            return Err(KotobaError::invalid_argument(
                "rdr",
                "The magic number of the input lexicon mismatches.",
            ));
        }
        let mut padding_buf = [0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;
        let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let entries = rkyv::from_bytes::<Vec<LexiconEntry>, Error>(&aligned_bytes).map_err(|e| {
            log::error!("[kotoba] Rejected a lexicon image: {e}");
            KotobaError::invalid_state(
                "rkyv validation failed. The lexicon file may be corrupted or incompatible."
                    .to_string(),
                e.to_string(),
            )
        })?;
        Self::from_entries(entries)
    }

    fn emit<I>(&self, key: &str, ids: I, callback: &mut dyn Callback) -> TraversalResult
    where
        I: Iterator<Item = u32>,
    {
        visit_key(
            callback,
            key,
            ids.map(|id| self.entries[usize::from_u32(id)].to_token()),
        )
    }

    fn reverse_matches(&self, chars: &[char]) -> Vec<TrieMatch> {
        self.values.common_prefix_iterator(chars).collect()
    }

    fn cached_reverse_matches(&self, key: &str) -> Option<Vec<TrieMatch>> {
        // Never wait for a concurrent populate.
        self.reverse_cache.try_lock().ok()?.get(key).cloned()
    }
}

impl Dictionary for LexiconDictionary {
    fn lookup_predictive(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let words = self.keys.predictive_words(key);
        let mut i = 0;
        while i < words.len() {
            let (word, offset) = &words[i];
            i += 1;
            match self.emit(word, self.keys.ids(*offset), callback) {
                TraversalResult::Done => return,
                TraversalResult::Cull => {
                    while i < words.len() && words[i].0.starts_with(word.as_str()) {
                        i += 1;
                    }
                }
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn lookup_prefix(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let chars: Vec<_> = key.chars().collect();
        for m in self.keys.common_prefix_iterator(&chars) {
            let word: String = chars[..m.end_char].iter().collect();
            match self.emit(&word, self.keys.ids(m.value), callback) {
                TraversalResult::Done | TraversalResult::Cull => return,
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn lookup_exact(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        if let Some(ids) = self.keys.exact_match(key) {
            self.emit(key, ids, callback);
        }
    }

    fn lookup_reverse(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        let chars: Vec<_> = key.chars().collect();
        let matches = self
            .cached_reverse_matches(key)
            .unwrap_or_else(|| self.reverse_matches(&chars));
        for m in matches {
            let value: String = chars[..m.end_char].iter().collect();
            match self.emit(&value, self.values.ids(m.value), callback) {
                TraversalResult::Done | TraversalResult::Cull => return,
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.keys.exact_match(key).is_some()
    }

    fn has_value(&self, value: &str) -> bool {
        self.values.exact_match(value).is_some()
    }

    fn populate_reverse_lookup_cache(&self, text: &str) {
        let chars: Vec<_> = text.chars().collect();
        let mut cache = self
            .reverse_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for i in 0..chars.len() {
            let matches = self.reverse_matches(&chars[i..]);
            if !matches.is_empty() {
                cache.insert(chars[i..].iter().collect(), matches);
            }
        }
    }

    fn clear_reverse_lookup_cache(&self) {
        self.reverse_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TokenCollector;

    fn lexicon() -> LexiconDictionary {
        let data = "\
とうきょう,東京,1,1,3000
とうきょう,東京,2,2,3500
とうきょうと,東京都,1,1,4000
きょう,今日,3,3,2000
きょう,京,4,4,5000
ぐーぐる,グーグル,5,5,4500,1
";
        LexiconDictionary::from_reader(data.as_bytes()).unwrap()
    }

    fn collect<F>(f: F) -> Vec<(String, String)>
    where
        F: FnOnce(&mut TokenCollector),
    {
        let mut collector = TokenCollector::new();
        f(&mut collector);
        collector
            .into_tokens()
            .into_iter()
            .map(|t| (t.key, t.value))
            .collect()
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_from_reader() {
        let lex = lexicon();
        assert_eq!(lex.len(), 6);
        assert_eq!(lex.entries()[0].param, WordParam::new(1, 1, 3000));
        assert_eq!(lex.entries()[5].attributes, Attributes::SPELLING_CORRECTION);
    }

    #[test]
    fn test_from_reader_empty_value_and_key() {
        let lex = LexiconDictionary::from_reader(",x,1,1,1\nabc,,1,1,1\n".as_bytes()).unwrap();
        assert_eq!(lex.len(), 1);
        assert_eq!(lex.entries()[0].value, "abc");
    }

    #[test]
    fn test_from_reader_few_cols() {
        assert!(LexiconDictionary::from_reader("あ,亜,1,2".as_bytes()).is_err());
    }

    #[test]
    fn test_from_reader_invalid_numbers() {
        assert!(LexiconDictionary::from_reader("あ,亜,-1,2,3".as_bytes()).is_err());
        assert!(LexiconDictionary::from_reader("あ,亜,1,2,コスト".as_bytes()).is_err());
        assert!(LexiconDictionary::from_reader("あ,亜,1,2,3,x".as_bytes()).is_err());
    }

    #[test]
    fn test_lookup_exact() {
        let lex = lexicon();
        let config = Config::default();
        let got = collect(|c| lex.lookup_exact("きょう", &config, c));
        assert_eq!(got, [pair("きょう", "今日"), pair("きょう", "京")]);
        assert!(collect(|c| lex.lookup_exact("きょ", &config, c)).is_empty());
    }

    #[test]
    fn test_lookup_prefix() {
        let lex = lexicon();
        let got = collect(|c| lex.lookup_prefix("とうきょうとちょう", &Config::default(), c));
        assert_eq!(
            got,
            [
                pair("とうきょう", "東京"),
                pair("とうきょう", "東京"),
                pair("とうきょうと", "東京都"),
            ]
        );
    }

    #[test]
    fn test_lookup_predictive() {
        let lex = lexicon();
        let got = collect(|c| lex.lookup_predictive("とう", &Config::default(), c));
        assert_eq!(got.len(), 3);
        assert_eq!(got[2], pair("とうきょうと", "東京都"));
    }

    struct CullAt(&'static str, Vec<String>);

    impl Callback for CullAt {
        fn on_key(&mut self, key: &str) -> TraversalResult {
            if key == self.0 {
                TraversalResult::Cull
            } else {
                TraversalResult::Continue
            }
        }

        fn on_token(&mut self, _key: &str, _actual_key: &str, token: &Token) -> TraversalResult {
            self.1.push(token.value.clone());
            TraversalResult::Continue
        }
    }

    #[test]
    fn test_lookup_predictive_cull() {
        let lex = lexicon();
        let mut cb = CullAt("とうきょう", vec![]);
        lex.lookup_predictive("", &Config::default(), &mut cb);
        assert_eq!(cb.1, ["今日", "京", "グーグル"]);
    }

    #[test]
    fn test_lookup_reverse() {
        let lex = lexicon();
        let got = collect(|c| lex.lookup_reverse("東京都庁", &Config::default(), c));
        assert_eq!(
            got,
            [
                pair("とうきょう", "東京"),
                pair("とうきょう", "東京"),
                pair("とうきょうと", "東京都"),
            ]
        );
    }

    #[test]
    fn test_reverse_cache_does_not_change_results() {
        let lex = lexicon();
        let config = Config::default();
        let before = collect(|c| lex.lookup_reverse("東京都", &config, c));
        lex.populate_reverse_lookup_cache("今日は東京都");
        assert_eq!(collect(|c| lex.lookup_reverse("東京都", &config, c)), before);
        lex.clear_reverse_lookup_cache();
        assert_eq!(collect(|c| lex.lookup_reverse("東京都", &config, c)), before);
    }

    #[test]
    fn test_clear_poisoned_reverse_cache() {
        let lex = lexicon();
        lex.populate_reverse_lookup_cache("東京都");
        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _guard = lex.reverse_cache.lock();
                panic!("poison the cache");
            });
            assert!(poisoner.join().is_err());
        });
        assert!(lex.reverse_cache.is_poisoned());

        lex.clear_reverse_lookup_cache();
        let cache = lex.reverse_cache.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_has_key_and_value() {
        let lex = lexicon();
        assert!(lex.has_key("とうきょうと"));
        assert!(!lex.has_key("とうきょ"));
        assert!(lex.has_value("グーグル"));
        assert!(!lex.has_value("ぐーぐる"));
    }

    #[test]
    fn test_write_read() {
        let lex = lexicon();
        let mut buf = vec![];
        lex.write(&mut buf).unwrap();
        assert!(buf.starts_with(LEXICON_MAGIC));
        assert_eq!((LEXICON_MAGIC_LEN + PADDING_LEN) % RKYV_ALIGNMENT, 0);

        let restored = LexiconDictionary::read(buf.as_slice()).unwrap();
        assert_eq!(restored.entries(), lex.entries());
        assert!(restored.has_key("きょう"));
    }

    #[test]
    fn test_read_invalid() {
        assert!(LexiconDictionary::read(&b"NotALexicon 0.1\n"[..]).is_err());

        let mut buf = vec![];
        lexicon().write(&mut buf).unwrap();
        buf.truncate(LEXICON_MAGIC_LEN + PADDING_LEN + 8);
        assert!(LexiconDictionary::read(buf.as_slice()).is_err());
    }
}
