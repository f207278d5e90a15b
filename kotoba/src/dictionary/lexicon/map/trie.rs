//! ダブル配列トライによる文字列検索

use crate::errors::{KotobaError, Result};

/// ダブル配列トライ
///
/// 空のレコード集合にも対応します。
pub struct Trie {
    da: Option<crawdad::Trie>,
}

impl Trie {
    /// レコードからトライを構築します。キーは一意でなければなりません。
    pub fn from_records<K>(records: &[(K, u32)]) -> Result<Self>
    where
        K: AsRef<str>,
    {
        if records.is_empty() {
            return Ok(Self { da: None });
        }
        Ok(Self {
            da: Some(
                crawdad::Trie::from_records(records.iter().map(|(k, v)| (k, *v)))
                    .map_err(|e| KotobaError::invalid_argument("records", e.to_string()))?,
            ),
        })
    }

    /// 完全一致するキーの値を返します。
    #[inline(always)]
    pub fn exact_match(&self, key: &str) -> Option<u32> {
        self.da.as_ref()?.exact_match(key.chars())
    }

    /// 入力の接頭辞に一致するキーを短い順に返します。
    #[inline(always)]
    pub fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = TrieMatch> + 'a {
        self.da.iter().flat_map(move |da| {
            da.common_prefix_search(input.iter().copied())
                .map(|(value, end_char)| TrieMatch::new(value, end_char))
        })
    }
}

/// トライマッチング結果
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct TrieMatch {
    pub value: u32,
    pub end_char: usize,
}

impl TrieMatch {
    /// 新しいマッチング結果を作成します。
    #[inline(always)]
    pub const fn new(value: u32, end_char: usize) -> Self {
        Self { value, end_char }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefix_iterator() {
        let trie = Trie::from_records(&[("東京", 0), ("東京都", 1), ("京都", 2)]).unwrap();
        let input: Vec<_> = "東京都庁".chars().collect();
        let matches: Vec<_> = trie.common_prefix_iterator(&input).collect();
        assert_eq!(matches, [TrieMatch::new(0, 2), TrieMatch::new(1, 3)]);
        assert_eq!(trie.exact_match("京都"), Some(2));
        assert_eq!(trie.exact_match("京"), None);
    }

    #[test]
    fn test_empty() {
        let trie = Trie::from_records::<&str>(&[]).unwrap();
        assert_eq!(trie.exact_match("a"), None);
        assert_eq!(trie.common_prefix_iterator(&['a']).count(), 0);
    }
}
