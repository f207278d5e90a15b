//! 文字列からエントリIDへのマップ
//!
//! 完全一致と共通接頭辞検索にはダブル配列トライを、
//! 前方一致検索には整列済みの文字列リストを使います。

pub mod posting;
pub mod trie;

use std::collections::BTreeMap;

use crate::dictionary::lexicon::map::posting::{Postings, PostingsBuilder};
use crate::dictionary::lexicon::map::trie::{Trie, TrieMatch};
use crate::errors::Result;

/// 文字列をトライ構造で管理するマップ
pub struct WordMap {
    trie: Trie,
    postings: Postings,
    // Unique words in byte order, paired with their postings offsets.
    words: Vec<(String, u32)>,
}

impl WordMap {
    /// 文字列のイテレータから新しいインスタンスを作成します。
    ///
    /// `i`番目の文字列にはエントリID `i` が割り当てられます。空文字列は登録しません。
    pub fn new<I, W>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut b = WordMapBuilder::new();
        for (i, w) in words.into_iter().enumerate() {
            b.add_record(w.as_ref(), u32::try_from(i)?);
        }
        b.build()
    }

    /// 完全一致する文字列のエントリIDを返します。
    #[inline(always)]
    pub fn exact_match(&self, word: &str) -> Option<impl Iterator<Item = u32> + '_> {
        self.trie
            .exact_match(word)
            .map(|offset| self.postings.ids(offset))
    }

    /// 入力の接頭辞に一致する文字列を短い順に返します。
    ///
    /// [`TrieMatch::value`]はポスティングリストのオフセットです。
    #[inline(always)]
    pub fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = TrieMatch> + 'a {
        self.trie.common_prefix_iterator(input)
    }

    /// `prefix`で始まる文字列とオフセットをバイト順に返します。
    pub fn predictive_words(&self, prefix: &str) -> &[(String, u32)] {
        let start = self.words.partition_point(|(w, _)| w.as_str() < prefix);
        let len = self.words[start..].partition_point(|(w, _)| w.starts_with(prefix));
        &self.words[start..start + len]
    }

    /// オフセットに対応するエントリIDを返します。
    #[inline(always)]
    pub fn ids(&self, offset: u32) -> impl Iterator<Item = u32> + '_ {
        self.postings.ids(offset)
    }
}

/// 文字列マップを構築するビルダー
#[derive(Default)]
pub struct WordMapBuilder {
    map: BTreeMap<String, Vec<u32>>,
}

impl WordMapBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn add_record(&mut self, word: &str, id: u32) {
        if !word.is_empty() {
            self.map.entry(word.to_string()).or_default().push(id);
        }
    }

    pub fn build(self) -> Result<WordMap> {
        let mut words = vec![];
        let mut builder = PostingsBuilder::new();
        for (word, ids) in self.map {
            let offset = builder.push(&ids)?;
            words.push((word, offset));
        }
        Ok(WordMap {
            trie: Trie::from_records(&words)?,
            postings: builder.build(),
            words,
        })
    }
}
