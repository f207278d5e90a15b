//! 接尾辞辞書
//!
//! 助詞や助動詞など、少数の機能語の続きを予測するための辞書です。
//! 同じ添字`i`を共有する3つの配列からなります。
//!
//! - 読みの昇順に整列された[`SerializedStringArray`]
//! - 表記の[`SerializedStringArray`]（空文字列は表記が読みと同じことを表す）
//! - リトルエンディアンのu32三つ組 `(lid, rid, cost)` の配列
//!
//! 読みの整列は構築時の不変条件であり、検索時には再検証しません。

use crate::config::Config;
use crate::dictionary::callback::visit_key;
use crate::dictionary::{Callback, Dictionary, SerializedStringArray, TraversalResult};
use crate::errors::{KotobaError, Result};
use crate::token::{Attributes, Token};
use crate::utils::read_u32_le;

const TOKEN_SIZE: usize = 12;

/// 接尾辞辞書
///
/// 予測検索のみに対応します。
#[derive(Clone, Copy, Debug)]
pub struct SuffixDictionary<'a> {
    keys: SerializedStringArray<'a>,
    values: SerializedStringArray<'a>,
    tokens: &'a [u8],
}

impl<'a> SuffixDictionary<'a> {
    /// 3つのバッファから辞書を作成します。
    ///
    /// # エラー
    ///
    /// 文字列配列が不正な場合、要素数が一致しない場合、
    /// トークン配列が短い場合、IDやコストがu16に収まらない場合にエラーを返します。
    pub fn new(key_data: &'a [u8], value_data: &'a [u8], token_data: &'a [u8]) -> Result<Self> {
        let keys = SerializedStringArray::new(key_data)?;
        let values = SerializedStringArray::new(value_data)?;
        if keys.len() != values.len() {
            return Err(KotobaError::invalid_format(
                "suffix_dictionary",
                format!(
                    "{} keys but {} values.",
                    keys.len(),
                    values.len()
                ),
            ));
        }
        let Some(tokens) = token_data.get(..keys.len() * TOKEN_SIZE) else {
            return Err(KotobaError::invalid_format(
                "suffix_dictionary",
                format!(
                    "The token array needs {} bytes, got {}.",
                    keys.len() * TOKEN_SIZE,
                    token_data.len()
                ),
            ));
        };
        let out_of_range = tokens
            .chunks_exact(4)
            .filter_map(|w| read_u32_le(w, 0))
            .any(|x| x > u32::from(u16::MAX));
        if out_of_range {
            return Err(KotobaError::invalid_format(
                "suffix_dictionary",
                "The token array contains values out of the u16 range.",
            ));
        }
        Ok(Self {
            keys,
            values,
            tokens,
        })
    }

    /// エントリ数を返します。
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// エントリがないかどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn token(&self, i: usize, key: &str) -> Token {
        let field = |j: usize| {
            read_u32_le(self.tokens, i * TOKEN_SIZE + j * 4).unwrap_or_default() as u16
        };
        let value = match self.values.get(i) {
            "" => key,
            v => v,
        };
        Token::new(key, value, field(0), field(1), field(2))
            .with_attributes(Attributes::SUFFIX_DICTIONARY)
    }
}

impl Dictionary for SuffixDictionary<'_> {
    fn lookup_predictive(&self, key: &str, _config: &Config, callback: &mut dyn Callback) {
        for i in self.keys.equal_range_by_prefix(key) {
            let suffix_key = self.keys.get(i);
            match visit_key(callback, suffix_key, [self.token(i, suffix_key)]) {
                TraversalResult::Done => return,
                TraversalResult::Cull => panic!("SuffixDictionary does not support culling"),
                TraversalResult::Continue | TraversalResult::NextKey => {}
            }
        }
    }

    fn lookup_prefix(&self, _key: &str, _config: &Config, _callback: &mut dyn Callback) {}

    fn lookup_exact(&self, _key: &str, _config: &Config, _callback: &mut dyn Callback) {}

    fn lookup_reverse(&self, _key: &str, _config: &Config, _callback: &mut dyn Callback) {}

    fn has_key(&self, _key: &str) -> bool {
        panic!("SuffixDictionary does not support has_key()")
    }

    fn has_value(&self, _value: &str) -> bool {
        panic!("SuffixDictionary does not support has_value()")
    }
}

/// 接尾辞辞書のバッファ一式
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuffixDictionaryData {
    /// 読みの文字列配列
    pub keys: Vec<u8>,
    /// 表記の文字列配列
    pub values: Vec<u8>,
    /// `(lid, rid, cost)`の配列
    pub tokens: Vec<u8>,
}

impl SuffixDictionaryData {
    /// バッファを参照する辞書を作成します。
    ///
    /// # エラー
    ///
    /// バッファが不正な場合にエラーを返します。
    pub fn dictionary(&self) -> Result<SuffixDictionary<'_>> {
        SuffixDictionary::new(&self.keys, &self.values, &self.tokens)
    }
}

/// 接尾辞辞書のバッファを構築するビルダー
#[derive(Default)]
pub struct SuffixDictionaryBuilder {
    entries: Vec<Token>,
}

impl SuffixDictionaryBuilder {
    /// 新しいビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリを追加します。
    pub fn add_entry(&mut self, key: &str, value: &str, lid: u16, rid: u16, cost: u16) -> &mut Self {
        self.entries.push(Token::new(key, value, lid, rid, cost));
        self
    }

    /// 読みで整列したバッファ一式を作成します。
    ///
    /// 同じ読みのエントリは追加順を保ちます。
    ///
    /// # エラー
    ///
    /// バッファの大きさがu32に収まらない場合にエラーを返します。
    pub fn build(mut self) -> Result<SuffixDictionaryData> {
        self.entries.sort_by(|a, b| a.key.cmp(&b.key));
        let keys = SerializedStringArray::serialize_to_buffer(self.entries.iter().map(|e| &e.key))?;
        let values = SerializedStringArray::serialize_to_buffer(self.entries.iter().map(|e| {
            if e.key == e.value { "" } else { e.value.as_str() }
        }))?;
        let mut tokens = Vec::with_capacity(self.entries.len() * TOKEN_SIZE);
        for e in &self.entries {
            for x in [e.lid, e.rid, e.cost] {
                tokens.extend_from_slice(&u32::from(x).to_le_bytes());
            }
        }
        Ok(SuffixDictionaryData {
            keys,
            values,
            tokens,
        })
    }
}
