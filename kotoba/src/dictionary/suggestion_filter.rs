//! 不適切なサジェスト候補のフィルタ
//!
//! 候補の表記をASCII小文字化し、そのフィンガープリントを
//! [`ExistenceFilter`]で引きます。

use crate::dictionary::existence_filter::{min_filter_size_in_bytes_for_error_rate, ExistenceFilter};
use crate::errors::Result;
use crate::utils::fingerprint;

/// 不適切なサジェスト候補のフィルタ
#[derive(Clone, Debug)]
pub struct SuggestionFilter<'a> {
    filter: ExistenceFilter<'a>,
}

impl<'a> SuggestionFilter<'a> {
    /// 直列化されたフィルタから作成します。
    ///
    /// # エラー
    ///
    /// `data`が正しいフィルタ形式でない場合にエラーを返します。
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Ok(Self {
            filter: ExistenceFilter::read(data)?,
        })
    }

    /// `text`がサジェストに不適切な語として登録されている可能性があるかどうかを返します。
    pub fn is_bad_suggestion(&self, text: &str) -> bool {
        self.filter.exists(fingerprint(&text.to_ascii_lowercase()))
    }
}

/// 不適切な語の一覧から直列化されたフィルタを構築します。
///
/// # 引数
///
/// * `words` - 登録する語
/// * `error_rate` - 目標とする偽陽性率
///
/// # エラー
///
/// `error_rate`が(0, 1)の範囲外の場合や、フィルタが大きすぎる場合にエラーを返します。
pub fn build<I, S>(words: I, error_rate: f64) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let words: Vec<String> = words
        .into_iter()
        .map(|w| w.as_ref().to_ascii_lowercase())
        .collect();
    let size = min_filter_size_in_bytes_for_error_rate(error_rate, words.len())?;
    let mut filter = ExistenceFilter::create_optimal(size, u32::try_from(words.len())?)?;
    for w in &words {
        filter.insert(fingerprint(w))?;
    }
    Ok(filter.to_bytes())
}
