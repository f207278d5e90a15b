//! 辞書バックエンドの合成
//!
//! [`CompositeDictionary`]はシステム辞書、値辞書、ユーザー辞書をこの順に問い合わせ、
//! 呼び出し側のコールバックの手前でトークンをフィルタリングします。

use crate::config::Config;
use crate::dictionary::{Callback, Dictionary, TraversalResult, UserDictionary};
use crate::pos::PosMatcher;
use crate::token::{Attributes, Token};
use crate::utils::is_english_transliteration;

/// 合成辞書
///
/// システム辞書と値辞書を所有し、ユーザー辞書は借用します。
pub struct CompositeDictionary<'a> {
    system: Box<dyn Dictionary + 'a>,
    value: Box<dyn Dictionary + 'a>,
    user: &'a dyn UserDictionary,
    pos_matcher: PosMatcher,
}

impl<'a> CompositeDictionary<'a> {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `system` - システム辞書
    /// * `value` - 値辞書
    /// * `user` - ユーザー辞書
    /// * `pos_matcher` - 郵便番号の判定に使う品詞情報
    pub fn new(
        system: Box<dyn Dictionary + 'a>,
        value: Box<dyn Dictionary + 'a>,
        user: &'a dyn UserDictionary,
        pos_matcher: PosMatcher,
    ) -> Self {
        Self {
            system,
            value,
            user,
            pos_matcher,
        }
    }

    fn backends(&self) -> [&dyn Dictionary; 3] {
        [&*self.system, &*self.value, self.user]
    }

    fn lookup<F>(&self, config: &Config, callback: &mut dyn Callback, f: F)
    where
        F: Fn(&dyn Dictionary, &mut dyn Callback),
    {
        let mut filter = FilteringCallback {
            user: self.user,
            pos_matcher: &self.pos_matcher,
            config,
            callback,
            done: false,
        };
        for dic in self.backends() {
            f(dic, &mut filter);
            if filter.done {
                return;
            }
        }
    }
}

impl Dictionary for CompositeDictionary<'_> {
    fn lookup_predictive(&self, key: &str, config: &Config, callback: &mut dyn Callback) {
        self.lookup(config, callback, |dic, cb| dic.lookup_predictive(key, config, cb));
    }

    fn lookup_prefix(&self, key: &str, config: &Config, callback: &mut dyn Callback) {
        self.lookup(config, callback, |dic, cb| dic.lookup_prefix(key, config, cb));
    }

    fn lookup_exact(&self, key: &str, config: &Config, callback: &mut dyn Callback) {
        self.lookup(config, callback, |dic, cb| dic.lookup_exact(key, config, cb));
    }

    fn lookup_reverse(&self, key: &str, config: &Config, callback: &mut dyn Callback) {
        self.lookup(config, callback, |dic, cb| dic.lookup_reverse(key, config, cb));
    }

    fn has_key(&self, key: &str) -> bool {
        self.backends().iter().any(|dic| dic.has_key(key))
    }

    fn has_value(&self, value: &str) -> bool {
        self.backends().iter().any(|dic| dic.has_value(value))
    }

    /// ユーザー辞書から順に問い合わせ、最初の空でないコメントを返します。
    fn lookup_comment(&self, key: &str, value: &str, config: &Config) -> Option<String> {
        self.backends().into_iter().rev().find_map(|dic| {
            dic.lookup_comment(key, value, config)
                .filter(|comment| !comment.is_empty())
        })
    }

    fn populate_reverse_lookup_cache(&self, text: &str) {
        for dic in self.backends() {
            dic.populate_reverse_lookup_cache(text);
        }
    }

    fn clear_reverse_lookup_cache(&self) {
        for dic in self.backends() {
            dic.clear_reverse_lookup_cache();
        }
    }
}

/// 設定と抑制辞書に従ってトークンを落とすコールバックのデコレーター
///
/// 落としたトークンは`Continue`として扱います。
struct FilteringCallback<'c, C: ?Sized> {
    user: &'c dyn UserDictionary,
    pos_matcher: &'c PosMatcher,
    config: &'c Config,
    callback: &'c mut C,
    // Set once any stage of the wrapped callback returns Done.
    done: bool,
}

impl<C> FilteringCallback<'_, C>
where
    C: Callback + ?Sized,
{
    fn should_drop(&self, token: &Token) -> bool {
        if !token.attributes.contains(Attributes::USER_DICTIONARY) {
            if !self.config.use_spelling_correction
                && token.attributes.contains(Attributes::SPELLING_CORRECTION)
            {
                return true;
            }
            if !self.config.use_zip_code_conversion && self.pos_matcher.is_zipcode(token.lid) {
                return true;
            }
            if !self.config.use_t13n_conversion && is_english_transliteration(&token.value) {
                return true;
            }
        }
        self.user.is_suppressed_entry(&token.key, &token.value)
    }

    #[inline(always)]
    fn record(&mut self, result: TraversalResult) -> TraversalResult {
        if result == TraversalResult::Done {
            self.done = true;
        }
        result
    }
}

impl<C> Callback for FilteringCallback<'_, C>
where
    C: Callback + ?Sized,
{
    fn on_key(&mut self, key: &str) -> TraversalResult {
        let result = self.callback.on_key(key);
        self.record(result)
    }

    fn on_actual_key(&mut self, key: &str, actual_key: &str, num_expanded: usize) -> TraversalResult {
        let result = self.callback.on_actual_key(key, actual_key, num_expanded);
        self.record(result)
    }

    fn on_token(&mut self, key: &str, actual_key: &str, token: &Token) -> TraversalResult {
        if self.should_drop(token) {
            return TraversalResult::Continue;
        }
        let result = self.callback.on_token(key, actual_key, token);
        self.record(result)
    }
}
