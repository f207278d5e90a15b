//! 辞書走査のコールバック規約
//!
//! すべての検索は、一致したキーごとに次の順でコールバックを呼び出します。
//!
//! 1. [`Callback::on_key`]
//! 2. [`Callback::on_actual_key`]
//! 3. そのキーを共有するトークンごとに[`Callback::on_token`]
//!
//! 各段階の戻り値[`TraversalResult`]によって、走査の続行や打ち切りを制御します。

use crate::token::Token;

/// コールバックの各段階が返す走査制御
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraversalResult {
    /// 次の呼び出しへ進みます。
    Continue,
    /// 現在のキーの残りのトークンを捨て、次のキーへ進みます。
    NextKey,
    /// `NextKey`に加えて、現在のキーを接頭辞とする部分木を読み飛ばします。
    ///
    /// トライを持たないバックエンドでは契約違反として扱われます。
    Cull,
    /// 走査全体を直ちに終了します。
    Done,
}

/// 辞書走査のビジター
///
/// すべての段階のデフォルト実装は[`TraversalResult::Continue`]を返すため、
/// 最小のコールバックは[`on_token`](Self::on_token)だけを実装すれば十分です。
pub trait Callback {
    /// 一致したキーごとに最初に呼ばれます。
    fn on_key(&mut self, _key: &str) -> TraversalResult {
        TraversalResult::Continue
    }

    /// 実際に一致したキーを通知します。
    ///
    /// `actual_key`は、かな修飾を区別しない展開検索でのみ`key`と異なります。
    fn on_actual_key(
        &mut self,
        _key: &str,
        _actual_key: &str,
        _num_expanded: usize,
    ) -> TraversalResult {
        TraversalResult::Continue
    }

    /// キーを共有するトークンごとに呼ばれます。
    fn on_token(&mut self, _key: &str, _actual_key: &str, _token: &Token) -> TraversalResult {
        TraversalResult::Continue
    }
}

/// すべてのトークンを複製して保持するコールバック
#[derive(Debug, Default)]
pub struct TokenCollector {
    tokens: Vec<Token>,
}

impl TokenCollector {
    /// 新しいインスタンスを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 集めたトークンを返します。
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// 集めたトークンを取り出します。
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl Callback for TokenCollector {
    fn on_token(&mut self, _key: &str, _actual_key: &str, token: &Token) -> TraversalResult {
        self.tokens.push(token.clone());
        TraversalResult::Continue
    }
}

/// 1つのキーについて`on_key`、`on_actual_key`、`on_token`を順に呼び出します。
///
/// いずれかの段階が[`TraversalResult::Continue`]以外を返した時点で、その値を返します。
pub(crate) fn visit_key<I>(callback: &mut dyn Callback, key: &str, tokens: I) -> TraversalResult
where
    I: IntoIterator<Item = Token>,
{
    let result = callback.on_key(key);
    if result != TraversalResult::Continue {
        return result;
    }
    let result = callback.on_actual_key(key, key, 0);
    if result != TraversalResult::Continue {
        return result;
    }
    for token in tokens {
        let result = callback.on_token(key, key, &token);
        if result != TraversalResult::Continue {
            return result;
        }
    }
    TraversalResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        token_result: Option<TraversalResult>,
    }

    impl Callback for Recorder {
        fn on_key(&mut self, key: &str) -> TraversalResult {
            self.events.push(format!("key:{key}"));
            TraversalResult::Continue
        }

        fn on_actual_key(&mut self, _key: &str, actual_key: &str, _n: usize) -> TraversalResult {
            self.events.push(format!("actual:{actual_key}"));
            TraversalResult::Continue
        }

        fn on_token(&mut self, _key: &str, _actual_key: &str, token: &Token) -> TraversalResult {
            self.events.push(format!("token:{}", token.value));
            self.token_result.unwrap_or(TraversalResult::Continue)
        }
    }

    #[test]
    fn test_visit_key_order() {
        let mut cb = Recorder::default();
        let tokens = [Token::new("k", "a", 0, 0, 0), Token::new("k", "b", 0, 0, 0)];
        assert_eq!(visit_key(&mut cb, "k", tokens), TraversalResult::Continue);
        assert_eq!(cb.events, ["key:k", "actual:k", "token:a", "token:b"]);
    }

    #[test]
    fn test_visit_key_stops_tokens() {
        let mut cb = Recorder {
            token_result: Some(TraversalResult::NextKey),
            ..Recorder::default()
        };
        let tokens = [Token::new("k", "a", 0, 0, 0), Token::new("k", "b", 0, 0, 0)];
        assert_eq!(visit_key(&mut cb, "k", tokens), TraversalResult::NextKey);
        assert_eq!(cb.events, ["key:k", "actual:k", "token:a"]);
    }

    #[test]
    fn test_token_collector() {
        let mut collector = TokenCollector::new();
        let token = Token::new("よみ", "読み", 1, 2, 3);
        assert_eq!(
            visit_key(&mut collector, "よみ", [token.clone()]),
            TraversalResult::Continue
        );
        assert_eq!(collector.into_tokens(), [token]);
    }
}
