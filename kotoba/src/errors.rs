//! エラー型の定義
//!
//! このモジュールは、kotobaライブラリで使用されるすべてのエラー型を定義します。
//! バイナリ辞書イメージの検証エラーはすべてここに集約され、
//! 検索処理の途中でエラーが伝播することはありません。

use std::error::Error;
use std::fmt::{self, Debug};

/// kotoba専用のResult型
///
/// エラー型としてデフォルトで[`KotobaError`]を使用します。
pub type Result<T, E = KotobaError> = std::result::Result<T, E>;

/// kotobaのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum KotobaError {
    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    ///
    /// バイナリイメージやCSVの構造検証に失敗した場合に使用されます。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    ///
    /// [`InvalidStateError`]のエラーバリアント。
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 整数変換エラー
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// 整数パースエラー
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// UTF-8エンコーディングエラー
    #[error(transparent)]
    Utf8(std::str::Utf8Error),

    /// I/Oエラー
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    #[error(transparent)]
    RkyvError(#[from] rkyv::rancor::Error),
}

impl KotobaError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

impl From<std::num::TryFromIntError> for KotobaError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseIntError> for KotobaError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<std::str::Utf8Error> for KotobaError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::Utf8(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_format() {
        let e = KotobaError::invalid_format("filter", "k must be in [1, 7]");
        assert_eq!(
            e.to_string(),
            "InvalidFormatError: filter: k must be in [1, 7]"
        );
    }

    #[test]
    fn test_from_parse_int() {
        let e: KotobaError = "x".parse::<u16>().unwrap_err().into();
        assert!(matches!(e, KotobaError::ParseInt(_)));
    }
}
