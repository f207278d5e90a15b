//! kotoba辞書のコマンドラインツール
//!
//! ソースファイルから辞書イメージを構築するサブコマンドと、
//! 標準入力から読んだキーで合成辞書を検索するサブコマンドを提供します。

mod build;
mod query;

use clap::Parser;
use thiserror::Error;

use crate::{build::BuildError, query::QueryError};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "lookup", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// ソースファイルから辞書イメージを構築します
    ///
    /// 語彙辞書のCSVに加えて、値辞書のトライや不適切語フィルタも生成できます。
    Build(build::Args),

    /// 標準入力から読んだキーで辞書を検索します
    Query(query::Args),
}

/// 実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum LookupError {
    /// 辞書構築中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// 検索中のエラー
    #[error(transparent)]
    QueryError(#[from] QueryError),
}

/// メイン関数
///
/// コマンドライン引数をパースし、指定されたサブコマンドを実行します。
fn main() -> Result<(), LookupError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Query(args) => Ok(query::run(args)?),
    }
}
