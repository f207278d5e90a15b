//! 辞書イメージの構築
//!
//! 語彙辞書のCSVから語彙辞書イメージを、値の一覧から値辞書のトライイメージを、
//! 不適切語の一覧からサジェストフィルタを生成します。

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use kotoba_dict::dictionary::suggestion_filter;
use kotoba_dict::dictionary::value::TrieIndex;
use kotoba_dict::dictionary::LexiconDictionary;
use kotoba_dict::errors::KotobaError;

use clap::Parser;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "build", about = "A program to build dictionary images.")]
pub struct Args {
    /// Lexicon file (key,value,lid,rid,cost[,attributes]).
    #[clap(short = 'l', long)]
    lexicon_in: PathBuf,

    /// File to which the lexicon image is output.
    #[clap(short = 'o', long)]
    lexicon_out: PathBuf,

    /// Values of the value dictionary, one per line.
    #[clap(long, requires = "trie_out")]
    values_in: Option<PathBuf>,

    /// File to which the value trie image is output.
    #[clap(long, requires = "values_in")]
    trie_out: Option<PathBuf>,

    /// Words that must not be suggested, one per line.
    #[clap(long, requires = "filter_out")]
    bad_words_in: Option<PathBuf>,

    /// File to which the suggestion filter is output.
    #[clap(long, requires = "bad_words_in")]
    filter_out: Option<PathBuf>,

    /// Target false positive rate of the suggestion filter.
    #[clap(long, default_value = "0.0001")]
    error_rate: f64,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 辞書構築エラー
    #[error("Dictionary building failed: {0}")]
    Kotoba(#[from] KotobaError),
}

/// 空行を除いた行を読み込みます。
fn read_lines(path: &Path) -> Result<Vec<String>, BuildError> {
    let mut lines = vec![];
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        if !line.is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// 指定されたイメージをすべて構築します。
pub fn run(args: Args) -> Result<(), BuildError> {
    eprintln!("Compiling the lexicon...");
    let lexicon = LexiconDictionary::from_reader(File::open(&args.lexicon_in)?)?;
    eprintln!("{} entries", lexicon.len());

    eprintln!("Writing the lexicon image...: {:?}", &args.lexicon_out);
    let mut wtr = BufWriter::new(File::create(&args.lexicon_out)?);
    lexicon.write(&mut wtr)?;
    wtr.flush()?;

    if let (Some(values_in), Some(trie_out)) = (&args.values_in, &args.trie_out) {
        eprintln!("Compiling the value trie...");
        let trie = TrieIndex::from_keys(read_lines(values_in)?)?;
        eprintln!("{} nodes", trie.num_nodes());
        eprintln!("Writing the value trie image...: {trie_out:?}");
        fs::write(trie_out, trie.to_bytes()?)?;
    }

    if let (Some(bad_words_in), Some(filter_out)) = (&args.bad_words_in, &args.filter_out) {
        eprintln!("Compiling the suggestion filter...");
        let filter = suggestion_filter::build(read_lines(bad_words_in)?, args.error_rate)?;
        eprintln!("Writing the suggestion filter...: {filter_out:?}");
        fs::write(filter_out, filter)?;
    }

    Ok(())
}
