//! 合成辞書の検索
//!
//! 標準入力の各行をキーとして検索し、見つかったトークンを
//! `読み\t表記\t左文脈ID\t右文脈ID\tコスト\t属性`の形式で出力します。

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use kotoba_dict::dictionary::suggestion_filter::SuggestionFilter;
use kotoba_dict::dictionary::value::TrieIndex;
use kotoba_dict::dictionary::{
    LexiconDictionary, MemoryUserDictionary, SuppressionDictionary, TokenCollector, UserEntry,
    ValueDictionary,
};
use kotoba_dict::errors::KotobaError;
use kotoba_dict::{CompositeDictionary, Config, Dictionary, PosMatcher};

use clap::Parser;
use memmap2::Mmap;

/// 検索の種類
#[derive(Clone, Copy, Debug)]
enum Mode {
    Predictive,
    Prefix,
    Exact,
    Reverse,
}

impl FromStr for Mode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "predictive" => Ok(Self::Predictive),
            "prefix" => Ok(Self::Prefix),
            "exact" => Ok(Self::Exact),
            "reverse" => Ok(Self::Reverse),
            _ => Err("Could not parse a mode"),
        }
    }
}

/// 検索コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "query", about = "Looks up keys read from stdin")]
pub struct Args {
    /// Lexicon image built by the build command.
    #[clap(short = 'l', long)]
    lexicon: PathBuf,

    /// Value trie image built by the build command.
    #[clap(short = 't', long)]
    trie: Option<PathBuf>,

    /// User dictionary file (key,value,pos_id[,comment[,suppressed]]).
    #[clap(short = 'u', long)]
    user_in: Option<PathBuf>,

    /// Suggestion filter built by the build command.
    #[clap(short = 'f', long)]
    filter: Option<PathBuf>,

    /// Lookup mode. Choices are predictive, prefix, exact, and reverse.
    #[clap(short = 'm', long, default_value = "predictive")]
    mode: Mode,

    /// POS id of zip code entries.
    #[clap(long, default_value = "0")]
    zipcode_id: u16,

    /// POS id assigned to value dictionary tokens.
    #[clap(long, default_value = "0")]
    suggestion_only_id: u16,

    /// Drops spelling correction candidates.
    #[clap(long)]
    no_spelling_correction: bool,

    /// Drops zip code candidates.
    #[clap(long)]
    no_zip_code: bool,

    /// Drops English transliteration candidates.
    #[clap(long)]
    no_t13n: bool,
}

/// 検索処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 辞書の読み込みエラー
    #[error("Dictionary loading failed: {0}")]
    Kotoba(#[from] KotobaError),
}

/// 辞書を読み込み、標準入力の各行を検索します。
pub fn run(args: Args) -> Result<(), QueryError> {
    let config = Config {
        use_spelling_correction: !args.no_spelling_correction,
        use_zip_code_conversion: !args.no_zip_code,
        use_t13n_conversion: !args.no_t13n,
    };
    let pos_matcher = PosMatcher::new(args.zipcode_id, args.suggestion_only_id);

    eprintln!("Loading the lexicon...");
    let system = LexiconDictionary::read(BufReader::new(File::open(&args.lexicon)?))?;

    // Page-aligned, so the archive can be accessed in place.
    let trie_mmap = match &args.trie {
        Some(path) => Some(unsafe { Mmap::map(&File::open(path)?)? }),
        None => None,
    };
    let empty_trie = TrieIndex::from_keys(Vec::<&str>::new())?;
    let value: Box<dyn Dictionary + '_> = match &trie_mmap {
        Some(mmap) => Box::new(ValueDictionary::new(TrieIndex::access(mmap)?, &pos_matcher)),
        None => Box::new(ValueDictionary::new(&empty_trie, &pos_matcher)),
    };

    let user = MemoryUserDictionary::new(Arc::new(SuppressionDictionary::new()));
    if let Some(path) = &args.user_in {
        user.load(UserEntry::parse_csv(File::open(path)?)?);
    }

    let filter_bytes = args.filter.as_ref().map(std::fs::read).transpose()?;
    let filter = filter_bytes
        .as_deref()
        .map(SuggestionFilter::new)
        .transpose()?;

    let dict = CompositeDictionary::new(Box::new(system), value, &user, pos_matcher);

    eprintln!("Ready to look up");

    let is_tty = io::stdout().is_terminal();
    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in io::stdin().lock().lines() {
        let line = line?;
        let mut collector = TokenCollector::new();
        match args.mode {
            Mode::Predictive => dict.lookup_predictive(&line, &config, &mut collector),
            Mode::Prefix => dict.lookup_prefix(&line, &config, &mut collector),
            Mode::Exact => dict.lookup_exact(&line, &config, &mut collector),
            Mode::Reverse => dict.lookup_reverse(&line, &config, &mut collector),
        }
        for t in collector.tokens() {
            if filter.as_ref().is_some_and(|f| f.is_bad_suggestion(&t.value)) {
                continue;
            }
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{:?}",
                t.key, t.value, t.lid, t.rid, t.cost, t.attributes
            )?;
        }
        out.write_all(b"EOS\n")?;
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
