//! 辞書イメージのファイル入出力に関するテスト
//!
//! 語彙辞書とトライのイメージをファイルに書き出し、読み戻した結果で検索できることを検証します。

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use rkyv::util::AlignedVec;
use tempfile::tempdir;

use kotoba_dict::dictionary::value::TrieIndex;
use kotoba_dict::dictionary::{
    LexiconDictionary, SerializedStringArray, TokenCollector, ValueDictionary,
};
use kotoba_dict::dictionary::lexicon::LEXICON_MAGIC;
use kotoba_dict::{Config, Dictionary, PosMatcher};

#[test]
fn test_lexicon_image_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("system.lex");

    let lexicon = LexiconDictionary::from_reader(
        "ほっかいどう,北海道,1,1,3000\nほっかいどう,北海道庁,1,1,5000\n".as_bytes(),
    )
    .unwrap();
    lexicon
        .write(BufWriter::new(File::create(&path).unwrap()))
        .unwrap();
    assert!(fs::read(&path).unwrap().starts_with(LEXICON_MAGIC));

    let restored = LexiconDictionary::read(BufReader::new(File::open(&path).unwrap())).unwrap();
    let mut collector = TokenCollector::new();
    restored.lookup_exact("ほっかいどう", &Config::default(), &mut collector);
    let values: Vec<_> = collector.tokens().iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, ["北海道", "北海道庁"]);
}

#[test]
fn test_trie_image_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("value.trie");

    let bytes = TrieIndex::from_keys(["kotoba", "kotlin", "kyoto"])
        .unwrap()
        .to_bytes()
        .unwrap();
    let mut file = File::create(&path).unwrap();
    file.write_all(&bytes).unwrap();
    drop(file);

    let data = fs::read(&path).unwrap();
    let mut aligned = AlignedVec::<16>::with_capacity(data.len());
    aligned.extend_from_slice(&data);
    let trie = TrieIndex::access(&aligned).unwrap();

    let dic = ValueDictionary::new(trie, &PosMatcher::new(0, 42));
    let mut collector = TokenCollector::new();
    dic.lookup_predictive("kot", &Config::default(), &mut collector);
    let values: Vec<_> = collector.tokens().iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, ["kotlin", "kotoba"]);
    assert!(collector.tokens().iter().all(|t| t.lid == 42 && t.rid == 42));
}

#[test]
fn test_string_array_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("strings.bin");

    let buf = SerializedStringArray::serialize_to_buffer(["あ", "い", "う"]).unwrap();
    fs::write(&path, &buf).unwrap();

    let data = fs::read(&path).unwrap();
    let array = SerializedStringArray::new(&data).unwrap();
    assert_eq!(array.iter().collect::<Vec<_>>(), ["あ", "い", "う"]);
    assert!(SerializedStringArray::new(&data[..data.len() / 2]).is_err());
}
