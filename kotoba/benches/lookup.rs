//! 辞書検索のベンチマーク
//!
//! 合成した語彙辞書、値辞書、ユーザー辞書を用いて、
//! 各バックエンド単体と合成辞書での検索速度を計測します。

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kotoba_dict::dictionary::value::TrieIndex;
use kotoba_dict::dictionary::{
    LexiconDictionary, LexiconEntry, MemoryUserDictionary, SuppressionDictionary, TokenCollector,
    UserEntry, ValueDictionary,
};
use kotoba_dict::{CompositeDictionary, Config, Dictionary, PosMatcher};

const KANA: [&str; 10] = ["か", "き", "く", "け", "こ", "さ", "し", "す", "せ", "そ"];
const ALPHA: [&str; 10] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];

/// `alphabet`から長さ`len`までのすべての語を生成します。
fn words(alphabet: &[&str], len: usize) -> Vec<String> {
    let mut all = vec![];
    let mut level = vec![String::new()];
    for _ in 0..len {
        let mut next = vec![];
        for w in &level {
            for c in alphabet {
                next.push(format!("{w}{c}"));
            }
        }
        all.extend(next.iter().cloned());
        level = next;
    }
    all
}

fn bench_lookup(c: &mut Criterion) {
    let keys = words(&KANA, 4);
    let lexicon = LexiconDictionary::from_entries(
        keys.iter()
            .enumerate()
            .map(|(i, k)| LexiconEntry::new(k, format!("語{i}"), 1, 1, (i % 8000) as u16)),
    )
    .unwrap();
    let trie = TrieIndex::from_keys(words(&ALPHA, 4)).unwrap();
    let pos_matcher = PosMatcher::new(100, 200);
    let user = MemoryUserDictionary::new(Arc::new(SuppressionDictionary::new()));
    user.load(
        keys.iter()
            .step_by(7)
            .map(|k| UserEntry::new(k, format!("{k}!"), 1)),
    );

    let queries: Vec<&str> = keys.iter().step_by(97).map(String::as_str).collect();
    let config = Config::default();

    let mut group = c.benchmark_group("Lookup");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function(BenchmarkId::new("Lexicon", "Prefix"), |b| {
        b.iter(|| {
            let mut collector = TokenCollector::new();
            for q in &queries {
                lexicon.lookup_prefix(q, &config, &mut collector);
            }
            collector
        });
    });

    group.bench_function(BenchmarkId::new("Lexicon", "Reverse"), |b| {
        b.iter(|| {
            let mut collector = TokenCollector::new();
            for i in (0..keys.len()).step_by(97) {
                lexicon.lookup_reverse(&format!("語{i}"), &config, &mut collector);
            }
            collector
        });
    });

    let value = ValueDictionary::new(&trie, &pos_matcher);
    group.bench_function(BenchmarkId::new("Value", "Predictive"), |b| {
        b.iter(|| {
            let mut collector = TokenCollector::new();
            for q in ALPHA.iter().flat_map(|x| ALPHA.iter().map(move |y| format!("{x}{y}"))) {
                value.lookup_predictive(&q, &config, &mut collector);
            }
            collector
        });
    });

    let composite = CompositeDictionary::new(
        Box::new(lexicon),
        Box::new(ValueDictionary::new(&trie, &pos_matcher)),
        &user,
        pos_matcher,
    );
    group.bench_function(BenchmarkId::new("Composite", "Exact"), |b| {
        b.iter(|| {
            let mut collector = TokenCollector::new();
            for q in &queries {
                composite.lookup_exact(q, &config, &mut collector);
            }
            collector
        });
    });
    group.bench_function(BenchmarkId::new("Composite", "Predictive"), |b| {
        b.iter(|| {
            let mut collector = TokenCollector::new();
            for q in KANA.iter().flat_map(|x| KANA.iter().map(move |y| format!("{x}{y}"))) {
                composite.lookup_predictive(&q, &config, &mut collector);
            }
            collector
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
