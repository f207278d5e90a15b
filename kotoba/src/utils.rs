//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! 主に以下の機能を提供します：
//!
//! - `FromU32`: u32からの型変換トレイト
//! - リトルエンディアン整数の読み出し
//! - CSV行の解析
//! - 文字種の判定と英字翻字の判定
//! - 64ビットフィンガープリント

use csv_core::ReadFieldResult;
use sha2::{Digest, Sha256};

/// u32から他の型への変換を提供するトレイト
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// バイト列の指定位置からリトルエンディアンのu32を読み出します。
///
/// 範囲外の場合は`None`を返します。
#[inline(always)]
pub(crate) fn read_u32_le(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// CSV形式の行を解析してフィールドのベクターに分割する
///
/// ダブルクォートで囲まれたフィールドや、フィールド内のカンマも正しく処理します。
/// UTF-8として不正なフィールドは空文字列になります。
///
/// ```
/// # use kotoba_dict::utils::parse_csv_row;
/// let fields = parse_csv_row("ほっかいどう,北海道,1,1,500");
/// assert_eq!(fields, vec!["ほっかいどう", "北海道", "1", "1", "500"]);
///
/// let fields_with_quote = parse_csv_row("あいう,\"a,b\"");
/// assert_eq!(fields_with_quote, vec!["あいう", "a,b"]);
/// ```
pub fn parse_csv_row(row: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::End => true,
            ReadFieldResult::OutputFull => true,
        };
        fields.push(
            std::str::from_utf8(&output[..nout])
                .unwrap_or_default()
                .to_string(),
        );
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    fields
}

/// 文字種
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScriptType {
    Hiragana,
    Katakana,
    Kanji,
    Number,
    Alphabet,
    Other,
}

/// 1文字の文字種を判定します。
///
/// 長音記号「ー」はカタカナ、「々」「〆」は漢字として扱います。
pub fn script_type(c: char) -> ScriptType {
    match u32::from(c) {
        0x3041..=0x309F => ScriptType::Hiragana,
        0x30A1..=0x30FF | 0x31F0..=0x31FF | 0xFF65..=0xFF9F => ScriptType::Katakana,
        0x3005 | 0x3006 | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF
        | 0x20000..=0x2FFFF => ScriptType::Kanji,
        0x30..=0x39 | 0xFF10..=0xFF19 => ScriptType::Number,
        0x41..=0x5A | 0x61..=0x7A | 0xFF21..=0xFF3A | 0xFF41..=0xFF5A => ScriptType::Alphabet,
        _ => ScriptType::Other,
    }
}

/// 文字列が英字の翻字（ASCII英字と空白・`!`・`'`・`-`のみ）かどうかを判定します。
///
/// 空文字列は`true`です。
pub fn is_english_transliteration(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, b' ' | b'!' | b'\'' | b'-' | b'A'..=b'Z' | b'a'..=b'z'))
}

/// 文字列の64ビットフィンガープリントを計算します。
///
/// SHA-256ダイジェストの先頭8バイトをリトルエンディアンで解釈した値です。
pub fn fingerprint(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut head = [0; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
/// HashMapリテラルを簡潔に記述するためのマクロ
///
/// ```ignore
/// let map = hashmap! {
///     "key1" => "value1",
///     "key2" => "value2",
/// };
/// ```
macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}
