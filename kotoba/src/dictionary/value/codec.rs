//! 値トライのキー符号化

/// 表記とトライのキーのバイト列を相互に変換します。
///
/// 符号化は前方一致を保存しなければなりません。
/// すなわち、`a`が`b`の接頭辞ならば`encode(a)`は`encode(b)`の接頭辞です。
pub trait ValueCodec {
    /// `value`を符号化して`out`の末尾に追加します。
    fn encode_value(&self, value: &str, out: &mut Vec<u8>);

    /// バイト列を表記に戻します。不正な入力には`None`を返します。
    fn decode_value(&self, encoded: &[u8]) -> Option<String>;
}

/// UTF-8のバイト列をそのままキーとする符号化
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8ValueCodec;

impl ValueCodec for Utf8ValueCodec {
    #[inline(always)]
    fn encode_value(&self, value: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(value.as_bytes());
    }

    #[inline(always)]
    fn decode_value(&self, encoded: &[u8]) -> Option<String> {
        std::str::from_utf8(encoded).ok().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_codec() {
        let codec = Utf8ValueCodec;
        let mut buf = vec![];
        codec.encode_value("東京", &mut buf);
        assert_eq!(codec.decode_value(&buf).as_deref(), Some("東京"));
        assert_eq!(codec.decode_value(&buf[..2]), None);
    }
}
