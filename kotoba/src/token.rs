//! 辞書トークンの定義
//!
//! このモジュールは、辞書検索の結果としてコールバックに渡される
//! [`Token`]と、その属性を表す[`Attributes`]を提供します。

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use rkyv::{Archive, Deserialize, Serialize};

/// トークンの属性を表すビット集合
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, Archive, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Attributes(u8);

impl Attributes {
    /// 属性なし
    pub const NONE: Self = Self(0);
    /// スペル補正による候補
    pub const SPELLING_CORRECTION: Self = Self(1);
    /// 接尾辞辞書由来の候補
    pub const SUFFIX_DICTIONARY: Self = Self(4);
    /// ユーザー辞書由来の候補
    pub const USER_DICTIONARY: Self = Self(8);

    /// ビット表現から属性を作成します。
    #[inline(always)]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// ビット表現を取得します。
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `other`のすべてのビットが立っているかどうかを返します。
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// 属性が一つも立っていないかどうかを返します。
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Attributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names = [
            (Self::SPELLING_CORRECTION, "SPELLING_CORRECTION"),
            (Self::SUFFIX_DICTIONARY, "SUFFIX_DICTIONARY"),
            (Self::USER_DICTIONARY, "USER_DICTIONARY"),
        ];
        let mut first = true;
        for (attr, name) in names {
            if self.contains(attr) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// 辞書の1エントリ
///
/// 検索のたびに一時的に生成され、[`Callback::on_token`]に参照で渡されます。
/// コールバックが複製しない限り、呼び出しの外には残りません。
///
/// [`Callback::on_token`]: crate::dictionary::Callback::on_token
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Token {
    /// 読み
    pub key: String,
    /// 表記
    pub value: String,
    /// 左文脈ID
    pub lid: u16,
    /// 右文脈ID
    pub rid: u16,
    /// 単語コスト
    pub cost: u16,
    /// 属性
    pub attributes: Attributes,
}

impl Token {
    /// 新しいトークンを作成します。
    pub fn new<K, V>(key: K, value: V, lid: u16, rid: u16, cost: u16) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
            lid,
            rid,
            cost,
            attributes: Attributes::NONE,
        }
    }

    /// 属性を設定したトークンを返します。
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}
