//! ダブル配列トライ
//!
//! 遷移先を`現在位置 XOR オフセット XOR ラベル`で求める静的トライです。
//! 構築時に値付きのキー集合をDAWGへ最小化してから配置するため、
//! 共通接尾辞の多いキー集合ではユニット数を大きく節約できます。

mod bit_vector;
mod builder;
mod dawg;
mod keyset;
pub mod lookup;

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{KabosuError, Result};
use crate::trie::builder::DoubleArrayBuilder;
use crate::trie::keyset::Keyset;
use crate::utils::FromU32;

/// 検索時のユニット表現
///
/// 32ビットに、値ユニットの印（最上位ビット）、終端キーの有無（ビット8）、
/// ラベル（下位8ビット）、子へのオフセットを詰めています。
#[derive(Clone, Copy)]
pub(crate) struct Unit(u32);

impl Unit {
    #[inline(always)]
    pub(crate) const fn has_leaf(self) -> bool {
        (self.0 >> 8) & 1 == 1
    }

    #[inline(always)]
    pub(crate) const fn value(self) -> u32 {
        self.0 & 0x7fff_ffff
    }

    /// ラベルの照合用の値を返します。最上位ビットを含めるため、
    /// 値ユニットがバイトラベルと一致することはありません。
    #[inline(always)]
    pub(crate) const fn label(self) -> u32 {
        self.0 & ((1 << 31) | 0xFF)
    }

    #[inline(always)]
    pub(crate) const fn offset(self) -> u32 {
        (self.0 >> 10) << ((self.0 & (1 << 9)) >> 6)
    }
}

enum Units<'a> {
    Owned(Vec<u32>),
    Bytes(&'a [u8]),
}

impl Units<'_> {
    #[inline(always)]
    fn get(&self, id: u32) -> u32 {
        match self {
            Self::Owned(units) => units[usize::from_u32(id)],
            Self::Bytes(bytes) => LittleEndian::read_u32(&bytes[usize::from_u32(id) * 4..]),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Owned(units) => units.len(),
            Self::Bytes(bytes) => bytes.len() / 4,
        }
    }
}

/// ダブル配列トライ
///
/// 構築済みのユニット列を所有する形と、辞書バイト列をそのまま参照する形の
/// どちらでも使えます。参照する形ではコピーもデシリアライズも行いません。
///
/// # 使用例
///
/// ```
/// use kabosu::trie::DoubleArray;
///
/// let keys: &[&[u8]] = &[b"e", b"ex", b"extra"];
/// let values = &[10, 20, 30];
/// let trie = DoubleArray::build(keys, Some(values)).unwrap();
///
/// assert_eq!(trie.exact_match_search(b"ex"), Some((20, 2)));
/// assert_eq!(trie.exact_match_search(b"ext"), None);
///
/// let results = trie.common_prefix_search(b"extra", 0, 16);
/// assert_eq!(results, vec![(10, 1), (20, 2), (30, 5)]);
/// ```
pub struct DoubleArray<'a> {
    units: Units<'a>,
}

impl<'a> DoubleArray<'a> {
    /// ソート済みのキー集合からトライを構築します。
    ///
    /// # 引数
    ///
    ///  - `keys`: 符号なしバイト列の辞書式順序で昇順のキー集合
    ///  - `values`: キーに対応する値。`None`のときはキーの添字が値になります。
    ///
    /// # エラー
    ///
    /// 以下の場合に[`KabosuError`]を返します。
    ///
    ///  - キーの順序が昇順でない、または重複している場合
    ///  - キーが空、またはヌルバイトを含む場合
    ///  - 値が`0x7fff_ffff`を越える場合
    ///  - `values`の長さが`keys`と一致しない場合
    pub fn build<K>(keys: &[K], values: Option<&[u32]>) -> Result<Self>
    where
        K: AsRef<[u8]>,
    {
        if let Some(values) = values {
            if keys.len() != values.len() {
                return Err(KabosuError::invalid_argument(
                    "values",
                    format!("must have {} elements: {}", keys.len(), values.len()),
                ));
            }
        }
        let units = DoubleArrayBuilder::build(&Keyset::new(keys, values))?;
        Ok(Self {
            units: Units::Owned(units),
        })
    }

    /// 構築済みのユニット列からトライを復元します。
    pub fn from_units(units: Vec<u32>) -> Self {
        Self {
            units: Units::Owned(units),
        }
    }

    /// リトルエンディアンで直列化されたユニット列をそのまま参照する
    /// トライを作ります。
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(KabosuError::invalid_argument(
                "bytes",
                format!("must be a multiple of 4 bytes: {}", bytes.len()),
            ));
        }
        Ok(Self {
            units: Units::Bytes(bytes),
        })
    }

    /// ユニット列を取り出します。
    pub fn into_units(self) -> Vec<u32> {
        match self.units {
            Units::Owned(units) => units,
            Units::Bytes(bytes) => bytes.chunks_exact(4).map(LittleEndian::read_u32).collect(),
        }
    }

    /// ユニット数を返します。
    pub fn size(&self) -> usize {
        self.units.len()
    }

    #[inline(always)]
    pub(crate) fn unit(&self, id: u32) -> Unit {
        Unit(self.units.get(id))
    }

    /// キーに完全一致するエントリを検索します。
    ///
    /// # 戻り値
    ///
    /// 一致するエントリの`(値, キーのバイト長)`。見つからなければ`None`。
    pub fn exact_match_search(&self, key: &[u8]) -> Option<(u32, usize)> {
        let mut node_pos = 0;
        let mut unit = self.unit(node_pos);
        for &k in key {
            node_pos ^= unit.offset() ^ u32::from(k);
            unit = self.unit(node_pos);
            if unit.label() != u32::from(k) {
                return None;
            }
        }
        if !unit.has_leaf() {
            return None;
        }
        let unit = self.unit(node_pos ^ unit.offset());
        Some((unit.value(), key.len()))
    }

    /// `key[offset..]`の接頭辞に一致するエントリを検索します。
    ///
    /// # 戻り値
    ///
    /// 一致した各エントリの`(値, キー内の終端位置)`。短い接頭辞から順に
    /// 並び、`max_num_results`件を越える分は捨てられます。
    pub fn common_prefix_search(
        &self,
        key: &[u8],
        offset: usize,
        max_num_results: usize,
    ) -> Vec<(u32, usize)> {
        let mut results = vec![];
        let mut node_pos = 0;
        let mut unit = self.unit(node_pos);
        node_pos ^= unit.offset();
        for i in offset..key.len() {
            let k = u32::from(key[i]);
            node_pos ^= k;
            unit = self.unit(node_pos);
            if unit.label() != k {
                return results;
            }
            node_pos ^= unit.offset();
            if unit.has_leaf() && results.len() < max_num_results {
                results.push((self.unit(node_pos).value(), i + 1));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_search() {
        let keys: &[&[u8]] = &[b"\xE4\xBA\xAC", b"\xE4\xBA\xAC\xE9\x83\xBD", b"a", b"ab"];
        let mut keys = keys.to_vec();
        keys.sort();
        let trie = DoubleArray::build(&keys, None).unwrap();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(trie.exact_match_search(key), Some((i as u32, key.len())));
        }
        assert_eq!(trie.exact_match_search(b"b"), None);
        assert_eq!(trie.exact_match_search(b"abc"), None);
        assert_eq!(trie.exact_match_search(b""), None);
    }

    #[test]
    fn test_common_prefix_search() {
        let keys: &[&[u8]] = &[b"a", b"ab", b"abc", b"b"];
        let values = &[0, 1, 2, 3];
        let trie = DoubleArray::build(keys, Some(values)).unwrap();
        assert_eq!(
            trie.common_prefix_search(b"abcd", 0, 16),
            vec![(0, 1), (1, 2), (2, 3)]
        );
        assert_eq!(trie.common_prefix_search(b"abcd", 1, 16), vec![]);
        assert_eq!(trie.common_prefix_search(b"xabc", 1, 16), vec![(0, 2), (1, 3), (2, 4)]);
        assert_eq!(trie.common_prefix_search(b"abcd", 0, 2), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_values_length_mismatch() {
        let keys: &[&[u8]] = &[b"a", b"b"];
        assert!(DoubleArray::build(keys, Some(&[0])).is_err());
    }

    #[test]
    fn test_from_bytes() {
        let keys: &[&[u8]] = &[b"a", b"ab", b"b"];
        let values = &[4, 5, 6];
        let units = DoubleArray::build(keys, Some(values)).unwrap().into_units();

        let mut bytes = vec![];
        for unit in &units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let trie = DoubleArray::from_bytes(&bytes).unwrap();
        assert_eq!(trie.size(), units.len());
        assert_eq!(trie.exact_match_search(b"ab"), Some((5, 2)));
        assert_eq!(trie.into_units(), units);

        assert!(DoubleArray::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_index_values() {
        let keys: &[&[u8]] = &[b"aa", b"ac", b"b"];
        let trie = DoubleArray::build(keys, None).unwrap();
        assert_eq!(trie.exact_match_search(b"ac"), Some((1, 2)));
    }
}
