//! 文字列ストレージ上の位置と長さを1語に詰めたポインタ

use crate::errors::{KabosuError, Result};
use crate::utils::FromU32;

/// 文字列ストレージ内の文字列を指すポインタ
///
/// オフセットと長さ(UTF-16単位)を32ビットに圧縮します。上位5ビットが
/// 長さの基本部で、長さが[`Self::MAX_SIMPLE_LENGTH`]を超えるときは
/// 追加の長さビットをオフセット側から借ります。借りたビット数だけ
/// オフセットの下位ビットはゼロ、つまり整列済みでなければなりません。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringPtr {
    length: u32,
    offset: u32,
}

impl StringPtr {
    /// 追加の長さビット数の上限
    pub const MAX_LENGTH_BITS: u32 = 12;
    /// 長さの基本部のシフト量
    pub const BASE_OFFSET: u32 = 32 - 5;
    /// 追加ビットなしで表せる長さの上限
    pub const MAX_SIMPLE_LENGTH: u32 = 31 - Self::MAX_LENGTH_BITS;
    /// 表せる長さの上限
    pub const MAX_LENGTH: u32 = 4095 + Self::MAX_SIMPLE_LENGTH;

    /// 検査なしでポインタを作ります。
    ///
    /// 妥当性は[`Self::is_valid`]か[`Self::encode`]で確かめられます。
    #[inline(always)]
    pub const fn new(length: u32, offset: u32) -> Self {
        Self { length, offset }
    }

    /// 32ビット表現を復号します。
    pub const fn decode(pointer: u32) -> Self {
        let base = pointer >> Self::BASE_OFFSET;
        let add_bits = base.saturating_sub(Self::MAX_SIMPLE_LENGTH);
        // 下位16ビットを飛ばした先にある最大11ビットの追加長
        let non_fixed_length = (pointer & 0x07ff_0000) >> (16 + Self::MAX_LENGTH_BITS - add_bits);
        // 追加長の最上位ビットは格納されず、常に1として扱う
        let implicit_bit = (1 << Self::MAX_LENGTH_BITS) >> (13 - add_bits);
        let length = (base - add_bits) + (non_fixed_length | implicit_bit);
        let fixed_shift = add_bits.saturating_sub(1);
        let offset = (pointer & (0x07ff_ffff >> fixed_shift)) << fixed_shift;
        Self { length, offset }
    }

    /// 32ビット表現に符号化します。
    ///
    /// # エラー
    ///
    /// 長さが[`Self::MAX_LENGTH`]を超えるか、オフセットが表現範囲外または
    /// 必要な整列を満たさない場合に[`KabosuError`]を返します。
    pub fn encode(&self) -> Result<u32> {
        if self.length > Self::MAX_LENGTH {
            return Err(KabosuError::invalid_argument(
                "length",
                format!(
                    "maximum possible length is {}, was requested {}",
                    Self::MAX_LENGTH,
                    self.length
                ),
            ));
        }
        if !Self::is_valid(self.offset, self.length) {
            return Err(KabosuError::invalid_argument(
                "offset",
                format!(
                    "string pointer is invalid: offset={:08x} length={} alignment={}",
                    self.offset,
                    self.length,
                    Self::required_alignment(self.length)
                ),
            ));
        }
        let add_bits = self.additional_bits();
        let base_length = self.length.min(Self::MAX_SIMPLE_LENGTH);
        let base_part = (add_bits + base_length) << Self::BASE_OFFSET;
        let implicit_bit = (1 << Self::MAX_LENGTH_BITS) >> (13 - add_bits);
        let non_fixed_length = (self.length - base_length) ^ implicit_bit;
        let length_part = non_fixed_length << (16 + Self::MAX_LENGTH_BITS - add_bits);
        let offset_part = self.offset >> add_bits.saturating_sub(1);
        debug_assert_eq!(base_part & length_part, 0);
        debug_assert_eq!(base_part & offset_part, 0);
        debug_assert_eq!(length_part & offset_part, 0);
        Ok(base_part | length_part | offset_part)
    }

    /// 長さに応じて必要なオフセットの整列を返します。
    pub const fn required_alignment(length: u32) -> u32 {
        if length <= Self::MAX_SIMPLE_LENGTH {
            return 0;
        }
        let remaining = length - Self::MAX_SIMPLE_LENGTH;
        32 - remaining.leading_zeros()
    }

    /// オフセットと長さの組が符号化できるかを返します。
    pub const fn is_valid(offset: u32, length: u32) -> bool {
        if offset >= 1 << Self::BASE_OFFSET {
            return false;
        }
        let alignment = Self::required_alignment(length);
        if alignment == 0 {
            return true;
        }
        let alignment_mask = (1 << (alignment - 1)) - 1;
        offset & alignment_mask == 0
    }

    /// 文字列の長さをUTF-16単位で返します。
    #[inline(always)]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// 文字列ストレージ上のオフセットをUTF-16単位で返します。
    #[inline(always)]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// このポインタが使う追加の長さビット数を返します。
    #[inline(always)]
    pub const fn additional_bits(&self) -> u32 {
        Self::required_alignment(self.length)
    }
}

/// UTF-16LEで連結された文字列ストレージ
pub struct CompactedStrings<'a> {
    bytes: &'a [u8],
}

impl<'a> CompactedStrings<'a> {
    /// 文字列ストレージのバイト列を包みます。
    #[inline(always)]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// ポインタの指す文字列を取り出します。
    ///
    /// # エラー
    ///
    /// 指す範囲がストレージの外に出るか、UTF-16として不正な場合に
    /// [`KabosuError`]を返します。
    pub fn get(&self, pointer: u32) -> Result<String> {
        let ptr = StringPtr::decode(pointer);
        let start = usize::from_u32(ptr.offset()) * 2;
        let end = start + usize::from_u32(ptr.length()) * 2;
        if end > self.bytes.len() {
            return Err(KabosuError::invalid_format(
                "strings",
                format!(
                    "string pointer is out of bounds: offset={} length={}",
                    ptr.offset(),
                    ptr.length()
                ),
            ));
        }
        let units: Vec<u16> = self.bytes[start..end]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(String::from_utf16(&units)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additional_bits() {
        assert_eq!(StringPtr::new(0, 0).additional_bits(), 0);
        assert_eq!(StringPtr::new(22, 0).additional_bits(), 2);
    }

    #[test]
    fn encode_simple_lengths() {
        assert_eq!(StringPtr::new(0, 0).encode().unwrap(), 0);
        assert_eq!(StringPtr::new(1, 0).encode().unwrap(), 1 << 27);
    }

    #[test]
    fn max_length_roundtrip() {
        let encoded = 0xffff_0000;
        assert_eq!(StringPtr::decode(encoded).length(), StringPtr::MAX_LENGTH);
        assert_eq!(
            StringPtr::new(StringPtr::MAX_LENGTH, 0).encode().unwrap(),
            encoded
        );
    }

    #[test]
    fn roundtrip_simple() {
        for &(length, offset) in &[(5, 10), (1, 10), (19, 10), (19, 0x07ff_ffff)] {
            let original = StringPtr::new(length, offset);
            let decoded = StringPtr::decode(original.encode().unwrap());
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn roundtrip_aligned_offsets() {
        for add_bits in 1..=12 {
            let length = StringPtr::MAX_SIMPLE_LENGTH + (1 << add_bits) - 1;
            let offset = 0x07ff_ffff ^ ((1 << (add_bits - 1)) - 1);
            let original = StringPtr::new(length, offset);
            let decoded = StringPtr::decode(original.encode().unwrap());
            assert_eq!(decoded, original, "add_bits={add_bits}");
        }
    }

    #[test]
    fn roundtrip_all_lengths() {
        for length in 0..=StringPtr::MAX_LENGTH {
            let shift = StringPtr::required_alignment(length).saturating_sub(1);
            let offset = (0x07ff_ffff >> shift) << shift;
            let original = StringPtr::new(length, offset);
            let decoded = StringPtr::decode(original.encode().unwrap());
            assert_eq!(decoded, original, "length={length}");
        }
    }

    #[test]
    fn validity() {
        assert!(StringPtr::is_valid(0, 0));
        assert!(StringPtr::is_valid(1, 0));
        assert!(StringPtr::is_valid(0, 1));
        assert!(StringPtr::is_valid(1, 1));
        assert!(StringPtr::is_valid(0, 19));
        assert!(StringPtr::is_valid(1, 19));
        assert!(StringPtr::is_valid(0, 20));
        assert!(StringPtr::is_valid(1, 20));
        assert!(StringPtr::is_valid(0, 21));
        assert!(!StringPtr::is_valid(1, 21));
        assert!(StringPtr::is_valid(2, 21));
        assert!(StringPtr::is_valid(0, 23));
        assert!(!StringPtr::is_valid(1, 23));
        assert!(!StringPtr::is_valid(2, 23));
        assert!(StringPtr::is_valid(4, 23));
        assert!(!StringPtr::is_valid(1 << 27, 1));
    }

    #[test]
    fn encode_failures() {
        assert!(StringPtr::new(StringPtr::MAX_LENGTH + 1, 0).encode().is_err());
        assert!(StringPtr::new(21, 1).encode().is_err());
        assert!(StringPtr::new(1, 1 << 27).encode().is_err());
    }

    #[test]
    fn compacted_strings() {
        let text: Vec<u16> = "東京都すだち".encode_utf16().collect();
        let mut bytes = vec![];
        for unit in &text {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let strings = CompactedStrings::new(&bytes);
        let tokyo = StringPtr::new(3, 0).encode().unwrap();
        let sudachi = StringPtr::new(3, 3).encode().unwrap();
        assert_eq!(strings.get(tokyo).unwrap(), "東京都");
        assert_eq!(strings.get(sudachi).unwrap(), "すだち");
        let out_of_bounds = StringPtr::new(4, 3).encode().unwrap();
        assert!(strings.get(out_of_bounds).is_err());
    }
}
