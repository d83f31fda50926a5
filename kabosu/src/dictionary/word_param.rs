//! 語の接続パラメータ列

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::BufReader;
use crate::errors::Result;
use crate::utils::FromU32;

/// 語ごとの`(左文脈ID, 右文脈ID, コスト)`の列
///
/// 辞書バイト列を参照したまま保持し、[`Self::set_cost`]を呼んだときだけ
/// パラメータ領域を私有バッファへ複製します（書き込み時コピー）。
pub struct WordParameterList<'a> {
    bytes: Cow<'a, [u8]>,
    size: u32,
}

impl<'a> WordParameterList<'a> {
    const ELEMENT_SIZE: usize = 2 * 3;

    /// バイト列の`offset`からパラメータ列を読み取ります。
    pub fn parse(bytes: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = BufReader::at(bytes, offset);
        let size = reader.read_u32()?;
        let params = reader.take(Self::ELEMENT_SIZE * usize::from_u32(size))?;
        Ok(Self {
            bytes: Cow::Borrowed(params),
            size,
        })
    }

    /// 語数を返します。
    #[inline(always)]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// 直列化サイズ（バイト）を返します。
    pub fn storage_size(&self) -> usize {
        4 + Self::ELEMENT_SIZE * usize::from_u32(self.size)
    }

    /// 語の左文脈IDを返します。
    #[inline(always)]
    pub fn left_id(&self, word_id: u32) -> i16 {
        LittleEndian::read_i16(&self.bytes[Self::ELEMENT_SIZE * usize::from_u32(word_id)..])
    }

    /// 語の右文脈IDを返します。
    #[inline(always)]
    pub fn right_id(&self, word_id: u32) -> i16 {
        LittleEndian::read_i16(&self.bytes[Self::ELEMENT_SIZE * usize::from_u32(word_id) + 2..])
    }

    /// 語の生起コストを返します。
    #[inline(always)]
    pub fn cost(&self, word_id: u32) -> i16 {
        LittleEndian::read_i16(&self.bytes[Self::ELEMENT_SIZE * usize::from_u32(word_id) + 4..])
    }

    /// 語の生起コストを書き換えます。
    ///
    /// 初回の呼び出しでパラメータ領域全体が私有バッファへ複製されるため、
    /// 元のバイト列を参照する他のインスタンスには影響しません。
    pub fn set_cost(&mut self, word_id: u32, cost: i16) {
        let index = Self::ELEMENT_SIZE * usize::from_u32(word_id) + 4;
        LittleEndian::write_i16(&mut self.bytes.to_mut()[index..], cost);
    }
}
