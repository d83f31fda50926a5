//! 辞書バイト列の読み書き
//!
//! 数値はすべてリトルエンディアン、可変長整数はLEB128です。文字列は
//! UTF-16LEのコード単位列で、長さは127単位までは1バイト、それ以上は
//! 最上位ビットを立てた2バイトで持ちます。

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{KabosuError, Result};
use crate::utils::FromU32;

/// 辞書バイト列の読み取りカーソル
pub(crate) struct BufReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    pub(crate) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// `pos`から読み始めるカーソルを作ります。
    pub(crate) const fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    #[inline(always)]
    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// `n`バイトを切り出してカーソルを進めます。
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "content underflow",
            ));
        }
        let taken = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(taken)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// LEB128の可変長整数を読みます。10バイト目以降まで続く場合はエラーです。
    pub(crate) fn read_varint64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..=63).step_by(7) {
            let b = self.read_u8()?;
            if shift == 63 && b > 1 {
                break;
            }
            value |= u64::from(b & 0x7F) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(KabosuError::invalid_format(
            "dictionary",
            "invalid long varint encoding",
        ))
    }

    pub(crate) fn read_varint32(&mut self) -> Result<u32> {
        let value = self.read_varint64()?;
        u32::try_from(value).map_err(|_| {
            KabosuError::invalid_format("dictionary", "invalid int varint encoding")
        })
    }

    /// 可変長整数の長さ付きUTF-8文字列を読みます。
    pub(crate) fn read_utf8_string(&mut self) -> Result<String> {
        let len = self.read_varint32()?;
        let bytes = self.take(usize::from_u32(len))?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    /// UTF-16コード単位数を読みます。
    pub(crate) fn read_string_length(&mut self) -> Result<u16> {
        let b = self.read_u8()?;
        if b & 0x80 == 0 {
            return Ok(u16::from(b));
        }
        let low = self.read_u8()?;
        Ok((u16::from(b & 0x7F) << 8) | u16::from(low))
    }

    /// 長さ付きのUTF-16LE文字列を読みます。
    pub(crate) fn read_utf16_string(&mut self) -> Result<String> {
        let len = usize::from(self.read_string_length()?);
        let bytes = self.take(len * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        Ok(String::from_utf16(&units)?)
    }

    /// 1バイトの要素数付きのu32配列を読みます。
    pub(crate) fn read_u32_array(&mut self) -> Result<Vec<u32>> {
        let len = usize::from(self.read_u8()?);
        let bytes = self.take(len * 4)?;
        Ok(bytes.chunks_exact(4).map(LittleEndian::read_u32).collect())
    }
}

/// 辞書バイト列の書き込みバッファ
///
/// [`BufReader`]と対になる形式で書き込みます。
pub(crate) struct BufWriter {
    bytes: Vec<u8>,
}

impl BufWriter {
    pub(crate) const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    #[inline(always)]
    pub(crate) fn position(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub(crate) fn put_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub(crate) fn put_varint64(&mut self, mut value: u64) {
        loop {
            let b = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.put_u8(b);
                return;
            }
            self.put_u8(b | 0x80);
        }
    }

    pub(crate) fn put_varint32(&mut self, value: u32) {
        self.put_varint64(u64::from(value));
    }

    pub(crate) fn put_utf8_string(&mut self, s: &str) {
        self.put_varint32(s.len() as u32);
        self.put_slice(s.as_bytes());
    }

    pub(crate) fn put_string_length(&mut self, len: u16) -> Result<()> {
        if len > 0x7FFF {
            return Err(KabosuError::invalid_argument(
                "len",
                format!("string length must not exceed 32767: {len}"),
            ));
        }
        if len < 0x80 {
            self.put_u8(len as u8);
        } else {
            self.put_u8((len >> 8) as u8 | 0x80);
            self.put_u8((len & 0xFF) as u8);
        }
        Ok(())
    }

    pub(crate) fn put_utf16_string(&mut self, s: &str) -> Result<()> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.put_string_length(u16::try_from(units.len())?)?;
        for unit in units {
            self.put_u16(unit);
        }
        Ok(())
    }

    pub(crate) fn put_u32_array(&mut self, values: &[u32]) -> Result<()> {
        let len = u8::try_from(values.len()).map_err(|_| {
            KabosuError::invalid_argument(
                "values",
                format!("array length must not exceed 255: {}", values.len()),
            )
        })?;
        self.put_u8(len);
        for &value in values {
            self.put_u32(value);
        }
        Ok(())
    }

    /// 書き込み済みの位置にu32を上書きします。位置の予約と後埋めに使います。
    pub(crate) fn put_at_u32(&mut self, pos: usize, value: u32) {
        self.bytes[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width() {
        let mut writer = BufWriter::new();
        writer.put_u8(0xAB);
        writer.put_u16(0x1234);
        writer.put_i16(-2);
        writer.put_u32(0xDEAD_BEEF);
        writer.put_i32(-3);
        writer.put_u64(0x0123_4567_89AB_CDEF);
        let bytes = writer.into_vec();

        let mut reader = BufReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i32().unwrap(), -3);
        assert_eq!(reader.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn test_varint() {
        let mut writer = BufWriter::new();
        for value in [0u64, 1, 127, 128, 300, u64::from(u32::MAX), u64::MAX] {
            writer.put_varint64(value);
        }
        let bytes = writer.into_vec();

        let mut reader = BufReader::new(&bytes);
        for value in [0u64, 1, 127, 128, 300, u64::from(u32::MAX), u64::MAX] {
            assert_eq!(reader.read_varint64().unwrap(), value);
        }
    }

    #[test]
    fn test_varint_encoding() {
        let mut writer = BufWriter::new();
        writer.put_varint32(300);
        assert_eq!(writer.into_vec(), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_varint_overflow() {
        let bytes = [0xFFu8; 11];
        let mut reader = BufReader::new(&bytes);
        assert!(reader.read_varint64().is_err());

        let mut writer = BufWriter::new();
        writer.put_varint64(u64::from(u32::MAX) + 1);
        let bytes = writer.into_vec();
        assert!(BufReader::new(&bytes).read_varint32().is_err());
    }

    #[test]
    fn test_string_length() {
        for len in [0u16, 1, 127, 128, 0x7FFF] {
            let mut writer = BufWriter::new();
            writer.put_string_length(len).unwrap();
            let bytes = writer.into_vec();
            assert_eq!(bytes.len(), if len < 0x80 { 1 } else { 2 });
            assert_eq!(BufReader::new(&bytes).read_string_length().unwrap(), len);
        }
        let mut writer = BufWriter::new();
        assert!(writer.put_string_length(0x8000).is_err());
    }

    #[test]
    fn test_utf16_string() {
        let mut writer = BufWriter::new();
        writer.put_utf16_string("東京都").unwrap();
        writer.put_utf16_string("").unwrap();
        writer.put_utf16_string("𠮟る").unwrap();
        let bytes = writer.into_vec();

        let mut reader = BufReader::new(&bytes);
        assert_eq!(reader.read_utf16_string().unwrap(), "東京都");
        assert_eq!(reader.read_utf16_string().unwrap(), "");
        assert_eq!(reader.read_utf16_string().unwrap(), "𠮟る");
    }

    #[test]
    fn test_utf8_string() {
        let mut writer = BufWriter::new();
        writer.put_utf8_string("compiled by kabosu");
        let bytes = writer.into_vec();
        let mut reader = BufReader::new(&bytes);
        assert_eq!(reader.read_utf8_string().unwrap(), "compiled by kabosu");
    }

    #[test]
    fn test_u32_array() {
        let mut writer = BufWriter::new();
        writer.put_u32_array(&[3, 1, 4, 1, 5]).unwrap();
        writer.put_u32_array(&[]).unwrap();
        let bytes = writer.into_vec();

        let mut reader = BufReader::new(&bytes);
        assert_eq!(reader.read_u32_array().unwrap(), vec![3, 1, 4, 1, 5]);
        assert_eq!(reader.read_u32_array().unwrap(), vec![]);

        let mut writer = BufWriter::new();
        assert!(writer.put_u32_array(&vec![0u32; 256]).is_err());
    }

    #[test]
    fn test_backpatch() {
        let mut writer = BufWriter::new();
        let pos = writer.position();
        writer.put_u32(0);
        writer.put_u8(9);
        writer.put_at_u32(pos, 0xCAFE);
        let bytes = writer.into_vec();
        let mut reader = BufReader::new(&bytes);
        assert_eq!(reader.read_u32().unwrap(), 0xCAFE);
        assert_eq!(reader.read_u8().unwrap(), 9);
    }
}
