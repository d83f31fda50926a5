//! トライの値から語ID列への表
//!
//! トライの値は表内のバイト位置で、そこに1バイトの語数と語IDの列が
//! 並んでいます。同表記の語が複数あるときに1つのキーから全語へ
//! たどるための間接層です。

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::BufReader;
use crate::errors::Result;
use crate::utils::FromU32;

pub struct WordIdTable<'a> {
    bytes: &'a [u8],
}

impl<'a> WordIdTable<'a> {
    /// バイト列の`offset`から語ID表を読み取ります。
    pub fn parse(bytes: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = BufReader::at(bytes, offset);
        let size = reader.read_u32()?;
        let table = reader.take(usize::from_u32(size))?;
        Ok(Self { bytes: table })
    }

    /// 直列化サイズ（バイト）を返します。
    pub fn storage_size(&self) -> usize {
        4 + self.bytes.len()
    }

    /// 表内の位置`index`にある語ID列を返します。
    pub fn get(&self, index: u32) -> Vec<u32> {
        let mut word_ids = vec![];
        self.fill(index, &mut word_ids);
        word_ids
    }

    /// [`Self::get`]の割り当てなし版。`word_ids`を上書きします。
    pub fn fill(&self, index: u32, word_ids: &mut Vec<u32>) {
        let index = usize::from_u32(index);
        let num = usize::from(self.bytes[index]);
        word_ids.clear();
        word_ids.reserve(num);
        let mut pos = index + 1;
        for _ in 0..num {
            word_ids.push(LittleEndian::read_u32(&self.bytes[pos..]));
            pos += 4;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::buffer::BufWriter;

    #[test]
    fn test_get() {
        let mut writer = BufWriter::new();
        let mut body = BufWriter::new();
        body.put_u32_array(&[10, 20]).unwrap();
        let second = body.position() as u32;
        body.put_u32_array(&[30]).unwrap();
        let body = body.into_vec();
        writer.put_u32(body.len() as u32);
        writer.put_slice(&body);
        let bytes = writer.into_vec();

        let table = WordIdTable::parse(&bytes, 0).unwrap();
        assert_eq!(table.storage_size(), bytes.len());
        assert_eq!(table.get(0), vec![10, 20]);
        assert_eq!(table.get(second), vec![30]);

        let mut word_ids = vec![99];
        table.fill(second, &mut word_ids);
        assert_eq!(word_ids, vec![30]);
    }

    #[test]
    fn test_truncated() {
        let mut writer = BufWriter::new();
        writer.put_u32(10);
        writer.put_u8(0);
        let bytes = writer.into_vec();
        assert!(WordIdTable::parse(&bytes, 0).is_err());
    }
}
