//! 語彙ブロックの書き出し

use std::collections::BTreeMap;

use crate::dictionary::buffer::BufWriter;
use crate::dictionary::build::RawWordEntry;
use crate::errors::{KabosuError, Result};
use crate::trie::DoubleArray;

/// トライ、語ID表、語パラメータ、語情報を辞書の並び順で書き出す
pub(crate) struct LexiconWriter<'a> {
    entries: &'a [RawWordEntry],
    pos_ids: &'a [u16],
    has_synonym_group_ids: bool,
}

impl<'a> LexiconWriter<'a> {
    pub(crate) fn new(
        entries: &'a [RawWordEntry],
        pos_ids: &'a [u16],
        has_synonym_group_ids: bool,
    ) -> Self {
        debug_assert_eq!(entries.len(), pos_ids.len());
        Self {
            entries,
            pos_ids,
            has_synonym_group_ids,
        }
    }

    pub(crate) fn write_to(&self, writer: &mut BufWriter) -> Result<()> {
        let (keys, values, word_id_table) = self.build_index()?;

        log::info!("building the trie...");
        let trie = DoubleArray::build(&keys, Some(&values))?;
        log::info!("writing the trie...");
        let units = trie.into_units();
        writer.put_u32(u32::try_from(units.len())?);
        for &unit in &units {
            writer.put_u32(unit);
        }
        log::info!(" {} bytes", 4 * units.len() + 4);

        log::info!("writing the word-ID table...");
        writer.put_u32(u32::try_from(word_id_table.len())?);
        writer.put_slice(&word_id_table);
        log::info!(" {} bytes", word_id_table.len() + 4);

        log::info!("writing the word parameters...");
        writer.put_u32(u32::try_from(self.entries.len())?);
        for entry in self.entries {
            writer.put_i16(entry.left_id);
            writer.put_i16(entry.right_id);
            writer.put_i16(entry.cost);
        }
        log::info!(" {} bytes", 6 * self.entries.len() + 4);

        self.write_word_infos(writer)
    }

    /// 表層形で引く索引を作ります。
    ///
    /// トライの値は語ID表の中のバイト位置です。左文脈IDが負の語は
    /// 索引されません。
    fn build_index(&self) -> Result<(Vec<&'a [u8]>, Vec<u32>, Vec<u8>)> {
        let mut index: BTreeMap<&[u8], Vec<u32>> = BTreeMap::new();
        for (word_id, entry) in self.entries.iter().enumerate() {
            if entry.left_id < 0 {
                continue;
            }
            let word_ids = index.entry(entry.surface.as_bytes()).or_default();
            if word_ids.len() >= 255 {
                return Err(KabosuError::invalid_argument(
                    "entries",
                    format!("key {} has >= 255 entries in the dictionary", entry.surface),
                ));
            }
            word_ids.push(word_id as u32);
        }
        let mut keys = Vec::with_capacity(index.len());
        let mut values = Vec::with_capacity(index.len());
        let mut table = BufWriter::new();
        for (key, word_ids) in &index {
            keys.push(*key);
            values.push(u32::try_from(table.position())?);
            table.put_u8(word_ids.len() as u8);
            for &word_id in word_ids {
                table.put_u32(word_id);
            }
        }
        Ok((keys, values, table.into_vec()))
    }

    /// 語情報を書き出します。
    ///
    /// 先頭にオフセット表の場所を空けておき、各語を書いた位置を辞書
    /// 先頭からの絶対位置として埋め戻します。
    fn write_word_infos(&self, writer: &mut BufWriter) -> Result<()> {
        log::info!("writing the wordInfos...");
        let offsets_position = writer.position();
        for _ in 0..self.entries.len() {
            writer.put_u32(0);
        }
        let base = writer.position();
        for (word_id, entry) in self.entries.iter().enumerate() {
            let offset = u32::try_from(writer.position())?;
            writer.put_at_u32(offsets_position + 4 * word_id, offset);
            writer.put_utf16_string(&entry.surface)?;
            writer.put_string_length(u16::try_from(entry.surface.len())?)?;
            writer.put_u16(self.pos_ids[word_id]);
            Self::write_form(writer, &entry.normalized_form, &entry.surface)?;
            writer.put_i32(entry.dictionary_form_word_id);
            Self::write_form(writer, &entry.reading_form, &entry.surface)?;
            writer.put_u32_array(&entry.a_unit_split)?;
            writer.put_u32_array(&entry.b_unit_split)?;
            writer.put_u32_array(&entry.word_structure)?;
            if self.has_synonym_group_ids {
                writer.put_u32_array(&entry.synonym_group_ids)?;
            }
        }
        log::info!(" {} bytes", writer.position() - base);
        Ok(())
    }

    fn write_form(writer: &mut BufWriter, form: &str, surface: &str) -> Result<()> {
        if form == surface {
            writer.put_utf16_string("")
        } else {
            writer.put_utf16_string(form)
        }
    }
}
