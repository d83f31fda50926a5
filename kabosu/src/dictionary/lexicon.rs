//! 単一辞書の語彙

use crate::dictionary::buffer::BufReader;
use crate::dictionary::word_id_table::WordIdTable;
use crate::dictionary::word_info::{WordInfo, WordInfoList};
use crate::dictionary::word_param::WordParameterList;
use crate::errors::Result;
use crate::trie::lookup::DoubleArrayLookup;
use crate::trie::DoubleArray;
use crate::utils::FromU32;

/// 検索で得られた1語
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexiconEntry {
    /// 語ID
    pub word_id: u32,
    /// テキスト内の語の終端位置
    pub end_offset: usize,
}

impl LexiconEntry {
    #[inline(always)]
    pub const fn new(word_id: u32, end_offset: usize) -> Self {
        Self {
            word_id,
            end_offset,
        }
    }
}

/// ダブル配列で索引された1つの辞書の語彙
///
/// トライ、語ID表、接続パラメータ、語情報の4ブロックからなります。
/// いずれも辞書バイト列を参照したまま保持します。
pub struct DoubleArrayLexicon<'a> {
    trie: DoubleArray<'a>,
    word_id_table: WordIdTable<'a>,
    word_params: WordParameterList<'a>,
    word_infos: WordInfoList<'a>,
}

impl<'a> DoubleArrayLexicon<'a> {
    /// 辞書バイト列の`offset`から語彙ブロックを読み取ります。
    ///
    /// `bytes`は辞書全体のバイト列である必要があります。語情報の格納位置が
    /// 辞書先頭からの絶対位置を持つためです。
    pub fn parse(bytes: &'a [u8], offset: usize, has_synonym_group_ids: bool) -> Result<Self> {
        let mut reader = BufReader::at(bytes, offset);
        let trie_size = reader.read_u32()?;
        let trie_bytes = reader.take(4 * usize::from_u32(trie_size))?;
        let trie = DoubleArray::from_bytes(trie_bytes)?;

        let mut offset = reader.position();
        let word_id_table = WordIdTable::parse(bytes, offset)?;
        offset += word_id_table.storage_size();

        let word_params = WordParameterList::parse(bytes, offset)?;
        offset += word_params.storage_size();

        let word_infos =
            WordInfoList::new(bytes, offset, word_params.size(), has_synonym_group_ids);

        Ok(Self {
            trie,
            word_id_table,
            word_params,
            word_infos,
        })
    }

    /// `text[offset..]`の接頭辞に一致する語を列挙します。
    ///
    /// 終端位置の短い語から順に返ります。同じ表記の語は語ID表の並びの
    /// まま続けて返ります。
    pub fn lookup<'s>(&'s self, text: &'s [u8], offset: usize) -> LexiconLookupIter<'s> {
        LexiconLookupIter {
            lookup: DoubleArrayLookup::new(&self.trie, text, offset, text.len()),
            word_id_table: &self.word_id_table,
            word_ids: vec![],
            end_offset: 0,
            index: 0,
        }
    }

    /// 語の左文脈IDを返します。
    #[inline(always)]
    pub fn left_id(&self, word_id: u32) -> i16 {
        self.word_params.left_id(word_id)
    }

    /// 語の右文脈IDを返します。
    #[inline(always)]
    pub fn right_id(&self, word_id: u32) -> i16 {
        self.word_params.right_id(word_id)
    }

    /// 語の生起コストを返します。
    #[inline(always)]
    pub fn cost(&self, word_id: u32) -> i16 {
        self.word_params.cost(word_id)
    }

    /// 語の生起コストを書き換えます。元のバイト列は書き換わりません。
    pub fn set_cost(&mut self, word_id: u32, cost: i16) {
        self.word_params.set_cost(word_id, cost);
    }

    /// 語の詳細情報を返します。
    pub fn word_info(&self, word_id: u32) -> Result<WordInfo> {
        self.word_infos.word_info(word_id)
    }

    /// 語数を返します。
    #[inline(always)]
    pub const fn size(&self) -> u32 {
        self.word_params.size()
    }

    #[inline(always)]
    pub(crate) fn trie(&self) -> &DoubleArray<'a> {
        &self.trie
    }

    #[inline(always)]
    pub(crate) fn word_id_table(&self) -> &WordIdTable<'a> {
        &self.word_id_table
    }

    pub(crate) fn word_info_region(&self) -> *const u8 {
        self.word_infos.region_ptr()
    }
}

/// [`DoubleArrayLexicon::lookup`]の結果を列挙するイテレータ
pub struct LexiconLookupIter<'a> {
    lookup: DoubleArrayLookup<'a>,
    word_id_table: &'a WordIdTable<'a>,
    word_ids: Vec<u32>,
    end_offset: usize,
    index: usize,
}

impl Iterator for LexiconLookupIter<'_> {
    type Item = LexiconEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.index < self.word_ids.len() {
                let entry = LexiconEntry::new(self.word_ids[self.index], self.end_offset);
                self.index += 1;
                return Some(entry);
            }
            if !self.lookup.next() {
                return None;
            }
            self.word_id_table
                .fill(self.lookup.value(), &mut self.word_ids);
            self.end_offset = self.lookup.end_offset();
            self.index = 0;
        }
    }
}
