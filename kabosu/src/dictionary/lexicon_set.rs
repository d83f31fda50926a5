//! 複数辞書の重ね合わせ

use crate::dictionary::lexicon::{DoubleArrayLexicon, LexiconEntry, LexiconLookupIter};
use crate::dictionary::word_id;
use crate::dictionary::word_info::WordInfo;
use crate::dictionary::word_lookup::WordLookup;
use crate::errors::{KabosuError, Result};
use crate::utils::FromU32;

/// システム辞書と0個以上のユーザー辞書をまとめた語彙
///
/// 返す語IDは上位4ビットに辞書番号を持ちます。番号0が最初に渡した
/// システム辞書、1以降が登録順のユーザー辞書です。
pub struct LexiconSet<'a> {
    lexicons: Vec<DoubleArrayLexicon<'a>>,
}

impl<'a> LexiconSet<'a> {
    /// 重ねられる辞書数の上限
    pub const MAX_DICTIONARIES: usize = 16;

    /// システム辞書だけを持つ語彙を作ります。
    pub fn new(system: DoubleArrayLexicon<'a>) -> Result<Self> {
        Self::validate_size(&system)?;
        Ok(Self {
            lexicons: vec![system],
        })
    }

    /// ユーザー辞書を登録します。
    ///
    /// 同じ辞書バイト列を指す辞書の再登録は無視されます。
    ///
    /// # エラー
    ///
    /// 辞書数が[`Self::MAX_DICTIONARIES`]に達している場合、または辞書の
    /// 語数が語IDに収まらない場合に[`KabosuError`]を返します。
    pub fn add(&mut self, lexicon: DoubleArrayLexicon<'a>) -> Result<()> {
        if self
            .lexicons
            .iter()
            .any(|l| l.word_info_region() == lexicon.word_info_region())
        {
            return Ok(());
        }
        if self.is_full() {
            return Err(KabosuError::invalid_argument(
                "lexicon",
                format!(
                    "number of dictionaries must not exceed {}",
                    Self::MAX_DICTIONARIES
                ),
            ));
        }
        Self::validate_size(&lexicon)?;
        self.lexicons.push(lexicon);
        Ok(())
    }

    fn validate_size(lexicon: &DoubleArrayLexicon) -> Result<()> {
        if lexicon.size() > word_id::MAX_WORD_ID + 1 {
            return Err(KabosuError::invalid_argument(
                "lexicon",
                format!("dictionary has too many words: {}", lexicon.size()),
            ));
        }
        Ok(())
    }

    /// 辞書数が上限に達しているかを返します。
    pub fn is_full(&self) -> bool {
        self.lexicons.len() >= Self::MAX_DICTIONARIES
    }

    /// `text[offset..]`の接頭辞に一致する語を列挙します。
    ///
    /// ユーザー辞書を登録順に引いた後、最後にシステム辞書を引きます。
    /// 語IDには辞書番号が付きます。
    pub fn lookup<'s>(&'s self, text: &'s [u8], offset: usize) -> LexiconSetLookupIter<'s> {
        if self.lexicons.len() == 1 {
            LexiconSetLookupIter::Single(self.lexicons[0].lookup(text, offset))
        } else {
            LexiconSetLookupIter::Chained(ChainedLookupIter {
                lexicons: &self.lexicons,
                text,
                offset,
                iter: self.lexicons[1].lookup(text, offset),
                dictionary_id: 1,
            })
        }
    }

    /// [`Self::lookup`]の割り当てなし版のカーソルを作ります。
    ///
    /// こちらは優先度の高い辞書から、つまり後から登録したユーザー辞書から
    /// 順に引きます。
    pub fn word_lookup<'s>(
        &'s self,
        text: &'s [u8],
        offset: usize,
        limit: usize,
    ) -> WordLookup<'s> {
        WordLookup::new(&self.lexicons, text, offset, limit)
    }

    /// 語の左文脈IDを返します。
    #[inline(always)]
    pub fn left_id(&self, word_id: u32) -> i16 {
        self.lexicon_of(word_id).left_id(word_id::word(word_id))
    }

    /// 語の右文脈IDを返します。
    #[inline(always)]
    pub fn right_id(&self, word_id: u32) -> i16 {
        self.lexicon_of(word_id).right_id(word_id::word(word_id))
    }

    /// 語の生起コストを返します。
    #[inline(always)]
    pub fn cost(&self, word_id: u32) -> i16 {
        self.lexicon_of(word_id).cost(word_id::word(word_id))
    }

    /// 語の詳細情報を返します。
    pub fn word_info(&self, word_id: u32) -> Result<WordInfo> {
        self.lexicon_of(word_id).word_info(word_id::word(word_id))
    }

    /// 全辞書の語数の合計を返します。
    pub fn size(&self) -> u32 {
        self.lexicons.iter().map(|l| l.size()).sum()
    }

    #[inline(always)]
    fn lexicon_of(&self, word_id: u32) -> &DoubleArrayLexicon<'a> {
        &self.lexicons[usize::from_u32(word_id::dic(word_id))]
    }
}

/// [`LexiconSet::lookup`]の結果を列挙するイテレータ
pub enum LexiconSetLookupIter<'a> {
    /// システム辞書だけのとき。辞書番号の付与を省きます。
    Single(LexiconLookupIter<'a>),
    /// 複数辞書を順に引くとき
    Chained(ChainedLookupIter<'a>),
}

impl Iterator for LexiconSetLookupIter<'_> {
    type Item = LexiconEntry;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Single(iter) => iter.next(),
            Self::Chained(iter) => iter.next(),
        }
    }
}

pub struct ChainedLookupIter<'a> {
    lexicons: &'a [DoubleArrayLexicon<'a>],
    text: &'a [u8],
    offset: usize,
    iter: LexiconLookupIter<'a>,
    dictionary_id: usize,
}

impl Iterator for ChainedLookupIter<'_> {
    type Item = LexiconEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.iter.next() {
                let tagged =
                    word_id::make_unchecked(self.dictionary_id as u32, entry.word_id);
                return Some(LexiconEntry::new(tagged, entry.end_offset));
            }
            // ユーザー辞書を登録順にたどり、最後にシステム辞書へ移る
            self.dictionary_id = match self.dictionary_id {
                0 => return None,
                id if id + 1 < self.lexicons.len() => id + 1,
                _ => 0,
            };
            self.iter = self.lexicons[self.dictionary_id].lookup(self.text, self.offset);
        }
    }
}
