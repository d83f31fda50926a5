//! 割り当てなしの複数辞書引き

use crate::dictionary::lexicon::DoubleArrayLexicon;
use crate::dictionary::word_id;
use crate::dictionary::word_id_table::WordIdTable;
use crate::trie::lookup::DoubleArrayLookup;

/// 複数辞書をまとめて引く再利用可能なカーソル
///
/// [`LexiconSet::lookup`]と違い、優先度の高い辞書、つまり後から登録した
/// ユーザー辞書から順に引きます。一致ごとの語ID群は内部バッファに
/// 書き込まれ、割り当ては起きません。
///
/// [`LexiconSet::lookup`]: crate::dictionary::lexicon_set::LexiconSet::lookup
pub struct WordLookup<'a> {
    lexicons: &'a [DoubleArrayLexicon<'a>],
    lookup: DoubleArrayLookup<'a>,
    word_id_table: &'a WordIdTable<'a>,
    word_ids: Vec<u32>,
    current_lexicon: usize,
}

impl<'a> WordLookup<'a> {
    pub(crate) fn new(
        lexicons: &'a [DoubleArrayLexicon<'a>],
        text: &'a [u8],
        offset: usize,
        limit: usize,
    ) -> Self {
        debug_assert!(!lexicons.is_empty());
        let current_lexicon = lexicons.len() - 1;
        let lexicon = &lexicons[current_lexicon];
        Self {
            lexicons,
            lookup: DoubleArrayLookup::new(lexicon.trie(), text, offset, limit),
            word_id_table: lexicon.word_id_table(),
            word_ids: Vec::new(),
            current_lexicon,
        }
    }

    /// 別の入力で検索をやり直します。
    pub fn reset(&mut self, text: &'a [u8], offset: usize, limit: usize) {
        self.current_lexicon = self.lexicons.len() - 1;
        let lexicon = &self.lexicons[self.current_lexicon];
        self.word_id_table = lexicon.word_id_table();
        self.lookup.set_array(lexicon.trie());
        self.lookup.reset(text, offset, limit);
    }

    /// 次の一致へ進みます。
    ///
    /// 一致があれば`true`を返し、[`Self::word_ids`]と[`Self::end_offset`]を
    /// 更新します。
    pub fn next(&mut self) -> bool {
        while !self.lookup.next() {
            if self.current_lexicon == 0 {
                return false;
            }
            self.current_lexicon -= 1;
            let lexicon = &self.lexicons[self.current_lexicon];
            self.word_id_table = lexicon.word_id_table();
            self.lookup.set_array(lexicon.trie());
        }
        self.word_id_table.fill(self.lookup.value(), &mut self.word_ids);
        let dictionary_id = self.current_lexicon as u32;
        if dictionary_id != 0 {
            for word_id in &mut self.word_ids {
                *word_id = word_id::make_unchecked(dictionary_id, *word_id);
            }
        }
        true
    }

    /// 現在の一致に対応する語ID群を返します。辞書番号付きです。
    #[inline(always)]
    pub fn word_ids(&self) -> &[u32] {
        &self.word_ids
    }

    /// 現在の一致に対応する語数を返します。
    #[inline(always)]
    pub fn num_words(&self) -> usize {
        self.word_ids.len()
    }

    /// 現在の一致の終端オフセットを返します。
    #[inline(always)]
    pub fn end_offset(&self) -> usize {
        self.lookup.end_offset()
    }
}
