//! バイナリ辞書とその構成部品
//!
//! 辞書はヘッダー、文法、語彙をこの順に並べた一続きのバイト列です。
//! [`BinaryDictionary`]がバイト列を所有し、文法と語彙は借用ビューとして
//! 取り出します。複数辞書の重ね合わせは[`lexicon_set::LexiconSet`]が
//! 担います。

pub(crate) mod buffer;
pub mod build;
pub mod description;
pub mod grammar;
pub mod header;
pub mod lexicon;
pub mod lexicon_set;
pub mod string_ptr;
pub mod version;
pub mod word_id;
pub mod word_id_table;
pub mod word_info;
pub mod word_lookup;
pub mod word_param;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::dictionary::grammar::Grammar;
use crate::dictionary::header::DictionaryHeader;
use crate::dictionary::lexicon::DoubleArrayLexicon;
use crate::errors::{KabosuError, Result};

/// 辞書バイト列の持ち方
enum Storage {
    /// ファイルのメモリマップ
    Mapped(Mmap),
    /// ヒープ上の所有バッファ
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for Storage {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// バイト列を所有するバイナリ辞書
///
/// 読み込み時にヘッダーと各部分の構造を検証します。メモリマップで
/// 開いた場合、マップはこの値が破棄されるときに解除されます。
pub struct BinaryDictionary {
    storage: Storage,
    header: DictionaryHeader,
    lexicon_offset: usize,
}

impl BinaryDictionary {
    fn new(storage: Storage) -> Result<Self> {
        let bytes = storage.as_ref();
        let header = DictionaryHeader::parse(bytes, 0)?;
        let version = header.version();
        let lexicon_offset = if version::has_grammar(version) {
            let grammar = Grammar::parse(bytes, DictionaryHeader::STORAGE_SIZE)?;
            DictionaryHeader::STORAGE_SIZE + grammar.storage_size()
        } else if header.is_user_dictionary() {
            DictionaryHeader::STORAGE_SIZE
        } else {
            return Err(KabosuError::invalid_format("dictionary", "invalid dictionary"));
        };
        DoubleArrayLexicon::parse(bytes, lexicon_offset, version::has_synonym_group_ids(version))?;
        Ok(Self {
            storage,
            header,
            lexicon_offset,
        })
    }

    /// ヒープ上のバイト列から辞書を開きます。
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Storage::Owned(bytes))
    }

    /// ファイルをメモリマップして辞書を開きます。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::new(Storage::Mapped(mmap))
    }

    /// システム辞書として開きます。
    ///
    /// # エラー
    ///
    /// 辞書として不正な場合、またはシステム辞書でない場合に
    /// [`KabosuError`]を返します。
    pub fn load_system<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dict = Self::from_path(path)?;
        if !dict.header.is_system_dictionary() {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "invalid system dictionary",
            ));
        }
        Ok(dict)
    }

    /// ユーザー辞書として開きます。
    ///
    /// # エラー
    ///
    /// 辞書として不正な場合、またはユーザー辞書でない場合に
    /// [`KabosuError`]を返します。
    pub fn load_user<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dict = Self::from_path(path)?;
        if !dict.header.is_user_dictionary() {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "invalid user dictionary",
            ));
        }
        Ok(dict)
    }

    /// ヘッダーを返します。
    #[inline(always)]
    pub const fn header(&self) -> &DictionaryHeader {
        &self.header
    }

    /// 文法部分のビューを返します。
    ///
    /// 文法ブロックを持たない旧形式のユーザー辞書では空の文法を
    /// 返します。ビューは呼ぶたびに読み直されるので、使い回す場合は
    /// 呼び出し側で保持してください。
    pub fn grammar(&self) -> Result<Grammar<'_>> {
        if version::has_grammar(self.header.version()) {
            Grammar::parse(self.storage.as_ref(), DictionaryHeader::STORAGE_SIZE)
        } else {
            Ok(Grammar::empty())
        }
    }

    /// 語彙部分のビューを返します。
    pub fn lexicon(&self) -> Result<DoubleArrayLexicon<'_>> {
        DoubleArrayLexicon::parse(
            self.storage.as_ref(),
            self.lexicon_offset,
            version::has_synonym_group_ids(self.header.version()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::build::{
        ConnectionMatrix, RawWordEntry, SystemDictionaryBuilder, UserDictionaryBuilder,
    };
    use crate::dictionary::grammar::Pos;

    fn word(surface: &str, cost: i16) -> RawWordEntry {
        RawWordEntry {
            surface: surface.to_string(),
            left_id: 0,
            right_id: 0,
            cost,
            pos: Pos::default(),
            reading_form: surface.to_string(),
            ..Default::default()
        }
    }

    fn system_bytes() -> Vec<u8> {
        let entries = vec![word("東京", 100), word("京都", 200)];
        let matrix = ConnectionMatrix::new(1, 1, vec![0]).unwrap();
        SystemDictionaryBuilder::build(&entries, &matrix, "test dictionary").unwrap()
    }

    #[test]
    fn open_system_dictionary() {
        let dict = BinaryDictionary::from_vec(system_bytes()).unwrap();
        assert!(dict.header().is_system_dictionary());
        assert_eq!(dict.header().description(), "test dictionary");
        let grammar = dict.grammar().unwrap();
        assert_eq!(grammar.pos_size(), 1);
        let lexicon = dict.lexicon().unwrap();
        assert_eq!(lexicon.size(), 2);
        let entries: Vec<_> = lexicon.lookup("京都".as_bytes(), 0).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(lexicon.word_info(entries[0].word_id).unwrap().surface(), "京都");
    }

    #[test]
    fn open_user_dictionary() {
        let bytes = UserDictionaryBuilder::build(&[word("すだち", 300)], "user").unwrap();
        let dict = BinaryDictionary::from_vec(bytes).unwrap();
        assert!(dict.header().is_user_dictionary());
        assert_eq!(dict.grammar().unwrap().pos_size(), 1);
        assert_eq!(dict.lexicon().unwrap().size(), 1);
    }

    #[test]
    fn open_legacy_user_dictionary() {
        let system = BinaryDictionary::from_vec(system_bytes()).unwrap();
        let grammar = system.grammar().unwrap();
        let bytes =
            UserDictionaryBuilder::build_legacy(&[word("すだち", 300)], &grammar, "user").unwrap();
        let dict = BinaryDictionary::from_vec(bytes).unwrap();
        assert!(dict.header().is_user_dictionary());
        // 文法ブロックを持たないので空の文法が返る
        assert_eq!(dict.grammar().unwrap().pos_size(), 0);
        assert_eq!(dict.lexicon().unwrap().size(), 1);
    }

    #[test]
    fn reject_garbage() {
        assert!(BinaryDictionary::from_vec(vec![0; 16]).is_err());
        assert!(BinaryDictionary::from_vec(vec![0xAA; 4096]).is_err());
    }
}
