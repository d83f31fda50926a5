//! 辞書バイナリの組み立て
//!
//! メモリ上の語エントリ列から、読み込み側がそのまま開ける辞書バイト列を
//! 作ります。システム辞書は品詞表と接続行列と語彙を持ち、ユーザー辞書は
//! 自前の品詞表を持つ形式と、システム辞書の文法を参照する旧形式を
//! 選べます。

mod lexicon_writer;

use hashbrown::HashMap;

use crate::dictionary::buffer::BufWriter;
use crate::dictionary::grammar::{Grammar, Pos};
use crate::dictionary::header::DictionaryHeader;
use crate::dictionary::version;
use crate::dictionary::word_id;
use crate::errors::{KabosuError, Result};
use crate::utils::FromU32;

use self::lexicon_writer::LexiconWriter;

const MAX_STRING_LENGTH: usize = i16::MAX as usize;
const MAX_ARRAY_LENGTH: usize = i8::MAX as usize;

/// 辞書に登録する1語のエントリ
///
/// `left_id`が負の語は見出しとして索引されません。語IDは付きますが、
/// 表層形からは引けなくなります。`normalized_form`と`reading_form`は
/// 空のとき表層形と同じとみなされます。
#[derive(Clone, Debug)]
pub struct RawWordEntry {
    /// 表層形
    pub surface: String,
    /// 左文脈ID
    pub left_id: i16,
    /// 右文脈ID
    pub right_id: i16,
    /// 生起コスト
    pub cost: i16,
    /// 品詞
    pub pos: Pos,
    /// 正規化形
    pub normalized_form: String,
    /// 辞書形の語ID。なければ`-1`
    pub dictionary_form_word_id: i32,
    /// 読み
    pub reading_form: String,
    /// A単位分割の語ID列
    pub a_unit_split: Vec<u32>,
    /// B単位分割の語ID列
    pub b_unit_split: Vec<u32>,
    /// 語構成の語ID列
    pub word_structure: Vec<u32>,
    /// 同義語グループID列
    pub synonym_group_ids: Vec<u32>,
}

impl Default for RawWordEntry {
    fn default() -> Self {
        Self {
            surface: String::new(),
            left_id: -1,
            right_id: -1,
            cost: 0,
            pos: Pos::default(),
            normalized_form: String::new(),
            dictionary_form_word_id: -1,
            reading_form: String::new(),
            a_unit_split: vec![],
            b_unit_split: vec![],
            word_structure: vec![],
            synonym_group_ids: vec![],
        }
    }
}

/// 左右の文脈IDで引く接続コストの密行列
pub struct ConnectionMatrix {
    left_size: u16,
    right_size: u16,
    costs: Vec<i16>,
}

impl ConnectionMatrix {
    /// コスト列から行列を作ります。
    ///
    /// `costs`は`left + left_size * right`の順に並べます。
    ///
    /// # エラー
    ///
    /// コスト列の長さが`left_size * right_size`に一致しない場合に
    /// [`KabosuError`]を返します。
    pub fn new(left_size: u16, right_size: u16, costs: Vec<i16>) -> Result<Self> {
        let expected = usize::from(left_size) * usize::from(right_size);
        if costs.len() != expected {
            return Err(KabosuError::invalid_argument(
                "costs",
                format!("connection matrix must have {} costs: {}", expected, costs.len()),
            ));
        }
        Ok(Self {
            left_size,
            right_size,
            costs,
        })
    }

    /// 左文脈IDの数を返します。
    #[inline(always)]
    pub const fn left_size(&self) -> u16 {
        self.left_size
    }

    /// 右文脈IDの数を返します。
    #[inline(always)]
    pub const fn right_size(&self) -> u16 {
        self.right_size
    }

    /// 接続コストを返します。
    #[inline(always)]
    pub fn cost(&self, left: u16, right: u16) -> i16 {
        self.costs[usize::from(left) + usize::from(self.left_size) * usize::from(right)]
    }

    fn write_to(&self, writer: &mut BufWriter) {
        writer.put_u16(self.left_size);
        writer.put_u16(self.right_size);
        for &cost in &self.costs {
            writer.put_i16(cost);
        }
    }
}

/// システム辞書を書き出すビルダー
pub struct SystemDictionaryBuilder {}

impl SystemDictionaryBuilder {
    /// エントリ列と接続行列からシステム辞書のバイト列を作ります。
    ///
    /// 書き出す形式は同義語グループID付きの版です。
    ///
    /// # エラー
    ///
    /// エントリの検査に失敗した場合に[`KabosuError`]を返します。
    pub fn build(
        entries: &[RawWordEntry],
        matrix: &ConnectionMatrix,
        description: &str,
    ) -> Result<Vec<u8>> {
        validate_entries(entries)?;
        let mut pos_table = PosTable::new();
        let mut pos_ids = Vec::with_capacity(entries.len());
        for entry in entries {
            pos_ids.push(pos_table.id_of(&entry.pos)?);
        }
        log::info!(" {} words", entries.len());
        let header = DictionaryHeader::new(
            version::SYSTEM_DICT_VERSION_2,
            current_epoch_seconds(),
            description.to_string(),
        );
        let mut writer = BufWriter::new();
        writer.put_slice(&header.to_bytes()?);
        log::info!("writing the POS table...");
        let start = writer.position();
        pos_table.write_to(&mut writer)?;
        log::info!(" {} bytes", writer.position() - start);
        log::info!("writing the connection matrix...");
        let start = writer.position();
        matrix.write_to(&mut writer);
        log::info!(" {} bytes", writer.position() - start);
        LexiconWriter::new(entries, &pos_ids, true).write_to(&mut writer)?;
        Ok(writer.into_vec())
    }
}

/// ユーザー辞書を書き出すビルダー
pub struct UserDictionaryBuilder {}

impl UserDictionaryBuilder {
    /// エントリ列からユーザー辞書のバイト列を作ります。
    ///
    /// 自前の品詞表を持つ自己完結の形式で、品詞IDはこの辞書の中だけで
    /// 閉じます。接続行列は持たず、サイズゼロの行列を書きます。
    ///
    /// # エラー
    ///
    /// エントリの検査に失敗した場合に[`KabosuError`]を返します。
    pub fn build(entries: &[RawWordEntry], description: &str) -> Result<Vec<u8>> {
        validate_entries(entries)?;
        let mut pos_table = PosTable::new();
        let mut pos_ids = Vec::with_capacity(entries.len());
        for entry in entries {
            pos_ids.push(pos_table.id_of(&entry.pos)?);
        }
        log::info!(" {} words", entries.len());
        let header = DictionaryHeader::new(
            version::USER_DICT_VERSION_3,
            current_epoch_seconds(),
            description.to_string(),
        );
        let mut writer = BufWriter::new();
        writer.put_slice(&header.to_bytes()?);
        log::info!("writing the POS table...");
        pos_table.write_to(&mut writer)?;
        writer.put_u16(0);
        writer.put_u16(0);
        LexiconWriter::new(entries, &pos_ids, true).write_to(&mut writer)?;
        Ok(writer.into_vec())
    }

    /// システム辞書の文法を参照する旧形式のユーザー辞書を作ります。
    ///
    /// 品詞はシステム辞書の品詞表で解決し、文法ブロックも同義語グループ
    /// IDも書きません。
    ///
    /// # エラー
    ///
    /// システム辞書にない品詞が現れた場合、またはエントリの検査に失敗した
    /// 場合に[`KabosuError`]を返します。
    pub fn build_legacy(
        entries: &[RawWordEntry],
        system_grammar: &Grammar,
        description: &str,
    ) -> Result<Vec<u8>> {
        validate_entries(entries)?;
        let mut pos_ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(pos_id) = system_grammar.get_part_of_speech_id(&entry.pos) else {
                return Err(KabosuError::invalid_argument(
                    "entries",
                    format!("invalid part of speech: {}", entry.pos),
                ));
            };
            pos_ids.push(pos_id);
        }
        log::info!(" {} words", entries.len());
        let header = DictionaryHeader::new(
            version::USER_DICT_VERSION_1,
            current_epoch_seconds(),
            description.to_string(),
        );
        let mut writer = BufWriter::new();
        writer.put_slice(&header.to_bytes()?);
        LexiconWriter::new(entries, &pos_ids, false).write_to(&mut writer)?;
        Ok(writer.into_vec())
    }
}

/// 品詞文字列をIDに引き当てる表
struct PosTable {
    table: Vec<Pos>,
    index: HashMap<Pos, u16>,
}

impl PosTable {
    fn new() -> Self {
        Self {
            table: vec![],
            index: HashMap::new(),
        }
    }

    fn id_of(&mut self, pos: &Pos) -> Result<u16> {
        if let Some(&pos_id) = self.index.get(pos) {
            return Ok(pos_id);
        }
        let next = self.table.len();
        if next >= i16::MAX as usize {
            return Err(KabosuError::invalid_argument(
                "pos",
                format!("maximum POS number exceeded by {pos}"),
            ));
        }
        let pos_id = next as u16;
        self.table.push(pos.clone());
        self.index.insert(pos.clone(), pos_id);
        Ok(pos_id)
    }

    fn write_to(&self, writer: &mut BufWriter) -> Result<()> {
        writer.put_u16(self.table.len() as u16);
        for pos in &self.table {
            for component in pos.components() {
                writer.put_utf16_string(component)?;
            }
        }
        Ok(())
    }
}

fn validate_entries(entries: &[RawWordEntry]) -> Result<()> {
    if entries.len() > usize::from_u32(word_id::MAX_WORD_ID) + 1 {
        return Err(KabosuError::invalid_argument(
            "entries",
            format!("dictionary has too many words: {}", entries.len()),
        ));
    }
    let num_entries = i32::try_from(entries.len())?;
    for entry in entries {
        if entry.surface.is_empty() {
            return Err(KabosuError::invalid_argument("entries", "headword is empty"));
        }
        if entry.surface.len() > MAX_STRING_LENGTH
            || utf16_length(&entry.surface) > MAX_STRING_LENGTH
            || utf16_length(&entry.normalized_form) > MAX_STRING_LENGTH
            || utf16_length(&entry.reading_form) > MAX_STRING_LENGTH
        {
            return Err(KabosuError::invalid_argument("entries", "string is too long"));
        }
        if entry.a_unit_split.len() > MAX_ARRAY_LENGTH
            || entry.b_unit_split.len() > MAX_ARRAY_LENGTH
            || entry.word_structure.len() > MAX_ARRAY_LENGTH
            || entry.synonym_group_ids.len() > MAX_ARRAY_LENGTH
        {
            return Err(KabosuError::invalid_argument("entries", "too many units"));
        }
        let dfwid = entry.dictionary_form_word_id;
        if dfwid < -1 || dfwid >= num_entries {
            return Err(KabosuError::invalid_argument(
                "entries",
                format!("invalid dictionary form word ID: {dfwid}"),
            ));
        }
    }
    Ok(())
}

fn utf16_length(s: &str) -> usize {
    s.encode_utf16().count()
}

fn current_epoch_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
