//! 新系列の辞書コンテナ
//!
//! 先頭4096バイトに辞書全体の目次を置く形式です。マジック文字列と
//! 形式バージョンに続けて、作成時刻、コメント、署名、参照先、そして
//! 名前付きブロックの位置表を持ちます。ブロックの実体は目次の後ろに
//! 並び、読み込み側は名前でスライスを取り出します。

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::{BufReader, BufWriter};
use crate::dictionary::version;
use crate::errors::{KabosuError, Result};

const MAGIC: &[u8; 16] = b"SudachiBinaryDic";
const FORMAT_VERSION: u64 = 1;

/// 辞書内の名前付きブロックの位置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    name: String,
    start: u64,
    size: u64,
}

impl Block {
    pub const fn new(name: String, start: u64, size: u64) -> Self {
        Self { name, start, size }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[inline(always)]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// 辞書コンテナの目次
///
/// # 使用例
///
/// ```
/// use kabosu::dictionary::description::{Block, Description};
///
/// let mut desc = Description::default();
/// desc.set_comment("テスト辞書".to_string());
/// desc.set_blocks(vec![Block::new("trie".to_string(), 4096, 1024)]);
///
/// let bytes = desc.to_bytes().unwrap();
/// assert_eq!(bytes.len(), Description::STORAGE_SIZE);
///
/// let loaded = Description::load(&bytes).unwrap();
/// assert_eq!(loaded.comment(), "テスト辞書");
/// assert!(loaded.is_system_dictionary());
/// ```
#[derive(Clone, Debug)]
pub struct Description {
    creation_time: u64,
    comment: String,
    signature: String,
    reference: String,
    blocks: Vec<Block>,
    flags: u64,
    num_indexed_entries: u32,
    num_total_entries: u32,
}

impl Default for Description {
    fn default() -> Self {
        let creation_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            creation_time,
            comment: String::new(),
            signature: default_signature(creation_time),
            reference: String::new(),
            blocks: vec![],
            flags: 0,
            num_indexed_entries: 0,
            num_total_entries: 0,
        }
    }
}

impl Description {
    /// 目次の直列化サイズ（バイト）。ブロックの実体はこの直後から始まります。
    pub const STORAGE_SIZE: usize = 4096;

    const FLAG_RUNTIME_COSTS: u64 = 1;

    /// 辞書バイト列の先頭から目次を読み取ります。
    ///
    /// # エラー
    ///
    /// 以下の場合に[`KabosuError`]を返します。
    ///
    ///  - 旧形式（272バイトヘッダ）の辞書を渡した場合
    ///  - マジック文字列または形式バージョンが一致しない場合
    ///  - 目次が壊れている場合
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::STORAGE_SIZE {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "dictionary is too short",
            ));
        }
        Self::check_legacy_format(bytes)?;
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "invalid magic string, dictionary is corrupted",
            ));
        }
        let mut reader = BufReader::at(&bytes[..Self::STORAGE_SIZE], MAGIC.len());
        let format_version = reader.read_u64()?;
        if format_version != FORMAT_VERSION {
            return Err(KabosuError::invalid_format(
                "dictionary",
                format!("invalid version {format_version}, corrupted dictionary"),
            ));
        }

        let creation_time = reader.read_u64()?;
        let flags = reader.read_u64()?;
        let comment = reader.read_utf8_string()?;
        let signature = reader.read_utf8_string()?;
        let reference = reader.read_utf8_string()?;
        let num_indexed_entries = reader.read_varint32()?;
        let num_total_entries = reader.read_varint32()?;
        let num_blocks = reader.read_varint32()?;
        let mut blocks = Vec::with_capacity(num_blocks as usize);
        for _ in 0..num_blocks {
            let name = reader.read_utf8_string()?;
            let start = reader.read_varint64()?;
            let size = reader.read_varint64()?;
            blocks.push(Block::new(name, start, size));
        }

        Ok(Self {
            creation_time,
            comment,
            signature,
            reference,
            blocks,
            flags,
            num_indexed_entries,
            num_total_entries,
        })
    }

    fn check_legacy_format(bytes: &[u8]) -> Result<()> {
        let head = LittleEndian::read_u64(&bytes[..8]);
        if version::is_system_dictionary(head) {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "passed dictionary is a legacy system dictionary, please rebuild it",
            ));
        }
        if version::is_user_dictionary(head) {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "passed dictionary is a legacy user dictionary, please rebuild it",
            ));
        }
        Ok(())
    }

    /// 目次を直列化します。常に[`Self::STORAGE_SIZE`]バイトです。
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new();
        writer.put_slice(MAGIC);
        writer.put_u64(FORMAT_VERSION);
        writer.put_u64(self.creation_time);
        writer.put_u64(self.flags);
        writer.put_utf8_string(&self.comment);
        writer.put_utf8_string(&self.signature);
        writer.put_utf8_string(&self.reference);
        writer.put_varint32(self.num_indexed_entries);
        writer.put_varint32(self.num_total_entries);
        writer.put_varint32(self.blocks.len() as u32);
        for block in &self.blocks {
            writer.put_utf8_string(&block.name);
            writer.put_varint64(block.start);
            writer.put_varint64(block.size);
        }

        let mut bytes = writer.into_vec();
        if bytes.len() > Self::STORAGE_SIZE {
            return Err(KabosuError::invalid_argument(
                "description",
                format!(
                    "serialized description must fit into {} bytes: {}",
                    Self::STORAGE_SIZE,
                    bytes.len()
                ),
            ));
        }
        bytes.resize(Self::STORAGE_SIZE, 0);
        Ok(bytes)
    }

    /// 指定した名前のブロックを辞書バイト列から切り出します。
    pub fn slice<'a>(&self, bytes: &'a [u8], name: &str) -> Result<&'a [u8]> {
        for block in &self.blocks {
            if block.name == name {
                let start = usize::try_from(block.start)?;
                let size = usize::try_from(block.size)?;
                let end = start.checked_add(size).filter(|&end| end <= bytes.len());
                let Some(end) = end else {
                    return Err(KabosuError::invalid_format(
                        "dictionary",
                        format!("block {name} is out of bounds"),
                    ));
                };
                return Ok(&bytes[start..end]);
            }
        }
        Err(KabosuError::invalid_argument(
            "part",
            format!("Dictionary did not contain part with name={name}"),
        ))
    }

    /// 参照先を持たない辞書がシステム辞書です。
    pub fn is_system_dictionary(&self) -> bool {
        self.reference.is_empty()
    }

    pub fn is_user_dictionary(&self) -> bool {
        !self.reference.is_empty()
    }

    #[inline(always)]
    pub const fn creation_time(&self) -> u64 {
        self.creation_time
    }

    pub fn set_creation_time(&mut self, creation_time: u64) {
        self.creation_time = creation_time;
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: String) {
        self.comment = comment;
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: String) {
        self.signature = signature;
    }

    /// 参照するシステム辞書の署名を返します。システム辞書では空です。
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn set_reference(&mut self, reference: String) {
        self.reference = reference;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    pub fn set_runtime_costs(&mut self, runtime_costs: bool) {
        self.flags = (self.flags & !Self::FLAG_RUNTIME_COSTS) | u64::from(runtime_costs);
    }

    pub const fn is_runtime_costs(&self) -> bool {
        self.flags & Self::FLAG_RUNTIME_COSTS != 0
    }

    /// 索引済みエントリ数と総エントリ数を設定します。
    pub fn set_num_entries(&mut self, indexed: u32, total: u32) {
        self.num_indexed_entries = indexed;
        self.num_total_entries = total;
    }

    #[inline(always)]
    pub const fn num_indexed_entries(&self) -> u32 {
        self.num_indexed_entries
    }

    #[inline(always)]
    pub const fn num_total_entries(&self) -> u32 {
        self.num_total_entries
    }
}

fn default_signature(creation_time: u64) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{creation_time}-{nanos:08x}")
}
