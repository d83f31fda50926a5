//! 旧来の辞書ヘッダ
//!
//! バージョン8バイト、作成時刻8バイト、説明文256バイトの固定272バイトです。
//! 説明文はUTF-8をヌル埋めで格納します。

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::version;
use crate::errors::{KabosuError, Result};

/// 辞書バイナリ先頭の固定長ヘッダ
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryHeader {
    version: u64,
    create_time: u64,
    description: String,
}

impl DictionaryHeader {
    /// ヘッダの直列化サイズ（バイト）
    pub const STORAGE_SIZE: usize = 8 + 8 + Self::DESCRIPTION_SIZE;

    const DESCRIPTION_SIZE: usize = 256;

    pub const fn new(version: u64, create_time: u64, description: String) -> Self {
        Self {
            version,
            create_time,
            description,
        }
    }

    /// バイト列の`offset`からヘッダを読み取ります。
    pub fn parse(bytes: &[u8], offset: usize) -> Result<Self> {
        if bytes.len() < offset + Self::STORAGE_SIZE {
            return Err(KabosuError::invalid_format(
                "header",
                "invalid header: too short",
            ));
        }
        let bytes = &bytes[offset..offset + Self::STORAGE_SIZE];
        let version = LittleEndian::read_u64(&bytes[..8]);
        let create_time = LittleEndian::read_u64(&bytes[8..16]);

        let desc_bytes = &bytes[16..];
        let desc_len = desc_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::DESCRIPTION_SIZE);
        let description = std::str::from_utf8(&desc_bytes[..desc_len])?.to_string();

        Ok(Self {
            version,
            create_time,
            description,
        })
    }

    /// ヘッダを直列化します。常に[`Self::STORAGE_SIZE`]バイトです。
    ///
    /// # エラー
    ///
    /// 説明文がUTF-8で256バイトを越える場合、
    /// [`KabosuError`](crate::errors::KabosuError)を返します。
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let desc = self.description.as_bytes();
        if desc.len() > Self::DESCRIPTION_SIZE {
            return Err(KabosuError::invalid_argument(
                "description",
                format!(
                    "description is too long: must be utf-8 of {} bytes or less",
                    Self::DESCRIPTION_SIZE
                ),
            ));
        }
        let mut bytes = Vec::with_capacity(Self::STORAGE_SIZE);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.create_time.to_le_bytes());
        bytes.extend_from_slice(desc);
        bytes.resize(Self::STORAGE_SIZE, 0);
        Ok(bytes)
    }

    #[inline(always)]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// 作成時刻（Unixエポック秒）を返します。
    #[inline(always)]
    pub const fn create_time(&self) -> u64 {
        self.create_time
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn is_system_dictionary(&self) -> bool {
        version::is_system_dictionary(self.version)
    }

    pub const fn is_user_dictionary(&self) -> bool {
        version::is_user_dictionary(self.version)
    }
}
