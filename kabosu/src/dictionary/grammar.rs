//! 品詞表と連接コスト行列

use std::borrow::Cow;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::BufReader;
use crate::errors::{KabosuError, Result};

/// 品詞。6要素の階層表現です。
///
/// 各要素はUTF-16で127単位以内に制限されます。辞書の品詞表が
/// 1バイト長の文字列として直列化されるためです。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    components: Vec<String>,
}

impl Pos {
    /// 品詞の階層数
    pub const DEPTH: usize = 6;

    /// 1要素の最大長（UTF-16コード単位）
    pub const MAX_COMPONENT_LENGTH: usize = 127;

    pub fn new(components: Vec<String>) -> Result<Self> {
        if components.len() != Self::DEPTH {
            return Err(KabosuError::invalid_argument(
                "components",
                format!("POS must have {} components: {}", Self::DEPTH, components.len()),
            ));
        }
        for component in &components {
            let len = component.encode_utf16().count();
            if len > Self::MAX_COMPONENT_LENGTH {
                return Err(KabosuError::invalid_argument(
                    "components",
                    format!(
                        "POS component must not be longer than {} chars: {}",
                        Self::MAX_COMPONENT_LENGTH,
                        component
                    ),
                ));
            }
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl Default for Pos {
    /// 全要素が`*`の品詞を返します。
    fn default() -> Self {
        Self {
            components: vec!["*".to_string(); Self::DEPTH],
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join(","))
    }
}

/// 品詞表と連接コスト行列
///
/// 品詞表は読み込み時に展開し、行列はバイト列を参照したまま保持します。
/// [`Self::set_connect_cost`]を呼んだときだけ行列を私有バッファへ
/// 複製します（書き込み時コピー）。
pub struct Grammar<'a> {
    pos_list: Vec<Pos>,
    left_size: usize,
    right_size: usize,
    matrix: Cow<'a, [u8]>,
    storage_size: usize,
}

impl<'a> Grammar<'a> {
    /// 連接禁止を表すコスト値
    pub const INHIBITED_CONNECTION: i16 = i16::MAX;

    /// 文頭の`(左文脈ID, 右文脈ID, コスト)`
    pub const BOS_PARAMETER: [i16; 3] = [0, 0, 0];

    /// 文末の`(左文脈ID, 右文脈ID, コスト)`
    pub const EOS_PARAMETER: [i16; 3] = [0, 0, 0];

    /// バイト列の`offset`から文法ブロックを読み取ります。
    pub fn parse(bytes: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = BufReader::at(bytes, offset);
        let pos_size = reader.read_u16()?;
        let mut pos_list = Vec::with_capacity(usize::from(pos_size));
        for _ in 0..pos_size {
            let mut components = Vec::with_capacity(Pos::DEPTH);
            for _ in 0..Pos::DEPTH {
                components.push(reader.read_utf16_string()?);
            }
            pos_list.push(Pos::new(components)?);
        }

        let left_size = usize::from(reader.read_u16()?);
        let right_size = usize::from(reader.read_u16()?);
        let matrix = reader.take(2 * left_size * right_size)?;
        let storage_size = reader.position() - offset;

        Ok(Self {
            pos_list,
            left_size,
            right_size,
            matrix: Cow::Borrowed(matrix),
            storage_size,
        })
    }

    /// 文法ブロックを持たない辞書のための空の文法を返します。
    pub fn empty() -> Self {
        Self {
            pos_list: vec![],
            left_size: 0,
            right_size: 0,
            matrix: Cow::Owned(vec![]),
            storage_size: 0,
        }
    }

    /// 品詞数を返します。
    pub fn pos_size(&self) -> usize {
        self.pos_list.len()
    }

    /// 品詞IDから品詞を引きます。
    pub fn pos(&self, pos_id: u16) -> Option<&Pos> {
        self.pos_list.get(usize::from(pos_id))
    }

    /// 品詞から品詞IDを引きます。
    pub fn get_part_of_speech_id(&self, pos: &Pos) -> Option<u16> {
        self.pos_list.iter().position(|p| p == pos).map(|i| i as u16)
    }

    /// 連接コストを返します。
    ///
    /// # 引数
    ///
    ///  - `left`: 左側の語の右文脈ID
    ///  - `right`: 右側の語の左文脈ID
    #[inline(always)]
    pub fn connect_cost(&self, left: i16, right: i16) -> i16 {
        let index = self.matrix_index(left, right);
        LittleEndian::read_i16(&self.matrix[index..])
    }

    /// 連接コストを書き換えます。
    ///
    /// 初回の呼び出しで行列全体が私有バッファへ複製されるため、元の
    /// バイト列を参照する他の文法には影響しません。
    pub fn set_connect_cost(&mut self, left: i16, right: i16, cost: i16) {
        let index = self.matrix_index(left, right);
        LittleEndian::write_i16(&mut self.matrix.to_mut()[index..], cost);
    }

    #[inline(always)]
    fn matrix_index(&self, left: i16, right: i16) -> usize {
        let left = left as u16 as usize;
        let right = right as u16 as usize;
        debug_assert!(left < self.left_size);
        debug_assert!(right < self.right_size);
        2 * (left + self.left_size * right)
    }

    /// 左文脈IDの総数を返します。
    #[inline(always)]
    pub const fn left_id_size(&self) -> usize {
        self.left_size
    }

    /// 右文脈IDの総数を返します。
    #[inline(always)]
    pub const fn right_id_size(&self) -> usize {
        self.right_size
    }

    /// 文法ブロックの直列化サイズ（バイト）を返します。
    #[inline(always)]
    pub const fn storage_size(&self) -> usize {
        self.storage_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::buffer::BufWriter;

    fn grammar_bytes() -> Vec<u8> {
        let mut writer = BufWriter::new();
        writer.put_u16(2);
        for component in ["名詞", "固有名詞", "地名", "一般", "*", "*"] {
            writer.put_utf16_string(component).unwrap();
        }
        for component in ["動詞", "一般", "*", "*", "五段-ラ行", "終止形-一般"] {
            writer.put_utf16_string(component).unwrap();
        }
        // 2 x 3 の行列
        writer.put_u16(2);
        writer.put_u16(3);
        for cost in [0i16, 10, 20, 30, -40, 50] {
            writer.put_i16(cost);
        }
        writer.into_vec()
    }

    fn pos(components: &[&str]) -> Pos {
        Pos::new(components.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_parse() {
        let mut bytes = vec![0xEE; 3];
        bytes.extend(grammar_bytes());
        let grammar = Grammar::parse(&bytes, 3).unwrap();

        assert_eq!(grammar.pos_size(), 2);
        assert_eq!(
            grammar.pos(0).unwrap().to_string(),
            "名詞,固有名詞,地名,一般,*,*"
        );
        assert_eq!(grammar.left_id_size(), 2);
        assert_eq!(grammar.right_id_size(), 3);
        assert_eq!(grammar.storage_size(), bytes.len() - 3);
    }

    #[test]
    fn test_pos_id() {
        let bytes = grammar_bytes();
        let grammar = Grammar::parse(&bytes, 0).unwrap();
        assert_eq!(
            grammar.get_part_of_speech_id(&pos(&["名詞", "固有名詞", "地名", "一般", "*", "*"])),
            Some(0)
        );
        assert_eq!(
            grammar.get_part_of_speech_id(&pos(&[
                "動詞",
                "一般",
                "*",
                "*",
                "五段-ラ行",
                "終止形-一般"
            ])),
            Some(1)
        );
        assert_eq!(grammar.get_part_of_speech_id(&Pos::default()), None);
    }

    #[test]
    fn test_connect_cost() {
        let bytes = grammar_bytes();
        let grammar = Grammar::parse(&bytes, 0).unwrap();
        assert_eq!(grammar.connect_cost(0, 0), 0);
        assert_eq!(grammar.connect_cost(1, 0), 10);
        assert_eq!(grammar.connect_cost(0, 1), 20);
        assert_eq!(grammar.connect_cost(1, 1), 30);
        assert_eq!(grammar.connect_cost(0, 2), -40);
        assert_eq!(grammar.connect_cost(1, 2), 50);
    }

    #[test]
    fn test_set_connect_cost_is_copy_on_write() {
        let bytes = grammar_bytes();
        let mut edited = Grammar::parse(&bytes, 0).unwrap();
        let original = Grammar::parse(&bytes, 0).unwrap();

        edited.set_connect_cost(1, 1, Grammar::INHIBITED_CONNECTION);
        assert_eq!(edited.connect_cost(1, 1), Grammar::INHIBITED_CONNECTION);
        assert_eq!(original.connect_cost(1, 1), 30);
        assert_eq!(edited.connect_cost(0, 2), -40);
    }

    #[test]
    fn test_empty() {
        let grammar = Grammar::empty();
        assert_eq!(grammar.pos_size(), 0);
        assert_eq!(grammar.left_id_size(), 0);
        assert_eq!(grammar.storage_size(), 0);
        assert_eq!(grammar.get_part_of_speech_id(&Pos::default()), None);
    }

    #[test]
    fn test_pos_validation() {
        assert!(Pos::new(vec!["名詞".to_string()]).is_err());
        let long = "あ".repeat(128);
        assert!(Pos::new(vec![
            long,
            "*".to_string(),
            "*".to_string(),
            "*".to_string(),
            "*".to_string(),
            "*".to_string()
        ])
        .is_err());
        assert_eq!(Pos::default().to_string(), "*,*,*,*,*,*");
    }

    #[test]
    fn test_truncated_matrix() {
        let mut bytes = grammar_bytes();
        bytes.pop();
        assert!(Grammar::parse(&bytes, 0).is_err());
    }
}
