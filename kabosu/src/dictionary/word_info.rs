//! 語の詳細情報

use crate::dictionary::buffer::BufReader;
use crate::errors::Result;
use crate::utils::FromU32;

/// 語の表層形、品詞、各種の正規化形と分割情報
///
/// 正規化形と読みが空文字列で直列化されている場合は表層形と同一と
/// みなして復元します。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordInfo {
    surface: String,
    head_word_length: u16,
    pos_id: u16,
    normalized_form: String,
    dictionary_form_word_id: i32,
    dictionary_form: String,
    reading_form: String,
    a_unit_split: Vec<u32>,
    b_unit_split: Vec<u32>,
    word_structure: Vec<u32>,
    synonym_group_ids: Vec<u32>,
}

impl WordInfo {
    /// 表層形を返します。
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// 表層形のUTF-8バイト長を返します。
    #[inline(always)]
    pub const fn head_word_length(&self) -> u16 {
        self.head_word_length
    }

    /// 品詞IDを返します。
    #[inline(always)]
    pub const fn pos_id(&self) -> u16 {
        self.pos_id
    }

    /// 正規化形を返します。
    pub fn normalized_form(&self) -> &str {
        &self.normalized_form
    }

    /// 辞書形の語ID。辞書形を持たない語では`-1`です。
    #[inline(always)]
    pub const fn dictionary_form_word_id(&self) -> i32 {
        self.dictionary_form_word_id
    }

    /// 辞書形を返します。
    pub fn dictionary_form(&self) -> &str {
        &self.dictionary_form
    }

    /// 読みを返します。
    pub fn reading_form(&self) -> &str {
        &self.reading_form
    }

    /// A単位での分割を構成する語IDの列を返します。
    pub fn a_unit_split(&self) -> &[u32] {
        &self.a_unit_split
    }

    /// B単位での分割を構成する語IDの列を返します。
    pub fn b_unit_split(&self) -> &[u32] {
        &self.b_unit_split
    }

    /// 語の構成を表す語IDの列を返します。
    pub fn word_structure(&self) -> &[u32] {
        &self.word_structure
    }

    /// 同義語グループIDの列を返します。持たない世代の辞書では空です。
    pub fn synonym_group_ids(&self) -> &[u32] {
        &self.synonym_group_ids
    }
}

/// 語の詳細情報の列
///
/// 語IDごとの格納位置を引く表と、可変長の本体からなります。本体は
/// アクセスのたびに復号します。
pub struct WordInfoList<'a> {
    bytes: &'a [u8],
    offset: usize,
    word_size: u32,
    has_synonym_group_ids: bool,
}

impl<'a> WordInfoList<'a> {
    /// # 引数
    ///
    ///  - `bytes`: 辞書全体のバイト列。格納位置の表が辞書先頭からの
    ///    絶対位置を持つためです。
    ///  - `offset`: 格納位置の表の開始位置
    ///  - `word_size`: 語数
    ///  - `has_synonym_group_ids`: 同義語グループIDを持つ世代かどうか
    pub const fn new(
        bytes: &'a [u8],
        offset: usize,
        word_size: u32,
        has_synonym_group_ids: bool,
    ) -> Self {
        Self {
            bytes,
            offset,
            word_size,
            has_synonym_group_ids,
        }
    }

    /// 語数を返します。
    #[inline(always)]
    pub const fn size(&self) -> u32 {
        self.word_size
    }

    /// 格納位置の表の先頭アドレス。同じ辞書バイト列を指すインスタンスの
    /// 同定に使います。
    pub(crate) fn region_ptr(&self) -> *const u8 {
        self.bytes[self.offset..].as_ptr()
    }

    fn word_offset(&self, word_id: u32) -> Result<usize> {
        let mut reader = BufReader::at(self.bytes, self.offset + 4 * usize::from_u32(word_id));
        Ok(usize::from_u32(reader.read_u32()?))
    }

    fn surface_of(&self, word_id: u32) -> Result<String> {
        let mut reader = BufReader::at(self.bytes, self.word_offset(word_id)?);
        reader.read_utf16_string()
    }

    /// 語の詳細情報を復号します。
    pub fn word_info(&self, word_id: u32) -> Result<WordInfo> {
        let mut reader = BufReader::at(self.bytes, self.word_offset(word_id)?);

        let surface = reader.read_utf16_string()?;
        let head_word_length = reader.read_string_length()?;
        let pos_id = reader.read_u16()?;
        let mut normalized_form = reader.read_utf16_string()?;
        if normalized_form.is_empty() {
            normalized_form = surface.clone();
        }
        let dictionary_form_word_id = reader.read_i32()?;
        let mut reading_form = reader.read_utf16_string()?;
        if reading_form.is_empty() {
            reading_form = surface.clone();
        }
        let a_unit_split = reader.read_u32_array()?;
        let b_unit_split = reader.read_u32_array()?;
        let word_structure = reader.read_u32_array()?;
        let synonym_group_ids = if self.has_synonym_group_ids {
            reader.read_u32_array()?
        } else {
            vec![]
        };

        // 辞書形は参照先の表層形だけを引く
        let dictionary_form =
            if dictionary_form_word_id >= 0 && dictionary_form_word_id as u32 != word_id {
                self.surface_of(dictionary_form_word_id as u32)?
            } else {
                surface.clone()
            };

        Ok(WordInfo {
            surface,
            head_word_length,
            pos_id,
            normalized_form,
            dictionary_form_word_id,
            dictionary_form,
            reading_form,
            a_unit_split,
            b_unit_split,
            word_structure,
            synonym_group_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::buffer::BufWriter;

    fn build_list(has_gids: bool) -> Vec<u8> {
        // 本体を先に作り、格納位置の表を先頭に置く
        let mut body = BufWriter::new();
        let mut offsets = vec![];

        offsets.push(body.position());
        body.put_utf16_string("走っ").unwrap();
        body.put_string_length("走っ".len() as u16).unwrap();
        body.put_u16(1);
        body.put_utf16_string("走る").unwrap();
        body.put_i32(1);
        body.put_utf16_string("ハシッ").unwrap();
        body.put_u32_array(&[]).unwrap();
        body.put_u32_array(&[]).unwrap();
        body.put_u32_array(&[]).unwrap();
        if has_gids {
            body.put_u32_array(&[5, 6]).unwrap();
        }

        offsets.push(body.position());
        body.put_utf16_string("走る").unwrap();
        body.put_string_length("走る".len() as u16).unwrap();
        body.put_u16(2);
        body.put_utf16_string("").unwrap();
        body.put_i32(-1);
        body.put_utf16_string("").unwrap();
        body.put_u32_array(&[0, 1]).unwrap();
        body.put_u32_array(&[1]).unwrap();
        body.put_u32_array(&[0]).unwrap();
        if has_gids {
            body.put_u32_array(&[]).unwrap();
        }

        let table_size = 4 * offsets.len();
        let mut writer = BufWriter::new();
        for offset in offsets {
            writer.put_u32((table_size + offset) as u32);
        }
        writer.put_slice(&body.into_vec());
        writer.into_vec()
    }

    #[test]
    fn test_word_info() {
        let bytes = build_list(true);
        let infos = WordInfoList::new(&bytes, 0, 2, true);
        assert_eq!(infos.size(), 2);

        let info = infos.word_info(0).unwrap();
        assert_eq!(info.surface(), "走っ");
        assert_eq!(info.head_word_length(), 6);
        assert_eq!(info.pos_id(), 1);
        assert_eq!(info.normalized_form(), "走る");
        assert_eq!(info.dictionary_form_word_id(), 1);
        assert_eq!(info.dictionary_form(), "走る");
        assert_eq!(info.reading_form(), "ハシッ");
        assert_eq!(info.synonym_group_ids(), &[5, 6]);
    }

    #[test]
    fn test_empty_forms_fall_back_to_surface() {
        let bytes = build_list(true);
        let infos = WordInfoList::new(&bytes, 0, 2, true);

        let info = infos.word_info(1).unwrap();
        assert_eq!(info.surface(), "走る");
        assert_eq!(info.normalized_form(), "走る");
        assert_eq!(info.dictionary_form_word_id(), -1);
        assert_eq!(info.dictionary_form(), "走る");
        assert_eq!(info.reading_form(), "走る");
        assert_eq!(info.a_unit_split(), &[0, 1]);
        assert_eq!(info.b_unit_split(), &[1]);
        assert_eq!(info.word_structure(), &[0]);
        assert_eq!(info.synonym_group_ids(), &[] as &[u32]);
    }

    #[test]
    fn test_without_synonym_group_ids() {
        let bytes = build_list(false);
        let infos = WordInfoList::new(&bytes, 0, 2, false);
        let info = infos.word_info(0).unwrap();
        assert_eq!(info.reading_form(), "ハシッ");
        assert_eq!(info.synonym_group_ids(), &[] as &[u32]);
    }

    #[test]
    fn test_corrupt_offset() {
        let bytes = build_list(true);
        let infos = WordInfoList::new(&bytes, 0, 2, true);
        assert!(infos.word_info(2).is_err());
    }
}
