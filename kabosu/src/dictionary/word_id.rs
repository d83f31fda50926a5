//! 辞書IDと語IDの多重化
//!
//! 32ビットの語IDの上位4ビットを辞書番号、下位28ビットを辞書内の
//! 語番号として使います。辞書番号0はシステム辞書です。

use crate::errors::{KabosuError, Result};

/// 辞書内の語IDの上限
pub const MAX_WORD_ID: u32 = 0x0fff_ffff;

/// 辞書番号の上限
pub const MAX_DICTIONARY_ID: u32 = 0xf;

/// 辞書番号と語番号から多重化済みの語IDを作ります。
pub fn make(dictionary_id: u32, word_id: u32) -> Result<u32> {
    if word_id > MAX_WORD_ID {
        return Err(KabosuError::invalid_argument(
            "word_id",
            format!("word ID is too large: {word_id}"),
        ));
    }
    if dictionary_id > MAX_DICTIONARY_ID {
        return Err(KabosuError::invalid_argument(
            "dictionary_id",
            format!("dictionary ID is too large: {dictionary_id}"),
        ));
    }
    Ok(make_unchecked(dictionary_id, word_id))
}

/// 範囲検査なしで語IDを多重化します。
#[inline(always)]
pub const fn make_unchecked(dictionary_id: u32, word_id: u32) -> u32 {
    (dictionary_id << 28) | word_id
}

/// 語IDから辞書番号を取り出します。
#[inline(always)]
pub const fn dic(word_id: u32) -> u32 {
    word_id >> 28
}

/// 語IDから辞書内の語番号を取り出します。
#[inline(always)]
pub const fn word(word_id: u32) -> u32 {
    word_id & MAX_WORD_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_split() {
        let id = make(3, 0x0123_4567).unwrap();
        assert_eq!(dic(id), 3);
        assert_eq!(word(id), 0x0123_4567);

        assert_eq!(make(0, 0).unwrap(), 0);
        assert_eq!(dic(make(15, MAX_WORD_ID).unwrap()), 15);
        assert_eq!(word(make(15, MAX_WORD_ID).unwrap()), MAX_WORD_ID);
    }

    #[test]
    fn test_out_of_range() {
        assert!(make(0, MAX_WORD_ID + 1).is_err());
        assert!(make(MAX_DICTIONARY_ID + 1, 0).is_err());
    }
}
