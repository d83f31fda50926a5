//! 辞書バイナリのバージョン識別子
//!
//! 先頭8バイトの値で辞書の種別と世代を見分けます。世代によって
//! 文法ブロックや同義語グループIDの有無が変わります。

/// 初期のシステム辞書
pub const SYSTEM_DICT_VERSION_1: u64 = 0x7366_d3f1_8bd1_11e7;

/// 同義語グループIDを持つシステム辞書
pub const SYSTEM_DICT_VERSION_2: u64 = 0xce9f_011a_9239_4434;

/// 初期のユーザー辞書。品詞をシステム辞書に依存します。
pub const USER_DICT_VERSION_1: u64 = 0xa50f_3118_8bd2_11e7;

/// 文法ブロックを持つユーザー辞書
pub const USER_DICT_VERSION_2: u64 = 0x9fde_b5a9_0168_d868;

/// 同義語グループIDを持つユーザー辞書
pub const USER_DICT_VERSION_3: u64 = 0xca98_1175_6ff6_4fb0;

/// システム辞書のバージョンかを判定します。
#[inline(always)]
pub const fn is_system_dictionary(version: u64) -> bool {
    version == SYSTEM_DICT_VERSION_1 || version == SYSTEM_DICT_VERSION_2
}

/// ユーザー辞書のバージョンかを判定します。
#[inline(always)]
pub const fn is_user_dictionary(version: u64) -> bool {
    version == USER_DICT_VERSION_1
        || version == USER_DICT_VERSION_2
        || version == USER_DICT_VERSION_3
}

/// 文法ブロックを持つバージョンかを判定します。
#[inline(always)]
pub const fn has_grammar(version: u64) -> bool {
    is_system_dictionary(version)
        || version == USER_DICT_VERSION_2
        || version == USER_DICT_VERSION_3
}

/// 語彙素に同義語グループIDを持つバージョンかを判定します。
#[inline(always)]
pub const fn has_synonym_group_ids(version: u64) -> bool {
    version == SYSTEM_DICT_VERSION_2 || version == USER_DICT_VERSION_3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(is_system_dictionary(SYSTEM_DICT_VERSION_1));
        assert!(is_system_dictionary(SYSTEM_DICT_VERSION_2));
        assert!(!is_system_dictionary(USER_DICT_VERSION_3));

        assert!(is_user_dictionary(USER_DICT_VERSION_1));
        assert!(is_user_dictionary(USER_DICT_VERSION_2));
        assert!(is_user_dictionary(USER_DICT_VERSION_3));
        assert!(!is_user_dictionary(SYSTEM_DICT_VERSION_1));

        assert!(!is_system_dictionary(0));
        assert!(!is_user_dictionary(0));
    }

    #[test]
    fn test_capabilities() {
        assert!(has_grammar(SYSTEM_DICT_VERSION_1));
        assert!(has_grammar(SYSTEM_DICT_VERSION_2));
        assert!(!has_grammar(USER_DICT_VERSION_1));
        assert!(has_grammar(USER_DICT_VERSION_2));
        assert!(has_grammar(USER_DICT_VERSION_3));

        assert!(has_synonym_group_ids(SYSTEM_DICT_VERSION_2));
        assert!(has_synonym_group_ids(USER_DICT_VERSION_3));
        assert!(!has_synonym_group_ids(SYSTEM_DICT_VERSION_1));
        assert!(!has_synonym_group_ids(USER_DICT_VERSION_2));
    }
}
