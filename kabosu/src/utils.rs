//! 内部ユーティリティ
//!
//! モジュール間で共有される型変換ヘルパーを提供します。

/// u32からの無条件変換を提供するトレイト
///
/// 辞書内の語IDや配列添字はu32で保持されるため、
/// スライスアクセス時のusizeへの変換が頻出します。
/// 失敗しないことが保証できる環境でのみ実装されます。
pub trait FromU32 {
    /// u32値から実装型の値を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u32() {
        assert_eq!(usize::from_u32(0), 0);
        assert_eq!(usize::from_u32(u32::MAX), 0xFFFF_FFFF);
    }
}
