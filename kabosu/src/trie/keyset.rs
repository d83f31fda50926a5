//! ソート済みキー集合のビュー
//!
//! ダブル配列の構築器に渡すキーと値のペアを、コピーせずに参照します。

/// ソート済みキー列（と任意の値列）への参照
///
/// キーは符号なしバイト列の辞書式順序で昇順に並んでいる必要があります。
/// 値列が無い場合、各キーの値はキーのインデックスになります。
pub(crate) struct Keyset<'a, K> {
    keys: &'a [K],
    values: Option<&'a [u32]>,
}

impl<'a, K> Keyset<'a, K>
where
    K: AsRef<[u8]>,
{
    pub(crate) const fn new(keys: &'a [K], values: Option<&'a [u32]>) -> Self {
        Self { keys, values }
    }

    #[inline(always)]
    pub(crate) fn num_keys(&self) -> usize {
        self.keys.len()
    }

    #[inline(always)]
    pub(crate) fn key(&self, key_id: usize) -> &[u8] {
        self.keys[key_id].as_ref()
    }

    /// キーの`byte_id`番目のバイトを返します。キー長を越えた位置は0です。
    #[inline(always)]
    pub(crate) fn key_byte(&self, key_id: usize, byte_id: usize) -> u8 {
        let key = self.keys[key_id].as_ref();
        if byte_id >= key.len() {
            0
        } else {
            key[byte_id]
        }
    }

    #[inline(always)]
    pub(crate) const fn has_values(&self) -> bool {
        self.values.is_some()
    }

    #[inline(always)]
    pub(crate) fn value(&self, key_id: usize) -> u32 {
        match self.values {
            Some(values) => values[key_id],
            None => key_id as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_byte_past_end() {
        let keys: &[&[u8]] = &[b"ab"];
        let keyset = Keyset::new(keys, None);
        assert_eq!(keyset.key_byte(0, 0), b'a');
        assert_eq!(keyset.key_byte(0, 1), b'b');
        assert_eq!(keyset.key_byte(0, 2), 0);
        assert_eq!(keyset.key_byte(0, 100), 0);
    }

    #[test]
    fn test_value_fallback() {
        let keys: &[&[u8]] = &[b"a", b"b"];
        let keyset = Keyset::new(keys, None);
        assert!(!keyset.has_values());
        assert_eq!(keyset.value(0), 0);
        assert_eq!(keyset.value(1), 1);

        let values = [10, 20];
        let keyset = Keyset::new(keys, Some(&values));
        assert!(keyset.has_values());
        assert_eq!(keyset.value(1), 20);
    }
}
