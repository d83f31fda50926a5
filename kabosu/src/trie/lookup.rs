//! 割り当てなしの接頭辞検索カーソル

use crate::trie::DoubleArray;

/// [`DoubleArray::common_prefix_search`]と同じ検索を、結果のベクタを
/// 作らずに1件ずつ取り出すカーソルです。
///
/// 呼び出しのたびに次の一致まで遷移を進めます。検索途中の状態は
/// カーソル側に保持されるため、同じキーを複数のトライへ順に引き直す
/// 用途（辞書の重ね合わせ）でも割り当てが発生しません。
///
/// # 使用例
///
/// ```
/// use kabosu::trie::DoubleArray;
/// use kabosu::trie::lookup::DoubleArrayLookup;
///
/// let keys: &[&[u8]] = &[b"a", b"ab"];
/// let values = &[1, 2];
/// let trie = DoubleArray::build(keys, Some(values)).unwrap();
///
/// let mut lookup = DoubleArrayLookup::new(&trie, b"abc", 0, 3);
/// assert!(lookup.next());
/// assert_eq!((lookup.value(), lookup.end_offset()), (1, 1));
/// assert!(lookup.next());
/// assert_eq!((lookup.value(), lookup.end_offset()), (2, 2));
/// assert!(!lookup.next());
/// ```
pub struct DoubleArrayLookup<'a> {
    array: &'a DoubleArray<'a>,
    key: &'a [u8],
    limit: usize,
    start_offset: usize,
    offset: usize,
    node_pos: u32,
    node_value: u32,
}

impl<'a> DoubleArrayLookup<'a> {
    /// `key[offset..limit]`を検索するカーソルを作ります。
    pub fn new(array: &'a DoubleArray<'a>, key: &'a [u8], offset: usize, limit: usize) -> Self {
        let mut lookup = Self {
            array,
            key,
            limit,
            start_offset: offset,
            offset,
            node_pos: 0,
            node_value: 0,
        };
        lookup.rewind();
        lookup
    }

    /// 検索対象のキー範囲を差し替え、カーソルを先頭に戻します。
    pub fn reset(&mut self, key: &'a [u8], offset: usize, limit: usize) {
        self.key = key;
        self.start_offset = offset;
        self.offset = offset;
        self.limit = limit;
        self.rewind();
    }

    /// 検索対象のトライを差し替えます。キー範囲はそのまま、カーソルは
    /// 開始位置に戻ります。
    pub fn set_array(&mut self, array: &'a DoubleArray<'a>) {
        self.array = array;
        self.offset = self.start_offset;
        self.rewind();
    }

    fn rewind(&mut self) {
        self.node_pos = 0;
        let unit = self.array.unit(self.node_pos);
        self.node_pos ^= unit.offset();
    }

    /// 次の一致まで検索を進めます。
    ///
    /// # 戻り値
    ///
    /// 一致が見つかれば`true`。このとき[`Self::value`]と
    /// [`Self::end_offset`]が新しい一致を指します。
    pub fn next(&mut self) -> bool {
        let mut node_pos = self.node_pos;
        while self.offset < self.limit {
            let k = u32::from(self.key[self.offset]);
            node_pos ^= k;
            let unit = self.array.unit(node_pos);
            if unit.label() != k {
                // これ以上の一致はない
                self.offset = self.limit;
                self.node_pos = node_pos;
                return false;
            }

            node_pos ^= unit.offset();
            if unit.has_leaf() {
                self.node_value = self.array.unit(node_pos).value();
                self.offset += 1;
                self.node_pos = node_pos;
                return true;
            }
            self.offset += 1;
        }
        false
    }

    /// 直近の一致の値を返します。
    #[inline(always)]
    pub const fn value(&self) -> u32 {
        self.node_value
    }

    /// 直近の一致のキー内終端位置を返します。
    #[inline(always)]
    pub const fn end_offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_common_prefix_search() {
        let keys: &[&[u8]] = &[b"a", b"ab", b"abcde", b"b"];
        let values = &[0, 1, 2, 3];
        let trie = DoubleArray::build(keys, Some(values)).unwrap();

        let key = b"abcdef";
        let expected = trie.common_prefix_search(key, 0, usize::MAX);
        let mut lookup = DoubleArrayLookup::new(&trie, key, 0, key.len());
        let mut actual = vec![];
        while lookup.next() {
            actual.push((lookup.value(), lookup.end_offset()));
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_no_match_exhausts_cursor() {
        let keys: &[&[u8]] = &[b"ab"];
        let values = &[7];
        let trie = DoubleArray::build(keys, Some(values)).unwrap();

        let mut lookup = DoubleArrayLookup::new(&trie, b"ax", 0, 2);
        assert!(!lookup.next());
        assert!(!lookup.next());
        assert_eq!(lookup.end_offset(), 2);
    }

    #[test]
    fn test_reset() {
        let keys: &[&[u8]] = &[b"a", b"ab"];
        let values = &[1, 2];
        let trie = DoubleArray::build(keys, Some(values)).unwrap();

        let mut lookup = DoubleArrayLookup::new(&trie, b"ab", 0, 2);
        assert!(lookup.next());
        lookup.reset(b"xa", 1, 2);
        assert!(lookup.next());
        assert_eq!((lookup.value(), lookup.end_offset()), (1, 2));
        assert!(!lookup.next());
    }

    #[test]
    fn test_set_array_restarts_key() {
        let keys1: &[&[u8]] = &[b"ab"];
        let keys2: &[&[u8]] = &[b"a", b"abc"];
        let trie1 = DoubleArray::build(keys1, Some(&[10])).unwrap();
        let trie2 = DoubleArray::build(keys2, Some(&[20, 30])).unwrap();

        let mut lookup = DoubleArrayLookup::new(&trie1, b"abc", 0, 3);
        assert!(lookup.next());
        assert_eq!((lookup.value(), lookup.end_offset()), (10, 2));
        assert!(!lookup.next());

        lookup.set_array(&trie2);
        assert!(lookup.next());
        assert_eq!((lookup.value(), lookup.end_offset()), (20, 1));
        assert!(lookup.next());
        assert_eq!((lookup.value(), lookup.end_offset()), (30, 3));
        assert!(!lookup.next());
    }
}
