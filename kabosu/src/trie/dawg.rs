//! DAWG（有向非巡回語グラフ）の構築
//!
//! ソート済みキーをトライに挿入しながら、確定した接尾辞の兄弟連鎖を
//! ハッシュ表で共有化（最小化）します。共有されたノードは「交差点」として
//! ビットベクトルに記録され、ダブル配列の構築時に物理的な配置の再利用に
//! 使われます。

use crate::errors::{KabosuError, Result};
use crate::trie::bit_vector::BitVector;
use crate::utils::FromU32;

const INITIAL_TABLE_SIZE: usize = 1 << 10;

/// 格納可能な値の上限。最上位ビットはユニット符号化で予約されています。
pub(crate) const MAX_VALUE: u32 = 0x7fff_ffff;

/// 構築中のトライノード
///
/// 終端ノードは`child`を値の格納に再利用します。
#[derive(Default, Clone)]
struct Node {
    child: u32,
    sibling: u32,
    label: u8,
    is_state: bool,
    has_sibling: bool,
}

impl Node {
    #[inline(always)]
    fn set_value(&mut self, value: u32) {
        self.child = value;
    }

    /// ノードをユニット表現に詰めます。ラベル0（終端）では`is_state`の
    /// ビットを持たず、値のために1ビット多く使います。
    #[inline(always)]
    fn unit(&self) -> u32 {
        if self.label == 0 {
            (self.child << 1) | u32::from(self.has_sibling)
        } else {
            (self.child << 2) | (u32::from(self.is_state) << 1) | u32::from(self.has_sibling)
        }
    }
}

/// 最小化済みDAWG
pub(crate) struct Dawg {
    units: Vec<u32>,
    labels: Vec<u8>,
    is_intersections: BitVector,
}

impl Dawg {
    pub(crate) const ROOT: u32 = 0;

    #[inline(always)]
    pub(crate) fn child(&self, id: u32) -> u32 {
        self.units[usize::from_u32(id)] >> 2
    }

    #[inline(always)]
    pub(crate) fn sibling(&self, id: u32) -> u32 {
        if self.has_sibling(id) {
            id + 1
        } else {
            0
        }
    }

    #[inline(always)]
    fn has_sibling(&self, id: u32) -> bool {
        self.units[usize::from_u32(id)] & 1 == 1
    }

    /// 終端ノードに格納された値を返します。`is_leaf(id)`が前提です。
    #[inline(always)]
    pub(crate) fn value(&self, id: u32) -> u32 {
        self.units[usize::from_u32(id)] >> 1
    }

    #[inline(always)]
    pub(crate) fn is_leaf(&self, id: u32) -> bool {
        self.label(id) == 0
    }

    #[inline(always)]
    pub(crate) fn label(&self, id: u32) -> u8 {
        self.labels[usize::from_u32(id)]
    }

    #[inline(always)]
    pub(crate) fn is_intersection(&self, id: u32) -> bool {
        self.is_intersections.get(id)
    }

    #[inline(always)]
    pub(crate) fn intersection_id(&self, id: u32) -> u32 {
        self.is_intersections.rank(id) - 1
    }

    #[inline(always)]
    pub(crate) fn num_intersections(&self) -> u32 {
        self.is_intersections.num_ones()
    }

    pub(crate) fn size(&self) -> usize {
        self.units.len()
    }
}

/// DAWG構築器
///
/// `insert`は符号なしバイト列の辞書式順序で昇順にキーを受け取ります。
/// 順序違反、重複キー、空キー、途中のヌルバイト、および符号化上限を
/// 越える値はエラーになります。
pub(crate) struct DawgBuilder {
    nodes: Vec<Node>,
    units: Vec<u32>,
    labels: Vec<u8>,
    is_intersections: BitVector,
    table: Vec<u32>,
    node_stack: Vec<u32>,
    recycle_bin: Vec<u32>,
    num_states: u32,
}

impl DawgBuilder {
    pub(crate) fn new() -> Self {
        let mut builder = Self {
            nodes: vec![],
            units: vec![],
            labels: vec![],
            is_intersections: BitVector::new(),
            table: vec![0; INITIAL_TABLE_SIZE],
            node_stack: vec![],
            recycle_bin: vec![],
            num_states: 1,
        };
        builder.append_node();
        // ユニット0は予約。ハッシュ表の空きスロット印0と衝突しないようにする。
        builder.append_unit();
        builder.nodes[0].label = 0xFF;
        builder.node_stack.push(0);
        builder
    }

    pub(crate) fn insert(&mut self, key: &[u8], value: u32) -> Result<()> {
        if value > MAX_VALUE {
            return Err(KabosuError::invalid_argument(
                "value",
                format!("must not exceed {MAX_VALUE}: {value}"),
            ));
        }
        if key.is_empty() {
            return Err(KabosuError::invalid_argument("key", "zero-length key"));
        }
        if key.contains(&0) {
            return Err(KabosuError::invalid_argument("key", "invalid null character"));
        }

        let mut id = 0;
        let mut key_pos = 0;

        // 直前のキーと一致する接頭辞をたどり、分岐点で閉じた接尾辞をflushする
        while key_pos <= key.len() {
            let child_id = self.nodes[usize::from_u32(id)].child;
            if child_id == 0 {
                break;
            }

            let key_label = if key_pos < key.len() { key[key_pos] } else { 0 };
            let unit_label = self.nodes[usize::from_u32(child_id)].label;
            if key_label < unit_label {
                return Err(KabosuError::invalid_argument("key", "wrong key order"));
            } else if key_label > unit_label {
                self.nodes[usize::from_u32(child_id)].has_sibling = true;
                self.flush(child_id);
                break;
            }
            id = child_id;
            key_pos += 1;
        }

        if key_pos > key.len() {
            return Err(KabosuError::invalid_argument("key", "duplicate key"));
        }

        while key_pos <= key.len() {
            let key_label = if key_pos < key.len() { key[key_pos] } else { 0 };
            let child_id = self.append_node();

            if self.nodes[usize::from_u32(id)].child == 0 {
                self.nodes[usize::from_u32(child_id)].is_state = true;
            }
            self.nodes[usize::from_u32(child_id)].sibling = self.nodes[usize::from_u32(id)].child;
            self.nodes[usize::from_u32(child_id)].label = key_label;
            self.nodes[usize::from_u32(id)].child = child_id;
            self.node_stack.push(child_id);

            id = child_id;
            key_pos += 1;
        }
        self.nodes[usize::from_u32(id)].set_value(value);
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Dawg {
        self.flush(0);
        self.units[0] = self.nodes[0].unit();
        self.labels[0] = self.nodes[0].label;
        self.is_intersections.build();
        Dawg {
            units: self.units,
            labels: self.labels,
            is_intersections: self.is_intersections,
        }
    }

    /// スタック上で`id`より深いノードを兄弟連鎖単位でユニット列に確定します。
    ///
    /// 同一の連鎖が既に存在する場合はそれを再利用し、共有先を交差点として
    /// 記録します。最後に`id`自身をスタックから外します（書き出しはしません）。
    fn flush(&mut self, id: u32) {
        loop {
            let Some(&stack_top) = self.node_stack.last() else {
                break;
            };
            if stack_top == id {
                break;
            }
            self.node_stack.pop();
            let node_id = stack_top;

            if self.num_states >= (self.table.len() - (self.table.len() >> 2)) as u32 {
                self.expand_table();
            }

            let mut num_siblings = 0u32;
            let mut i = node_id;
            while i != 0 {
                num_siblings += 1;
                i = self.nodes[usize::from_u32(i)].sibling;
            }

            let (mut match_id, hash_id) = self.find_node(node_id);
            if match_id != 0 {
                self.is_intersections.set(match_id, true);
            } else {
                // 連鎖を降順に書き出し、最小ラベルの子が最小のユニットIDを持つようにする
                let mut unit_id = 0;
                for _ in 0..num_siblings {
                    unit_id = self.append_unit();
                }
                let mut i = node_id;
                while i != 0 {
                    self.units[usize::from_u32(unit_id)] = self.nodes[usize::from_u32(i)].unit();
                    self.labels[usize::from_u32(unit_id)] = self.nodes[usize::from_u32(i)].label;
                    unit_id -= 1;
                    i = self.nodes[usize::from_u32(i)].sibling;
                }
                match_id = unit_id + 1;
                self.table[hash_id] = match_id;
                self.num_states += 1;
            }

            let mut i = node_id;
            while i != 0 {
                let next = self.nodes[usize::from_u32(i)].sibling;
                self.free_node(i);
                i = next;
            }

            if let Some(&parent) = self.node_stack.last() {
                self.nodes[usize::from_u32(parent)].child = match_id;
            }
        }
        self.node_stack.pop();
    }

    fn expand_table(&mut self) {
        let table_size = self.table.len() << 1;
        self.table.clear();
        self.table.resize(table_size, 0);

        for id in 1..self.units.len() as u32 {
            if self.labels[usize::from_u32(id)] == 0 || self.is_state(id) {
                let hash_id = self.find_unit(id);
                self.table[hash_id] = id;
            }
        }
    }

    fn find_unit(&self, id: u32) -> usize {
        let mask = self.table.len() - 1;
        let mut hash_id = usize::from_u32(self.hash_unit(id)) & mask;
        loop {
            if self.table[hash_id] == 0 {
                return hash_id;
            }
            hash_id = (hash_id + 1) & mask;
        }
    }

    fn find_node(&self, node_id: u32) -> (u32, usize) {
        let mask = self.table.len() - 1;
        let mut hash_id = usize::from_u32(self.hash_node(node_id)) & mask;
        loop {
            let unit_id = self.table[hash_id];
            if unit_id == 0 {
                return (0, hash_id);
            }
            if self.are_equal(node_id, unit_id) {
                return (unit_id, hash_id);
            }
            hash_id = (hash_id + 1) & mask;
        }
    }

    /// ノードの兄弟連鎖と、`unit_id`から始まるユニット連鎖が一致するかを
    /// 判定します。連鎖長、そして各要素のユニット表現とラベルを比較します。
    fn are_equal(&self, node_id: u32, unit_id: u32) -> bool {
        let mut unit_id = unit_id;
        let mut i = self.nodes[usize::from_u32(node_id)].sibling;
        while i != 0 {
            if !self.has_sibling(unit_id) {
                return false;
            }
            unit_id += 1;
            i = self.nodes[usize::from_u32(i)].sibling;
        }
        if self.has_sibling(unit_id) {
            return false;
        }

        let mut i = node_id;
        while i != 0 {
            let node = &self.nodes[usize::from_u32(i)];
            if node.unit() != self.units[usize::from_u32(unit_id)]
                || node.label != self.labels[usize::from_u32(unit_id)]
            {
                return false;
            }
            i = node.sibling;
            unit_id -= 1;
        }
        true
    }

    fn hash_unit(&self, id: u32) -> u32 {
        let mut hash_value = 0;
        let mut id = id;
        while id != 0 {
            let unit = self.units[usize::from_u32(id)];
            let label = self.labels[usize::from_u32(id)];
            hash_value ^= hash((u32::from(label) << 24) ^ unit);
            id = if self.has_sibling(id) { id + 1 } else { 0 };
        }
        hash_value
    }

    fn hash_node(&self, node_id: u32) -> u32 {
        let mut hash_value = 0;
        let mut i = node_id;
        while i != 0 {
            let node = &self.nodes[usize::from_u32(i)];
            hash_value ^= hash((u32::from(node.label) << 24) ^ node.unit());
            i = node.sibling;
        }
        hash_value
    }

    #[inline(always)]
    fn has_sibling(&self, id: u32) -> bool {
        self.units[usize::from_u32(id)] & 1 == 1
    }

    #[inline(always)]
    fn is_state(&self, id: u32) -> bool {
        self.units[usize::from_u32(id)] & 2 == 2
    }

    fn append_unit(&mut self) -> u32 {
        self.is_intersections.append();
        self.units.push(0);
        self.labels.push(0);
        self.is_intersections.size() - 1
    }

    fn append_node(&mut self) -> u32 {
        if let Some(id) = self.recycle_bin.pop() {
            self.nodes[usize::from_u32(id)] = Node::default();
            id
        } else {
            let id = self.nodes.len() as u32;
            self.nodes.push(Node::default());
            id
        }
    }

    fn free_node(&mut self, id: u32) {
        self.recycle_bin.push(id);
    }
}

/// 32ビット整数のミキシング関数
///
/// 算術右シフトを使う点まで含めて既存の辞書と同じ挙動にしています。
#[inline(always)]
fn hash(key: u32) -> u32 {
    let mut key = key as i32;
    key = (!key).wrapping_add(key << 15);
    key ^= key >> 12;
    key = key.wrapping_add(key << 2);
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    key as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[(&[u8], u32)]) -> Dawg {
        let mut builder = DawgBuilder::new();
        for &(key, value) in keys {
            builder.insert(key, value).unwrap();
        }
        builder.finish()
    }

    fn lookup(dawg: &Dawg, key: &[u8]) -> Option<u32> {
        let mut id = Dawg::ROOT;
        for i in 0..=key.len() {
            let label = if i < key.len() { key[i] } else { 0 };
            let mut child = dawg.child(id);
            loop {
                if child == 0 {
                    return None;
                }
                if dawg.label(child) == label {
                    break;
                }
                child = dawg.sibling(child);
            }
            id = child;
        }
        Some(dawg.value(id))
    }

    #[test]
    fn test_insert_and_lookup() {
        let dawg = build(&[(b"a", 10), (b"ab", 20), (b"b", 30), (b"ba", 40)]);
        assert_eq!(lookup(&dawg, b"a"), Some(10));
        assert_eq!(lookup(&dawg, b"ab"), Some(20));
        assert_eq!(lookup(&dawg, b"b"), Some(30));
        assert_eq!(lookup(&dawg, b"ba"), Some(40));
        assert_eq!(lookup(&dawg, b"c"), None);
        assert_eq!(lookup(&dawg, b"abc"), None);
    }

    #[test]
    fn test_suffix_sharing() {
        // 同じ値を持つ同形の接尾辞は1つの連鎖に共有される
        let shared = build(&[(b"ax", 1), (b"bx", 1)]);
        let unshared = build(&[(b"ax", 1), (b"bx", 2)]);
        assert!(shared.size() < unshared.size());
        assert!(shared.num_intersections() > 0);
    }

    #[test]
    fn test_zero_length_key() {
        let mut builder = DawgBuilder::new();
        assert!(builder.insert(b"", 0).is_err());
    }

    #[test]
    fn test_null_character() {
        let mut builder = DawgBuilder::new();
        assert!(builder.insert(b"a\0b", 0).is_err());
    }

    #[test]
    fn test_too_large_value() {
        let mut builder = DawgBuilder::new();
        assert!(builder.insert(b"a", MAX_VALUE).is_ok());
        assert!(builder.insert(b"b", MAX_VALUE + 1).is_err());
    }

    #[test]
    fn test_wrong_key_order() {
        let mut builder = DawgBuilder::new();
        builder.insert(b"b", 0).unwrap();
        assert!(builder.insert(b"a", 1).is_err());

        let mut builder = DawgBuilder::new();
        builder.insert(b"ab", 0).unwrap();
        assert!(builder.insert(b"a", 1).is_err());
    }

    #[test]
    fn test_duplicate_key() {
        let mut builder = DawgBuilder::new();
        builder.insert(b"ab", 0).unwrap();
        assert!(builder.insert(b"ab", 1).is_err());
    }

    #[test]
    fn test_many_keys_force_table_growth() {
        let mut keys = vec![];
        for a in 1u8..=16 {
            for b in 1u8..=16 {
                for c in 1u8..=16 {
                    keys.push(vec![a, b, c]);
                }
            }
        }
        keys.sort();
        let mut builder = DawgBuilder::new();
        for (i, key) in keys.iter().enumerate() {
            builder.insert(key, i as u32).unwrap();
        }
        let dawg = builder.finish();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(lookup(&dawg, key), Some(i as u32));
        }
    }
}
