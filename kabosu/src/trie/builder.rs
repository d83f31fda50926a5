//! ダブル配列の構築
//!
//! 値付きのキー集合はまずDAWGに最小化してから、値なしのキー集合は
//! 直接、ダブル配列に配置します。空きスロットは直近16ブロック分だけを
//! 循環リストで管理し、それより古いブロックは順次確定します。

use crate::errors::{KabosuError, Result};
use crate::trie::dawg::{Dawg, DawgBuilder, MAX_VALUE};
use crate::trie::keyset::Keyset;
use crate::utils::FromU32;

const BLOCK_SIZE: u32 = 256;
const NUM_EXTRA_BLOCKS: u32 = 16;
const NUM_EXTRAS: u32 = BLOCK_SIZE * NUM_EXTRA_BLOCKS;

const UPPER_MASK: u32 = 0xFF << 21;
const LOWER_MASK: u32 = 0xFF;

/// 構築中のダブル配列ユニット
///
/// 検索時の符号化と互換です。オフセットは下位8ビットが0なら8ビット
/// 右に詰めた拡張形式で格納します。
#[derive(Default, Clone, Copy)]
struct BuilderUnit(u32);

impl BuilderUnit {
    #[inline(always)]
    const fn get(self) -> u32 {
        self.0
    }

    #[inline(always)]
    fn set_has_leaf(&mut self, has_leaf: bool) {
        if has_leaf {
            self.0 |= 1 << 8;
        } else {
            self.0 &= !(1 << 8);
        }
    }

    #[inline(always)]
    fn set_value(&mut self, value: u32) {
        self.0 = value | (1 << 31);
    }

    #[inline(always)]
    fn set_label(&mut self, label: u8) {
        self.0 = (self.0 & !0xFF) | u32::from(label);
    }

    fn set_offset(&mut self, offset: u32) -> Result<()> {
        if offset >= 1 << 29 {
            return Err(KabosuError::invalid_state(
                "failed to modify unit",
                "too large offset",
            ));
        }
        self.0 &= (1 << 31) | (1 << 8) | 0xFF;
        if offset < 1 << 21 {
            self.0 |= offset << 10;
        } else {
            self.0 |= (offset << 2) | (1 << 9);
        }
        Ok(())
    }
}

/// 未確定スロットの管理情報。循環リストのノードです。
#[derive(Default, Clone)]
struct Extra {
    prev: u32,
    next: u32,
    is_fixed: bool,
    is_used: bool,
}

pub(crate) struct DoubleArrayBuilder {
    units: Vec<BuilderUnit>,
    extras: Vec<Extra>,
    labels: Vec<u8>,
    table: Vec<u32>,
    extras_head: u32,
}

impl DoubleArrayBuilder {
    /// キー集合からダブル配列のユニット列を構築します。
    ///
    /// キーは符号なしバイト列の辞書式順序で昇順に並んでいる必要があります。
    pub(crate) fn build<K>(keyset: &Keyset<K>) -> Result<Vec<u32>>
    where
        K: AsRef<[u8]>,
    {
        let mut builder = Self::new();
        if keyset.has_values() {
            let mut dawg_builder = DawgBuilder::new();
            for i in 0..keyset.num_keys() {
                dawg_builder.insert(keyset.key(i), keyset.value(i))?;
            }
            let dawg = dawg_builder.finish();
            builder.build_from_dawg(&dawg)?;
        } else {
            builder.build_from_keyset(keyset)?;
        }
        builder.fix_all_blocks();
        Ok(builder.units.iter().map(|u| u.get()).collect())
    }

    fn new() -> Self {
        Self {
            units: vec![],
            extras: vec![Extra::default(); usize::from_u32(NUM_EXTRAS)],
            labels: vec![],
            table: vec![],
            extras_head: 0,
        }
    }

    #[inline(always)]
    fn extra(&self, id: u32) -> &Extra {
        &self.extras[usize::from_u32(id % NUM_EXTRAS)]
    }

    #[inline(always)]
    fn extra_mut(&mut self, id: u32) -> &mut Extra {
        &mut self.extras[usize::from_u32(id % NUM_EXTRAS)]
    }

    #[inline(always)]
    fn num_units(&self) -> u32 {
        self.units.len() as u32
    }

    fn init_root(&mut self) -> Result<()> {
        self.reserve_id(0);
        self.extra_mut(0).is_used = true;
        self.units[0].set_offset(1)?;
        self.units[0].set_label(0);
        Ok(())
    }

    fn build_from_dawg(&mut self, dawg: &Dawg) -> Result<()> {
        self.units.reserve(dawg.size().next_power_of_two());
        self.table.clear();
        self.table
            .resize(usize::from_u32(dawg.num_intersections()), 0);

        self.init_root()?;
        if dawg.child(Dawg::ROOT) == 0 {
            return Ok(());
        }

        // 再帰の代わりに明示的なスタックで深さ優先にたどる。子は兄弟連鎖の
        // 逆順に積み、再帰版と同一の配置順を保つ。
        let mut node_stack = vec![(Dawg::ROOT, 0u32)];
        while let Some((dawg_id, dic_id)) = node_stack.pop() {
            let dawg_child_id = dawg.child(dawg_id);
            if dawg.is_intersection(dawg_child_id) {
                let offset = self.table[usize::from_u32(dawg.intersection_id(dawg_child_id))];
                if offset != 0 {
                    let offset = offset ^ dic_id;
                    if offset & UPPER_MASK == 0 || offset & LOWER_MASK == 0 {
                        if dawg.is_leaf(dawg_child_id) {
                            self.units[usize::from_u32(dic_id)].set_has_leaf(true);
                        }
                        self.units[usize::from_u32(dic_id)].set_offset(offset)?;
                        continue;
                    }
                }
            }

            let offset = self.arrange_from_dawg(dawg, dawg_id, dic_id)?;
            if dawg.is_intersection(dawg_child_id) {
                self.table[usize::from_u32(dawg.intersection_id(dawg_child_id))] = offset;
            }

            let mut num_children = 0;
            let mut id = dawg_child_id;
            while id != 0 {
                num_children += 1;
                id = dawg.sibling(id);
            }
            // 兄弟連鎖のユニットIDは連番
            for i in (0..num_children).rev() {
                let child_id = dawg_child_id + i;
                let child_label = dawg.label(child_id);
                if child_label != 0 {
                    node_stack.push((child_id, offset ^ u32::from(child_label)));
                }
            }
        }
        Ok(())
    }

    fn arrange_from_dawg(&mut self, dawg: &Dawg, dawg_id: u32, dic_id: u32) -> Result<u32> {
        self.labels.clear();

        let mut dawg_child_id = dawg.child(dawg_id);
        while dawg_child_id != 0 {
            self.labels.push(dawg.label(dawg_child_id));
            dawg_child_id = dawg.sibling(dawg_child_id);
        }

        let offset = self.find_valid_offset(dic_id);
        self.units[usize::from_u32(dic_id)].set_offset(dic_id ^ offset)?;

        let mut dawg_child_id = dawg.child(dawg_id);
        for i in 0..self.labels.len() {
            let label = self.labels[i];
            let dic_child_id = offset ^ u32::from(label);
            self.reserve_id(dic_child_id);

            if dawg.is_leaf(dawg_child_id) {
                self.units[usize::from_u32(dic_id)].set_has_leaf(true);
                self.units[usize::from_u32(dic_child_id)].set_value(dawg.value(dawg_child_id));
            } else {
                self.units[usize::from_u32(dic_child_id)].set_label(label);
            }
            dawg_child_id = dawg.sibling(dawg_child_id);
        }
        self.extra_mut(offset).is_used = true;

        Ok(offset)
    }

    fn build_from_keyset<K>(&mut self, keyset: &Keyset<K>) -> Result<()>
    where
        K: AsRef<[u8]>,
    {
        self.units.reserve(keyset.num_keys().next_power_of_two());

        self.init_root()?;
        if keyset.num_keys() == 0 {
            return Ok(());
        }

        let mut node_stack = vec![(0, keyset.num_keys(), 0usize, 0u32)];
        let mut groups = vec![];
        while let Some((mut begin, end, depth, dic_id)) = node_stack.pop() {
            let offset = self.arrange_from_keyset(keyset, begin, end, depth, dic_id)?;

            // 終端キーを読み飛ばし、残りを次のバイトで区間に分ける
            while begin < end {
                if keyset.key_byte(begin, depth) != 0 {
                    break;
                }
                begin += 1;
            }
            if begin == end {
                continue;
            }

            groups.clear();
            let mut last_begin = begin;
            let mut last_label = keyset.key_byte(begin, depth);
            begin += 1;
            while begin < end {
                let label = keyset.key_byte(begin, depth);
                if label != last_label {
                    groups.push((last_begin, begin, last_label));
                    last_begin = begin;
                    last_label = label;
                }
                begin += 1;
            }
            groups.push((last_begin, end, last_label));

            for &(group_begin, group_end, label) in groups.iter().rev() {
                node_stack.push((group_begin, group_end, depth + 1, offset ^ u32::from(label)));
            }
        }
        Ok(())
    }

    fn arrange_from_keyset<K>(
        &mut self,
        keyset: &Keyset<K>,
        begin: usize,
        end: usize,
        depth: usize,
        dic_id: u32,
    ) -> Result<u32>
    where
        K: AsRef<[u8]>,
    {
        self.labels.clear();

        let mut value = None;
        for i in begin..end {
            let label = keyset.key_byte(i, depth);
            if label == 0 {
                if depth < keyset.key(i).len() {
                    return Err(KabosuError::invalid_argument(
                        "keys",
                        "invalid null character",
                    ));
                }
                if value.is_some() {
                    return Err(KabosuError::invalid_argument("keys", "duplicate key"));
                }
                let v = keyset.value(i);
                if v > MAX_VALUE {
                    return Err(KabosuError::invalid_argument(
                        "values",
                        format!("must not exceed {MAX_VALUE}: {v}"),
                    ));
                }
                value = Some(v);
            }

            match self.labels.last() {
                None => self.labels.push(label),
                Some(&last) if label != last => {
                    if label < last {
                        return Err(KabosuError::invalid_argument("keys", "wrong key order"));
                    }
                    self.labels.push(label);
                }
                _ => {}
            }
        }

        let offset = self.find_valid_offset(dic_id);
        self.units[usize::from_u32(dic_id)].set_offset(dic_id ^ offset)?;

        for i in 0..self.labels.len() {
            let label = self.labels[i];
            let dic_child_id = offset ^ u32::from(label);
            self.reserve_id(dic_child_id);
            if label == 0 {
                self.units[usize::from_u32(dic_id)].set_has_leaf(true);
                // ラベル0はこの区間に終端キーがあるときだけ現れるので、値は必ず設定済み
                self.units[usize::from_u32(dic_child_id)].set_value(value.unwrap_or(0));
            } else {
                self.units[usize::from_u32(dic_child_id)].set_label(label);
            }
        }
        self.extra_mut(offset).is_used = true;

        Ok(offset)
    }

    fn find_valid_offset(&self, id: u32) -> u32 {
        if self.extras_head >= self.num_units() {
            return self.num_units() | (id & LOWER_MASK);
        }

        let mut unfixed_id = self.extras_head;
        loop {
            let offset = unfixed_id ^ u32::from(self.labels[0]);
            if self.is_valid_offset(id, offset) {
                return offset;
            }
            unfixed_id = self.extra(unfixed_id).next;
            if unfixed_id == self.extras_head {
                break;
            }
        }
        self.num_units() | (id & LOWER_MASK)
    }

    fn is_valid_offset(&self, id: u32, offset: u32) -> bool {
        if self.extra(offset).is_used {
            return false;
        }

        let rel_offset = id ^ offset;
        if rel_offset & LOWER_MASK != 0 && rel_offset & UPPER_MASK != 0 {
            return false;
        }

        for i in 1..self.labels.len() {
            if self.extra(offset ^ u32::from(self.labels[i])).is_fixed {
                return false;
            }
        }
        true
    }

    fn reserve_id(&mut self, id: u32) {
        if id >= self.num_units() {
            self.expand_units();
        }

        if id == self.extras_head {
            self.extras_head = self.extra(id).next;
            if self.extras_head == id {
                self.extras_head = self.num_units();
            }
        }
        let prev = self.extra(id).prev;
        let next = self.extra(id).next;
        self.extra_mut(prev).next = next;
        self.extra_mut(next).prev = prev;
        self.extra_mut(id).is_fixed = true;
    }

    fn expand_units(&mut self) {
        let src_num_units = self.num_units();
        let src_num_blocks = src_num_units / BLOCK_SIZE;

        let dest_num_units = src_num_units + BLOCK_SIZE;
        let dest_num_blocks = src_num_blocks + 1;

        // 循環リストの管理範囲から外れるブロックを先に確定する
        if dest_num_blocks > NUM_EXTRA_BLOCKS {
            self.fix_block(src_num_blocks - NUM_EXTRA_BLOCKS);
        }

        self.units
            .resize(usize::from_u32(dest_num_units), BuilderUnit::default());

        if dest_num_blocks > NUM_EXTRA_BLOCKS {
            for id in src_num_units..dest_num_units {
                let extra = self.extra_mut(id);
                extra.is_used = false;
                extra.is_fixed = false;
            }
        }

        for i in src_num_units + 1..dest_num_units {
            self.extra_mut(i - 1).next = i;
            self.extra_mut(i).prev = i - 1;
        }
        self.extra_mut(src_num_units).prev = dest_num_units - 1;
        self.extra_mut(dest_num_units - 1).next = src_num_units;

        // 新しいブロックをリストの末尾（先頭の直前）に継ぎ足す。リストが
        // 空のときはextras_headが旧num_unitsを指しており、そのまま新しい
        // ブロックだけで輪が閉じる。
        let head = self.extras_head;
        let head_prev = self.extra(head).prev;
        self.extra_mut(src_num_units).prev = head_prev;
        self.extra_mut(dest_num_units - 1).next = head;
        self.extra_mut(head_prev).next = src_num_units;
        self.extra_mut(head).prev = dest_num_units - 1;
    }

    fn fix_all_blocks(&mut self) {
        let num_blocks = self.num_units() / BLOCK_SIZE;
        let begin = num_blocks.saturating_sub(NUM_EXTRA_BLOCKS);
        for block_id in begin..num_blocks {
            self.fix_block(block_id);
        }
    }

    /// ブロック内の未確定スロットをすべて確定します。
    ///
    /// 未確定スロットには、ブロック内の未使用オフセットとのXORをラベルとして
    /// 書き込みます。どの遷移とも一致しない値になるため、検索が誤って
    /// 成功することはありません。
    fn fix_block(&mut self, block_id: u32) {
        let begin = block_id * BLOCK_SIZE;
        let end = begin + BLOCK_SIZE;

        let mut unused_offset = 0;
        for offset in begin..end {
            if !self.extra(offset).is_used {
                unused_offset = offset;
                break;
            }
        }

        for id in begin..end {
            if !self.extra(id).is_fixed {
                self.reserve_id(id);
                self.units[usize::from_u32(id)].set_label((id ^ unused_offset) as u8);
            }
        }
    }
}
