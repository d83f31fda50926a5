//! rank付きビットベクトル
//!
//! トライ構築時に共有ノード（交差点）へ密なIDを割り当てるために使用します。
//! `build()`で32ビットブロックごとのpopcount累積値を前計算し、
//! 以降のrankクエリをO(1)で処理します。

use crate::utils::FromU32;

const UNIT_SIZE: u32 = 32;

/// 追記専用のビットベクトル
#[derive(Default)]
pub(crate) struct BitVector {
    units: Vec<u32>,
    ranks: Vec<u32>,
    num_ones: u32,
    size: u32,
}

impl BitVector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 指定位置のビットを返します。
    #[inline(always)]
    pub(crate) fn get(&self, id: u32) -> bool {
        (self.units[usize::from_u32(id / UNIT_SIZE)] >> (id % UNIT_SIZE)) & 1 == 1
    }

    /// `[0, id]`（両端を含む）に立っているビット数を返します。
    ///
    /// `build()`を呼んだ後にのみ使用できます。
    #[inline(always)]
    pub(crate) fn rank(&self, id: u32) -> u32 {
        let unit_id = usize::from_u32(id / UNIT_SIZE);
        let mask = !0u32 >> (UNIT_SIZE - id % UNIT_SIZE - 1);
        self.ranks[unit_id] + (self.units[unit_id] & mask).count_ones()
    }

    pub(crate) fn set(&mut self, id: u32, bit: bool) {
        let unit_id = usize::from_u32(id / UNIT_SIZE);
        if bit {
            self.units[unit_id] |= 1 << (id % UNIT_SIZE);
        } else {
            self.units[unit_id] &= !(1 << (id % UNIT_SIZE));
        }
    }

    /// 末尾に0のビットを1つ追加します。
    pub(crate) fn append(&mut self) {
        if self.size % UNIT_SIZE == 0 {
            self.units.push(0);
        }
        self.size += 1;
    }

    /// rankテーブルを構築します。以降のビット変更は反映されません。
    pub(crate) fn build(&mut self) {
        self.ranks.clear();
        self.ranks.reserve(self.units.len());
        self.num_ones = 0;
        for &unit in &self.units {
            self.ranks.push(self.num_ones);
            self.num_ones += unit.count_ones();
        }
    }

    #[inline(always)]
    pub(crate) const fn num_ones(&self) -> u32 {
        self.num_ones
    }

    #[inline(always)]
    pub(crate) const fn size(&self) -> u32 {
        self.size
    }
}
