// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Heavenly stems, earthly branches and the 60-step cycle they form.
//!
//! A position in the cycle is a single index in `[0, 60)`; its stem is the
//! index mod 10 and its branch the index mod 12. Only pairs of equal parity
//! occur, so stem and branch are never chosen independently.

use serde::{Serialize, Serializer};
use std::fmt;

/// The ten heavenly stems, 甲 to 癸.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stem {
    Gap,
    Eul,
    Byeong,
    Jeong,
    Mu,
    Gi,
    Gyeong,
    Sin,
    Im,
    Gye,
}

const STEM_HANJA: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
const STEM_KOREAN: [&str; 10] = ["갑", "을", "병", "정", "무", "기", "경", "신", "임", "계"];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Gap,
        Stem::Eul,
        Stem::Byeong,
        Stem::Jeong,
        Stem::Mu,
        Stem::Gi,
        Stem::Gyeong,
        Stem::Sin,
        Stem::Im,
        Stem::Gye,
    ];

    /// Stem at `index`, taken mod 10.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 10) as usize]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn hanja(self) -> &'static str {
        STEM_HANJA[self as usize]
    }

    pub fn korean(self) -> &'static str {
        STEM_KOREAN[self as usize]
    }

    /// Stem of the 寅 month in a year with this stem.
    ///
    /// 甲/己 → 丙, 乙/庚 → 戊, 丙/辛 → 庚, 丁/壬 → 壬, 戊/癸 → 甲.
    pub fn first_month_stem(self) -> Stem {
        Self::from_index(2 * (self.index() as u32 % 5) + 2)
    }

    /// Stem of the 子 hour on a day with this stem.
    ///
    /// 甲/己 → 甲, 乙/庚 → 丙, 丙/辛 → 戊, 丁/壬 → 庚, 戊/癸 → 壬.
    pub fn first_hour_stem(self) -> Stem {
        Self::from_index(2 * (self.index() as u32 % 5))
    }

    /// The stem `steps` places later, wrapping.
    pub fn advance(self, steps: u32) -> Stem {
        Self::from_index(self.index() as u32 + steps)
    }
}

/// The twelve earthly branches, 子 to 亥.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
    Ja,
    Chuk,
    In,
    Myo,
    Jin,
    Sa,
    O,
    Mi,
    Sin,
    Yu,
    Sul,
    Hae,
}

const BRANCH_HANJA: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];
const BRANCH_KOREAN: [&str; 12] = [
    "자", "축", "인", "묘", "진", "사", "오", "미", "신", "유", "술", "해",
];

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Ja,
        Branch::Chuk,
        Branch::In,
        Branch::Myo,
        Branch::Jin,
        Branch::Sa,
        Branch::O,
        Branch::Mi,
        Branch::Sin,
        Branch::Yu,
        Branch::Sul,
        Branch::Hae,
    ];

    /// Branch at `index`, taken mod 12.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 12) as usize]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn hanja(self) -> &'static str {
        BRANCH_HANJA[self as usize]
    }

    pub fn korean(self) -> &'static str {
        BRANCH_KOREAN[self as usize]
    }

    /// Branch of the month `offset` months after the 寅 month.
    pub fn of_month(offset: u8) -> Branch {
        Self::from_index(Branch::In.index() as u32 + offset as u32)
    }

    /// Months from 寅 to this branch, in `[0, 12)`.
    pub fn month_offset(self) -> u8 {
        (self.index() + 12 - Branch::In.index()) % 12
    }
}

/// A position in the 60-step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StemBranch(u8);

impl StemBranch {
    /// 甲子.
    pub const FIRST: StemBranch = StemBranch(0);

    /// Position `index` mod 60.
    pub fn new(index: i64) -> Self {
        StemBranch(index.rem_euclid(60) as u8)
    }

    /// The unique position with this stem and branch, if their parities
    /// agree.
    pub fn from_parts(stem: Stem, branch: Branch) -> Option<Self> {
        let (s, b) = (i64::from(stem.index()), i64::from(branch.index()));
        if (s - b) % 2 != 0 {
            return None;
        }
        // n - s = 5(s - b) and n - b = 6(s - b), both 0 for even s - b
        Some(Self::new(6 * s - 5 * b))
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub fn stem(self) -> Stem {
        Stem::from_index(self.0 as u32)
    }

    pub fn branch(self) -> Branch {
        Branch::from_index(self.0 as u32)
    }

    pub fn hanja(self) -> String {
        format!("{}{}", self.stem().hanja(), self.branch().hanja())
    }

    pub fn korean(self) -> String {
        format!("{}{}", self.stem().korean(), self.branch().korean())
    }

    pub fn pillar(self) -> SexagenaryPillar {
        SexagenaryPillar::from(self)
    }
}

impl fmt::Display for StemBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem().hanja(), self.branch().hanja())
    }
}

/// One of the four pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SexagenaryPillar {
    position: StemBranch,
}

impl SexagenaryPillar {
    pub fn stem(&self) -> Stem {
        self.position.stem()
    }

    pub fn branch(&self) -> Branch {
        self.position.branch()
    }

    pub fn index60(&self) -> u8 {
        self.position.index()
    }

    /// Hanja pair, e.g. `甲子`.
    pub fn label(&self) -> String {
        self.position.hanja()
    }

    /// Hangul pair, e.g. `갑자`.
    pub fn korean(&self) -> String {
        self.position.korean()
    }

    pub fn position(&self) -> StemBranch {
        self.position
    }
}

impl From<StemBranch> for SexagenaryPillar {
    fn from(position: StemBranch) -> Self {
        Self { position }
    }
}

impl fmt::Display for SexagenaryPillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.position.fmt(f)
    }
}

impl Serialize for SexagenaryPillar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SexagenaryPillar", 5)?;
        state.serialize_field("stem", self.stem().hanja())?;
        state.serialize_field("branch", self.branch().hanja())?;
        state.serialize_field("label", &self.label())?;
        state.serialize_field("korean", &self.korean())?;
        state.serialize_field("index60", &self.index60())?;
        state.end()
    }
}
