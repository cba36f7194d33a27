//! Shared wire/domain types used by the decoder, storage, and aggregator.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

pub type ActorId = u32;
pub type TargetId = u32;
pub type SkillCode = u32;

/// Special-damage bitset flags (spec §3), plus the virtual `CRITICAL` flag
/// derived from an event's type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecialFlag {
    Back,
    Unknown,
    Parry,
    Perfect,
    Double,
    Endure,
    Unknown4,
    PowerShard,
    Critical,
}

impl SpecialFlag {
    pub const ALL: [SpecialFlag; 9] = [
        SpecialFlag::Back,
        SpecialFlag::Unknown,
        SpecialFlag::Parry,
        SpecialFlag::Perfect,
        SpecialFlag::Double,
        SpecialFlag::Endure,
        SpecialFlag::Unknown4,
        SpecialFlag::PowerShard,
        SpecialFlag::Critical,
    ];

    /// Decodes the on-wire bitset (the first byte of a damage event's
    /// special block, spec §3/§4.4.3). `CRITICAL` is never set here; it is
    /// derived separately from the event's type field.
    pub fn from_bitset(byte: u8) -> Vec<SpecialFlag> {
        let table: [(u8, SpecialFlag); 8] = [
            (0x01, SpecialFlag::Back),
            (0x02, SpecialFlag::Unknown),
            (0x04, SpecialFlag::Parry),
            (0x08, SpecialFlag::Perfect),
            (0x10, SpecialFlag::Double),
            (0x20, SpecialFlag::Endure),
            (0x40, SpecialFlag::Unknown4),
            (0x80, SpecialFlag::PowerShard),
        ];
        table
            .into_iter()
            .filter(|&(mask, _)| byte & mask != 0)
            .map(|(_, flag)| flag)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialFlag::Back => "BACK",
            SpecialFlag::Unknown => "UNKNOWN",
            SpecialFlag::Parry => "PARRY",
            SpecialFlag::Perfect => "PERFECT",
            SpecialFlag::Double => "DOUBLE",
            SpecialFlag::Endure => "ENDURE",
            SpecialFlag::Unknown4 => "UNKNOWN4",
            SpecialFlag::PowerShard => "POWER_SHARD",
            SpecialFlag::Critical => "CRITICAL",
        }
    }
}

/// Serializes as its wire name (`"BACK"`, `"CRITICAL"`, ...) so a snapshot's
/// `special_counts` map round-trips as plain JSON string keys.
impl Serialize for SpecialFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A fully-decoded damage or DoT tick, ready for `Storage::append_damage`.
#[derive(Debug, Clone)]
pub struct DamageEvent {
    pub is_dot: bool,
    pub target_id: TargetId,
    pub actor_id: ActorId,
    pub skill_code: SkillCode,
    pub damage: u32,
    pub specials: Vec<SpecialFlag>,
    pub is_critical: bool,
}

/// Per-`(target, actor, skill)` damage accumulator. Keyed by a tuple rather
/// than the formatted string key of the system this was ported from: the
/// triple is already comparable and hashable, so there is no reason to pay
/// for string formatting and parsing on every damage tick.
#[derive(Debug, Clone, Serialize)]
pub struct SkillStats {
    pub total_damage: u64,
    pub counts: u64,
    pub special_counts: BTreeMap<SpecialFlag, u64>,
}

impl SkillStats {
    pub fn new() -> SkillStats {
        SkillStats {
            total_damage: 0,
            counts: 0,
            special_counts: SpecialFlag::ALL.iter().map(|&f| (f, 0)).collect(),
        }
    }

    pub fn record(&mut self, damage: u32, specials: &[SpecialFlag]) {
        self.total_damage += damage as u64;
        self.counts += 1;
        for &flag in specials {
            *self.special_counts.entry(flag).or_insert(0) += 1;
        }
    }

    pub fn merge(&mut self, other: &SkillStats) {
        self.total_damage += other.total_damage;
        self.counts += other.counts;
        for (&flag, &count) in &other.special_counts {
            *self.special_counts.entry(flag).or_insert(0) += count;
        }
    }
}

impl Default for SkillStats {
    fn default() -> Self {
        SkillStats::new()
    }
}

pub type CombatStatsKey = (TargetId, ActorId, SkillCode);
