//! In-memory combat state (spec §4.5). Single writer (the dispatcher
//! thread, via the decoder), single reader (the aggregator thread) taking
//! a consistent snapshot under a lock.

use std::collections::{BTreeMap, HashMap};

use dps_common::time::now_secs;

use crate::catalog::{ActorClass, Catalog};
use crate::types::{ActorId, CombatStatsKey, DamageEvent, SkillCode, SkillStats, TargetId};

/// Per-actor specialty slots parsed from a skill code (spec §3).
pub type SpecialtySlots = Vec<u8>;

/// Deep copy of everything the Aggregator needs, taken under the Storage
/// lock and then processed lock-free (spec §4.6 step 1).
#[derive(Debug, Clone)]
pub struct StorageSnapshot {
    pub combat_stats: HashMap<CombatStatsKey, SkillStats>,
    pub target_list: Vec<TargetId>,
    pub actor_list: Vec<ActorId>,
    pub main_player: Option<String>,
    pub last_target: Option<TargetId>,
    pub last_target_by_me: Option<TargetId>,
    pub nickname_map: HashMap<ActorId, String>,
    pub actor_class_map: HashMap<ActorId, ActorClass>,
    pub mob_code: HashMap<u32, u32>,
    pub summon_code: HashMap<u32, u32>,
    pub actor_skill_slots: HashMap<ActorId, BTreeMap<SkillCode, SpecialtySlots>>,
    pub parsed_skill_code: HashMap<SkillCode, SkillCode>,
    /// Skill codes whose heuristic origin (zeroing the last four digits)
    /// does not resolve to a known actor class, kept alongside
    /// `parsed_skill_code` per the open question in spec §9 rather than
    /// silently discarded.
    pub failed_skill_code: HashMap<SkillCode, SkillCode>,
    pub start_time: Option<f64>,
    pub last_damage_time: Option<f64>,
}

/// Combat telemetry accumulated since the last reset, plus discovery state
/// (nicknames, mob/summon bindings) that survives resets.
pub struct Storage {
    combat_stats: HashMap<CombatStatsKey, SkillStats>,
    target_list: Vec<TargetId>,
    actor_list: Vec<ActorId>,

    main_player: Option<String>,
    last_target: Option<TargetId>,
    last_target_by_me: Option<TargetId>,

    nickname_map: HashMap<ActorId, String>,
    mob_storage: HashMap<u32, u32>,
    summon_storage: HashMap<u32, u32>,

    actor_class_map: HashMap<ActorId, ActorClass>,
    actor_skill_slots: HashMap<ActorId, BTreeMap<SkillCode, SpecialtySlots>>,
    parsed_skill_code: HashMap<SkillCode, SkillCode>,
    failed_skill_code: HashMap<SkillCode, SkillCode>,

    start_time: Option<f64>,
    last_damage_time: Option<f64>,

    catalog: Catalog,
}

impl Storage {
    pub fn new(catalog: Catalog) -> Storage {
        Storage {
            combat_stats: HashMap::new(),
            target_list: Vec::new(),
            actor_list: Vec::new(),
            main_player: None,
            last_target: None,
            last_target_by_me: None,
            nickname_map: HashMap::new(),
            mob_storage: HashMap::new(),
            summon_storage: HashMap::new(),
            actor_class_map: HashMap::new(),
            actor_skill_slots: HashMap::new(),
            parsed_skill_code: HashMap::new(),
            failed_skill_code: HashMap::new(),
            start_time: None,
            last_damage_time: None,
            catalog,
        }
    }

    pub fn get_current_target(&self) -> Option<TargetId> {
        self.last_target
    }

    pub fn nickname_of(&self, actor_id: ActorId) -> Option<&str> {
        self.nickname_map.get(&actor_id).map(String::as_str)
    }

    /// Records one decoded damage/DoT tick (spec §4.5 `append_damage`).
    /// Self-damage (`actor_id == target_id`) must be filtered by the
    /// caller before this is reached; it is not re-checked here.
    pub fn append_damage(&mut self, mut event: DamageEvent) {
        let now = now_secs();
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }
        self.last_damage_time = Some(now);

        if event.is_critical && !event.specials.contains(&crate::types::SpecialFlag::Critical) {
            event.specials.push(crate::types::SpecialFlag::Critical);
        }

        self.last_target = Some(event.target_id);

        if let Some(name) = self.nickname_map.get(&event.actor_id) {
            if self.main_player.as_deref() == Some(name.as_str()) {
                self.last_target_by_me = Some(event.target_id);
            }
        }

        let key = (event.target_id, event.actor_id, event.skill_code);
        self.combat_stats
            .entry(key)
            .or_insert_with(SkillStats::new)
            .record(event.damage, &event.specials);

        if !self.actor_list.contains(&event.actor_id) {
            self.actor_list.push(event.actor_id);
        }
        if !self.target_list.contains(&event.target_id) {
            self.target_list.push(event.target_id);
        }

        let original_code = infer_original_skill_code(event.skill_code);
        self.parsed_skill_code
            .entry(event.skill_code)
            .or_insert(original_code);

        match self.catalog.class_for_origin(original_code) {
            Some(class) => {
                self.actor_class_map.insert(event.actor_id, class);
            }
            None => {
                self.failed_skill_code.insert(event.skill_code, original_code);
            }
        }

        let slots = parse_specialty_slots(event.skill_code);
        self.actor_skill_slots
            .entry(event.actor_id)
            .or_default()
            .insert(original_code, slots);
    }

    pub fn append_nickname(&mut self, actor_id: ActorId, name: String) {
        self.nickname_map.insert(actor_id, name);
    }

    pub fn set_main_player(&mut self, name: String) {
        self.main_player = Some(name);
    }

    pub fn append_mob(&mut self, instance_id: u32, type_code: u32) {
        self.mob_storage.insert(instance_id, type_code);
    }

    pub fn append_summon(&mut self, summon_id: u32, summoner_id: u32) {
        self.summon_storage.insert(summon_id, summoner_id);
    }

    /// Deep copy of all mutable collections, plus timestamps (spec §4.5).
    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            combat_stats: self.combat_stats.clone(),
            target_list: self.target_list.clone(),
            actor_list: self.actor_list.clone(),
            main_player: self.main_player.clone(),
            last_target: self.last_target,
            last_target_by_me: self.last_target_by_me,
            nickname_map: self.nickname_map.clone(),
            actor_class_map: self.actor_class_map.clone(),
            mob_code: self.mob_storage.clone(),
            summon_code: self.summon_storage.clone(),
            actor_skill_slots: self.actor_skill_slots.clone(),
            parsed_skill_code: self.parsed_skill_code.clone(),
            failed_skill_code: self.failed_skill_code.clone(),
            start_time: self.start_time,
            last_damage_time: self.last_damage_time,
        }
    }

    /// Clears `combat_stats`, rosters, and timestamps. Nickname, mob, and
    /// summon maps are discovery-bound, not per-fight, and survive reset.
    pub fn reset(&mut self) {
        self.combat_stats.clear();
        self.target_list.clear();
        self.actor_list.clear();
        self.last_target = None;
        self.last_target_by_me = None;
        self.start_time = None;
        self.last_damage_time = None;
    }
}

/// Zeroes the last four decimal digits of a skill code (spec §3).
pub fn infer_original_skill_code(code: SkillCode) -> SkillCode {
    code - (code % 10_000)
}

/// Decodes the three "specialty slot" digits (thousands, hundreds, tens)
/// of a skill code's last four digits, dropping zeros and sorting
/// ascending (spec §3).
pub fn parse_specialty_slots(skill_id: SkillCode) -> SpecialtySlots {
    let last_four = skill_id % 10_000;
    let slot_1 = (last_four / 1000) % 10;
    let slot_2 = (last_four / 100) % 10;
    let slot_3 = (last_four / 10) % 10;

    let mut slots: Vec<u8> = [slot_1, slot_2, slot_3]
        .into_iter()
        .filter(|&s| s > 0)
        .map(|s| s as u8)
        .collect();
    slots.sort_unstable();
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpecialFlag;

    fn event(target: u32, actor: u32, skill: u32, damage: u32) -> DamageEvent {
        DamageEvent {
            is_dot: false,
            target_id: target,
            actor_id: actor,
            skill_code: skill,
            damage,
            specials: Vec::new(),
            is_critical: false,
        }
    }

    #[test]
    fn infers_original_code_and_specialty_slots() {
        assert_eq!(infer_original_skill_code(11_023_210), 11_020_000);
        assert_eq!(parse_specialty_slots(11_023_210), vec![1, 2, 3]);
        assert_eq!(parse_specialty_slots(11_020_000), Vec::<u8>::new());
    }

    #[test]
    fn append_damage_accumulates_and_tracks_rosters() {
        let mut storage = Storage::new(Catalog::empty());
        storage.append_damage(event(1, 2, 11_020_000, 100));
        storage.append_damage(event(1, 2, 11_020_000, 50));

        let snap = storage.snapshot();
        let stats = snap.combat_stats.get(&(1, 2, 11_020_000)).unwrap();
        assert_eq!(stats.total_damage, 150);
        assert_eq!(stats.counts, 2);
        assert_eq!(snap.actor_list, vec![2]);
        assert_eq!(snap.target_list, vec![1]);
        assert_eq!(snap.last_target, Some(1));
        assert_eq!(
            snap.actor_class_map.get(&2),
            Some(&ActorClass::Gladiator)
        );
    }

    #[test]
    fn critical_flag_is_folded_into_special_counts() {
        let mut storage = Storage::new(Catalog::empty());
        let mut e = event(1, 2, 10_000, 10);
        e.is_critical = true;
        storage.append_damage(e);

        let snap = storage.snapshot();
        let stats = snap.combat_stats.get(&(1, 2, 10_000)).unwrap();
        assert_eq!(stats.special_counts[&SpecialFlag::Critical], 1);
    }

    #[test]
    fn reset_clears_fight_state_but_preserves_discovery_maps() {
        let mut storage = Storage::new(Catalog::empty());
        storage.append_damage(event(1, 2, 10_000, 10));
        storage.append_nickname(2, "Aragorn".to_string());
        storage.append_mob(50, 9001);
        storage.append_summon(60, 2);

        storage.reset();

        let snap = storage.snapshot();
        assert!(snap.combat_stats.is_empty());
        assert!(snap.target_list.is_empty());
        assert!(snap.actor_list.is_empty());
        assert_eq!(snap.start_time, None);
        assert_eq!(snap.nickname_map.get(&2).map(String::as_str), Some("Aragorn"));
        assert_eq!(snap.mob_code.get(&50), Some(&9001));
        assert_eq!(snap.summon_code.get(&60), Some(&2));
    }

    #[test]
    fn last_target_by_me_tracks_main_player_damage() {
        let mut storage = Storage::new(Catalog::empty());
        storage.append_nickname(2, "Hero".to_string());
        storage.set_main_player("Hero".to_string());

        storage.append_damage(event(5, 2, 10_000, 10));
        let snap = storage.snapshot();
        assert_eq!(snap.last_target_by_me, Some(5));

        storage.append_damage(event(6, 3, 10_000, 10));
        let snap = storage.snapshot();
        assert_eq!(snap.last_target_by_me, Some(5));
        assert_eq!(snap.last_target, Some(6));
    }
}
