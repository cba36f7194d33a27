//! Aggregator (spec §4.6): periodic rollups computed from a Storage
//! snapshot, plus the synchronous Reset/Snapshot API (spec §4.7).

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use dps_common::time::{now_secs, RUNNING_TIME_EPSILON};

use crate::catalog::ActorClass;
use crate::storage::{SpecialtySlots, StorageSnapshot};
use crate::types::{ActorId, SkillCode, SkillStats, TargetId};

/// One tick's fully-computed rollups, ready to hand to a [`crate::interfaces::SnapshotSink`].
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub main_player: Option<String>,
    pub last_target: Option<TargetId>,
    pub last_target_by_me: Option<TargetId>,
    pub target_list: Vec<TargetId>,
    pub actor_list: Vec<ActorId>,
    pub target_start_time: f64,
    pub target_last_time: f64,
    pub nickname_map: HashMap<ActorId, String>,
    pub actor_class_map: HashMap<ActorId, ActorClass>,
    pub mob_code: HashMap<u32, u32>,
    pub summon_code: HashMap<u32, u32>,
    pub actor_skill_slots: HashMap<ActorId, BTreeMap<SkillCode, SpecialtySlots>>,
    pub parsed_skill_code: HashMap<SkillCode, SkillCode>,
    pub failed_skill_code: HashMap<SkillCode, SkillCode>,
    pub duration: f64,
    pub running_time: f64,
    pub overview_stats: SkillStats,
    pub overview_stats_by_target: HashMap<TargetId, SkillStats>,
    pub overview_stats_by_target_player: HashMap<TargetId, HashMap<ActorId, SkillStats>>,
    pub overview_stats_by_player: HashMap<ActorId, SkillStats>,
    pub detailed_skills_stats_by_target_player:
        HashMap<TargetId, HashMap<ActorId, HashMap<SkillCode, SkillStats>>>,
    pub detailed_skills_stats_by_actor: HashMap<ActorId, HashMap<SkillCode, SkillStats>>,
}

/// Computes one tick's rollups from a Storage snapshot (spec §4.6 steps
/// 2-5). Returns `None` if `start_time` is unset (nothing has happened
/// yet this fight).
pub fn compute(snapshot: &StorageSnapshot) -> Option<Snapshot> {
    let start_time = snapshot.start_time?;
    let last_damage_time = snapshot.last_damage_time.unwrap_or(start_time);

    let mut overview_stats = SkillStats::new();
    let mut overview_stats_by_target: HashMap<TargetId, SkillStats> = HashMap::new();
    let mut overview_stats_by_target_player: HashMap<TargetId, HashMap<ActorId, SkillStats>> =
        HashMap::new();
    let mut overview_stats_by_player: HashMap<ActorId, SkillStats> = HashMap::new();
    let mut detailed_by_target_player: HashMap<
        TargetId,
        HashMap<ActorId, HashMap<SkillCode, SkillStats>>,
    > = HashMap::new();
    let mut detailed_by_actor: HashMap<ActorId, HashMap<SkillCode, SkillStats>> = HashMap::new();

    for (&(target, actor, skill), stats) in &snapshot.combat_stats {
        overview_stats.merge(stats);

        overview_stats_by_target
            .entry(target)
            .or_insert_with(SkillStats::new)
            .merge(stats);

        overview_stats_by_player
            .entry(actor)
            .or_insert_with(SkillStats::new)
            .merge(stats);

        overview_stats_by_target_player
            .entry(target)
            .or_default()
            .entry(actor)
            .or_insert_with(SkillStats::new)
            .merge(stats);

        detailed_by_target_player
            .entry(target)
            .or_default()
            .entry(actor)
            .or_default()
            .entry(skill)
            .or_insert_with(SkillStats::new)
            .merge(stats);

        detailed_by_actor
            .entry(actor)
            .or_default()
            .entry(skill)
            .or_insert_with(SkillStats::new)
            .merge(stats);
    }

    // Every target/actor pair that has ever appeared gets an entry, even
    // if the pair itself never exchanged damage (spec §4.6 step 3: the
    // rollup is indexed by the full target/actor cross product).
    for &target in &snapshot.target_list {
        let by_player = overview_stats_by_target_player.entry(target).or_default();
        for &actor in &snapshot.actor_list {
            by_player.entry(actor).or_insert_with(SkillStats::new);
        }
        detailed_by_target_player
            .entry(target)
            .or_default()
            .entry(0)
            .or_default();
        // The zero-actor placeholder above exists only to guarantee the
        // outer map entry; remove it immediately so it never surfaces.
        detailed_by_target_player.get_mut(&target).unwrap().remove(&0);
        for &actor in &snapshot.actor_list {
            detailed_by_target_player
                .get_mut(&target)
                .unwrap()
                .entry(actor)
                .or_default();
        }
    }

    Some(Snapshot {
        main_player: snapshot.main_player.clone(),
        last_target: snapshot.last_target,
        last_target_by_me: snapshot.last_target_by_me,
        target_list: snapshot.target_list.clone(),
        actor_list: snapshot.actor_list.clone(),
        target_start_time: start_time,
        target_last_time: last_damage_time,
        nickname_map: snapshot.nickname_map.clone(),
        actor_class_map: snapshot.actor_class_map.clone(),
        mob_code: snapshot.mob_code.clone(),
        summon_code: snapshot.summon_code.clone(),
        actor_skill_slots: snapshot.actor_skill_slots.clone(),
        parsed_skill_code: snapshot.parsed_skill_code.clone(),
        failed_skill_code: snapshot.failed_skill_code.clone(),
        duration: now_secs() - start_time,
        running_time: (last_damage_time - start_time) + RUNNING_TIME_EPSILON,
        overview_stats,
        overview_stats_by_target,
        overview_stats_by_target_player,
        overview_stats_by_player,
        detailed_skills_stats_by_target_player: detailed_by_target_player,
        detailed_skills_stats_by_actor: detailed_by_actor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::storage::Storage;
    use crate::types::DamageEvent;

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
    fn returns_none_before_any_damage() {
        let storage = Storage::new(Catalog::empty());
        assert!(compute(&storage.snapshot()).is_none());
    }

    #[test]
    fn rolls_up_overview_and_detailed_stats() {
        let mut storage = Storage::new(Catalog::empty());
        storage.append_damage(event(1, 10, 100, 50));
        storage.append_damage(event(1, 10, 200, 25));
        storage.append_damage(event(2, 11, 100, 10));

        let snapshot = compute(&storage.snapshot()).unwrap();

        assert_eq!(snapshot.overview_stats.total_damage, 85);
        assert_eq!(
            snapshot.overview_stats_by_target[&1].total_damage,
            75
        );
        assert_eq!(
            snapshot.overview_stats_by_target_player[&1][&10].total_damage,
            75
        );
        assert_eq!(snapshot.overview_stats_by_player[&10].total_damage, 75);
        assert_eq!(
            snapshot.detailed_skills_stats_by_actor[&10][&100].total_damage,
            50
        );
        assert_eq!(
            snapshot.detailed_skills_stats_by_target_player[&1][&10][&200].total_damage,
            25
        );
    }

    #[test]
    fn running_time_includes_epsilon() {
        let mut storage = Storage::new(Catalog::empty());
        storage.append_damage(event(1, 2, 100, 5));
        let snapshot = compute(&storage.snapshot()).unwrap();
        assert!(snapshot.running_time >= RUNNING_TIME_EPSILON);
    }
}
