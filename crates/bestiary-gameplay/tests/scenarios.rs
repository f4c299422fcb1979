//! End-to-end encounter scenarios.

use bestiary_common::{EntityId, ItemTypeId, Vec2};
use bestiary_gameplay::testing::RecordingRewards;
use bestiary_gameplay::*;
use proptest::prelude::*;

const SPECIES: &str = r#"
default_species = "wolf"

[[species]]
key = "wolf"
name = "Grey Wolf"
temperament = "aggressive"
gold_reward = 4
xp_reward = 10

[species.behavior]
profile = "predator"

[species.attributes]
health = 40
damage = 10
speed = 80.0
crit_chance = 0.0
detection_radius = 200.0

[[species.loot]]
item = 3
min = 2
max = 2

[[species]]
key = "boar"
name = "Boar"
temperament = "neutral"

[species.behavior]
profile = "charger"
detect_charge_chance = 0.0
damage_charge_chance = 1.0

[species.attributes]
health = 80
damage = 20
defense = 2
speed = 100.0
crit_chance = 0.0
detection_radius = 150.0

[[species]]
key = "spider"
name = "Cave Spider"
temperament = "aggressive"

[species.behavior]
profile = "ambusher"
ambush_chance = 1.0
poisonous_chance = 0.0

[species.attributes]
health = 30
damage = 10
speed = 70.0
crit_chance = 0.0
detection_radius = 200.0
"#;

fn registry() -> SpeciesRegistry {
    let mut registry = SpeciesRegistry::new();
    registry.load_toml_str(SPECIES).expect("valid species");
    registry
}

fn player(damage: u32, defense: u32) -> PlayerActor {
    PlayerActor::new(AttributeSet::new(100, damage, defense, 100.0).with_crit(0.0, 2.0))
}

struct Scene {
    encounter: Encounter,
    world: Arena,
    rewards: RecordingRewards,
}

impl Scene {
    fn new(player: PlayerActor, seed: u64) -> Self {
        let encounter = Encounter::new(EngineTuning::default(), player, seed);
        let mut world = Arena::new();
        world.insert(encounter.player().id, Vec2::ZERO);
        Self {
            encounter,
            world,
            rewards: RecordingRewards::default(),
        }
    }

    fn spawn(&mut self, registry: &SpeciesRegistry, key: &str, at: Vec2) -> EntityId {
        let factory = CreatureFactory::new(registry);
        self.encounter
            .spawn_species(&factory, key, at, &mut self.world)
            .expect("spawn")
    }

    fn tick(&mut self, now: f32, delta: f32) {
        self.encounter
            .tick(now, delta, &mut self.world, &mut self.rewards);
        self.world.integrate(delta);
    }

    fn creature(&self, id: EntityId) -> &Creature {
        self.encounter.creature(id).expect("creature present")
    }
}

#[test]
fn basic_attack_lands_between_six_and_nine() {
    let resolver = CombatResolver::default();
    let attacker = AttributeSet::new(50, 10, 0, 1.0).with_crit(0.0, 2.0);
    let mut rng = CombatRng::new(42);

    for _ in 0..500 {
        let mut defender = AttributeSet::new(100, 0, 4, 1.0);
        let result = resolver.resolve(&attacker, &mut defender, 10.0, &mut rng);
        assert!(result.performed);
        assert!(
            (6..=9).contains(&result.amount_dealt),
            "dealt {}",
            result.amount_dealt
        );
        assert_eq!(defender.health(), 100 - result.amount_dealt);
    }
}

#[test]
fn charger_rushes_where_the_player_stood() {
    let registry = registry();
    let mut scene = Scene::new(player(10, 0), 7);
    let boar = scene.spawn(&registry, "boar", Vec2::new(300.0, 0.0));

    let hit = scene
        .encounter
        .player_attack(boar, 0.0, &mut scene.world, &mut scene.rewards);
    assert!(hit.landed());

    let creature = scene.creature(boar);
    assert_eq!(creature.state(), BehaviorState::Chasing);
    assert!(creature.is_enraged());
    match creature.profile() {
        BehaviorProfile::Charger(charger) => assert_eq!(charger.charge_point(), Some(Vec2::ZERO)),
        other => panic!("unexpected profile {other:?}"),
    }

    let mut now = 0.0;
    let mut reached = false;
    for _ in 0..40 {
        now += 100.0;
        scene.tick(now, 100.0);
        if scene.creature(boar).state() == BehaviorState::Attacking {
            reached = true;
            break;
        }
    }
    assert!(reached, "charger never reached attack range");
    match scene.creature(boar).profile() {
        BehaviorProfile::Charger(charger) => assert_eq!(charger.charge_point(), None),
        other => panic!("unexpected profile {other:?}"),
    }
}

#[test]
fn poison_deals_exactly_ten_then_expires() {
    let mut registry = SpeciesRegistry::new();
    let mut template = AttributeTemplate::default();
    template.health = 40;
    registry
        .register(SpeciesDefinition::new("toad", "Toad").with_attributes(template))
        .expect("valid");

    let mut scene = Scene::new(player(10, 0), 3);
    let toad = scene.spawn(&registry, "toad", Vec2::new(2000.0, 0.0));

    let outcome = scene.encounter.apply_status_to_creature(
        toad,
        StatusKind::Poison,
        2,
        5000.0,
        1000.0,
        Some(scene.encounter.player().id),
    );
    assert_eq!(outcome, ApplyOutcome::Inserted);

    let mut now = 0.0;
    for _ in 0..8 {
        now += 1000.0;
        scene.tick(now, 1000.0);
    }

    let creature = scene.creature(toad);
    assert_eq!(creature.core().attributes.health(), 30);
    assert!(!creature.core().statuses.has(StatusKind::Poison));

    let ticks: u32 = scene
        .encounter
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            CombatEvent::StatusTicked { target, damage, .. } if target == toad => Some(damage),
            _ => None,
        })
        .sum();
    assert_eq!(ticks, 10);
}

#[test]
fn ambush_first_strike_ignores_global_cooldown() {
    let registry = registry();
    let mut scene = Scene::new(player(10, 0), 9);
    let wolf = scene.spawn(&registry, "wolf", Vec2::new(-20.0, 0.0));
    let spider = scene.spawn(&registry, "spider", Vec2::new(100.0, 0.0));

    scene.tick(16.0, 16.0);
    assert!(scene.creature(spider).is_hidden());
    assert_eq!(scene.creature(spider).state(), BehaviorState::Idle);

    scene.tick(32.0, 16.0);
    scene.tick(48.0, 16.0);
    assert!(scene.encounter.resolver().global_cooldown() > 0.0);
    assert!(scene
        .encounter
        .drain_events()
        .iter()
        .any(|e| matches!(e, CombatEvent::AttackResolved { attacker, .. } if *attacker == wolf)));

    let player_id = scene.encounter.player().id;
    scene.world.set_position(player_id, Vec2::new(70.0, 0.0));
    scene.tick(64.0, 16.0);
    assert_eq!(scene.creature(spider).state(), BehaviorState::Attacking);
    assert!(!scene.creature(spider).is_hidden());

    let before = scene.encounter.player().attributes.health();
    scene.tick(80.0, 16.0);

    let strikes: Vec<DamageResult> = scene
        .encounter
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            CombatEvent::AttackResolved {
                attacker,
                kind: AttackKind::FirstStrike,
                result,
                ..
            } if attacker == spider => Some(result),
            _ => None,
        })
        .collect();
    assert_eq!(strikes.len(), 1);
    assert!(
        (12..=17).contains(&strikes[0].amount_dealt),
        "first strike dealt {}",
        strikes[0].amount_dealt
    );
    assert_eq!(
        scene.encounter.player().attributes.health(),
        before - strikes[0].amount_dealt
    );
}

#[test]
fn dodging_player_takes_nothing_and_never_retaliates() {
    let mut resolver = CombatResolver::default();
    let mut target = PlayerActor::new(AttributeSet::new(100, 10, 0, 100.0).with_dodge(1.0));
    let attacker = AttributeSet::new(50, 25, 0, 1.0);
    let mut rng = CombatRng::new(1);
    let request = AttackRequest::new(EntityId::new(), 25.0, AttackPacing::default())
        .with_gate(CooldownGate::Independent);

    for _ in 0..50 {
        let result = resolver.creature_attack(&request, &attacker, &mut target, &mut rng);
        assert!(result.was_dodged);
        assert_eq!(result.amount_dealt, 0);
    }
    assert_eq!(target.attributes.health(), 100);
    assert_eq!(resolver.retaliation_target(), None);
}

#[test]
fn dead_creature_is_terminal_until_removed() {
    let registry = registry();
    let mut scene = Scene::new(player(500, 0), 5);
    let wolf = scene.spawn(&registry, "wolf", Vec2::new(400.0, 0.0));
    scene.encounter.drain_events();

    let kill = scene
        .encounter
        .player_attack(wolf, 100.0, &mut scene.world, &mut scene.rewards);
    assert!(kill.killed);
    assert_eq!(scene.creature(wolf).state(), BehaviorState::Dead);
    assert_eq!(scene.rewards.grants, vec![(4, 10)]);
    assert_eq!(
        scene.rewards.dropped,
        vec![ItemTypeId::new(3), ItemTypeId::new(3)]
    );

    let events = scene.encounter.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::CreatureDied { id, gold: 4, xp: 10, .. } if *id == wolf
    )));

    let outcome =
        scene
            .encounter
            .apply_status_to_creature(wolf, StatusKind::Burn, 5, 2000.0, 500.0, None);
    assert_eq!(outcome, ApplyOutcome::Discarded);
    let again = scene
        .encounter
        .player_attack(wolf, 200.0, &mut scene.world, &mut scene.rewards);
    assert!(!again.performed);

    scene.tick(500.0, 400.0);
    assert_eq!(scene.creature(wolf).state(), BehaviorState::Dead);
    assert!(!scene.encounter.drain_events().iter().any(|e| matches!(
        e,
        CombatEvent::StateChanged { id, .. } if *id == wolf
    )));

    scene.tick(1100.0, 600.0);
    assert!(scene.encounter.creature(wolf).is_none());
    assert_eq!(scene.encounter.alive_count(), 0);
    assert_eq!(scene.rewards.grants.len(), 1);
}

#[test]
fn registry_loads_from_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("beasts.toml"), SPECIES).expect("write");

    let mut registry = SpeciesRegistry::new();
    assert_eq!(registry.load_dir(dir.path()).expect("load"), 3);

    let mut scene = Scene::new(player(10, 0), 2);
    let stray = scene.spawn(&registry, "manticore", Vec2::new(10.0, 10.0));
    assert_eq!(scene.creature(stray).core().species().key, "wolf");
}

proptest! {
    #[test]
    fn prop_global_cooldown_only_decreases(deltas in prop::collection::vec(0.0f32..400.0, 1..60)) {
        let mut resolver = CombatResolver::default();
        let mut target = PlayerActor::new(AttributeSet::new(10_000, 0, 0, 1.0));
        let attacker = AttributeSet::new(10, 5, 0, 1.0);
        let mut rng = CombatRng::new(11);
        let request = AttackRequest::new(EntityId::new(), 5.0, AttackPacing::default());

        let first = resolver.creature_attack(&request, &attacker, &mut target, &mut rng);
        prop_assert!(first.performed);

        let mut previous = resolver.global_cooldown();
        prop_assert!(previous >= resolver.config().min_attack_cooldown);

        for delta in deltas {
            resolver.tick(delta);
            let current = resolver.global_cooldown();
            prop_assert!(current <= previous);
            prop_assert!(current >= 0.0);
            previous = current;
        }
    }

    #[test]
    fn prop_seeded_cooldown_respects_floor(
        base in -1000.0f32..20_000.0,
        speed in -2.0f32..10.0,
        is_boss in any::<bool>(),
    ) {
        let resolver = CombatResolver::default();
        let pacing = AttackPacing { base_cooldown: base, attack_speed: speed, is_boss };
        let cooldown = resolver.seed_cooldown(&pacing);
        prop_assert!(cooldown.is_finite());
        prop_assert!(cooldown >= resolver.config().min_attack_cooldown);
    }
}
