use battle_prepare_core::{
    ActorId, Command, Event, ExchangeError, MapLayout, PrepareConfig, RawSlot, RemoveError,
    RosterOverrides, SlotId, SubPhase, TilePos,
};
use battle_prepare_world::{self as world, query, World};

fn actor_slot(id: u32, template: u32, actor: Option<u32>) -> RawSlot {
    RawSlot {
        id,
        x: id,
        y: 1,
        kind: Some("actor".to_owned()),
        template: Some(template.to_string()),
        actor,
        erased: actor.is_none(),
        ..RawSlot::default()
    }
}

fn ids(values: &[u32]) -> Vec<ActorId> {
    values.iter().copied().map(ActorId::new).collect()
}

fn begin(raw: &[RawSlot], party: &[u32]) -> World {
    let layout = MapLayout::from_raw(raw).expect("valid layout");
    let mut world = World::new(&layout, PrepareConfig::default());
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::BeginPreparation {
            party: ids(party),
            overrides: RosterOverrides::default(),
        },
        &mut events,
    );
    world
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn scenario_a() -> World {
    begin(
        &[
            actor_slot(1, 1, Some(1)),
            actor_slot(2, 2, Some(2)),
            actor_slot(3, 3, Some(3)),
            actor_slot(4, 0, None),
        ],
        &[1, 2, 3, 4],
    )
}

fn scenario_b() -> World {
    let mut world = scenario_a();
    let _ = run(
        &mut world,
        Command::AddActor {
            slot: SlotId::new(4),
            actor: ActorId::new(4),
        },
    );
    world
}

fn assert_ledger_invariants(world: &World) {
    let roster = query::roster(world);
    for actor in roster.locked() {
        assert!(roster.is_eligible(*actor), "locked actor {actor:?} not eligible");
        assert!(!roster.is_remaining(*actor), "locked actor {actor:?} benched");
    }
    for actor in roster.remaining() {
        assert!(roster.is_eligible(*actor), "benched actor {actor:?} not eligible");
    }
    let mut sorted = roster.remaining().to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted, roster.remaining(), "bench must stay sorted without duplicates");
}

#[test]
fn scenario_a_initial_ledger() {
    let world = scenario_a();
    let roster = query::roster(&world);

    assert_eq!(roster.locked(), ids(&[1, 2, 3]).as_slice());
    assert_eq!(roster.max_actor(), 4);
    assert_eq!(roster.min_actor(), 1);
    assert_eq!(roster.remaining(), ids(&[4]).as_slice());
    assert_ledger_invariants(&world);
}

#[test]
fn scenario_b_add_fills_floating_slot() {
    let world = scenario_b();
    let roster = query::roster(&world);

    assert!(roster.remaining().is_empty());
    assert_eq!(roster.current_count(), 4);
    assert!(roster.is_valid_count());
    assert_eq!(
        query::slot(&world, SlotId::new(4)).and_then(|slot| slot.deployed_actor()),
        Some(ActorId::new(4))
    );
    assert_ledger_invariants(&world);
}

#[test]
fn scenario_c_lower_cap_benches_floating_occupant() {
    let mut world = scenario_b();
    let events = run(&mut world, Command::SetMaxActor { count: 3 });
    let roster = query::roster(&world);

    assert_eq!(roster.remaining(), ids(&[4]).as_slice());
    assert_eq!(roster.current_count(), 3);
    assert!(roster.is_valid_count());
    assert!(events.contains(&Event::ActorRemoved {
        slot: SlotId::new(4),
        actor: ActorId::new(4),
    }));
    for locked in 1..=3 {
        let slot = query::slot(&world, SlotId::new(locked)).expect("locked slot");
        assert_eq!(slot.deployed_actor(), Some(ActorId::new(locked)));
    }
}

#[test]
fn lower_cap_never_benches_locked_actors() {
    let mut world = scenario_b();
    let _ = run(&mut world, Command::SetMaxActor { count: 1 });
    let roster = query::roster(&world);

    assert_eq!(roster.current_count(), 3, "only the floating occupant may go");
    assert!(!roster.is_valid_count());
}

#[test]
fn scenario_d_exchange_with_locked_slot_is_rejected() {
    let mut world = scenario_a();
    let before: Vec<TilePos> = query::slots(&world).map(|slot| slot.position()).collect();

    let events = run(
        &mut world,
        Command::ExchangePositions {
            first: SlotId::new(4),
            second: SlotId::new(1),
        },
    );

    assert_eq!(
        events,
        vec![Event::ExchangeRejected {
            first: SlotId::new(4),
            second: SlotId::new(1),
            reason: ExchangeError::Locked,
        }]
    );
    let after: Vec<TilePos> = query::slots(&world).map(|slot| slot.position()).collect();
    assert_eq!(before, after, "positions must not move");
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
}

#[test]
fn scenario_e_reconciliation_fills_freed_slot() {
    let mut world = begin(
        &[actor_slot(1, 1, Some(1)), actor_slot(2, 0, Some(5))],
        &[1, 5, 9],
    );
    assert_eq!(query::roster(&world).remaining(), ids(&[9]).as_slice());

    let _ = run(&mut world, Command::ToggleFormationMember { actor: ActorId::new(5) });
    let _ = run(&mut world, Command::ToggleFormationMember { actor: ActorId::new(9) });
    let events = run(&mut world, Command::CommitFormation);

    let removed = events
        .iter()
        .position(|event| matches!(event, Event::ActorRemoved { .. }))
        .expect("removal happened");
    let added = events
        .iter()
        .position(|event| matches!(event, Event::ActorAdded { .. }))
        .expect("add happened");
    assert!(removed < added, "removals must complete before adds");

    let slot = query::slot(&world, SlotId::new(2)).expect("floating slot");
    assert_eq!(slot.deployed_actor(), Some(ActorId::new(9)));
    assert_eq!(query::roster(&world).remaining(), ids(&[5]).as_slice());
    assert!(events.contains(&Event::FormationCommitted));
}

#[test]
fn reconciliation_fills_empty_locked_slot() {
    let mut world = begin(&[actor_slot(1, 0, Some(1)), actor_slot(2, 7, None)], &[1, 2]);
    assert_eq!(query::roster(&world).remaining(), ids(&[2, 7]).as_slice());
    assert_eq!(query::roster(&world).max_actor(), 2);

    let _ = run(&mut world, Command::ToggleFormationMember { actor: ActorId::new(2) });
    let events = run(&mut world, Command::CommitFormation);

    let slot = query::slot(&world, SlotId::new(2)).expect("locked slot");
    assert_eq!(slot.deployed_actor(), Some(ActorId::new(2)));
    assert!(!slot.is_erased());
    assert_eq!(query::roster(&world).remaining(), ids(&[7]).as_slice());
    assert!(events.contains(&Event::ActorAdded {
        slot: SlotId::new(2),
        actor: ActorId::new(2),
    }));
    assert!(events.contains(&Event::FormationCommitted));
    assert_ledger_invariants(&world);
}

#[test]
fn reconciliation_consumes_selected_actors_from_the_end() {
    let mut world = begin(
        &[
            actor_slot(1, 1, Some(1)),
            actor_slot(2, 0, None),
            actor_slot(3, 0, None),
        ],
        &[1, 6, 7],
    );

    let _ = run(&mut world, Command::ToggleFormationMember { actor: ActorId::new(6) });
    let _ = run(&mut world, Command::ToggleFormationMember { actor: ActorId::new(7) });
    let _ = run(&mut world, Command::CommitFormation);

    let deployed = |id: u32| {
        query::slot(&world, SlotId::new(id)).and_then(|slot| slot.deployed_actor())
    };
    assert_eq!(deployed(2), Some(ActorId::new(7)));
    assert_eq!(deployed(3), Some(ActorId::new(6)));
    assert!(query::roster(&world).remaining().is_empty());
}

#[test]
fn formation_commit_blocked_when_count_invalid() {
    let mut world = scenario_a();
    let _ = run(&mut world, Command::SetMinActor { count: 4 });

    let events = run(&mut world, Command::CommitFormation);

    assert!(events.contains(&Event::FormationRejected {
        reason: battle_prepare_core::FormationError::InvalidCount,
    }));
    assert!(!events.contains(&Event::FormationCommitted));
}

#[test]
fn add_then_remove_restores_bench() {
    let mut world = scenario_a();
    let before = query::roster(&world).remaining().to_vec();

    let _ = run(
        &mut world,
        Command::AddActor {
            slot: SlotId::new(4),
            actor: ActorId::new(4),
        },
    );
    let events = run(&mut world, Command::RemoveActor { slot: SlotId::new(4) });

    assert_eq!(query::roster(&world).remaining(), before.as_slice());
    assert!(events.contains(&Event::TurnIndicatorDetached {
        slot: SlotId::new(4),
    }));
    let slot = query::slot(&world, SlotId::new(4)).expect("slot");
    assert!(slot.is_erased());
    assert_ledger_invariants(&world);
}

#[test]
fn remove_at_minimum_is_rejected() {
    let mut world = begin(&[actor_slot(1, 0, Some(1)), actor_slot(2, 0, None)], &[1, 2]);

    let events = run(&mut world, Command::RemoveActor { slot: SlotId::new(1) });

    assert_eq!(
        events,
        vec![Event::RemoveRejected {
            slot: SlotId::new(1),
            reason: RemoveError::BelowMinimum,
        }]
    );
    assert!(!query::roster(&world).can_remove());
}

#[test]
fn locked_occupant_cannot_be_removed() {
    let mut world = scenario_b();

    let events = run(&mut world, Command::RemoveActor { slot: SlotId::new(2) });

    assert_eq!(
        events,
        vec![Event::RemoveRejected {
            slot: SlotId::new(2),
            reason: RemoveError::Locked,
        }]
    );
}

#[test]
fn add_rejected_when_bench_empty() {
    let mut world = scenario_b();
    let _ = run(&mut world, Command::SetMaxActor { count: 6 });
    assert!(!query::roster(&world).can_add(), "bench is empty");

    let events = run(
        &mut world,
        Command::AddActor {
            slot: SlotId::new(4),
            actor: ActorId::new(4),
        },
    );
    assert!(matches!(events.as_slice(), [Event::AddRejected { .. }]));
}

#[test]
fn actors_alive_counter_follows_placements() {
    let mut world = scenario_a();
    let variable = PrepareConfig::default().actors_alive_variable;
    assert_eq!(query::variable(&world, variable), 3);

    let _ = run(
        &mut world,
        Command::AddActor {
            slot: SlotId::new(4),
            actor: ActorId::new(4),
        },
    );
    assert_eq!(query::variable(&world, variable), 4);

    let _ = run(&mut world, Command::RemoveActor { slot: SlotId::new(4) });
    assert_eq!(query::variable(&world, variable), 3);
}

#[test]
fn exchange_swaps_positions_of_floating_slots() {
    let mut world = begin(
        &[actor_slot(1, 0, Some(1)), actor_slot(2, 0, Some(2))],
        &[1, 2],
    );

    let events = run(
        &mut world,
        Command::ExchangePositions {
            first: SlotId::new(1),
            second: SlotId::new(2),
        },
    );

    assert!(events.contains(&Event::PositionsExchanged {
        first: SlotId::new(1),
        second: SlotId::new(2),
    }));
    let first = query::slot(&world, SlotId::new(1)).expect("slot");
    let second = query::slot(&world, SlotId::new(2)).expect("slot");
    assert_eq!(first.position(), TilePos::new(2, 1));
    assert_eq!(second.position(), TilePos::new(1, 1));
    assert_eq!(first.deployed_actor(), Some(ActorId::new(1)), "binding moves with the unit");
}

#[test]
fn max_override_applies_at_entry() {
    let layout = MapLayout::from_raw(&[
        actor_slot(1, 0, Some(1)),
        actor_slot(2, 0, Some(2)),
        actor_slot(3, 0, Some(3)),
    ])
    .expect("valid layout");
    let mut world = World::new(&layout, PrepareConfig::default());
    let _ = run(
        &mut world,
        Command::BeginPreparation {
            party: ids(&[1, 2, 3]),
            overrides: RosterOverrides {
                max_actor: Some(2),
                min_actor: Some(2),
            },
        },
    );

    let roster = query::roster(&world);
    assert_eq!(roster.max_actor(), 2);
    assert_eq!(roster.min_actor(), 2);
    assert_eq!(roster.remaining(), ids(&[3]).as_slice(), "last floating slot benched first");
}
