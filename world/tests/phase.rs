use battle_prepare_core::{
    ActorId, BattlePhase, Command, Event, InputRejection, MapLayout, MenuCommand, PopupChoice,
    PrepareConfig, RawSlot, RosterOverrides, ScriptTag, SlotId, SubPhase, Surface, TilePos,
};
use battle_prepare_world::{self as world, query, World};

fn raw(id: u32, kind: &str, template: Option<&str>, actor: Option<u32>) -> RawSlot {
    RawSlot {
        id,
        x: id,
        y: 0,
        kind: Some(kind.to_owned()),
        template: template.map(str::to_owned),
        actor,
        erased: kind == "actor" && actor.is_none(),
        ..RawSlot::default()
    }
}

fn layout() -> MapLayout {
    MapLayout::from_raw(&[
        raw(1, "actor", Some("1"), Some(1)),
        raw(2, "actor", Some("0"), Some(2)),
        raw(3, "actor", Some("0"), None),
        RawSlot {
            scripted: true,
            ..raw(4, "playerEvent", None, None)
        },
        RawSlot {
            scripted: true,
            ..raw(5, "afterPrepare", None, None)
        },
    ])
    .expect("valid layout")
}

fn prepared(config: PrepareConfig) -> World {
    let mut world = World::new(&layout(), config);
    let _ = run(
        &mut world,
        Command::BeginPreparation {
            party: vec![ActorId::new(1), ActorId::new(2), ActorId::new(3)],
            overrides: RosterOverrides::default(),
        },
    );
    world
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

#[test]
fn entry_starts_in_normal_sub_phase() {
    let mut world = World::new(&layout(), PrepareConfig::default());
    assert_eq!(query::battle_phase(&world), BattlePhase::Initialize);

    let events = run(
        &mut world,
        Command::BeginPreparation {
            party: vec![ActorId::new(2)],
            overrides: RosterOverrides::default(),
        },
    );

    assert_eq!(query::battle_phase(&world), BattlePhase::BattlePrepare);
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert_eq!(query::active_slot(&world), None);
    assert!(events.contains(&Event::BattlePhaseChanged {
        phase: BattlePhase::BattlePrepare,
    }));
    assert_eq!(
        query::roster(&world).all_eligible(),
        &[ActorId::new(1), ActorId::new(2)],
        "locked actor missing from the party is listed first"
    );
}

#[test]
fn selecting_floating_slot_opens_prepare_command() {
    let mut world = prepared(PrepareConfig::default());

    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    assert_eq!(query::sub_phase(&world), SubPhase::PrepareCommand);
    assert_eq!(query::active_slot(&world), Some(SlotId::new(2)));
    assert!(query::signal(&world, Surface::PrepareCommand).is_raised());
    assert!(query::signal(&world, Surface::ActorCommandStatus).is_raised());
    assert!(query::call_menu_suppressed(&world));
    assert!(!query::player_can_move(&world));

    let entries = query::prepare_command_entries(&world);
    let choices: Vec<PopupChoice> = entries.iter().map(|entry| entry.choice).collect();
    assert_eq!(
        choices,
        vec![
            PopupChoice::PartyMember(ActorId::new(3)),
            PopupChoice::Exchange,
            PopupChoice::Status,
            PopupChoice::Remove,
        ]
    );
    let remove = entries.last().expect("remove entry");
    assert!(remove.enabled, "two deployed actors against a minimum of one");
}

#[test]
fn selecting_floating_slot_without_actor_commands_starts_exchange() {
    let config = PrepareConfig {
        actor_commands: false,
        ..PrepareConfig::default()
    };
    let mut world = prepared(config);

    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    assert_eq!(query::sub_phase(&world), SubPhase::ExchangePosition);
    assert!(!query::signal(&world, Surface::PrepareCommand).is_raised());
    assert!(query::move_cache(&world)
        .iter()
        .any(|tile| tile.exchange_origin() && tile.position() == TilePos::new(2, 0)));
}

#[test]
fn begin_exchange_marks_origin_and_clears_popup() {
    let mut world = prepared(PrepareConfig::default());
    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    let _ = run(&mut world, Command::BeginExchange);

    assert_eq!(query::sub_phase(&world), SubPhase::ExchangePosition);
    assert!(!query::signal(&world, Surface::PrepareCommand).is_raised());
    assert_eq!(query::active_slot(&world), Some(SlotId::new(2)));

    let events = run(&mut world, Command::CancelExchange);
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert_eq!(query::active_slot(&world), None);
    assert!(events.contains(&Event::MoveCacheCleared));
    assert!(query::move_cache(&world)
        .iter()
        .all(|tile| !tile.exchange_origin()));
}

#[test]
fn benching_exchange_origin_drops_origin_tile() {
    let mut world = prepared(PrepareConfig::default());
    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });
    let _ = run(&mut world, Command::BeginExchange);
    assert!(query::move_cache(&world)
        .iter()
        .any(|tile| tile.exchange_origin()));

    let events = run(&mut world, Command::SetMaxActor { count: 1 });

    assert!(events.contains(&Event::ActorRemoved {
        slot: SlotId::new(2),
        actor: ActorId::new(2),
    }));
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert_eq!(query::active_slot(&world), None);
    assert!(events.contains(&Event::MoveCacheCleared));
    assert!(!query::move_cache(&world).is_empty());
    assert!(query::move_cache(&world)
        .iter()
        .all(|tile| !tile.exchange_origin()));
}

#[test]
fn cancel_prepare_command_returns_to_normal() {
    let mut world = prepared(PrepareConfig::default());
    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    let _ = run(&mut world, Command::CancelPrepareCommand);

    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert_eq!(query::active_slot(&world), None);
    for surface in Surface::ALL {
        assert!(!query::signal(&world, surface).is_raised(), "{surface:?} left raised");
    }
}

#[test]
fn remove_from_popup_returns_to_normal() {
    let mut world = prepared(PrepareConfig::default());
    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    let _ = run(&mut world, Command::RemoveActor { slot: SlotId::new(2) });

    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert_eq!(query::active_slot(&world), None);
    assert!(!query::signal(&world, Surface::ActorCommandStatus).is_raised());
    assert_eq!(
        query::roster(&world).remaining(),
        &[ActorId::new(2), ActorId::new(3)]
    );
}

#[test]
fn change_actor_swaps_occupant_with_bench() {
    let mut world = prepared(PrepareConfig::default());
    let _ = run(&mut world, Command::SelectFloatingSlot { slot: SlotId::new(2) });

    let events = run(
        &mut world,
        Command::ChangeActor {
            slot: SlotId::new(2),
            actor: ActorId::new(3),
        },
    );

    assert!(events.contains(&Event::ActorChanged {
        slot: SlotId::new(2),
        previous: ActorId::new(2),
        actor: ActorId::new(3),
    }));
    assert_eq!(query::roster(&world).remaining(), &[ActorId::new(2)]);
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
}

#[test]
fn status_window_is_opaque_until_resumed() {
    let mut world = prepared(PrepareConfig::default());

    let _ = run(&mut world, Command::ShowStatus { slot: SlotId::new(1) });
    assert_eq!(query::sub_phase(&world), SubPhase::StatusWindow);
    assert!(query::signal(&world, Surface::Status).is_raised());
    assert!(query::call_menu_suppressed(&world));

    let _ = run(&mut world, Command::AcknowledgeSignal { surface: Surface::Status });
    assert!(!query::signal(&world, Surface::Status).is_raised());

    let _ = run(&mut world, Command::ResumeNormal);
    assert_eq!(query::sub_phase(&world), SubPhase::Normal);
    assert!(!query::call_menu_suppressed(&world));
}

#[test]
fn player_event_slot_starts_scripted_content() {
    let mut world = prepared(PrepareConfig::default());

    let events = run(&mut world, Command::StartSlotEvent { slot: SlotId::new(4) });

    assert_eq!(
        events,
        vec![Event::ScriptedEventStarted {
            slot: SlotId::new(4),
            tag: ScriptTag::PlayerEvent,
        }]
    );
}

#[test]
fn slot_event_on_actor_slot_is_rejected() {
    let mut world = prepared(PrepareConfig::default());

    let events = run(&mut world, Command::StartSlotEvent { slot: SlotId::new(2) });

    assert_eq!(
        events,
        vec![Event::InputRejected {
            reason: InputRejection::NotInteractive,
        }]
    );
}

#[test]
fn finish_runs_after_prepare_content_and_hands_off() {
    let mut world = prepared(PrepareConfig::default());

    let events = run(&mut world, Command::FinishPreparation);

    assert!(events.contains(&Event::ScriptedEventStarted {
        slot: SlotId::new(5),
        tag: ScriptTag::AfterPrepare,
    }));
    assert!(events.contains(&Event::MoveCacheCleared));
    assert_eq!(
        events.last(),
        Some(&Event::PreparationFinished {
            battle_actors: vec![SlotId::new(1), SlotId::new(2)],
        })
    );
    assert_eq!(query::battle_phase(&world), BattlePhase::ActorPhase);
    assert!(query::move_cache(&world).is_empty());
    assert!(query::menu_commands(&world).is_empty());
}

#[test]
fn menu_offers_prepare_event_only_with_prepare_slots() {
    let world = prepared(PrepareConfig::default());
    assert_eq!(
        query::menu_commands(&world),
        vec![
            MenuCommand::FinishPrepare,
            MenuCommand::Formation,
            MenuCommand::Position,
        ]
    );

    let layout = MapLayout::from_raw(&[
        raw(1, "actor", Some("0"), Some(1)),
        RawSlot {
            scripted: true,
            ..raw(2, "prepare", None, None)
        },
    ])
    .expect("valid layout");
    let mut world = World::new(&layout, PrepareConfig::default());
    let _ = run(
        &mut world,
        Command::BeginPreparation {
            party: vec![ActorId::new(1)],
            overrides: RosterOverrides::default(),
        },
    );
    assert!(query::menu_commands(&world).contains(&MenuCommand::PrepareEvent));

    let events = run(&mut world, Command::RunPrepareEvents);
    assert_eq!(
        events,
        vec![Event::ScriptedEventStarted {
            slot: SlotId::new(2),
            tag: ScriptTag::Prepare,
        }]
    );
}

#[test]
fn auto_open_menu_is_requested_once() {
    let mut world = prepared(PrepareConfig::default());
    assert!(query::menu_open_requested(&world));

    let _ = run(&mut world, Command::AcknowledgeMenuOpened);
    assert!(!query::menu_open_requested(&world));

    let quiet = prepared(PrepareConfig {
        auto_open_menu: false,
        ..PrepareConfig::default()
    });
    assert!(!query::menu_open_requested(&quiet));
}

#[test]
fn skip_preparation_goes_straight_to_actor_phase() {
    let mut world = World::new(&layout(), PrepareConfig::default());

    let _ = run(&mut world, Command::SkipPreparation);

    assert_eq!(query::battle_phase(&world), BattlePhase::ActorPhase);
    assert_eq!(query::battle_actors(&world), &[SlotId::new(1), SlotId::new(2)]);
}

#[test]
fn slot_lookup_by_tile() {
    let world = prepared(PrepareConfig::default());
    let slot = query::slot_at(&world, TilePos::new(3, 0)).expect("slot on tile");
    assert_eq!(slot.id(), SlotId::new(3));
    assert!(slot.is_erased());
    assert!(query::slot_at(&world, TilePos::new(9, 9)).is_none());
}
