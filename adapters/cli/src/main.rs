#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the battle preparation engine.

mod map_file;
mod save_file;
mod script;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use battle_prepare_core::{ActorId, PrepareSettings};
use battle_prepare_system_session::{PrepareSession, SessionState};
use battle_prepare_world::{query, Slot};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use map_file::MapFile;

/// Battle preparation tools.
#[derive(Debug, Parser)]
#[command(name = "battle-prepare", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Enables the preparation phase for the next battle.
    Enable {
        /// Save file holding the toggle.
        #[arg(long, default_value = "save.json")]
        save: PathBuf,
    },
    /// Disables the preparation phase for the next battle.
    Disable {
        /// Save file holding the toggle.
        #[arg(long, default_value = "save.json")]
        save: PathBuf,
    },
    /// Prints whether the next battle starts with a preparation phase.
    Status {
        /// Save file holding the toggle.
        #[arg(long, default_value = "save.json")]
        save: PathBuf,
    },
    /// Enters preparation on a map and prints the resulting roster.
    Inspect {
        /// Map description in TOML.
        map: PathBuf,
    },
    /// Replays an input script against a map.
    Play {
        /// Map description in TOML.
        map: PathBuf,
        /// Input script, one step per line.
        script: PathBuf,
        /// Save file consulted for the toggle and reset after the battle.
        #[arg(long)]
        save: Option<PathBuf>,
        /// Overrides the maximum headcount for this battle.
        #[arg(long)]
        max_actor: Option<usize>,
        /// Overrides the minimum headcount for this battle.
        #[arg(long)]
        min_actor: Option<usize>,
    },
}

/// Entry point for the battle preparation command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        CliCommand::Enable { save } => toggle(&save, true, &mut out),
        CliCommand::Disable { save } => toggle(&save, false, &mut out),
        CliCommand::Status { save } => {
            let settings = save_file::load(&save)?;
            report_toggle(&settings, &mut out)
        }
        CliCommand::Inspect { map } => inspect(&map, &mut out),
        CliCommand::Play {
            map,
            script,
            save,
            max_actor,
            min_actor,
        } => {
            let mut settings = match &save {
                Some(path) => save_file::load(path)?,
                None => PrepareSettings::default(),
            };
            if let Some(count) = max_actor {
                settings.override_max_actor(count);
            }
            if let Some(count) = min_actor {
                settings.override_min_actor(count);
            }
            play(&map, &script, &mut settings, &mut out)?;
            if let Some(path) = &save {
                save_file::store(path, &settings)?;
            }
            Ok(())
        }
    }
}

fn toggle(save: &Path, enabled: bool, out: &mut impl Write) -> Result<()> {
    let mut settings = save_file::load(save)?;
    if enabled {
        settings.enable();
    } else {
        settings.disable();
    }
    save_file::store(save, &settings)?;
    report_toggle(&settings, out)
}

fn report_toggle(settings: &PrepareSettings, out: &mut impl Write) -> Result<()> {
    let state = if settings.is_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    writeln!(out, "battle preparation {state}")?;
    Ok(())
}

fn inspect(map: &Path, out: &mut impl Write) -> Result<()> {
    let file = MapFile::load(map)?;
    let world = file
        .world()
        .with_context(|| format!("map {} has invalid slots", map.display()))?;
    let mut session = PrepareSession::new(world);
    let _ = session.begin(file.party(), &mut PrepareSettings::default())?;
    let world = session.world();

    for slot in query::slots(world) {
        writeln!(
            out,
            "slot {:>3} ({:>3},{:>3}) {:<12} template {:>3} {}",
            slot.id().get(),
            slot.position().x(),
            slot.position().y(),
            format!("{:?}", slot.role()),
            slot.template().get(),
            describe_occupant(slot),
        )?;
    }

    let roster = query::roster(world);
    writeln!(out, "eligible  {:?}", ids(roster.all_eligible()))?;
    writeln!(out, "locked    {:?}", ids(roster.locked()))?;
    writeln!(out, "remaining {:?}", ids(roster.remaining()))?;
    writeln!(
        out,
        "count {} (min {}, max {}) {}",
        roster.current_count(),
        roster.min_actor(),
        roster.max_actor(),
        if roster.is_valid_count() { "ready" } else { "not ready" },
    )?;
    writeln!(out, "menu {:?}", query::menu_commands(world))?;
    for entry in session.formation().entries(world) {
        writeln!(
            out,
            "formation actor {} deployed={} locked={}",
            entry.actor.get(),
            entry.deployed,
            entry.locked
        )?;
    }
    Ok(())
}

fn describe_occupant(slot: &Slot) -> String {
    if slot.is_erased() {
        return "erased".to_owned();
    }
    match slot.unit() {
        Some(unit) => format!("{unit:?}"),
        None => "empty".to_owned(),
    }
}

fn ids(actors: &[ActorId]) -> Vec<u32> {
    actors.iter().map(|actor| actor.get()).collect()
}

fn play(
    map: &Path,
    script_path: &Path,
    settings: &mut PrepareSettings,
    out: &mut impl Write,
) -> Result<()> {
    let file = MapFile::load(map)?;
    let world = file
        .world()
        .with_context(|| format!("map {} has invalid slots", map.display()))?;
    let text = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let steps = script::parse(&text)
        .with_context(|| format!("failed to parse script {}", script_path.display()))?;

    let mut session = PrepareSession::new(world);
    let state = session.begin(file.party(), settings)?;
    writeln!(out, "session {state:?}")?;
    for event in session.drain_events() {
        writeln!(out, "  {event:?}")?;
    }

    script::run(&mut session, &steps, out)?;
    writeln!(out, "session {:?}", session.state())?;

    if session.state() != SessionState::Preparing {
        settings.end_battle();
    }
    Ok(())
}
