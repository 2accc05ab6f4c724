//! Line-based input scripts replayed against a preparation session.
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! tap 3 0
//! choose exchange
//! busy actor-status
//! tap 4 0
//! idle actor-status
//! ready
//! ```

use std::io::Write;

use anyhow::Result;
use battle_prepare_core::{ActorId, PopupChoice, Surface, TilePos};
use battle_prepare_system_prepare::WindowActivity;
use battle_prepare_system_session::PrepareSession;
use thiserror::Error;

/// One scripted player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Tap(TilePos),
    Choose(PopupChoice),
    Cancel,
    Toggle(ActorId),
    Close,
    MaxActor(usize),
    MinActor(usize),
    PrepareEvents,
    Acknowledge(Surface),
    Resume,
    Busy(Surface),
    Idle(Surface),
    Ready,
}

/// Script line that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub(crate) struct ScriptError {
    line: usize,
    message: String,
}

/// Parses a whole script.
pub(crate) fn parse(text: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let step = parse_step(content).map_err(|message| ScriptError {
            line: index + 1,
            message,
        })?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_step(content: &str) -> Result<Step, String> {
    let words: Vec<&str> = content.split_whitespace().collect();
    let step = match words.as_slice() {
        ["tap", x, y] => Step::Tap(TilePos::new(number(x)?, number(y)?)),
        ["choose", "exchange"] => Step::Choose(PopupChoice::Exchange),
        ["choose", "status"] => Step::Choose(PopupChoice::Status),
        ["choose", "remove"] => Step::Choose(PopupChoice::Remove),
        ["choose", "cancel"] => Step::Choose(PopupChoice::Cancel),
        ["choose", "member", actor] => {
            Step::Choose(PopupChoice::PartyMember(ActorId::new(number(actor)?)))
        }
        ["cancel"] => Step::Cancel,
        ["toggle", actor] => Step::Toggle(ActorId::new(number(actor)?)),
        ["close"] => Step::Close,
        ["max", count] => Step::MaxActor(number(count)?),
        ["min", count] => Step::MinActor(number(count)?),
        ["prepare"] => Step::PrepareEvents,
        ["ack", surface] => Step::Acknowledge(surface_named(surface)?),
        ["resume"] => Step::Resume,
        ["busy", surface] => Step::Busy(surface_named(surface)?),
        ["idle", surface] => Step::Idle(surface_named(surface)?),
        ["ready"] => Step::Ready,
        _ => return Err(format!("unknown step `{content}`")),
    };
    Ok(step)
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse()
        .map_err(|_| format!("`{word}` is not a non-negative number"))
}

fn surface_named(word: &str) -> Result<Surface, String> {
    match word {
        "command" => Ok(Surface::PrepareCommand),
        "actor-status" => Ok(Surface::ActorCommandStatus),
        "status" => Ok(Surface::Status),
        other => Err(format!("unknown surface `{other}`")),
    }
}

/// Window animation state toggled by `busy` and `idle` steps.
#[derive(Clone, Debug, Default)]
pub(crate) struct ScriptWindows {
    busy: Vec<Surface>,
}

impl ScriptWindows {
    fn set(&mut self, surface: Surface, busy: bool) {
        self.busy.retain(|candidate| *candidate != surface);
        if busy {
            self.busy.push(surface);
        }
    }
}

impl WindowActivity for ScriptWindows {
    fn is_busy(&self, surface: Surface) -> bool {
        self.busy.contains(&surface)
    }
}

/// Replays the steps, echoing every world event to `out`.
pub(crate) fn run(
    session: &mut PrepareSession,
    steps: &[Step],
    out: &mut impl Write,
) -> Result<()> {
    let mut windows = ScriptWindows::default();
    for step in steps {
        writeln!(out, "> {step:?}")?;
        let outcome = match *step {
            Step::Tap(position) => session.tap(position, &windows),
            Step::Choose(choice) => session.choose(choice, &windows),
            Step::Cancel => session.cancel(&windows),
            Step::Toggle(actor) => session.toggle_member(actor),
            Step::Close => session.close_formation(),
            Step::MaxActor(count) => session.set_max_actor(count),
            Step::MinActor(count) => session.set_min_actor(count),
            Step::PrepareEvents => session.run_prepare_events(),
            Step::Acknowledge(surface) => {
                session.acknowledge(surface);
                Ok(())
            }
            Step::Resume => session.resume(),
            Step::Busy(surface) => {
                windows.set(surface, true);
                Ok(())
            }
            Step::Idle(surface) => {
                windows.set(surface, false);
                Ok(())
            }
            Step::Ready => session.commit().map(|battle| {
                let ids: Vec<u32> = battle.iter().map(|slot| slot.get()).collect();
                tracing::info!(?ids, "battle starts");
            }),
        };
        if let Err(error) = outcome {
            writeln!(out, "  refused: {error}")?;
        }
        for event in session.drain_events() {
            writeln!(out, "  {event:?}")?;
        }
    }
    Ok(())
}
