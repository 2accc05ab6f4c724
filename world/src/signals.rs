//! Refresh flags consumed by presentation surfaces.

use battle_prepare_core::{Event, RefreshSignal, SignalPayload, Surface};

#[derive(Clone, Debug, Default)]
pub(crate) struct WindowSignals {
    prepare_command: RefreshSignal,
    actor_command_status: RefreshSignal,
    status: RefreshSignal,
}

impl WindowSignals {
    pub(crate) fn get(&self, surface: Surface) -> RefreshSignal {
        match surface {
            Surface::PrepareCommand => self.prepare_command,
            Surface::ActorCommandStatus => self.actor_command_status,
            Surface::Status => self.status,
        }
    }

    pub(crate) fn raise(&mut self, surface: Surface, payload: SignalPayload, out: &mut Vec<Event>) {
        self.set(surface, RefreshSignal::Raised(payload), out);
    }

    pub(crate) fn clear(&mut self, surface: Surface, out: &mut Vec<Event>) {
        self.set(surface, RefreshSignal::Cleared, out);
    }

    pub(crate) fn clear_all(&mut self, out: &mut Vec<Event>) {
        for surface in Surface::ALL {
            self.clear(surface, out);
        }
    }

    fn set(&mut self, surface: Surface, signal: RefreshSignal, out: &mut Vec<Event>) {
        let slot = match surface {
            Surface::PrepareCommand => &mut self.prepare_command,
            Surface::ActorCommandStatus => &mut self.actor_command_status,
            Surface::Status => &mut self.status,
        };
        if *slot == signal {
            return;
        }
        *slot = signal;
        out.push(Event::SignalChanged { surface, signal });
    }
}
