//! Encounter lifecycle signals emitted by the host.

/// Things the host tells the engine about the local entity's situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterSignal {
    CombatStarted,
    CombatEnded,
    /// Entered an instanced duty (dungeon, trial, raid).
    DutyEntered,
    DutyLeft,
}

/// Consumer of [`EncounterSignal`]s.
pub trait SignalHandler {
    fn handle_signal(&mut self, signal: EncounterSignal);

    fn handle_signals(&mut self, signals: &[EncounterSignal]) {
        for signal in signals {
            self.handle_signal(*signal);
        }
    }
}
