use std::fmt::Display;

/// The sixteen states of the JTAG TAP controller, plus the [`TapState::Invalid`] sentinel
/// returned when a name cannot be resolved.
///
/// The discriminants follow the order used by the Linux JTAG subsystem, so a state can be
/// handed to a driver as-is.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum TapState {
    Reset = 0,
    Idle = 1,
    DrSelect = 2,
    DrCapture = 3,
    DrShift = 4,
    DrExit1 = 5,
    DrPause = 6,
    DrExit2 = 7,
    DrUpdate = 8,
    IrSelect = 9,
    IrCapture = 10,
    IrShift = 11,
    IrExit1 = 12,
    IrPause = 13,
    IrExit2 = 14,
    IrUpdate = 15,
    Invalid = 0xff,
}

/// Returned by [`TapState::name`] for anything without a table entry.
pub const UNKNOWN_STATE_NAME: &str = "???";

// Lookup by state returns the first hit, so the canonical names must come before any alias.
const NAME_MAPPING: &[(TapState, &str)] = &[
    (TapState::Reset, "RESET"),
    (TapState::Idle, "RUN/IDLE"),
    (TapState::DrSelect, "DRSELECT"),
    (TapState::DrCapture, "DRCAPTURE"),
    (TapState::DrShift, "DRSHIFT"),
    (TapState::DrExit1, "DREXIT1"),
    (TapState::DrPause, "DRPAUSE"),
    (TapState::DrExit2, "DREXIT2"),
    (TapState::DrUpdate, "DRUPDATE"),
    (TapState::IrSelect, "IRSELECT"),
    (TapState::IrCapture, "IRCAPTURE"),
    (TapState::IrShift, "IRSHIFT"),
    (TapState::IrExit1, "IREXIT1"),
    (TapState::IrPause, "IRPAUSE"),
    (TapState::IrExit2, "IREXIT2"),
    (TapState::IrUpdate, "IRUPDATE"),
    // input only: the standard SVF spelling
    (TapState::Idle, "IDLE"),
];

impl TapState {
    /// All real TAP states in graph order. Does not contain [`TapState::Invalid`].
    pub const ALL: [TapState; 16] = [
        TapState::Reset,
        TapState::Idle,
        TapState::DrSelect,
        TapState::DrCapture,
        TapState::DrShift,
        TapState::DrExit1,
        TapState::DrPause,
        TapState::DrExit2,
        TapState::DrUpdate,
        TapState::IrSelect,
        TapState::IrCapture,
        TapState::IrShift,
        TapState::IrExit1,
        TapState::IrPause,
        TapState::IrExit2,
        TapState::IrUpdate,
    ];

    /// The canonical name of this state, or `"???"` if there is none.
    pub fn name(self) -> &'static str {
        NAME_MAPPING
            .iter()
            .find(|(state, _)| *state == self)
            .map(|(_, name)| *name)
            .unwrap_or(UNKNOWN_STATE_NAME)
    }

    /// Resolves a state name, ignoring ASCII case. Accepts `IDLE` as an alias for `RUN/IDLE`.
    /// Returns [`TapState::Invalid`] when nothing matches.
    pub fn from_name(name: &str) -> TapState {
        NAME_MAPPING
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name))
            .map(|(state, _)| *state)
            .unwrap_or(TapState::Invalid)
    }

    pub fn is_valid(self) -> bool {
        self != TapState::Invalid
    }
}

impl Display for TapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Free-function form of [`TapState::name`].
pub fn name_of(state: TapState) -> &'static str {
    state.name()
}

/// Free-function form of [`TapState::from_name`].
pub fn state_of(name: &str) -> TapState {
    TapState::from_name(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for state in TapState::ALL {
            assert_eq!(TapState::from_name(state.name()), state);
        }
    }

    #[test]
    fn idle_accepts_alias_and_any_case() {
        assert_eq!(state_of("idle"), TapState::Idle);
        assert_eq!(state_of("IDLE"), TapState::Idle);
        assert_eq!(state_of("Run/Idle"), TapState::Idle);
        assert_eq!(state_of("run/idle"), TapState::Idle);
    }

    #[test]
    fn alias_is_never_returned() {
        assert_eq!(name_of(TapState::Idle), "RUN/IDLE");
        assert!(TapState::ALL.iter().all(|s| s.name() != "IDLE"));
    }

    #[test]
    fn unknown_lookups_degrade_to_sentinels() {
        assert_eq!(name_of(TapState::Invalid), "???");
        assert_eq!(state_of("SHIFTDR"), TapState::Invalid);
        assert_eq!(state_of(""), TapState::Invalid);
        assert_eq!(state_of("IDLE "), TapState::Invalid);
    }

    #[test]
    fn every_state_has_a_distinct_name() {
        let mut names: Vec<_> = TapState::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 16);
    }
}
