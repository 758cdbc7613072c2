//! Controller state and per-tick outcomes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A reading was stored at `index`.
    Sampled { index: usize, value: f32 },
    /// The reading failed; the buffer cursor did not move.
    Skipped { cycle: u32 },
    /// The cycle cap was passed and the run finalized.
    Finished,
    /// Tick arrived while idle.
    Idle,
}
