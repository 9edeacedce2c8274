//! Signals driving state transitions
//!
//! Signals carry no payload. Everything a state needs travels through the
//! state's own context, handed over on transitions.

/// Ids below this value are reserved for "no signal"
pub const FIRST_SIGNAL_ID: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    LeftMouseDown,
    LeftMouseUp,
    LeftMouseDrag,
    /// Return the machine to its begin state
    BackToStart,
    Delete,
    Duplicate,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Signal::LeftMouseDown,
        Signal::LeftMouseUp,
        Signal::LeftMouseDrag,
        Signal::BackToStart,
        Signal::Delete,
        Signal::Duplicate,
    ];

    /// Stable numeric id, used in debug traces
    pub fn id(&self) -> u32 {
        FIRST_SIGNAL_ID + *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            Signal::LeftMouseDown => "LeftMouseDown",
            Signal::LeftMouseUp => "LeftMouseUp",
            Signal::LeftMouseDrag => "LeftMouseDrag",
            Signal::BackToStart => "BackToStart",
            Signal::Delete => "Delete",
            Signal::Duplicate => "Duplicate",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
