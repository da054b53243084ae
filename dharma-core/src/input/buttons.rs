//! Button identities and semantic press events

/// Number of physical buttons
pub const BUTTON_COUNT: usize = 5;

/// Physical buttons on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    /// Count up
    Increment,
    /// Count down; long press resets
    Decrement,
    /// Prostration start/pause and sound toggle
    Prostration,
    /// Next mode
    Next,
    /// Previous mode
    Previous,
}

impl ButtonId {
    /// All buttons in control-loop polling order
    pub const ALL: [ButtonId; BUTTON_COUNT] = [
        ButtonId::Increment,
        ButtonId::Decrement,
        ButtonId::Prostration,
        ButtonId::Next,
        ButtonId::Previous,
    ];

    /// Position in [`ButtonId::ALL`]
    pub fn index(self) -> usize {
        match self {
            ButtonId::Increment => 0,
            ButtonId::Decrement => 1,
            ButtonId::Prostration => 2,
            ButtonId::Next => 3,
            ButtonId::Previous => 4,
        }
    }
}

/// Kind of debounced button event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressKind {
    /// Stable down edge
    Press,
    /// Stable up edge of a short press
    ///
    /// Not delivered when the same press already produced a `LongPress`.
    Release,
    /// Held past the long-press threshold, fires once per press
    LongPress,
}

/// A debounced button event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressEvent {
    /// Button that produced the event
    pub source: ButtonId,
    /// What happened
    pub kind: PressKind,
}

impl PressEvent {
    /// Create a new event
    pub const fn new(source: ButtonId, kind: PressKind) -> Self {
        Self { source, kind }
    }
}
