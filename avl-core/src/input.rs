//! Semantic input signals derived from a per-frame button snapshot.

/// State of one button for the current frame.
///
/// `repeat_count` is zero on the frame the button goes down and counts
/// auto-repeats while it is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    pub repeat_count: u32,
}

impl ButtonState {
    pub fn down() -> Self {
        Self {
            pressed: true,
            repeat_count: 0,
        }
    }

    /// Pressed on this frame, not held over from an earlier one.
    #[inline]
    pub fn fresh_press(&self) -> bool {
        self.pressed && self.repeat_count == 0
    }
}

/// The buttons the visualizer listens to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Buttons {
    pub pause: ButtonState,
    pub insert: ButtonState,
    /// Speed presets 0 through 9.
    pub digits: [ButtonState; 10],
}

/// What the host asks the visualizer to do this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Signals {
    pub pause_toggle: bool,
    pub trigger_insert: bool,
    pub speed_select: Option<u8>,
}

impl Signals {
    /// Reads a button snapshot.
    ///
    /// Toggles only fire on a fresh press so holding a key does not
    /// flicker. Speed selection is idempotent, so a held digit is fine;
    /// with several digits down the highest one wins.
    pub fn from_buttons(buttons: &Buttons) -> Self {
        let speed_select = buttons
            .digits
            .iter()
            .rposition(|b| b.pressed)
            .map(|i| i as u8);
        Self {
            pause_toggle: buttons.pause.fresh_press(),
            trigger_insert: buttons.insert.fresh_press(),
            speed_select,
        }
    }
}
