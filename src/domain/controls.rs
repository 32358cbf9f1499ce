/// Control snapshot read by the engine once per frame.
///
/// Directions are continuous (held), the action flag is turned into an
/// edge trigger by the engine using the `last_action` store.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub action: bool,
}

impl Controls {
    /// Per-axis sum of held directions: -1, 0 or +1 on each axis.
    /// Opposite directions cancel.
    pub fn axes(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up { dy -= 1.0; }
        if self.down { dy += 1.0; }
        if self.left { dx -= 1.0; }
        if self.right { dx += 1.0; }
        (dx, dy)
    }

    pub fn merge(self, other: Controls) -> Controls {
        Controls {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
            action: self.action || other.action,
        }
    }
}

/// Where the engine polls controls from.
pub trait ControlSource {
    fn controls(&self) -> Controls;
    /// Action state observed on the previous frame.
    fn last_action(&self) -> bool;
    fn set_last_action(&mut self, pressed: bool);
}
