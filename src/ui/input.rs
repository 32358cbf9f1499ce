/// Keyboard state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered firing and menu keys (only on initial press)
///   - Simultaneous movement + fire in the same frame
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use crate::domain::controls::{ControlSource, Controls};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// A key held across a screen change stays swallowed until it goes this
/// long without an event. Covers the usual autorepeat start delay.
const REPEAT_GRACE: Duration = Duration::from_millis(600);

// ── Key sets ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_FIRE: &[KeyCode] = &[KeyCode::Char(' ')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Flags were pushed by `attach` and must be popped.
    enhanced: bool,

    /// Keys still down from the previous screen, with the time of their
    /// latest event. Their repeats are not presses.
    suppressed: HashMap<KeyCode, Instant>,

    /// Gamepad snapshot OR-ed into `controls()`.
    pad: Controls,

    /// Action state seen by the engine on the previous frame.
    last_action: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            enhanced: false,
            suppressed: HashMap::new(),
            pad: Controls::default(),
            last_action: false,
        }
    }

    /// Ask the terminal for press/release reporting. Call after raw mode
    /// is enabled.
    pub fn attach(&mut self) -> io::Result<()> {
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced = true;
            self.honor_release = true;
            log::info!("keyboard enhancement enabled");
        } else {
            log::info!("keyboard enhancement unavailable, using hold timeout");
        }
        Ok(())
    }

    /// Undo `attach`. Safe to call when nothing was pushed.
    pub fn detach(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(io::stdout(), PopKeyboardEnhancementFlags)?;
            self.enhanced = false;
            self.honor_release = false;
        }
        Ok(())
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.handle_key(key, Instant::now()),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        // Entries outlive HOLD_TIMEOUT so `suppress_held` still sees a key
        // sitting in its autorepeat delay; `is_held` applies the timeout.
        let now = Instant::now();
        self.last_active.retain(|_, t| now.saturating_duration_since(*t) < REPEAT_GRACE);
        self.suppressed.retain(|_, t| now.saturating_duration_since(*t) < REPEAT_GRACE);
    }

    /// Fold one key event into the held/pressed state.
    pub fn handle_key(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                // Explicit release: remove from active set
                self.last_active.remove(&key.code);
                self.suppressed.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout-based expiry
            }
            _ => {
                // Press, Repeat, or any other kind: treat as active
                if let Some(seen) = self.suppressed.get_mut(&key.code) {
                    if at.saturating_duration_since(*seen) < REPEAT_GRACE {
                        *seen = at;
                        return;
                    }
                    self.suppressed.remove(&key.code);
                }
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Replace the gamepad contribution for this frame.
    pub fn set_pad(&mut self, pad: Controls) {
        self.pad = pad;
    }

    /// Forget held keys and the action edge, e.g. between screens.
    pub fn reset(&mut self) {
        self.last_active.clear();
        self.fresh_presses.clear();
        self.pad = Controls::default();
        self.last_action = false;
    }

    /// Forget state like `reset`, but keep swallowing keys that are still
    /// down so their autorepeat does not act on the next screen.
    pub fn suppress_held(&mut self, at: Instant) {
        for (code, seen) in self.last_active.drain() {
            if at.saturating_duration_since(seen) < REPEAT_GRACE {
                self.suppressed.insert(code, seen);
            }
        }
        self.reset();
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn active(&self, codes: &[KeyCode]) -> bool {
        self.any_held(codes) || self.any_pressed(codes)
    }

    /// Keyboard-only snapshot.
    pub fn keyboard(&self) -> Controls {
        Controls {
            up: self.active(KEYS_UP),
            down: self.active(KEYS_DOWN),
            left: self.active(KEYS_LEFT),
            right: self.active(KEYS_RIGHT),
            action: self.active(KEYS_FIRE),
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSource for InputState {
    fn controls(&self) -> Controls {
        self.keyboard().merge(self.pad)
    }

    fn last_action(&self) -> bool {
        self.last_action
    }

    fn set_last_action(&mut self, pressed: bool) {
        self.last_action = pressed;
    }
}
