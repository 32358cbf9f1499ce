/// Outbound notifications from the engine.
///
/// The engine reports through `GameCallbacks`. The shell uses `EventLog`,
/// which turns each callback into a `GameEvent` it drains after every
/// frame.

pub use crate::domain::entity::Command;

/// Callback contract between the engine and whatever hosts it.
pub trait GameCallbacks {
    fn on_score_update(&mut self, score: u32);
    fn on_level_update(&mut self, level: u32);
    fn on_game_over(&mut self, score: u32);
    fn on_victory(&mut self, score: u32);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    ScoreChanged(u32),
    LevelChanged(u32),
    GameOver { score: u32 },
    Victory { score: u32 },
}

impl GameEvent {
    pub fn is_outcome(&self) -> bool {
        matches!(self, GameEvent::GameOver { .. } | GameEvent::Victory { .. })
    }
}

/// Queues callbacks as events, in firing order.
#[derive(Default, Debug)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl GameCallbacks for EventLog {
    fn on_score_update(&mut self, score: u32) {
        self.events.push(GameEvent::ScoreChanged(score));
    }

    fn on_level_update(&mut self, level: u32) {
        self.events.push(GameEvent::LevelChanged(level));
    }

    fn on_game_over(&mut self, score: u32) {
        self.events.push(GameEvent::GameOver { score });
    }

    fn on_victory(&mut self, score: u32) {
        self.events.push(GameEvent::Victory { score });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_firing_order_and_drains() {
        let mut log = EventLog::new();
        log.on_score_update(3);
        log.on_level_update(2);
        log.on_victory(30);
        assert_eq!(
            log.drain(),
            vec![
                GameEvent::ScoreChanged(3),
                GameEvent::LevelChanged(2),
                GameEvent::Victory { score: 30 },
            ]
        );
        assert!(log.drain().is_empty());
    }

    #[test]
    fn only_terminal_events_are_outcomes() {
        assert!(GameEvent::GameOver { score: 0 }.is_outcome());
        assert!(GameEvent::Victory { score: 1 }.is_outcome());
        assert!(!GameEvent::ScoreChanged(1).is_outcome());
        assert!(!GameEvent::LevelChanged(2).is_outcome());
    }
}
