/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

use config::GameConfig;
use domain::controls::ControlSource;
use sim::clock::{FramePacer, SystemClock};
use sim::engine::Engine;
use sim::event::{EventLog, GameEvent};
use sim::save::BestScoreStore;
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CANCEL, KEYS_CONFIRM, KEYS_QUIT};
use ui::renderer::Renderer;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Title,
    Playing,
    GameOver,
    Victory,
}

/// Screen state the shell keeps between frames.
struct Shell {
    phase: Phase,
    score: u32,
    level: u32,
    best: u32,
    new_best: bool,
}

impl Shell {
    fn new(best: u32) -> Self {
        Shell { phase: Phase::Title, score: 0, level: 1, best, new_best: false }
    }

    /// Fold one engine event into the screen state.
    fn apply(&mut self, event: GameEvent, store: &BestScoreStore) {
        match event {
            GameEvent::ScoreChanged(score) => self.score = score,
            GameEvent::LevelChanged(level) => self.level = level,
            GameEvent::GameOver { score } => {
                self.record(score, store);
                self.phase = Phase::GameOver;
            }
            GameEvent::Victory { score } => {
                self.record(score, store);
                self.phase = Phase::Victory;
            }
        }
    }

    fn record(&mut self, score: u32, store: &BestScoreStore) {
        let previous = store.load().max(self.best);
        self.best = store.submit(score).max(previous);
        self.new_best = score > previous;
    }
}

fn main() {
    // Logs go to stderr; keep them off unless asked for, since they would
    // land on top of the alternate screen.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let config = GameConfig::load();
    let store = BestScoreStore::open();
    log::info!("best score file: {}", store.path().display());
    let mut shell = Shell::new(store.load());

    let mut renderer = Renderer::new(config.display.cell_width, config.display.cell_height);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut kb = InputState::new();
    if let Err(e) = kb.attach() {
        log::warn!("keyboard enhancement failed: {e}");
    }

    let result = game_loop(&mut shell, &mut renderer, &mut kb, &config, &store);

    if let Err(e) = kb.detach() {
        eprintln!("Keyboard reset failed: {e}");
    }

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing RoboFire: Cloud Clash!");
    println!("Final Score: {}   Best: {}", shell.score, shell.best);
}

fn game_loop(
    shell: &mut Shell,
    renderer: &mut Renderer,
    kb: &mut InputState,
    config: &GameConfig,
    store: &BestScoreStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    log::info!("gamepad connected: {}", gp.connected);

    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("rng seed {seed}");
    let rng: Box<dyn RngCore> = Box::new(Pcg32::seed_from_u64(seed));

    let (width, height) = renderer.viewport();
    let mut engine = Engine::new(
        width,
        height,
        config.tuning.clone(),
        Box::new(SystemClock::new()),
        rng,
        EventLog::new(),
    );
    let max_level = config.tuning.max_level;
    let mut pacer = FramePacer::new(Duration::from_millis(config.display.frame_ms));

    loop {
        kb.drain_events();
        gp.update();
        kb.set_pad(gp.controls());

        if kb.ctrl_c_pressed() {
            break;
        }

        if renderer.sync_size()? {
            let (w, h) = renderer.viewport();
            engine.resize(w, h);
        }

        let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
        let cancel = kb.any_pressed(KEYS_CANCEL) || gp.cancel_pressed();
        if kb.any_pressed(KEYS_QUIT) {
            break;
        }

        match shell.phase {
            Phase::Title => {
                if cancel {
                    break;
                }
                if confirm {
                    start_run(shell, &mut engine, kb);
                }
            }
            Phase::Playing => {
                if cancel {
                    engine.stop();
                    kb.reset();
                    shell.phase = Phase::Title;
                } else if engine.is_running() {
                    engine.frame(kb, renderer);
                }
            }
            Phase::GameOver | Phase::Victory => {
                if confirm {
                    start_run(shell, &mut engine, kb);
                } else if cancel {
                    shell.phase = Phase::Title;
                }
            }
        }

        for event in engine.callbacks_mut().drain() {
            if event.is_outcome() {
                // Fire still held at the end of a run must not confirm.
                kb.suppress_held(Instant::now());
            }
            shell.apply(event, store);
        }

        match shell.phase {
            Phase::Title => renderer.compose_title(shell.best, max_level),
            Phase::Playing => renderer.compose_hud(shell.score, shell.level, max_level, shell.best),
            Phase::GameOver => {
                renderer.compose_game_over(shell.score, shell.level, shell.best, shell.new_best)
            }
            Phase::Victory => renderer.compose_victory(shell.score, shell.best, shell.new_best),
        }

        renderer.present()?;
        pacer.wait();
    }

    Ok(())
}

/// Begin a fresh run. The key that started it must not also fire.
fn start_run(shell: &mut Shell, engine: &mut Engine<EventLog>, kb: &mut InputState) {
    kb.reset();
    kb.set_last_action(true);
    engine.restart();
    shell.new_best = false;
    shell.phase = Phase::Playing;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> BestScoreStore {
        let dir = std::env::temp_dir().join(format!("robofire-shell-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = BestScoreStore::at(dir.join("highscore.dat"));
        let _ = std::fs::remove_file(store.path());
        store
    }

    #[test]
    fn progress_events_update_hud_state() {
        let store = temp_store("progress");
        let mut shell = Shell::new(0);
        shell.phase = Phase::Playing;
        shell.apply(GameEvent::ScoreChanged(10), &store);
        shell.apply(GameEvent::LevelChanged(2), &store);
        assert_eq!((shell.score, shell.level), (10, 2));
        assert_eq!(shell.phase, Phase::Playing);
    }

    #[test]
    fn game_over_records_new_best() {
        let store = temp_store("best");
        let mut shell = Shell::new(store.load());
        shell.apply(GameEvent::GameOver { score: 14 }, &store);
        assert_eq!(shell.phase, Phase::GameOver);
        assert!(shell.new_best);
        assert_eq!(shell.best, 14);
        assert_eq!(store.load(), 14);

        shell.apply(GameEvent::Victory { score: 9 }, &store);
        assert_eq!(shell.phase, Phase::Victory);
        assert!(!shell.new_best);
        assert_eq!(shell.best, 14);
    }
}
