/// Per-frame simulation: input, spawning, movement, collisions, render.
///
/// The engine owns the Player, the spawned entities and the run
/// progression (score, level). It reads time from an injected `Clock`,
/// randomness from an injected RNG, and reports through `GameCallbacks`.

use rand::{Rng, RngCore};

use crate::config::Tuning;
use crate::domain::controls::ControlSource;
use crate::domain::draw::Surface;
use crate::domain::entity::{
    Entity, EntityKind, Hazard, Obstacle, Player, Sprite, HAZARD_SIZE,
};
use crate::domain::geometry::{check_collision, Collide, Vec2};

use super::clock::Clock;
use super::event::{Command, GameCallbacks};

// ── Layout constants ──

/// Player starts this far above the bottom edge.
const PLAYER_START_LIFT: f32 = 100.0;
const HAZARD_SPAWN_Y: f32 = -60.0;
const OBSTACLE_SPAWN_Y: f32 = -40.0;
/// Horizontal room reserved when picking an obstacle's spawn x.
const OBSTACLE_SPAWN_SPAN: f32 = 40.0;
/// Entities further than this below the viewport are swept.
const SWEEP_BELOW: f32 = 50.0;
/// Entities above this line are swept.
const SWEEP_ABOVE: f32 = -100.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

pub struct Engine<C: GameCallbacks> {
    callbacks: C,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
    tuning: Tuning,

    width: f32,
    height: f32,

    player: Player,
    entities: Vec<Entity>,
    commands: Vec<Command>,

    score: u32,
    level: u32,
    state: RunState,

    last_frame_ms: f64,
    hazard_timer: f64,
    obstacle_timer: f64,
}

impl<C: GameCallbacks> Engine<C> {
    /// Build an idle engine for a `width x height` viewport. Reports the
    /// initial score and level right away.
    pub fn new(
        width: f32,
        height: f32,
        tuning: Tuning,
        clock: Box<dyn Clock>,
        rng: Box<dyn RngCore>,
        callbacks: C,
    ) -> Self {
        let player = spawn_player(width, height, &tuning);
        let mut engine = Engine {
            callbacks,
            clock,
            rng,
            tuning,
            width,
            height,
            player,
            entities: Vec::new(),
            commands: Vec::new(),
            score: 0,
            level: 1,
            state: RunState::Idle,
            last_frame_ms: 0.0,
            hazard_timer: 0.0,
            obstacle_timer: 0.0,
        };
        engine.report_progress();
        engine
    }

    // ── Lifecycle ──

    /// Begin (or resume) simulating. No-op while already running.
    pub fn start(&mut self) {
        if self.state == RunState::Running {
            return;
        }
        self.state = RunState::Running;
        self.last_frame_ms = self.clock.now_ms();
        log::info!("run started at level {} score {}", self.level, self.score);
    }

    /// Halt at the next frame boundary. Safe to call repeatedly; never
    /// reports an outcome.
    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Stopped;
            log::debug!("run stopped");
        }
    }

    /// Throw the current run away and start a fresh one.
    pub fn restart(&mut self) {
        self.stop();
        self.player = spawn_player(self.width, self.height, &self.tuning);
        self.entities.clear();
        self.commands.clear();
        self.score = 0;
        self.level = 1;
        self.hazard_timer = 0.0;
        self.obstacle_timer = 0.0;
        self.state = RunState::Idle;
        self.report_progress();
        self.start();
    }

    /// New viewport bounds. The Player is pulled back inside if needed.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.player.clamp_to(self.width, self.height);
        log::debug!("viewport resized to {}x{}", self.width, self.height);
    }

    // ── Frame ──

    /// Run one simulation step. Does nothing unless running.
    pub fn frame(&mut self, input: &mut dyn ControlSource, surface: &mut dyn Surface) {
        if self.state != RunState::Running {
            return;
        }
        let now = self.clock.now_ms();
        let dt = (now - self.last_frame_ms).max(0.0);
        self.last_frame_ms = now;

        surface.clear();
        self.handle_input(input, now, dt);
        self.spawn(dt);
        self.advance(dt as f32);
        self.resolve_collisions();
        self.render(surface);
    }

    fn handle_input(&mut self, input: &mut dyn ControlSource, now: f64, dt: f64) {
        let controls = input.controls();
        let (ax, ay) = controls.axes();
        let step = self.player.speed * dt as f32;
        self.player.move_by(ax * step, ay * step);
        self.player.clamp_to(self.width, self.height);

        // Fire on the press edge only.
        if controls.action && !input.last_action() {
            self.player.shoot(now, &mut self.commands);
        }
        input.set_last_action(controls.action);

        for Command::Spawn(entity) in self.commands.drain(..) {
            self.entities.push(entity);
        }
    }

    fn spawn(&mut self, dt: f64) {
        self.hazard_timer += dt;
        self.obstacle_timer += dt;

        if self.hazard_timer >= self.tuning.hazard_interval(self.level) {
            let x = self.spawn_x(HAZARD_SIZE.width);
            let hazard = Hazard::new(Vec2::new(x, HAZARD_SPAWN_Y), self.level);
            log::trace!("spawned {} at x={x:.0}", hazard.body().id);
            self.entities.push(Entity::Hazard(hazard));
            self.hazard_timer = 0.0;
        }

        if self.obstacle_timer >= self.tuning.obstacle_interval(self.level) {
            let x = self.spawn_x(OBSTACLE_SPAWN_SPAN);
            let obstacle = Obstacle::new(Vec2::new(x, OBSTACLE_SPAWN_Y), self.level, self.rng.as_mut());
            log::trace!("spawned {} at x={x:.0}", obstacle.body().id);
            self.entities.push(Entity::Obstacle(obstacle));
            self.obstacle_timer = 0.0;
        }
    }

    /// Uniform x in `[0, width - span)`, or 0 when the viewport is too
    /// narrow.
    fn spawn_x(&mut self, span: f32) -> f32 {
        let room = self.width - span;
        if room <= 0.0 {
            0.0
        } else {
            self.rng.random_range(0.0..room)
        }
    }

    fn advance(&mut self, dt: f32) {
        self.player.update(dt);
        for e in &mut self.entities {
            e.update(dt);
        }

        let floor = self.height + SWEEP_BELOW;
        self.entities.retain(|e| {
            let y = e.body().pos.y;
            e.is_active() && y <= floor && y >= SWEEP_ABOVE
        });
    }

    fn resolve_collisions(&mut self) {
        if self.player.body().active {
            let player = self.player.rect();
            for i in 0..self.entities.len() {
                let e = &mut self.entities[i];
                if !e.is_active() || !check_collision(&player, &*e) {
                    continue;
                }
                match e.kind() {
                    EntityKind::Obstacle => {
                        self.stop();
                        log::info!("game over with score {}", self.score);
                        self.callbacks.on_game_over(self.score);
                        return;
                    }
                    EntityKind::Reward => {
                        e.deactivate();
                        if self.collect_reward() {
                            return;
                        }
                    }
                    _ => {}
                }
            }
        }

        // Rewards dropped here join the collection after the pass.
        let mut dropped = Vec::new();
        for i in 0..self.entities.len() {
            if self.entities[i].kind() != EntityKind::Hazard || !self.entities[i].is_active() {
                continue;
            }
            for j in 0..self.entities.len() {
                let hit = {
                    let (hazard, shot) = (&self.entities[i], &self.entities[j]);
                    shot.kind() == EntityKind::Projectile
                        && shot.is_active()
                        && check_collision(hazard, shot)
                };
                if hit {
                    self.entities[i].deactivate();
                    self.entities[j].deactivate();
                    if let Entity::Hazard(h) = &self.entities[i] {
                        log::trace!("{} shot down", h.body().id);
                        dropped.push(Entity::Reward(h.create_reward()));
                    }
                    break;
                }
            }
        }
        self.entities.extend(dropped);
    }

    /// Score one reward. Returns true when it ended the run in victory.
    fn collect_reward(&mut self) -> bool {
        self.score = self.score.saturating_add(self.tuning.points_per_reward);
        self.callbacks.on_score_update(self.score);

        if self.score >= self.level.saturating_mul(self.tuning.points_to_level_up) {
            self.level += 1;
            log::debug!("level up to {}", self.level);
            self.callbacks.on_level_update(self.level);
            if self.level > self.tuning.max_level {
                self.stop();
                log::info!("victory with score {}", self.score);
                self.callbacks.on_victory(self.score);
                return true;
            }
        }
        false
    }

    fn render(&self, surface: &mut dyn Surface) {
        if self.player.body().active {
            self.player.render(surface);
        }
        for e in self.entities.iter().filter(|e| e.is_active()) {
            e.render(surface);
        }
    }

    fn report_progress(&mut self) {
        self.callbacks.on_score_update(self.score);
        self.callbacks.on_level_update(self.level);
    }

    // ── Accessors ──

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn callbacks_mut(&mut self) -> &mut C { &mut self.callbacks }
}

fn spawn_player(width: f32, height: f32, tuning: &Tuning) -> Player {
    let mut player = Player::new(
        Vec2::new(width / 2.0, height - PLAYER_START_LIFT),
        tuning.player_speed,
        tuning.shoot_cooldown_ms,
    );
    player.clamp_to(width, height);
    player
}

#[cfg(test)]
impl<C: GameCallbacks> Engine<C> {
    fn state(&self) -> RunState { self.state }
    fn score(&self) -> u32 { self.score }
    fn level(&self) -> u32 { self.level }
    fn viewport(&self) -> (f32, f32) { (self.width, self.height) }
    fn player(&self) -> &Player { &self.player }
    fn entities(&self) -> &[Entity] { &self.entities }

    fn insert(&mut self, e: Entity) {
        self.entities.push(e);
    }

    fn set_progress(&mut self, score: u32, level: u32) {
        self.score = score;
        self.level = level;
    }

    fn place_player(&mut self, pos: Vec2) {
        self.player.body_mut().pos = pos;
    }

    fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind && e.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::controls::testing::ScriptedControls;
    use crate::domain::controls::Controls;
    use crate::domain::draw::testing::GridSurface;
    use crate::domain::draw::Tint;
    use crate::domain::entity::{ObstacleShape, Projectile, Reward, PLAYER_SIZE};
    use crate::sim::clock::testing::ManualClock;
    use crate::sim::event::{EventLog, GameEvent};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const W: f32 = 800.0;
    const H: f32 = 600.0;

    struct Rig {
        engine: Engine<EventLog>,
        clock: ManualClock,
        input: ScriptedControls,
        surface: GridSurface,
    }

    impl Rig {
        fn new() -> Self {
            let clock = ManualClock::new();
            let engine = Engine::new(
                W,
                H,
                Tuning::default(),
                Box::new(clock.clone()),
                Box::new(Pcg32::seed_from_u64(9)),
                EventLog::new(),
            );
            Rig {
                engine,
                clock,
                input: ScriptedControls::default(),
                surface: GridSurface::new(80, 30),
            }
        }

        fn started() -> Self {
            let mut rig = Self::new();
            rig.engine.start();
            rig.engine.callbacks_mut().drain();
            rig
        }

        fn step(&mut self, ms: f64) {
            self.clock.advance(ms);
            self.engine.frame(&mut self.input, &mut self.surface);
        }

        fn events(&mut self) -> Vec<GameEvent> {
            self.engine.callbacks_mut().drain()
        }

        /// A spot overlapping the player's box.
        fn on_player(&self) -> Vec2 {
            let p = self.engine.player().body().pos;
            Vec2::new(p.x + 10.0, p.y + 10.0)
        }
    }

    #[test]
    fn construction_reports_initial_progress() {
        let mut rig = Rig::new();
        assert_eq!(rig.events(), vec![GameEvent::ScoreChanged(0), GameEvent::LevelChanged(1)]);
        assert_eq!(rig.engine.state(), RunState::Idle);
    }

    #[test]
    fn player_starts_bottom_centre() {
        let rig = Rig::new();
        assert_eq!(rig.engine.player().body().pos, Vec2::new(400.0, 500.0));
    }

    #[test]
    fn idle_engine_ignores_frames() {
        let mut rig = Rig::new();
        rig.step(16.0);
        assert_eq!(rig.surface.clears, 0);
    }

    #[test]
    fn start_is_idempotent() {
        let mut rig = Rig::started();
        rig.clock.advance(50.0);
        rig.engine.start();
        rig.step(0.0);
        // Baseline was not reset by the second start: 50 ms elapsed.
        assert!(rig.engine.hazard_timer >= 50.0);
    }

    #[test]
    fn stop_twice_equals_once_and_is_silent() {
        let mut rig = Rig::started();
        rig.engine.stop();
        rig.engine.stop();
        assert_eq!(rig.engine.state(), RunState::Stopped);
        assert!(!rig.engine.is_running());
        assert!(rig.events().is_empty());
        rig.step(16.0);
        assert_eq!(rig.surface.clears, 0);
    }

    #[test]
    fn frame_clears_and_renders_player() {
        let mut rig = Rig::started();
        rig.step(16.0);
        assert_eq!(rig.surface.clears, 1);
        assert!(rig.surface.count(Tint::RobotBlue) > 0);
    }

    #[test]
    fn movement_scales_with_delta() {
        let mut rig = Rig::started();
        rig.input.now = Controls { left: true, up: true, ..Default::default() };
        rig.step(100.0);
        let p = rig.engine.player().body().pos;
        assert!((p.x - 370.0).abs() < 1e-3 && (p.y - 470.0).abs() < 1e-3, "{p:?}");
    }

    #[test]
    fn player_stays_inside_viewport() {
        let mut rig = Rig::started();
        let patterns = [
            Controls { left: true, up: true, ..Default::default() },
            Controls { right: true, down: true, ..Default::default() },
            Controls { right: true, up: true, ..Default::default() },
        ];
        for c in patterns {
            rig.input.now = c;
            for _ in 0..60 {
                rig.step(50.0);
                let p = rig.engine.player().body().pos;
                assert!(p.x >= 0.0 && p.x <= W - PLAYER_SIZE.width, "x = {}", p.x);
                assert!(p.y >= 0.0 && p.y <= H - PLAYER_SIZE.height, "y = {}", p.y);
            }
            if !rig.engine.is_running() {
                break;
            }
        }
    }

    #[test]
    fn held_action_fires_once() {
        let mut rig = Rig::started();
        rig.input.now.action = true;
        for _ in 0..10 {
            rig.step(50.0);
        }
        assert_eq!(rig.engine.count(EntityKind::Projectile), 1);
    }

    #[test]
    fn shots_within_cooldown_yield_one_projectile() {
        let mut rig = Rig::started();
        rig.input.now.action = true;
        rig.step(16.0);
        rig.input.now.action = false;
        rig.step(50.0);
        rig.input.now.action = true;
        rig.step(50.0);
        assert_eq!(rig.engine.count(EntityKind::Projectile), 1);

        rig.input.now.action = false;
        rig.step(150.0);
        rig.input.now.action = true;
        rig.step(100.0);
        assert_eq!(rig.engine.count(EntityKind::Projectile), 2);
    }

    #[test]
    fn hazard_spawns_on_interval() {
        let mut rig = Rig::started();
        for _ in 0..18 {
            rig.step(100.0);
        }
        assert_eq!(rig.engine.count(EntityKind::Hazard), 0);
        rig.step(100.0);
        assert_eq!(rig.engine.count(EntityKind::Hazard), 1);
        let h = rig.engine.entities().iter().find(|e| e.kind() == EntityKind::Hazard).unwrap();
        assert!(h.body().pos.x >= 0.0 && h.body().pos.x < W - HAZARD_SIZE.width);
    }

    #[test]
    fn high_level_spawns_hold_the_interval_floor() {
        let mut rig = Rig::started();
        rig.engine.set_progress(0, 30);
        rig.step(250.0);
        assert_eq!(rig.engine.count(EntityKind::Hazard), 1);
        for _ in 0..4 {
            rig.step(50.0);
            assert_eq!(rig.engine.count(EntityKind::Hazard), 1);
        }
        rig.step(50.0);
        assert_eq!(rig.engine.count(EntityKind::Hazard), 2);
        assert!(rig.engine.is_running());
    }

    #[test]
    fn resize_below_player_size_pins_to_left_edge() {
        let mut rig = Rig::started();
        rig.engine.resize(30.0, H);
        assert_eq!(rig.engine.player().body().pos.x, 0.0);
    }

    #[test]
    fn obstacle_spawns_on_interval() {
        let mut rig = Rig::started();
        for _ in 0..28 {
            rig.step(100.0);
        }
        assert_eq!(rig.engine.count(EntityKind::Obstacle), 0);
        rig.step(100.0);
        assert_eq!(rig.engine.count(EntityKind::Obstacle), 1);
    }

    #[test]
    fn narrow_viewport_spawns_at_left_edge() {
        let mut rig = Rig::started();
        rig.engine.resize(30.0, H);
        rig.step(2000.0);
        let h = rig.engine.entities().iter().find(|e| e.kind() == EntityKind::Hazard).unwrap();
        assert_eq!(h.body().pos.x, 0.0);
    }

    #[test]
    fn sweep_drops_inactive_and_offscreen() {
        let mut rig = Rig::started();
        let mut dead = Reward::new(Vec2::new(10.0, 100.0));
        dead.body_mut().active = false;
        rig.engine.insert(Entity::Reward(dead));
        rig.engine.insert(Entity::Hazard(Hazard::new(Vec2::new(10.0, H + 49.0), 1)));
        rig.engine.insert(Entity::Hazard(Hazard::new(Vec2::new(10.0, H + 40.0), 1)));
        rig.engine.insert(Entity::Projectile(Projectile::new(Vec2::new(10.0, -95.0))));
        rig.step(16.0);
        assert_eq!(rig.engine.entities().len(), 1);
        assert_eq!(rig.engine.entities()[0].kind(), EntityKind::Hazard);
    }

    #[test]
    fn reward_pickup_scores_and_levels_up() {
        let mut rig = Rig::started();
        rig.engine.set_progress(9, 1);
        let at = rig.on_player();
        rig.engine.insert(Entity::Reward(Reward::new(at)));
        rig.step(16.0);
        assert_eq!(rig.events(), vec![GameEvent::ScoreChanged(10), GameEvent::LevelChanged(2)]);
        assert_eq!(rig.engine.level(), 2);
        assert_eq!(rig.engine.count(EntityKind::Reward), 0);
    }

    #[test]
    fn final_level_up_is_victory_once() {
        let mut rig = Rig::started();
        rig.engine.set_progress(99, 10);
        let at = rig.on_player();
        rig.engine.insert(Entity::Reward(Reward::new(at)));
        rig.engine.insert(Entity::Reward(Reward::new(at)));
        rig.step(16.0);
        assert_eq!(
            rig.events(),
            vec![
                GameEvent::ScoreChanged(100),
                GameEvent::LevelChanged(11),
                GameEvent::Victory { score: 100 },
            ]
        );
        assert_eq!(rig.engine.state(), RunState::Stopped);
        rig.step(16.0);
        assert!(rig.events().is_empty());
        assert_eq!(rig.engine.score(), 100);
    }

    #[test]
    fn obstacle_contact_is_game_over_once() {
        let mut rig = Rig::started();
        let at = rig.on_player();
        rig.engine.insert(Entity::Obstacle(Obstacle::with_shape(at, 1, ObstacleShape::Bolt)));
        rig.engine.insert(Entity::Obstacle(Obstacle::with_shape(at, 1, ObstacleShape::Asteroid)));
        rig.step(16.0);
        assert_eq!(rig.events(), vec![GameEvent::GameOver { score: 0 }]);
        assert!(!rig.engine.is_running());

        let clears = rig.surface.clears;
        rig.step(16.0);
        assert_eq!(rig.surface.clears, clears);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn shot_hazard_drops_reward_collected_next_frame() {
        let mut rig = Rig::started();
        let hazard_at = Vec2::new(100.0, 100.0);
        rig.engine.insert(Entity::Hazard(Hazard::new(hazard_at, 1)));
        rig.engine.insert(Entity::Projectile(Projectile::new(Vec2::new(120.0, 110.0))));
        // Park the player where the coin will appear.
        rig.engine.place_player(Vec2::new(105.0, 95.0));
        rig.step(1.0);

        assert_eq!(rig.engine.count(EntityKind::Hazard), 0);
        assert_eq!(rig.engine.count(EntityKind::Projectile), 0);
        assert_eq!(rig.engine.count(EntityKind::Reward), 1);
        assert_eq!(rig.engine.score(), 0);
        assert!(rig.surface.count(Tint::CoinYellow) > 0);

        rig.step(1.0);
        assert_eq!(rig.engine.score(), 1);
        assert_eq!(rig.events(), vec![GameEvent::ScoreChanged(1)]);
    }

    #[test]
    fn score_only_grows_in_reward_steps() {
        let mut rig = Rig::started();
        let mut last = 0;
        for _ in 0..25 {
            let at = rig.on_player();
            rig.engine.insert(Entity::Reward(Reward::new(at)));
            rig.step(1.0);
            assert_eq!(rig.engine.score(), last + 1);
            last = rig.engine.score();
        }
        assert_eq!(rig.engine.level(), 3);
    }

    #[test]
    fn resize_pulls_player_inside() {
        let mut rig = Rig::started();
        rig.engine.resize(300.0, 200.0);
        let p = rig.engine.player().body().pos;
        assert_eq!(p, Vec2::new(250.0, 150.0));
        assert_eq!(rig.engine.viewport(), (300.0, 200.0));
    }

    #[test]
    fn restart_resets_the_run() {
        let mut rig = Rig::started();
        rig.engine.set_progress(42, 5);
        rig.engine.insert(Entity::Hazard(Hazard::new(Vec2::new(10.0, 10.0), 5)));
        rig.engine.stop();
        rig.engine.restart();
        assert!(rig.engine.is_running());
        assert_eq!(rig.engine.score(), 0);
        assert_eq!(rig.engine.level(), 1);
        assert!(rig.engine.entities().is_empty());
        assert_eq!(rig.events(), vec![GameEvent::ScoreChanged(0), GameEvent::LevelChanged(1)]);
    }
}
