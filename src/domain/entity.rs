/// Entities: Player (robot), Projectile, Hazard (cloud), Reward (coin),
/// Obstacle (bolt or asteroid).
///
/// Every entity owns a `Body` (id, kind, position, velocity, size,
/// active flag) plus kind-specific state. Speeds are in units per
/// millisecond; `update` takes the frame delta in milliseconds.
///
/// The Player is kept apart from the `Entity` enum: the engine stores it
/// in its own field, so it is never swept with the spawned entities.

use rand::{Rng, RngCore};

use super::draw::{Surface, Tint};
use super::geometry::{generate_id, Collide, Rect, Size, Vec2};

// ── Tuning constants ──

pub const PLAYER_SIZE: Size = Size::new(50.0, 50.0);

pub const PROJECTILE_SIZE: Size = Size::new(10.0, 20.0);
pub const PROJECTILE_SPEED: f32 = 0.7;
/// Projectile spawns this far above the player's top edge.
const PROJECTILE_LIFT: f32 = 15.0;

pub const HAZARD_SIZE: Size = Size::new(60.0, 40.0);
const HAZARD_BASE_SPEED: f32 = 0.1;
const HAZARD_LEVEL_SPEED: f32 = 0.02;

pub const REWARD_SIZE: Size = Size::new(30.0, 30.0);
const REWARD_SPEED: f32 = 0.2;
const REWARD_SPIN: f32 = 0.005;
const REWARD_DRIFT: f32 = 0.5;

pub const OBSTACLE_SIZE: Size = Size::new(30.0, 40.0);
const OBSTACLE_BASE_SPEED: f32 = 0.15;
const OBSTACLE_LEVEL_SPEED: f32 = 0.03;
const OBSTACLE_SPIN: f32 = 0.002;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Player,
    Hazard,
    Projectile,
    Reward,
    Obstacle,
}

impl EntityKind {
    fn prefix(self) -> &'static str {
        match self {
            EntityKind::Player => "robot",
            EntityKind::Hazard => "cloud",
            EntityKind::Projectile => "bullet",
            EntityKind::Reward => "coin",
            EntityKind::Obstacle => "obstacle",
        }
    }
}

/// State shared by every entity kind.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: String,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Size,
    pub active: bool,
}

impl Body {
    fn new(kind: EntityKind, pos: Vec2, vel: Vec2, size: Size) -> Self {
        Body {
            id: format!("{}-{}", kind.prefix(), generate_id()),
            kind,
            pos,
            vel,
            size,
            active: true,
        }
    }

    /// Move along the unit velocity at `speed` for `dt` ms.
    fn advance(&mut self, speed: f32, dt: f32) {
        self.pos.x += self.vel.x * speed * dt;
        self.pos.y += self.vel.y * speed * dt;
    }
}

impl Collide for Body {
    fn rect(&self) -> Rect {
        Rect::from_parts(self.pos, self.size)
    }
}

/// Per-kind behaviour shared through the `Entity` enum and the Player.
pub trait Sprite {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn update(&mut self, dt: f32);
    fn render(&self, surface: &mut dyn Surface);
}

/// Requests an entity makes of the engine. Drained once per frame.
#[derive(Debug)]
pub enum Command {
    Spawn(Entity),
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Player {
    body: Body,
    pub speed: f32,
    cooldown_ms: f64,
    last_shot: Option<f64>,
}

impl Player {
    pub fn new(pos: Vec2, speed: f32, cooldown_ms: f64) -> Self {
        Player {
            body: Body::new(EntityKind::Player, pos, Vec2::ZERO, PLAYER_SIZE),
            speed,
            cooldown_ms,
            last_shot: None,
        }
    }

    /// Set this frame's displacement. Applied and cleared by `update`.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.body.vel = Vec2::new(dx, dy);
    }

    /// Fire unless still cooling down. Returns whether a projectile was
    /// queued.
    pub fn shoot(&mut self, now_ms: f64, commands: &mut Vec<Command>) -> bool {
        if let Some(last) = self.last_shot {
            if now_ms - last < self.cooldown_ms {
                return false;
            }
        }
        let b = &self.body;
        let pos = Vec2::new(
            b.pos.x + b.size.width / 2.0 - PROJECTILE_SIZE.width / 2.0,
            b.pos.y - PROJECTILE_LIFT,
        );
        commands.push(Command::Spawn(Entity::Projectile(Projectile::new(pos))));
        self.last_shot = Some(now_ms);
        true
    }

    /// Keep the box inside `width x height`, counting the displacement
    /// still pending in the velocity.
    pub fn clamp_to(&mut self, width: f32, height: f32) {
        let b = &mut self.body;
        let max_x = width - b.size.width;
        let max_y = height - b.size.height;
        // Upper bound first so a viewport smaller than the box pins it at 0.
        b.pos.x = b.pos.x.min(max_x).max(0.0);
        b.pos.y = b.pos.y.min(max_y).max(0.0);
        let tx = (b.pos.x + b.vel.x).min(max_x).max(0.0);
        let ty = (b.pos.y + b.vel.y).min(max_y).max(0.0);
        b.vel = Vec2::new(tx - b.pos.x, ty - b.pos.y);
    }
}

impl Sprite for Player {
    fn body(&self) -> &Body { &self.body }
    fn body_mut(&mut self) -> &mut Body { &mut self.body }

    fn update(&mut self, _dt: f32) {
        self.body.pos.x += self.body.vel.x;
        self.body.pos.y += self.body.vel.y;
        self.body.vel = Vec2::ZERO;
    }

    fn render(&self, s: &mut dyn Surface) {
        let Vec2 { x, y } = self.body.pos;
        let Size { width: w, height: h } = self.body.size;

        // Body
        s.fill_rect(self.body.rect(), '█', Tint::RobotBlue);
        s.plot(x + w * 0.1, y + h * 0.1, '▛', Tint::RobotBlue);
        s.plot(x + w * 0.9, y + h * 0.1, '▜', Tint::RobotBlue);

        // Eyes
        s.plot(x + w * 0.3, y + h * 0.3, '◉', Tint::White);
        s.plot(x + w * 0.7, y + h * 0.3, '◉', Tint::White);

        // Mouth
        s.line(
            Vec2::new(x + w * 0.3, y + h * 0.7),
            Vec2::new(x + w * 0.7, y + h * 0.7),
            '▁',
            Tint::White,
        );

        // Antenna
        s.plot(x + w * 0.5, y - h * 0.2, '●', Tint::AntennaRed);
    }
}

// ══════════════════════════════════════════════════════════════
// Projectile
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Projectile {
    body: Body,
}

impl Projectile {
    pub fn new(pos: Vec2) -> Self {
        Projectile { body: Body::new(EntityKind::Projectile, pos, Vec2::UP, PROJECTILE_SIZE) }
    }
}

impl Sprite for Projectile {
    fn body(&self) -> &Body { &self.body }
    fn body_mut(&mut self) -> &mut Body { &mut self.body }

    fn update(&mut self, dt: f32) {
        self.body.advance(PROJECTILE_SPEED, dt);
        if self.body.pos.y < -self.body.size.height {
            self.body.active = false;
        }
    }

    fn render(&self, s: &mut dyn Surface) {
        let c = self.body.rect().center();
        let h = self.body.size.height;
        s.plot(c.x, c.y, '▲', Tint::BulletOrange);
        s.plot(c.x, c.y + h, '┊', Tint::BulletGlow);
    }
}

// ══════════════════════════════════════════════════════════════
// Hazard (cloud)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Hazard {
    body: Body,
    speed: f32,
}

impl Hazard {
    /// Speed is fixed from `level` here and never re-evaluated.
    pub fn new(pos: Vec2, level: u32) -> Self {
        Hazard {
            body: Body::new(EntityKind::Hazard, pos, Vec2::DOWN, HAZARD_SIZE),
            speed: HAZARD_BASE_SPEED + level as f32 * HAZARD_LEVEL_SPEED,
        }
    }

    /// The coin dropped when this cloud is shot, centred on it.
    pub fn create_reward(&self) -> Reward {
        let c = self.body.rect().center();
        Reward::new(Vec2::new(
            c.x - REWARD_SIZE.width / 2.0,
            c.y - REWARD_SIZE.height / 2.0,
        ))
    }
}

impl Sprite for Hazard {
    fn body(&self) -> &Body { &self.body }
    fn body_mut(&mut self) -> &mut Body { &mut self.body }

    fn update(&mut self, dt: f32) {
        self.body.advance(self.speed, dt);
    }

    fn render(&self, s: &mut dyn Surface) {
        let Vec2 { x, y } = self.body.pos;
        let Size { width: w, height: h } = self.body.size;
        let puffs = [
            (0.3, 0.5, 0.5),
            (0.6, 0.4, 0.6),
            (0.8, 0.6, 0.4),
        ];
        for (fx, fy, fr) in puffs {
            let r = h * fr;
            s.fill_ellipse(Vec2::new(x + w * fx, y + h * fy), r, r, '▒', Tint::CloudGray);
        }
        // Thin clouds can miss every cell centre.
        let c = self.body.rect().center();
        s.plot(c.x, c.y, '▒', Tint::CloudGray);
    }
}

// ══════════════════════════════════════════════════════════════
// Reward (coin)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Reward {
    body: Body,
    rotation: f32,
    rotation_speed: f32,
}

impl Reward {
    pub fn new(pos: Vec2) -> Self {
        Reward {
            body: Body::new(EntityKind::Reward, pos, Vec2::DOWN, REWARD_SIZE),
            rotation: 0.0,
            rotation_speed: REWARD_SPIN,
        }
    }

    /// Apparent half-width of the spinning coin.
    fn face_radius(&self) -> f32 {
        let Size { width: w, height: h } = self.body.size;
        w / 2.0 * self.rotation.cos().abs() + h / 2.0 * self.rotation.sin().abs()
    }
}

impl Sprite for Reward {
    fn body(&self) -> &Body { &self.body }
    fn body_mut(&mut self) -> &mut Body { &mut self.body }

    fn update(&mut self, dt: f32) {
        self.body.advance(REWARD_SPEED, dt);
        self.rotation += self.rotation_speed * dt;
        self.body.pos.x += (self.rotation * 0.5).sin() * REWARD_DRIFT;
    }

    fn render(&self, s: &mut dyn Surface) {
        let c = self.body.rect().center();
        let Size { width: w, height: h } = self.body.size;
        let rx = self.face_radius();
        let ry = h / 2.0;

        s.fill_ellipse(c, rx, ry, '●', Tint::CoinYellow);

        // Face glyph narrows as the coin turns edge-on.
        let turn = self.rotation.cos().abs();
        let face = if turn > 0.66 {
            '●'
        } else if turn > 0.33 {
            '◖'
        } else {
            '|'
        };
        s.plot(c.x, c.y, face, Tint::CoinYellow);

        // Highlight
        s.plot(c.x - w / 8.0, c.y - h / 8.0, '·', Tint::CoinHighlight);

        // Rim
        s.plot(c.x - rx, c.y, '(', Tint::CoinEdge);
        s.plot(c.x + rx, c.y, ')', Tint::CoinEdge);
    }
}

// ══════════════════════════════════════════════════════════════
// Obstacle
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObstacleShape {
    Bolt,
    Asteroid,
}

#[derive(Clone, Debug)]
pub struct Obstacle {
    body: Body,
    speed: f32,
    rotation: f32,
    shape: ObstacleShape,
}

impl Obstacle {
    pub fn new(pos: Vec2, level: u32, rng: &mut dyn RngCore) -> Self {
        let shape = if rng.random_bool(0.5) {
            ObstacleShape::Bolt
        } else {
            ObstacleShape::Asteroid
        };
        Self::with_shape(pos, level, shape)
    }

    pub fn with_shape(pos: Vec2, level: u32, shape: ObstacleShape) -> Self {
        Obstacle {
            body: Body::new(EntityKind::Obstacle, pos, Vec2::DOWN, OBSTACLE_SIZE),
            speed: OBSTACLE_BASE_SPEED + level as f32 * OBSTACLE_LEVEL_SPEED,
            rotation: 0.0,
            shape,
        }
    }

    fn render_bolt(&self, s: &mut dyn Surface) {
        let Vec2 { x, y } = self.body.pos;
        let Size { width: w, height: h } = self.body.size;

        // Glow underneath the bolt
        let c = self.body.rect().center();
        s.fill_ellipse(c, w / 2.0, w / 2.0, '░', Tint::BoltGlow);

        let zigzag = [
            (0.5, 0.0),
            (0.8, 0.4),
            (0.6, 0.4),
            (0.9, 1.0),
            (0.5, 0.6),
            (0.7, 0.6),
            (0.2, 0.0),
        ];
        let pts: Vec<Vec2> = zigzag
            .iter()
            .map(|&(fx, fy)| Vec2::new(x + w * fx, y + h * fy))
            .collect();
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            s.line(a, b, stroke_glyph(a, b), Tint::BoltRed);
        }
    }

    fn render_asteroid(&self, s: &mut dyn Surface) {
        let c = self.body.rect().center();
        let Size { width: w, height: h } = self.body.size;
        let (sin, cos) = self.rotation.sin_cos();
        let turn = |fx: f32, fy: f32| {
            let px = w * fx;
            let py = h * fy;
            Vec2::new(c.x + px * cos - py * sin, c.y + px * sin + py * cos)
        };

        s.fill_ellipse(c, w * 0.45, h * 0.45, '▓', Tint::RockGray);

        let outline = [
            (-0.5, -0.2),
            (-0.3, -0.5),
            (0.1, -0.4),
            (0.5, -0.1),
            (0.4, 0.3),
            (0.1, 0.5),
            (-0.3, 0.4),
            (-0.5, 0.1),
        ];
        for i in 0..outline.len() {
            let (ax, ay) = outline[i];
            let (bx, by) = outline[(i + 1) % outline.len()];
            s.line(turn(ax, ay), turn(bx, by), '▓', Tint::RockGray);
        }

        // Craters
        for (fx, fy) in [(-0.15, -0.1), (0.2, 0.15), (-0.1, 0.25)] {
            let p = turn(fx, fy);
            s.plot(p.x, p.y, '°', Tint::CraterGray);
        }
    }
}

impl Sprite for Obstacle {
    fn body(&self) -> &Body { &self.body }
    fn body_mut(&mut self) -> &mut Body { &mut self.body }

    fn update(&mut self, dt: f32) {
        self.body.advance(self.speed, dt);
        self.rotation += OBSTACLE_SPIN * dt;
    }

    fn render(&self, s: &mut dyn Surface) {
        match self.shape {
            ObstacleShape::Bolt => self.render_bolt(s),
            ObstacleShape::Asteroid => self.render_asteroid(s),
        }
    }
}

/// Pick a stroke glyph matching the segment's slope (screen y grows down).
fn stroke_glyph(a: Vec2, b: Vec2) -> char {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dy.abs() < f32::EPSILON {
        '─'
    } else if dx.abs() < f32::EPSILON {
        '│'
    } else if (dx > 0.0) == (dy > 0.0) {
        '╲'
    } else {
        '╱'
    }
}

// ══════════════════════════════════════════════════════════════
// Entity: the spawned kinds, dispatched by variant
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub enum Entity {
    Projectile(Projectile),
    Hazard(Hazard),
    Reward(Reward),
    Obstacle(Obstacle),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.body().kind
    }

    pub fn is_active(&self) -> bool {
        self.body().active
    }

    pub fn deactivate(&mut self) {
        self.body_mut().active = false;
    }

    fn sprite(&self) -> &dyn Sprite {
        match self {
            Entity::Projectile(e) => e,
            Entity::Hazard(e) => e,
            Entity::Reward(e) => e,
            Entity::Obstacle(e) => e,
        }
    }

    fn sprite_mut(&mut self) -> &mut dyn Sprite {
        match self {
            Entity::Projectile(e) => e,
            Entity::Hazard(e) => e,
            Entity::Reward(e) => e,
            Entity::Obstacle(e) => e,
        }
    }
}

impl Sprite for Entity {
    fn body(&self) -> &Body { self.sprite().body() }
    fn body_mut(&mut self) -> &mut Body { self.sprite_mut().body_mut() }
    fn update(&mut self, dt: f32) { self.sprite_mut().update(dt) }
    fn render(&self, s: &mut dyn Surface) { self.sprite().render(s) }
}

impl Collide for Entity {
    fn rect(&self) -> Rect { self.body().rect() }
}

impl Collide for Player {
    fn rect(&self) -> Rect { self.body.rect() }
}

#[cfg(test)]
impl Hazard {
    pub fn speed(&self) -> f32 { self.speed }
}

#[cfg(test)]
impl Reward {
    pub fn rotation(&self) -> f32 { self.rotation }
}

#[cfg(test)]
impl Obstacle {
    pub fn speed(&self) -> f32 { self.speed }
    pub fn shape(&self) -> ObstacleShape { self.shape }
    pub fn rotation(&self) -> f32 { self.rotation }
}
