/// Geometry primitives and the AABB overlap test.
///
/// All coordinates are world units (f32), origin top-left, y grows down.
/// An entity's box is anchored at its top-left corner.

use rand::Rng;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: -1.0 };
    pub const DOWN: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }
}

/// Axis-aligned box: top-left corner plus extent.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn from_parts(pos: Vec2, size: Size) -> Self {
        Rect { x: pos.x, y: pos.y, w: size.width, h: size.height }
    }

    #[inline]
    pub fn right(&self) -> f32 { self.x + self.w }

    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.h }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Anything that occupies a box in the world.
pub trait Collide {
    fn rect(&self) -> Rect;
}

impl Collide for Rect {
    fn rect(&self) -> Rect { *self }
}

/// Strict AABB overlap: boxes that only share an edge do not collide.
pub fn check_collision<A: Collide + ?Sized, B: Collide + ?Sized>(a: &A, b: &B) -> bool {
    let a = a.rect();
    let b = b.rect();
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 7;

/// Short base36 token. Used only as a collection key.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overlapping_boxes_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(check_collision(&a, &b));
    }

    #[test]
    fn edge_touching_is_not_a_hit() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!check_collision(&a, &right));
        assert!(!check_collision(&a, &below));
    }

    #[test]
    fn contained_box_collides() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 5.0, 5.0);
        assert!(check_collision(&outer, &inner));
        assert!(check_collision(&inner, &outer));
    }

    #[test]
    fn ids_are_short_base36() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(generate_id(), generate_id());
    }

    fn any_rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 1.0f32..200.0, 1.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn collision_is_symmetric(a in any_rect(), b in any_rect()) {
            prop_assert_eq!(check_collision(&a, &b), check_collision(&b, &a));
        }

        #[test]
        fn separated_boxes_never_collide(a in any_rect(), gap in 1.0f32..50.0, h in 1.0f32..50.0) {
            let left = Rect::new(a.x - gap - h, a.y, h, a.h);
            let right = Rect::new(a.right() + gap, a.y, h, a.h);
            let above = Rect::new(a.x, a.y - gap - h, a.w, h);
            let below = Rect::new(a.x, a.bottom() + gap, a.w, h);
            prop_assert!(!check_collision(&a, &left));
            prop_assert!(!check_collision(&a, &right));
            prop_assert!(!check_collision(&a, &above));
            prop_assert!(!check_collision(&a, &below));
        }
    }
}
