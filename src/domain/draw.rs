/// Drawing surface abstraction.
///
/// Entities draw in world units; the surface owns the mapping from units
/// onto its cell grid. Only `clear`, `cell_size` and `plot` are required,
/// the shape helpers rasterise onto cell centres through `plot`.

use super::geometry::{Rect, Vec2};

/// Palette shared by every sprite. The terminal renderer maps each tint
/// to a concrete RGB colour.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tint {
    RobotBlue,
    White,
    AntennaRed,
    BulletOrange,
    BulletGlow,
    CloudGray,
    CoinYellow,
    CoinHighlight,
    CoinEdge,
    BoltRed,
    BoltGlow,
    RockGray,
    CraterGray,
}

pub trait Surface {
    /// Wipe the playfield before a new frame.
    fn clear(&mut self);

    /// World units covered by one cell, (width, height).
    fn cell_size(&self) -> (f32, f32);

    /// Put a glyph into the cell containing world point (x, y).
    /// Points outside the surface are dropped.
    fn plot(&mut self, x: f32, y: f32, glyph: char, tint: Tint);

    /// Fill every cell whose centre lies inside `rect`.
    fn fill_rect(&mut self, rect: Rect, glyph: char, tint: Tint) {
        self.fill_where(rect, glyph, tint, &|_, _| true);
    }

    /// Fill every cell whose centre lies inside the ellipse.
    fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, glyph: char, tint: Tint) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let bounds = Rect::new(center.x - rx, center.y - ry, rx * 2.0, ry * 2.0);
        self.fill_where(bounds, glyph, tint, &|x, y| {
            let nx = (x - center.x) / rx;
            let ny = (y - center.y) / ry;
            nx * nx + ny * ny <= 1.0
        });
    }

    /// Plot a straight segment, one glyph per cell stepped along the
    /// dominant axis.
    fn line(&mut self, from: Vec2, to: Vec2, glyph: char, tint: Tint) {
        let (cw, ch) = self.cell_size();
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = (dx.abs() / cw).max(dy.abs() / ch).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.plot(from.x + dx * t, from.y + dy * t, glyph, tint);
        }
    }

    /// Cell-centre scan of `bounds`, plotting where `inside` holds.
    fn fill_where(&mut self, bounds: Rect, glyph: char, tint: Tint, inside: &dyn Fn(f32, f32) -> bool) {
        let (cw, ch) = self.cell_size();
        if cw <= 0.0 || ch <= 0.0 {
            return;
        }
        let col0 = (bounds.x / cw).floor() as i64;
        let col1 = (bounds.right() / cw).ceil() as i64;
        let row0 = (bounds.y / ch).floor() as i64;
        let row1 = (bounds.bottom() / ch).ceil() as i64;
        for row in row0..row1 {
            let cy = (row as f32 + 0.5) * ch;
            if cy < bounds.y || cy > bounds.bottom() {
                continue;
            }
            for col in col0..col1 {
                let cx = (col as f32 + 0.5) * cw;
                if cx < bounds.x || cx > bounds.right() {
                    continue;
                }
                if inside(cx, cy) {
                    self.plot(cx, cy, glyph, tint);
                }
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records plotted cells on a fixed grid, for sprite and engine tests.
    pub struct GridSurface {
        pub cell_w: f32,
        pub cell_h: f32,
        pub cols: usize,
        pub rows: usize,
        pub cells: Vec<Option<(char, Tint)>>,
        pub clears: usize,
    }

    impl GridSurface {
        pub fn new(cols: usize, rows: usize) -> Self {
            GridSurface {
                cell_w: 10.0,
                cell_h: 20.0,
                cols,
                rows,
                cells: vec![None; cols * rows],
                clears: 0,
            }
        }

        pub fn at(&self, col: usize, row: usize) -> Option<(char, Tint)> {
            self.cells.get(row * self.cols + col).copied().flatten()
        }

        pub fn count(&self, tint: Tint) -> usize {
            self.cells.iter().filter(|c| matches!(c, Some((_, t)) if *t == tint)).count()
        }
    }

    impl Surface for GridSurface {
        fn clear(&mut self) {
            self.cells.fill(None);
            self.clears += 1;
        }

        fn cell_size(&self) -> (f32, f32) {
            (self.cell_w, self.cell_h)
        }

        fn plot(&mut self, x: f32, y: f32, glyph: char, tint: Tint) {
            if x < 0.0 || y < 0.0 {
                return;
            }
            let col = (x / self.cell_w) as usize;
            let row = (y / self.cell_h) as usize;
            if col < self.cols && row < self.rows {
                self.cells[row * self.cols + col] = Some((glyph, tint));
            }
        }
    }
}
