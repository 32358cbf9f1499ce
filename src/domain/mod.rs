pub mod controls;
pub mod draw;
pub mod entity;
pub mod geometry;
