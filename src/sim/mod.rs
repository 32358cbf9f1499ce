pub mod clock;
pub mod engine;
pub mod event;
pub mod save;
