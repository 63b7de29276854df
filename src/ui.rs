//! Ratatui front-end for the lending tracker. It is one consumer of the
//! `Library` facade: every catalog, lending and report action goes through
//! it, and rejections are shown in the footer instead of aborting the loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
