//! Terminal front end for tasklane.
//!
//! Stands in for a graphical view layer: it drives the session store and the
//! task synchronization layer, prompts for input with `dialoguer` and renders
//! results with `console`.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod render;
pub mod terminal;
