//! Dashboard rendering.

pub mod generator;

pub use generator::{render_html, render_json};
