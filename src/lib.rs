// SPDX-License-Identifier: GPL-3.0-or-later
//! Fetch thermal camera frames over HTTP, and turn them into false-color images, temperature
//! readings and a motion sensor.
pub mod consumer;
pub mod error;
mod image_buffer;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod settings;
pub mod source;
pub mod temperature;
mod util;

pub use pipeline::Pipeline;
pub use settings::{Args, Settings};
