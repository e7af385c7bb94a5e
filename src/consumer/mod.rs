// SPDX-License-Identifier: GPL-3.0-or-later
//! Things that read from a [`Coordinator`][crate::source::Coordinator]: a camera that keeps the
//! latest rendered image, thermometers for the frame statistics, and a motion sensor.
mod camera;
mod sensors;

pub use camera::{RenderLoop, ThermalCamera};
pub use sensors::{MotionSensor, Thermometer};
