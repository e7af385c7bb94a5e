// SPDX-License-Identifier: GPL-3.0-or-later
//! Acquiring thermal frames from a networked source.
//!
//! A [`Coordinator`] either polls a JSON endpoint or keeps a connection to a length-prefixed
//! frame stream open, and publishes each valid frame as an immutable [`FrameRecord`].
mod backoff;
mod coordinator;
mod listeners;
mod payload;
mod record;
mod settings;

pub use coordinator::Coordinator;
pub use listeners::ListenerId;
pub use payload::{decode_stream_payload, parse_json_frame, raw_to_celsius};
pub use record::{FrameRecord, ScalarKind};
pub use settings::{FieldMap, SourceSettings, TransportMode};
