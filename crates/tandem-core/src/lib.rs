// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tandem matchmaking service.
//!
//! This crate provides the preference codec, the foundational trait
//! definitions for the identity store and delivery channels, error types,
//! and common types used throughout the Tandem workspace.

pub mod error;
pub mod preference;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TandemError;
pub use preference::{compatible, Desired, Identity, PrefChange, PrefMask};
pub use traits::{Channel, ChannelHub, Directory};
pub use types::{
    InboundMessage, MessageId, Outgoing, Participant, ParticipantId, ReactionChange, Tally,
};
