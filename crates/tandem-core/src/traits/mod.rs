// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the external collaborators of the matchmaking core.

pub mod channel;
pub mod directory;

pub use channel::{Channel, ChannelHub};
pub use directory::Directory;
