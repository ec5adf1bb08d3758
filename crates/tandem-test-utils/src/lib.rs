// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Tandem workspace: an in-memory [`MemoryDirectory`]
//! mirroring the SQLite store's semantics, plus capturing channel mocks.

mod channel;
mod directory;

pub use channel::{MockChannel, MockHub};
pub use directory::MemoryDirectory;
