// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preference codec: a 6-bit mask encoding self-identity and desired-partner sets.
//!
//! Bits 0-2 are the desired-partner set, bits 3-5 the participant's own
//! identity set. All three bits set in either half means "any". The codec
//! never produces an empty half: clearing the last desire bit snaps back to
//! "desire anyone", and clearing the identity half models "rather not say"
//! as "any identity".

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The three mutually exclusive self-identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Identity {
    Male,
    Female,
    NonBinary,
}

impl Identity {
    /// Bit position within a 3-bit half.
    pub fn bit(self) -> u8 {
        match self {
            Identity::Male => 0b100,
            Identity::Female => 0b010,
            Identity::NonBinary => 0b001,
        }
    }

    /// All identities, in display order.
    pub const ALL: [Identity; 3] = [Identity::Male, Identity::Female, Identity::NonBinary];
}

/// The decoded desired-partner set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    /// All three desire bits set.
    Anyone,
    /// A literal, non-empty subset.
    OneOf(Vec<Identity>),
}

impl std::fmt::Display for Desired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Desired::Anyone => f.write_str("anyone"),
            Desired::OneOf(set) => {
                let parts: Vec<String> = set.iter().map(|i| i.to_string()).collect();
                f.write_str(&parts.join(" + "))
            }
        }
    }
}

/// A preference-change command applied to a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefChange {
    /// Replace the identity half outright.
    SetIdentity(Identity),
    /// Clear the identity half ("rather not say" -- normalizes to any).
    RatherNotSay,
    /// XOR one bit of the desire half.
    ToggleDesire(Identity),
}

const HALF: u8 = 0b111;

/// The 6-bit identity/desire preference mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefMask(u8);

impl Default for PrefMask {
    /// Any identity, desiring anyone.
    fn default() -> Self {
        PrefMask(0b111111)
    }
}

impl PrefMask {
    /// Build from a raw 6-bit value, normalizing empty halves to "any".
    pub fn from_bits(bits: u8) -> Self {
        PrefMask(bits & 0b111111).normalized()
    }

    /// The raw 6-bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// The desired-partner half (low 3 bits).
    pub fn desire_bits(self) -> u8 {
        self.0 & HALF
    }

    /// The self-identity half (high 3 bits), shifted down.
    pub fn identity_bits(self) -> u8 {
        (self.0 >> 3) & HALF
    }

    /// The participant's single self-identity, or `None` when the identity
    /// half is not exactly one bit ("rather not say").
    pub fn identity(self) -> Option<Identity> {
        match self.identity_bits() {
            0b100 => Some(Identity::Male),
            0b010 => Some(Identity::Female),
            0b001 => Some(Identity::NonBinary),
            _ => None,
        }
    }

    /// Decode the desired-partner set.
    pub fn desired(self) -> Desired {
        let bits = self.desire_bits();
        if bits == HALF {
            return Desired::Anyone;
        }
        let set = Identity::ALL
            .into_iter()
            .filter(|i| bits & i.bit() != 0)
            .collect();
        Desired::OneOf(set)
    }

    /// True iff the desire half accepts anyone.
    pub fn desires_anyone(self) -> bool {
        self.desire_bits() == HALF
    }

    /// The mask with the desire half forced to "anyone" (congestion fallback).
    pub fn broadened(self) -> Self {
        PrefMask(self.0 | HALF)
    }

    /// Apply a preference-change command, returning the new mask.
    ///
    /// Post-condition: neither half is empty -- an emptied desire half becomes
    /// "anyone", an emptied identity half becomes "any identity".
    pub fn apply(self, change: PrefChange) -> Self {
        let mask = match change {
            PrefChange::SetIdentity(identity) => (identity.bit() << 3) | self.desire_bits(),
            PrefChange::RatherNotSay => self.desire_bits(),
            PrefChange::ToggleDesire(identity) => {
                (self.identity_bits() << 3) | (self.desire_bits() ^ identity.bit())
            }
        };
        PrefMask(mask).normalized()
    }

    /// Force empty halves to "any".
    fn normalized(self) -> Self {
        let mut bits = self.0;
        if bits & HALF == 0 {
            bits |= HALF;
        }
        if bits & (HALF << 3) == 0 {
            bits |= HALF << 3;
        }
        PrefMask(bits)
    }

    /// One-line summary for user-facing notices, e.g. `"male, seeking anyone"`.
    pub fn summary(self) -> String {
        let identity = self
            .identity()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "unknown".into());
        format!("{identity}, seeking {}", self.desired())
    }
}

/// Symmetric bidirectional compatibility between two masks.
///
/// Every identity bit `b` presents must fall within `a`'s desire set and
/// vice-versa, with at least one overlapping bit in each direction. Earlier
/// revisions of this rule checked only one direction; the bidirectional form
/// is the correct one.
pub fn compatible(a: PrefMask, b: PrefMask) -> bool {
    accepts(a, b) && accepts(b, a)
}

/// True iff every identity bit `of` presents is acceptable to `to`'s desires.
///
/// A full identity half (`0b111`, "rather not say") presents no specific
/// identity and satisfies any desire set.
fn accepts(to: PrefMask, of: PrefMask) -> bool {
    let desire = to.desire_bits();
    let identity = of.identity_bits();
    if identity == HALF {
        return true;
    }
    desire & identity != 0 && !desire & HALF & identity == 0
}
