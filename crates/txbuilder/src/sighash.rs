use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Signature-hash flag set selecting which parts of a transaction a signature commits to.
///
/// The zero value means "unset"; [`Transaction::fill_input`](crate::Transaction::fill_input)
/// replaces it with [`SigHashFlags::ALL_FORK_ID`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigHashFlags(u32);

impl SigHashFlags {
    pub const UNSET: Self = Self(0x00);
    pub const ALL: Self = Self(0x01);
    pub const NONE: Self = Self(0x02);
    pub const SINGLE: Self = Self(0x03);
    pub const FORK_ID: Self = Self(0x40);
    pub const ANYONE_CAN_PAY: Self = Self(0x80);

    pub const ALL_FORK_ID: Self = Self(0x41);
    pub const NONE_FORK_ID: Self = Self(0x42);
    pub const SINGLE_FORK_ID: Self = Self(0x43);

    const BASE_MASK: u32 = 0x1f;

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// `ALL`, `NONE` or `SINGLE` with the modifier bits stripped.
    #[must_use]
    pub const fn base_type(self) -> Self {
        Self(self.0 & Self::BASE_MASK)
    }

    #[must_use]
    pub const fn has_fork_id(self) -> bool {
        self.0 & Self::FORK_ID.0 != 0
    }

    #[must_use]
    pub const fn has_anyone_can_pay(self) -> bool {
        self.0 & Self::ANYONE_CAN_PAY.0 != 0
    }

    #[must_use]
    pub const fn or_default(self) -> Self {
        if self.is_unset() {
            Self::ALL_FORK_ID
        } else {
            self
        }
    }
}

impl BitOr for SigHashFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for SigHashFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
