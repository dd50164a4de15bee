//! Capability flag set
//!
//! Every objective function advertises which optional operations it actually
//! implements. Algorithms test these flags before calling an optional operation
//! instead of calling it and inspecting the failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};

/// Fixed-width set of capability flags.
///
/// Flags combine with `|`. Membership is tested with [`Features::contains`],
/// which is a masked test, never an equality check on the raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(u32);

impl Features {
    /// The function can be evaluated.
    pub const HAS_VALUE: Features = Features(1);
    /// `eval_derivative` returns a sensible first derivative.
    pub const HAS_FIRST_DERIVATIVE: Features = Features(2);
    /// `eval_second_derivative` returns a sensible gradient and Hessian.
    pub const HAS_SECOND_DERIVATIVE: Features = Features(4);
    /// The function can propose a sensible starting point.
    pub const CAN_PROPOSE_STARTING_POINT: Features = Features(8);
    /// The feasible region is a strict subset of the search space.
    pub const IS_CONSTRAINED: Features = Features(16);
    /// A constraint handler can be queried.
    pub const HAS_CONSTRAINT_HANDLER: Features = Features(32);
    /// Infeasible points can be repaired to the closest feasible point.
    pub const CAN_PROVIDE_CLOSEST_FEASIBLE: Features = Features(64);
    /// Evaluation may run concurrently from several threads.
    pub const IS_THREAD_SAFE: Features = Features(128);
    /// Repeated evaluation of the same point may give different values.
    pub const IS_NOISY: Features = Features(256);

    const NAMED: [(&'static str, Features); 9] = [
        ("HAS_VALUE", Self::HAS_VALUE),
        ("HAS_FIRST_DERIVATIVE", Self::HAS_FIRST_DERIVATIVE),
        ("HAS_SECOND_DERIVATIVE", Self::HAS_SECOND_DERIVATIVE),
        ("CAN_PROPOSE_STARTING_POINT", Self::CAN_PROPOSE_STARTING_POINT),
        ("IS_CONSTRAINED", Self::IS_CONSTRAINED),
        ("HAS_CONSTRAINT_HANDLER", Self::HAS_CONSTRAINT_HANDLER),
        ("CAN_PROVIDE_CLOSEST_FEASIBLE", Self::CAN_PROVIDE_CLOSEST_FEASIBLE),
        ("IS_THREAD_SAFE", Self::IS_THREAD_SAFE),
        ("IS_NOISY", Self::IS_NOISY),
    ];

    const MASK: u32 = 0x1ff;

    pub const fn empty() -> Self {
        Features(0)
    }

    pub const fn all() -> Self {
        Features(Self::MASK)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build a flag set from raw bits, dropping bits that name no flag.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Features(bits & Self::MASK)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag of `other` is set in `self`.
    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when at least one flag of `other` is set in `self`.
    pub const fn intersects(self, other: Features) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Features) -> Self {
        Features(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Features) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Features) {
        self.0 &= !other.0;
    }

    /// Iterate over the set flags together with their names.
    pub fn iter(self) -> impl Iterator<Item = (&'static str, Features)> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, flag)| self.contains(*flag))
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        self.union(rhs)
    }
}

impl BitOrAssign for Features {
    fn bitor_assign(&mut self, rhs: Features) {
        self.insert(rhs);
    }
}

impl BitAnd for Features {
    type Output = Features;

    fn bitand(self, rhs: Features) -> Features {
        Features(self.0 & rhs.0)
    }
}

impl Sub for Features {
    type Output = Features;

    fn sub(self, rhs: Features) -> Features {
        Features(self.0 & !rhs.0)
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let mut first = true;
        for (name, _) in self.iter() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        Ok(())
    }
}
