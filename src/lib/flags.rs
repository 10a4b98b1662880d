use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Operation variant bits. Combine with `|`, e.g. `LOWER | LEFT | UNIT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

pub const NONE: Flags = Flags(0);
pub const NOTRANS: Flags = Flags(0);
pub const TRANSA: Flags = Flags(0x1);
pub const TRANSB: Flags = Flags(0x2);
/// Transpose bit for the single-operand variants (TRMM, TRSM, SYRK, SYR2K).
pub const TRANS: Flags = TRANSA;
pub const LOWER: Flags = Flags(0x4);
pub const UPPER: Flags = Flags(0x8);
pub const LEFT: Flags = Flags(0x10);
pub const RIGHT: Flags = Flags(0x20);
pub const UNIT: Flags = Flags(0x40);

impl Flags {
    #[inline(always)]
    pub fn contains(self, other: Flags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub fn trans_a(self) -> bool {
        self.contains(TRANSA)
    }

    #[inline(always)]
    pub fn trans_b(self) -> bool {
        self.contains(TRANSB)
    }

    /// Lower triangle selected. Upper is the default when neither bit is set.
    #[inline(always)]
    pub fn lower(self) -> bool {
        debug_assert!(!(self.contains(LOWER) && self.contains(UPPER)),
                      "LOWER and UPPER are mutually exclusive");
        self.contains(LOWER)
    }

    /// Operand on the right side. Left is the default when neither bit is set.
    #[inline(always)]
    pub fn right(self) -> bool {
        debug_assert!(!(self.contains(LEFT) && self.contains(RIGHT)),
                      "LEFT and RIGHT are mutually exclusive");
        self.contains(RIGHT)
    }

    #[inline(always)]
    pub fn unit(self) -> bool {
        self.contains(UNIT)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [(TRANSA, "TRANSA"), (TRANSB, "TRANSB"), (LOWER, "LOWER"),
                     (UPPER, "UPPER"), (LEFT, "LEFT"), (RIGHT, "RIGHT"), (UNIT, "UNIT")];
        let set: Vec<&str> = names.iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_and_query() {
        let flags = LOWER | RIGHT | UNIT;
        assert!(flags.lower());
        assert!(flags.right());
        assert!(flags.unit());
        assert!(!flags.trans_a());
        assert!(!flags.contains(NONE));
        assert_eq!(format!("{:?}", flags), "LOWER|RIGHT|UNIT");
        assert_eq!(format!("{:?}", NONE), "NONE");
    }

    #[test]
    fn trans_is_transa() {
        assert!(TRANS.trans_a());
        assert!((TRANSA | TRANSB).trans_b());
    }
}
