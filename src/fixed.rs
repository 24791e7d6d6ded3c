//! Q16.16 fixed-point arithmetic.
//!
//! The low 16 bits of the wrapped `i32` hold the fraction. Products are formed
//! in an `i64` so the intermediate can never overflow; narrowing back to `i32`
//! saturates, which keeps every operation total.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};

pub const FRAC_BITS: u32 = 16;
pub const SCALE: i32 = 1 << FRAC_BITS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(SCALE);
    pub const MIN: Fixed = Fixed(i32::MIN);
    pub const MAX: Fixed = Fixed(i32::MAX);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Exact conversion of a whole number.
    #[inline]
    pub const fn from_int(value: i16) -> Self {
        Self((value as i32) << FRAC_BITS)
    }

    /// Truncates toward zero. Out-of-range inputs saturate and NaN maps to zero.
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self((value * SCALE as f32) as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / SCALE as f32
    }

    /// Full-width product, then an arithmetic shift right by [`FRAC_BITS`].
    ///
    /// The shift floors negative products (two's complement), it does not
    /// round toward zero the way a division would.
    #[inline]
    pub const fn saturating_mul(self, rhs: Fixed) -> Fixed {
        let wide = (self.0 as i64 * rhs.0 as i64) >> FRAC_BITS;
        Fixed(saturate(wide))
    }

    /// Never panics, even with `lo > hi` (the result is then `hi`).
    #[inline]
    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Fixed {
        Ord::min(Ord::max(self, lo), hi)
    }

    #[inline]
    pub const fn saturating_add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub const fn saturating_sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }
}

#[inline]
const fn saturate(wide: i64) -> i32 {
    if wide > i32::MAX as i64 {
        i32::MAX
    } else if wide < i32::MIN as i64 {
        i32::MIN
    } else {
        wide as i32
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        self.saturating_sub(rhs)
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        self.saturating_mul(rhs)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(self.0.saturating_neg())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}
