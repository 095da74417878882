use std::str::FromStr;

use crate::utils::{UtilError, random_u32};

/// Probability `chance / out_of` of sweeping the driver on a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lottery {
    chance: u32,
    out_of: u32,
}

impl Lottery {
    pub fn new(chance: u32, out_of: u32) -> Self {
        Self { chance, out_of }
    }

    pub fn always() -> Self {
        Self::new(1, 1)
    }

    pub fn never() -> Self {
        Self::new(0, 1)
    }

    pub fn chance(&self) -> u32 {
        self.chance
    }

    pub fn out_of(&self) -> u32 {
        self.out_of
    }

    /// Draw once.
    pub fn wins(&self) -> Result<bool, UtilError> {
        if self.chance == 0 || self.out_of == 0 {
            return Ok(false);
        }
        if self.chance >= self.out_of {
            return Ok(true);
        }
        Ok(uniform_below(self.out_of)? < self.chance)
    }
}

/// Uniform draw in `0..n`, rejecting the tail of the `u32` range that would bias
/// the remainder. `n` must be non-zero.
fn uniform_below(n: u32) -> Result<u32, UtilError> {
    let span = 1u64 << 32;
    let limit = span - span % u64::from(n);
    loop {
        let draw = random_u32()?;
        if u64::from(draw) < limit {
            return Ok(draw % n);
        }
    }
}

impl Default for Lottery {
    fn default() -> Self {
        Self::new(2, 100)
    }
}

impl FromStr for Lottery {
    type Err = UtilError;

    /// Accepts `chance,out_of`, optionally wrapped in brackets: `2,100` or `[2, 100]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let invalid = || UtilError::Format(format!("Invalid lottery: {s}"));

        let (chance, out_of) = trimmed.split_once(',').ok_or_else(invalid)?;
        let chance = chance.trim().parse().map_err(|_| invalid())?;
        let out_of: u32 = out_of.trim().parse().map_err(|_| invalid())?;
        if out_of == 0 {
            return Err(invalid());
        }
        Ok(Self::new(chance, out_of))
    }
}
