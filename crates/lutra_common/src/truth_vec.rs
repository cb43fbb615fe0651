//! Packed vectors of 4-state logic values used as truth tables and LUT
//! configuration words.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A packed vector of [`Logic`] values.
///
/// Bit `i` of a `TruthVec` of width `2^n` holds the function value at the
/// input combination whose binary encoding is `i` (input `k` contributes
/// `2^k`). The same type carries LUT INIT words at emission time: a K-LUT
/// INIT is `2^K` bits, a dual-output INIT is 64 bits.
///
/// Each value occupies 2 bits, 32 values per `u64` word.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TruthVec {
    width: u32,
    /// Packed storage: 2 bits per logic value.
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl TruthVec {
    /// Creates a new `TruthVec` of the given width, initialized to all `Zero`.
    pub fn new(width: u32) -> Self {
        let num_words = width.div_ceil(VALUES_PER_WORD) as usize;
        Self {
            width,
            data: vec![0; num_words],
        }
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        match (self.data[word_idx] >> bit_offset) & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::X,
            3 => Logic::Z,
            _ => unreachable!(),
        }
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }

    /// Sets the value at the given index from a boolean.
    pub fn set_bool(&mut self, index: u32, value: bool) {
        self.set(index, Logic::from_bool(value));
    }

    /// Creates a `TruthVec` from the low `width` bits of a `u64`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 != 0 {
                v.set(i, Logic::One);
            }
        }
        v
    }

    /// Converts to a `u64`, if all values are definite (0 or 1) and the
    /// width does not exceed 64.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > 64 {
            return None;
        }
        let mut result = 0u64;
        for i in 0..self.width {
            match self.get(i) {
                Logic::Zero => {}
                Logic::One => result |= 1 << i,
                Logic::X | Logic::Z => return None,
            }
        }
        Some(result)
    }

    /// Parses a binary string like `"1000"` into a `TruthVec`.
    ///
    /// The leftmost character is the most significant bit (highest index).
    /// Returns `None` if the string contains invalid characters.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let width = s.len() as u32;
        let mut v = Self::new(width);
        for (i, c) in s.chars().rev().enumerate() {
            v.set(i as u32, Logic::from_char(c)?);
        }
        Some(v)
    }

    /// Extracts `width` values starting at `offset` into a new vector.
    ///
    /// Used to split a 64-bit dual-output INIT into its 32-bit halves.
    ///
    /// # Panics
    ///
    /// Panics if `offset + width` exceeds this vector's width.
    pub fn extract(&self, offset: u32, width: u32) -> Self {
        assert!(
            offset + width <= self.width,
            "extract [{offset}, {offset}+{width}) out of bounds for width {}",
            self.width
        );
        let mut out = Self::new(width);
        for i in 0..width {
            out.set(i, self.get(offset + i));
        }
        out
    }

    /// Returns `true` if every value is a driven `Zero` or `One`.
    pub fn is_fully_defined(&self) -> bool {
        (0..self.width).all(|i| self.get(i).is_defined())
    }
}

impl fmt::Display for TruthVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for TruthVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TruthVec({self})")
    }
}
