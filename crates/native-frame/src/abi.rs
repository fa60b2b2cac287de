//! AAPCS64 calling-convention constants for fast native calls.
//!
//! The call-site compiler and the native entry stub compiler both size their
//! frames from these values, so they must never diverge between the two.

use crate::{Error, Result};

// ── AAPCS64 Constants ──

/// Size of one machine word (and of a saved return address) in bytes.
pub const FRAME_POINTER_SIZE: usize = 8;

/// Stack alignment required by AAPCS64.
/// Same as the managed ABI stack alignment.
pub const AAPCS64_STACK_ALIGNMENT: usize = 16;

/// Up to how many float-like (float, double) args are passed in registers (v0-v7).
/// The rest of the args go on the stack.
pub const MAX_FLOAT_OR_DOUBLE_REGISTER_ARGUMENTS: usize = 8;

/// Up to how many integer-like (pointers, objects, longs, int, short, bool, etc)
/// args are passed in registers (x0-x7). The rest of the args go on the stack.
pub const MAX_INT_LIKE_REGISTER_ARGUMENTS: usize = 8;

const _: () = assert!(AAPCS64_STACK_ALIGNMENT.is_power_of_two());
const _: () = assert!(AAPCS64_STACK_ALIGNMENT % FRAME_POINTER_SIZE == 0);

/// Register budgets, word size and stack alignment of a native calling convention.
///
/// Values are fixed for a given hardware target and never mutated after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallingConvention {
    fp_register_args: usize,
    int_register_args: usize,
    word_size: usize,
    stack_alignment: usize,
}

impl CallingConvention {
    /// The ARM64 procedure-call standard.
    pub const AAPCS64: Self = Self {
        fp_register_args: MAX_FLOAT_OR_DOUBLE_REGISTER_ARGUMENTS,
        int_register_args: MAX_INT_LIKE_REGISTER_ARGUMENTS,
        word_size: FRAME_POINTER_SIZE,
        stack_alignment: AAPCS64_STACK_ALIGNMENT,
    };

    /// Build a custom convention.
    ///
    /// The stack alignment must be a power of two and a multiple of the
    /// (non-zero) word size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConvention`] when any of these rules is violated.
    pub fn new(
        fp_register_args: usize,
        int_register_args: usize,
        word_size: usize,
        stack_alignment: usize,
    ) -> Result<Self> {
        if word_size == 0 {
            return Err(Error::InvalidConvention(
                "word size must be non-zero".to_string(),
            ));
        }
        if !stack_alignment.is_power_of_two() {
            return Err(Error::InvalidConvention(format!(
                "stack alignment {stack_alignment} is not a power of two"
            )));
        }
        if stack_alignment % word_size != 0 {
            return Err(Error::InvalidConvention(format!(
                "word size {word_size} does not divide stack alignment {stack_alignment}"
            )));
        }

        tracing::debug!(
            fp_register_args,
            int_register_args,
            word_size,
            stack_alignment,
            "custom calling convention"
        );

        Ok(Self {
            fp_register_args,
            int_register_args,
            word_size,
            stack_alignment,
        })
    }

    #[must_use]
    pub const fn fp_register_args(&self) -> usize {
        self.fp_register_args
    }

    #[must_use]
    pub const fn int_register_args(&self) -> usize {
        self.int_register_args
    }

    #[must_use]
    pub const fn word_size(&self) -> usize {
        self.word_size
    }

    #[must_use]
    pub const fn stack_alignment(&self) -> usize {
        self.stack_alignment
    }
}

impl Default for CallingConvention {
    fn default() -> Self {
        Self::AAPCS64
    }
}
