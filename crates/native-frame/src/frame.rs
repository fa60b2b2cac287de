//! Frame sizes for fast (critical) native calls.
//!
//! The stub sizes here must match the extra frame emitted by the compiler at
//! the native call site, and the direct-call sizes must match the frame the
//! JNI compiler emits when it calls the native method without a stub.

use crate::abi::CallingConvention;
use crate::shorty::{ArgCounts, Shorty, ShortyType};
use crate::{Error, Result};

/// Round `value` up to a multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two; any other value gives a
/// meaningless result in release builds and panics in debug builds.
/// [`CallingConvention`] guarantees this for its stack alignment.
#[must_use]
pub const fn round_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Breakdown of a stub frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StubFrameLayout {
    /// Bytes of outgoing arguments passed on the stack.
    pub out_args_size: usize,
    /// The return address is spilled next to the stack args.
    pub saves_return_address: bool,
    /// Aligned size of the frame built by the stub.
    pub frame_size: usize,
}

impl StubFrameLayout {
    /// Without a frame the stub jumps straight into the native method and
    /// reuses the caller's return address.
    #[must_use]
    pub const fn is_tail_call(&self) -> bool {
        !self.saves_return_address
    }
}

/// Frame size queries under one calling convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameCalculator {
    convention: CallingConvention,
}

impl FrameCalculator {
    #[must_use]
    pub const fn new(convention: CallingConvention) -> Self {
        Self { convention }
    }

    #[must_use]
    pub const fn convention(&self) -> &CallingConvention {
        &self.convention
    }

    /// Size of the stack arguments for a native call.
    ///
    /// FP and integer args use separate register files; an overflowing FP arg
    /// never takes a free integer register or vice versa.
    ///
    /// Counts come from method signatures and are expected to be small; use
    /// [`Self::checked_native_out_args_size`] for counts that may overflow.
    #[must_use]
    pub const fn native_out_args_size(&self, num_fp_args: usize, num_non_fp_args: usize) -> usize {
        let cc = &self.convention;
        let num_stack_fp_args = num_fp_args.saturating_sub(cc.fp_register_args());
        let num_stack_non_fp_args = num_non_fp_args.saturating_sub(cc.int_register_args());
        (num_stack_fp_args + num_stack_non_fp_args) * cc.word_size()
    }

    /// [`Self::native_out_args_size`] for untrusted argument counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutArgsOverflow`] when the size does not fit in `usize`.
    pub fn checked_native_out_args_size(
        &self,
        num_fp_args: usize,
        num_non_fp_args: usize,
    ) -> Result<usize> {
        let cc = &self.convention;
        let num_stack_fp_args = num_fp_args.saturating_sub(cc.fp_register_args());
        let num_stack_non_fp_args = num_non_fp_args.saturating_sub(cc.int_register_args());
        num_stack_fp_args
            .checked_add(num_stack_non_fp_args)
            .and_then(|count| count.checked_mul(cc.word_size()))
            .ok_or(Error::OutArgsOverflow {
                fp: num_fp_args,
                non_fp: num_non_fp_args,
            })
    }

    /// Stack args size for a critical native call with a raw shorty.
    ///
    /// The shorty must be non-empty and use only the shorty alphabet.
    #[must_use]
    pub fn call_args_size(&self, shorty: &str) -> usize {
        let counts = ArgCounts::of_raw(shorty);
        self.native_out_args_size(counts.fp, counts.non_fp)
    }

    /// Frame size for the critical native stub.
    #[must_use]
    pub fn stub_frame_size(&self, shorty: &str) -> usize {
        debug_assert!(!shorty.is_empty(), "shorty must include a return type");
        let extends_result = shorty
            .chars()
            .next()
            .and_then(ShortyType::from_char)
            .is_some_and(ShortyType::needs_result_extension);
        self.stub_layout_from(shorty, self.call_args_size(shorty), extends_result)
            .frame_size
    }

    /// Frame size for a direct call to a critical native method.
    ///
    /// No return address to save; narrow results are extended by the caller.
    #[must_use]
    pub fn direct_call_frame_size(&self, shorty: &str) -> usize {
        let size = round_up(self.call_args_size(shorty), self.convention.stack_alignment());
        tracing::trace!(shorty, size, "critical native direct call frame");
        size
    }

    /// Stub frame layout for a validated shorty.
    #[must_use]
    pub fn stub_frame_layout(&self, shorty: Shorty<'_>) -> StubFrameLayout {
        let counts = shorty.arg_counts();
        self.stub_layout_from(
            shorty.as_str(),
            self.native_out_args_size(counts.fp, counts.non_fp),
            shorty.return_type().needs_result_extension(),
        )
    }

    fn stub_layout_from(
        &self,
        shorty: &str,
        out_args_size: usize,
        extends_result: bool,
    ) -> StubFrameLayout {
        // Tail call only when there are no stack args and no result to extend.
        let saves_return_address = out_args_size != 0 || extends_result;
        let mut size = out_args_size;
        if saves_return_address {
            size += self.convention.word_size();
        }
        let frame_size = round_up(size, self.convention.stack_alignment());

        tracing::trace!(
            shorty,
            out_args_size,
            saves_return_address,
            frame_size,
            "critical native stub frame"
        );

        StubFrameLayout {
            out_args_size,
            saves_return_address,
            frame_size,
        }
    }
}

const AAPCS64: FrameCalculator = FrameCalculator::new(CallingConvention::AAPCS64);

/// [`FrameCalculator::native_out_args_size`] on AAPCS64.
#[must_use]
pub const fn native_out_args_size(num_fp_args: usize, num_non_fp_args: usize) -> usize {
    AAPCS64.native_out_args_size(num_fp_args, num_non_fp_args)
}

/// [`FrameCalculator::call_args_size`] on AAPCS64.
#[must_use]
pub fn critical_native_call_args_size(shorty: &str) -> usize {
    AAPCS64.call_args_size(shorty)
}

/// [`FrameCalculator::stub_frame_size`] on AAPCS64.
#[must_use]
pub fn critical_native_stub_frame_size(shorty: &str) -> usize {
    AAPCS64.stub_frame_size(shorty)
}

/// [`FrameCalculator::direct_call_frame_size`] on AAPCS64.
#[must_use]
pub fn critical_native_direct_call_frame_size(shorty: &str) -> usize {
    AAPCS64.direct_call_frame_size(shorty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(0, 16), 0);
        assert_eq!(round_up(1, 16), 16);
        assert_eq!(round_up(16, 16), 16);
        assert_eq!(round_up(24, 16), 32);
    }

    #[test]
    fn test_out_args_within_registers() {
        assert_eq!(native_out_args_size(0, 0), 0);
        assert_eq!(native_out_args_size(8, 8), 0);
    }

    #[test]
    fn test_out_args_overflow_per_class() {
        assert_eq!(native_out_args_size(9, 0), 8);
        assert_eq!(native_out_args_size(0, 9), 8);
        assert_eq!(native_out_args_size(10, 11), 40);
        // Unused integer registers do not absorb FP overflow.
        assert_eq!(native_out_args_size(12, 0), 32);
    }

    #[test]
    fn test_checked_out_args_matches_unchecked() {
        let calc = FrameCalculator::default();
        assert_eq!(calc.checked_native_out_args_size(0, 0), Ok(0));
        assert_eq!(calc.checked_native_out_args_size(10, 11), Ok(40));
        assert_eq!(
            calc.checked_native_out_args_size(10, 11),
            Ok(calc.native_out_args_size(10, 11))
        );
    }

    #[test]
    fn test_checked_out_args_overflow() {
        let calc = FrameCalculator::default();
        assert_eq!(
            calc.checked_native_out_args_size(usize::MAX, 0),
            Err(Error::OutArgsOverflow {
                fp: usize::MAX,
                non_fp: 0
            })
        );
        // The sum of both classes overflows before the multiply.
        assert!(calc
            .checked_native_out_args_size(usize::MAX, usize::MAX)
            .is_err());
        // Registers absorb the first args, so this still fits.
        let max_fp = usize::MAX / 8 + 8;
        assert_eq!(
            calc.checked_native_out_args_size(max_fp, 0),
            Ok((usize::MAX / 8) * 8)
        );
    }

    #[test]
    fn test_call_args_ignores_return_type() {
        assert_eq!(critical_native_call_args_size("D"), 0);
        assert_eq!(critical_native_call_args_size("DDDDDDDDD"), 0);
        assert_eq!(critical_native_call_args_size("DDDDDDDDDD"), 8);
        assert_eq!(critical_native_call_args_size("FDDDDDDDDD"), 8);
    }

    #[test]
    fn test_stub_tail_call() {
        assert_eq!(critical_native_stub_frame_size("J"), 0);
        assert_eq!(critical_native_stub_frame_size("V"), 0);
        assert_eq!(critical_native_stub_frame_size("IIIIIIIII"), 0);
    }

    #[test]
    fn test_stub_narrow_return_reserves_lr() {
        for ret in ["Z", "B", "C", "S"] {
            assert_eq!(critical_native_stub_frame_size(ret), 16, "return {ret}");
            assert_eq!(critical_native_direct_call_frame_size(ret), 0);
        }
    }

    #[test]
    fn test_stub_with_stack_args() {
        // 9 ints: one stack arg + LR = 16.
        assert_eq!(critical_native_call_args_size("IIIIIIIIII"), 8);
        assert_eq!(critical_native_stub_frame_size("IIIIIIIIII"), 16);
        assert_eq!(critical_native_direct_call_frame_size("IIIIIIIIII"), 16);
        // Two stack args + LR = 24 -> 32.
        assert_eq!(critical_native_stub_frame_size("VIIIIIIIIII"), 32);
        assert_eq!(critical_native_direct_call_frame_size("VIIIIIIIIII"), 16);
    }

    #[test]
    fn test_layout_matches_stub_size() {
        let calc = FrameCalculator::default();
        let shorty = Shorty::parse("ZJJJJJJJJJJ").expect("valid shorty");
        let layout = calc.stub_frame_layout(shorty);
        assert_eq!(layout.out_args_size, 16);
        assert!(layout.saves_return_address);
        assert!(!layout.is_tail_call());
        assert_eq!(layout.frame_size, 32);
        assert_eq!(layout.frame_size, calc.stub_frame_size(shorty.as_str()));
    }

    #[test]
    fn test_layout_uses_parsed_return_type() {
        let calc = FrameCalculator::default();
        for (raw, saves, size) in [("B", true, 16), ("S", true, 16), ("J", false, 0), ("V", false, 0)] {
            let layout = calc.stub_frame_layout(Shorty::parse(raw).expect("valid shorty"));
            assert_eq!(layout.out_args_size, 0, "{raw}");
            assert_eq!(layout.saves_return_address, saves, "{raw}");
            assert_eq!(layout.frame_size, size, "{raw}");
            assert_eq!(layout.frame_size, calc.stub_frame_size(raw), "{raw}");
        }
    }

    #[test]
    fn test_custom_convention() {
        let cc = CallingConvention::new(2, 4, 4, 8).expect("valid convention");
        let calc = FrameCalculator::new(cc);
        assert_eq!(calc.native_out_args_size(3, 5), 8);
        // One stack arg (4) + return address (4) = 8.
        assert_eq!(calc.stub_frame_size("VFFF"), 8);
        assert_eq!(calc.direct_call_frame_size("VFFF"), 8);
        assert_eq!(calc.stub_frame_size("B"), 8);
    }
}
