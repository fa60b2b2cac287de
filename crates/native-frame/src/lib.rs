//! Stack frame sizes for fast (critical) native calls on AAPCS64.
//!
//! Both the call-site compiler and the native entry stub compiler size their
//! frames with these queries. Every query is a pure function of its inputs.

pub mod abi;
pub mod error;
pub mod frame;
pub mod shorty;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use abi::CallingConvention;
pub use error::{Error, Result};
pub use frame::{
    FrameCalculator, StubFrameLayout, critical_native_call_args_size,
    critical_native_direct_call_frame_size, critical_native_stub_frame_size,
    native_out_args_size, round_up,
};
pub use shorty::{ArgClass, ArgCounts, Shorty, ShortyType};
