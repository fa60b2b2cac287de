//! Test harness for native-frame tests
//!
//! Builders for shorty signatures so tests can describe a call by its
//! argument mix instead of spelling out long strings.
//!
//! # Example
//!
//! ```rust
//! use native_frame::test_harness::*;
//! use native_frame::critical_native_stub_frame_size;
//!
//! // `long f(int x 9)`: one int spills to the stack.
//! let shorty = shorty_with('J', 0, 9);
//! assert_eq!(shorty, "JIIIIIIIII");
//! assert_eq!(critical_native_stub_frame_size(&shorty), 16);
//! ```

#![allow(clippy::must_use_candidate, clippy::missing_panics_doc)]

use crate::{FrameCalculator, Shorty, ShortyType};

/// Every return type character, `V` included.
pub const RETURN_TYPES: &str = "VZBCSIJFDL";

/// Every argument type character.
pub const ARG_TYPES: &str = "ZBCSIJFDL";

/// Return types that need sign/zero extension of the native result.
pub const NARROW_RETURN_TYPES: &str = "ZBCS";

/// Build a shorty returning `ret` with `fp` doubles followed by `ints` ints.
pub fn shorty_with(ret: char, fp: usize, ints: usize) -> String {
    let mut shorty = String::with_capacity(1 + fp + ints);
    shorty.push(ret);
    shorty.extend(std::iter::repeat_n('D', fp));
    shorty.extend(std::iter::repeat_n('I', ints));
    shorty
}

/// Build a shorty from a return type and argument types.
pub fn shorty_of(ret: ShortyType, args: &[ShortyType]) -> String {
    std::iter::once(ret)
        .chain(args.iter().copied())
        .map(ShortyType::as_char)
        .collect()
}

/// Parse a shorty that the test knows is valid.
pub fn parse(raw: &str) -> Shorty<'_> {
    Shorty::parse(raw).unwrap_or_else(|e| panic!("invalid test shorty {raw:?}: {e}"))
}

/// Assert that the stub and direct-call frames agree with the expected sizes.
pub fn assert_frames(calc: &FrameCalculator, shorty: &str, stub: usize, direct: usize) {
    assert_eq!(
        calc.stub_frame_size(shorty),
        stub,
        "stub frame size for {shorty}"
    );
    assert_eq!(
        calc.direct_call_frame_size(shorty),
        direct,
        "direct call frame size for {shorty}"
    );
    let layout = calc.stub_frame_layout(parse(shorty));
    assert_eq!(layout.frame_size, stub, "stub layout for {shorty}");
}
