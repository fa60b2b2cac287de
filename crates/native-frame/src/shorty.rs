//! Shorty signatures: one character per type, return type first.

use std::fmt;

use crate::{Error, Result};

/// Register file an argument is passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgClass {
    /// float, double (v0-v7 on AAPCS64).
    FloatingPoint,
    /// Everything else (x0-x7 on AAPCS64).
    Integer,
}

/// A single shorty type character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortyType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ShortyType {
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            'V' => Self::Void,
            'Z' => Self::Boolean,
            'B' => Self::Byte,
            'C' => Self::Char,
            'S' => Self::Short,
            'I' => Self::Int,
            'J' => Self::Long,
            'F' => Self::Float,
            'D' => Self::Double,
            'L' => Self::Reference,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Void => 'V',
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Char => 'C',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Reference => 'L',
        }
    }

    #[must_use]
    pub const fn arg_class(self) -> ArgClass {
        match self {
            Self::Float | Self::Double => ArgClass::FloatingPoint,
            _ => ArgClass::Integer,
        }
    }

    /// Narrow integer results must be sign- or zero-extended after the native
    /// call returns.
    #[must_use]
    pub const fn needs_result_extension(self) -> bool {
        matches!(self, Self::Boolean | Self::Byte | Self::Char | Self::Short)
    }
}

impl fmt::Display for ShortyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Argument tallies per register class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArgCounts {
    pub fp: usize,
    pub non_fp: usize,
}

impl ArgCounts {
    /// Classify the argument characters of a raw shorty (everything after the
    /// return type). Unknown characters count as integer-class.
    #[must_use]
    pub fn of_raw(shorty: &str) -> Self {
        debug_assert!(!shorty.is_empty(), "shorty must include a return type");
        let args = shorty.get(1..).unwrap_or_default();
        let fp = args.bytes().filter(|&c| c == b'F' || c == b'D').count();
        Self {
            fp,
            non_fp: args.len() - fp,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.fp + self.non_fp
    }
}

/// A validated shorty signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shorty<'a> {
    raw: &'a str,
}

impl<'a> Shorty<'a> {
    /// Validate `raw` against the shorty alphabet.
    ///
    /// # Errors
    ///
    /// Fails on an empty string, an unknown character, or `V` in argument
    /// position.
    pub fn parse(raw: &'a str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::EmptyShorty);
        }
        for (position, ch) in raw.chars().enumerate() {
            match ShortyType::from_char(ch) {
                None => return Err(Error::InvalidShortyChar { ch, position }),
                Some(ShortyType::Void) if position > 0 => {
                    return Err(Error::VoidArgument { position });
                }
                Some(_) => {}
            }
        }
        Ok(Self { raw })
    }

    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    #[must_use]
    pub fn return_type(&self) -> ShortyType {
        self.types().next().unwrap_or(ShortyType::Void)
    }

    pub fn args(&self) -> impl Iterator<Item = ShortyType> + 'a {
        self.types().skip(1)
    }

    #[must_use]
    pub fn arg_counts(&self) -> ArgCounts {
        self.args()
            .fold(ArgCounts::default(), |mut counts, ty| {
                match ty.arg_class() {
                    ArgClass::FloatingPoint => counts.fp += 1,
                    ArgClass::Integer => counts.non_fp += 1,
                }
                counts
            })
    }

    fn types(&self) -> impl Iterator<Item = ShortyType> + 'a {
        // Parsed shorties only hold alphabet characters.
        self.raw.chars().filter_map(ShortyType::from_char)
    }
}

impl fmt::Display for Shorty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_mapping_is_bijective() {
        for ch in "VZBCSIJFDL".chars() {
            let ty = ShortyType::from_char(ch).expect("known char");
            assert_eq!(ty.as_char(), ch);
        }
        assert_eq!(ShortyType::from_char('X'), None);
        assert_eq!(ShortyType::from_char('['), None);
    }

    #[test]
    fn test_arg_class() {
        assert_eq!(ShortyType::Float.arg_class(), ArgClass::FloatingPoint);
        assert_eq!(ShortyType::Double.arg_class(), ArgClass::FloatingPoint);
        assert_eq!(ShortyType::Long.arg_class(), ArgClass::Integer);
        assert_eq!(ShortyType::Reference.arg_class(), ArgClass::Integer);
        assert_eq!(ShortyType::Boolean.arg_class(), ArgClass::Integer);
    }

    #[test]
    fn test_narrow_extension_set() {
        let narrow: Vec<char> = "VZBCSIJFDL"
            .chars()
            .filter_map(ShortyType::from_char)
            .filter(|ty| ty.needs_result_extension())
            .map(ShortyType::as_char)
            .collect();
        assert_eq!(narrow, vec!['Z', 'B', 'C', 'S']);
    }

    #[test]
    fn test_parse_valid() {
        let shorty = Shorty::parse("ZFIDJL").expect("valid shorty");
        assert_eq!(shorty.return_type(), ShortyType::Boolean);
        assert_eq!(
            shorty.args().collect::<Vec<_>>(),
            vec![
                ShortyType::Float,
                ShortyType::Int,
                ShortyType::Double,
                ShortyType::Long,
                ShortyType::Reference
            ]
        );
        assert_eq!(shorty.arg_counts(), ArgCounts { fp: 2, non_fp: 3 });
        assert_eq!(shorty.to_string(), "ZFIDJL");
    }

    #[test]
    fn test_parse_void_return_only() {
        let shorty = Shorty::parse("V").expect("void return");
        assert_eq!(shorty.return_type(), ShortyType::Void);
        assert_eq!(shorty.arg_counts().total(), 0);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Shorty::parse(""), Err(Error::EmptyShorty));
        assert_eq!(
            Shorty::parse("IIx"),
            Err(Error::InvalidShortyChar {
                ch: 'x',
                position: 2
            })
        );
        assert_eq!(
            Shorty::parse("IIV"),
            Err(Error::VoidArgument { position: 2 })
        );
    }

    #[test]
    fn test_raw_counts_skip_return_type() {
        assert_eq!(ArgCounts::of_raw("D"), ArgCounts { fp: 0, non_fp: 0 });
        assert_eq!(ArgCounts::of_raw("FIF"), ArgCounts { fp: 1, non_fp: 1 });
        assert_eq!(
            ArgCounts::of_raw("JLLDZ"),
            ArgCounts { fp: 1, non_fp: 3 }
        );
    }
}
