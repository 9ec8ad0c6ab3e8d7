//! Line classification
//!
//! Both flat-file formats are positional: the first `WIDTH` characters name
//! the field, the payload starts at `PAYLOAD_COLUMN`. Lines that start with
//! whitespace carry no tag and continue whatever field was active before.
//!
//! ```text
//! ID   CYC_HUMAN               Reviewed;         105 AA.
//! ^^   ^
//! tag  payload
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// Marker that closes a record.
pub const TERMINATOR: &str = "//";

/// The closed set of field codes of one format
pub trait TagCode: Copy + Eq + Hash + Debug {
    /// Number of characters that make up the code
    const WIDTH: usize;
    /// Column (0-based) where the payload starts
    const PAYLOAD_COLUMN: usize;

    fn from_code(code: &str) -> Option<Self>;

    fn code(self) -> &'static str;

    /// Whether this tag opens a new record
    fn is_start(self) -> bool;
}

/// A classified input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a, T> {
    Tagged { tag: T, payload: &'a str },
    /// Indented line without a tag; belongs to the previously active field
    Continuation(&'a str),
    Terminator,
    /// Blank lines, unknown codes, decoration
    Unrecognized,
}

/// Classify one newline-stripped line
pub fn classify<T: TagCode>(line: &str) -> Line<'_, T> {
    let line = line.trim_end();

    if line.starts_with(TERMINATOR) {
        return Line::Terminator;
    }
    if line.is_empty() {
        return Line::Unrecognized;
    }
    if line.starts_with(char::is_whitespace) {
        return Line::Continuation(line.trim_start());
    }

    let Some(code) = line.get(..T::WIDTH) else {
        return Line::Unrecognized;
    };
    let Some(tag) = T::from_code(code) else {
        return Line::Unrecognized;
    };

    // The code must be followed by a separator, not glued to more text
    let rest = &line[T::WIDTH..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return Line::Unrecognized;
    }

    let separator = T::PAYLOAD_COLUMN - T::WIDTH;
    let payload = match rest.get(..separator) {
        Some(gap) if gap.bytes().all(|b| b == b' ') => &rest[separator..],
        _ => rest.trim_start(),
    };
    Line::Tagged { tag, payload }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Two {
        Id,
        De,
    }

    impl TagCode for Two {
        const WIDTH: usize = 2;
        const PAYLOAD_COLUMN: usize = 5;

        fn from_code(code: &str) -> Option<Self> {
            match code {
                "ID" => Some(Two::Id),
                "DE" => Some(Two::De),
                _ => None,
            }
        }

        fn code(self) -> &'static str {
            match self {
                Two::Id => "ID",
                Two::De => "DE",
            }
        }

        fn is_start(self) -> bool {
            self == Two::Id
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Three;

    impl TagCode for Three {
        const WIDTH: usize = 3;
        const PAYLOAD_COLUMN: usize = 4;

        fn from_code(code: &str) -> Option<Self> {
            (code == "ENT").then_some(Three)
        }

        fn code(self) -> &'static str {
            "ENT"
        }

        fn is_start(self) -> bool {
            true
        }
    }

    #[test]
    fn test_tagged_line() {
        assert_eq!(
            classify::<Two>("DE   Alcohol dehydrogenase."),
            Line::Tagged { tag: Two::De, payload: "Alcohol dehydrogenase." }
        );
    }

    #[test]
    fn test_payload_keeps_inner_indentation() {
        match classify::<Two>("DE            Short=FC;") {
            Line::Tagged { tag, payload } => {
                assert_eq!(tag, Two::De);
                assert!(payload.starts_with(' '));
                assert_eq!(payload.trim_start(), "Short=FC;");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_short_tagged_line() {
        assert_eq!(classify::<Two>("DE"), Line::Tagged { tag: Two::De, payload: "" });
        assert_eq!(classify::<Two>("DE  x"), Line::Tagged { tag: Two::De, payload: "x" });
    }

    #[test]
    fn test_terminator_and_continuation() {
        assert_eq!(classify::<Two>("//"), Line::<Two>::Terminator);
        assert_eq!(
            classify::<Two>("     MGDVEKGKKI FVQKCAQCHT"),
            Line::<Two>::Continuation("MGDVEKGKKI FVQKCAQCHT")
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify::<Two>("XX   decoration"), Line::<Two>::Unrecognized);
        assert_eq!(classify::<Two>(""), Line::<Two>::Unrecognized);
        assert_eq!(classify::<Two>("IDENTIFIER"), Line::<Two>::Unrecognized);
        assert_eq!(classify::<Two>("é"), Line::<Two>::Unrecognized);
    }

    #[test]
    fn test_three_character_codes() {
        assert_eq!(
            classify::<Three>("ENT 42"),
            Line::Tagged { tag: Three, payload: "42" }
        );
    }
}
