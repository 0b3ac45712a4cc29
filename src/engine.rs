//! Boundary-replacement engine: pure span location and splice for
//! `def`-style function definitions in indentation-delimited source text.
//!
//! No parse tree is built. A declaration is found by its header pattern
//! (`def <name>(` with a parameter list closed by `):`), and its body is
//! delimited by the next dedented line - a line whose first character sits
//! at column zero. This relies on the convention that a body is always
//! indented relative to its own declaration.
//!
//! Known accuracy limits, kept deliberately rather than fixed with a parser:
//! only the first matching declaration is considered (use [`locate_all`] when
//! duplicates must be disambiguated by the caller), and a column-zero comment
//! terminates a body just like any other dedented line.

use regex::Regex;

/// Byte range of one whole function definition.
///
/// Starts at the beginning of the declaration line and ends immediately
/// before the newline that precedes the terminating dedented line, or at
/// end-of-text for a function that closes the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpan {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
}

impl FunctionSpan {
    /// The matched text within `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.byte_start..self.byte_end]
    }
}

/// Compile the declaration-header pattern for `name`.
///
/// The name must be immediately followed by `(` so that a target of `run`
/// never matches `run_all`, and a bare mention of the name in a comment or
/// string never forms a header on its own. `(?s)` lets the parameter list
/// span lines.
fn header_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?s)\bdef\s+{}\(.*?\):", regex::escape(name))).ok()
}

/// Locate the first definition of `name` in `source`.
///
/// Returns `None` when no declaration header matches.
pub fn locate_function(source: &str, name: &str) -> Option<FunctionSpan> {
    if name.is_empty() {
        return None;
    }
    let header = header_pattern(name)?;
    let m = header.find(source)?;
    Some(span_from_header(source, m.start(), m.end()))
}

/// Locate every non-overlapping definition of `name`, in textual order.
///
/// First-occurrence replacement is the only supported write path; this
/// exists so callers facing duplicate same-named definitions can pick a
/// span by index or surrounding context themselves.
pub fn locate_all(source: &str, name: &str) -> Vec<FunctionSpan> {
    if name.is_empty() {
        return Vec::new();
    }
    let Some(header) = header_pattern(name) else {
        return Vec::new();
    };
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(m) = header.find_at(source, at) {
        let span = span_from_header(source, m.start(), m.end());
        at = span.byte_end.max(m.end());
        spans.push(span);
        if at >= source.len() {
            break;
        }
    }
    spans
}

/// Widen a header match into the full definition span.
fn span_from_header(source: &str, header_start: usize, header_end: usize) -> FunctionSpan {
    // Rewind to the start of the declaration line so indentation of a
    // nested definition is part of the span.
    let byte_start = source[..header_start]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    // Scan forward for a newline immediately followed by a non-whitespace
    // character: the line after it is dedented to column zero and starts the
    // next top-level statement. Blank lines and indented lines never
    // terminate the body. A function closing the file extends to end-of-text.
    let bytes = source.as_bytes();
    let mut byte_end = source.len();
    for i in header_end..source.len() {
        if bytes[i] == b'\n' {
            if let Some(&next) = bytes.get(i + 1) {
                if !next.is_ascii_whitespace() {
                    byte_end = i;
                    break;
                }
            }
        }
    }

    FunctionSpan {
        byte_start,
        byte_end,
    }
}

/// Replace the first definition of `name` in `source` with `replacement`.
///
/// Returns `None` when no declaration matched, leaving the caller with the
/// original text; otherwise the new text, with everything outside the
/// replaced span preserved byte-for-byte. Pure and deterministic; performs
/// no I/O.
pub fn replace_function(source: &str, name: &str, replacement: &str) -> Option<String> {
    let span = locate_function(source, name)?;
    let mut out =
        String::with_capacity(source.len() - (span.byte_end - span.byte_start) + replacement.len());
    out.push_str(&source[..span.byte_start]);
    out.push_str(replacement);
    out.push_str(&source[span.byte_end..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TWO_FUNCTIONS: &str = "def foo():\n    return 1\n\ndef bar():\n    return 2\n";

    #[test]
    fn replaces_first_function_and_preserves_rest() {
        let result =
            replace_function(TWO_FUNCTIONS, "foo", "def foo():\n    return 99\n").unwrap();
        assert_eq!(
            result,
            "def foo():\n    return 99\n\ndef bar():\n    return 2\n"
        );
    }

    #[test]
    fn replacement_header_is_found_again() {
        let result =
            replace_function(TWO_FUNCTIONS, "foo", "def foo():\n    return 99\n").unwrap();
        let span = locate_function(&result, "foo").unwrap();
        assert!(span.text(&result).contains("return 99"));
        assert!(!span.text(&result).contains("return 1"));
    }

    #[test]
    fn no_declaration_is_a_no_op() {
        assert_eq!(
            replace_function(TWO_FUNCTIONS, "baz", "def baz(): pass\n"),
            None
        );
        assert_eq!(locate_function(TWO_FUNCTIONS, "baz"), None);
    }

    #[test]
    fn last_function_extends_to_end_of_text() {
        let source = "x = 1\n\ndef tail():\n    a = 2\n    return a\n";
        let span = locate_function(source, "tail").unwrap();
        assert_eq!(span.byte_end, source.len());

        let result = replace_function(source, "tail", "def tail():\n    return 3\n").unwrap();
        assert_eq!(result, "x = 1\n\ndef tail():\n    return 3\n");
    }

    #[test]
    fn name_substring_of_longer_identifier_does_not_match() {
        let source = "def run_all():\n    return 1\n";
        assert_eq!(locate_function(source, "run"), None);
    }

    #[test]
    fn bare_mention_in_comment_does_not_match() {
        let source = "# frobnicate is configured elsewhere\nx = 1\n";
        assert_eq!(locate_function(source, "frobnicate"), None);
    }

    #[test]
    fn multiline_parameter_list() {
        let source = "def wide(\n    a,\n    b,\n):\n    return a + b\n\nend = 0\n";
        let span = locate_function(source, "wide").unwrap();
        assert!(span.text(source).ends_with("return a + b\n"));
        assert_eq!(&source[span.byte_end..], "\nend = 0\n");
    }

    #[test]
    fn blank_lines_inside_body_do_not_terminate() {
        let source = "def gappy():\n    a = 1\n\n    b = 2\n    return a + b\n\ntail = 1\n";
        let span = locate_function(source, "gappy").unwrap();
        assert!(span.text(source).contains("b = 2"));
        assert_eq!(&source[span.byte_end..], "\ntail = 1\n");
    }

    #[test]
    fn nested_definition_keeps_its_indentation() {
        let source = "class C:\n    def method(self):\n        return 1\n\ntop = 2\n";
        let span = locate_function(source, "method").unwrap();
        assert!(span.text(source).starts_with("    def method(self):"));
        assert_eq!(&source[span.byte_end..], "\ntop = 2\n");
    }

    #[test]
    fn inner_definition_does_not_terminate_outer_body() {
        let source =
            "def outer():\n    def inner():\n        return 1\n    return inner\n\nz = 0\n";
        let span = locate_function(source, "outer").unwrap();
        assert!(span.text(source).contains("return inner"));
    }

    #[test]
    fn locate_all_returns_every_occurrence_in_order() {
        let source = "def twin():\n    return 1\n\ndef twin():\n    return 2\n";
        let spans = locate_all(source, "twin");
        assert_eq!(spans.len(), 2);
        assert!(spans[0].text(source).contains("return 1"));
        assert!(spans[1].text(source).contains("return 2"));
        assert!(spans[0].byte_end <= spans[1].byte_start);
    }

    #[test]
    fn replace_targets_only_the_first_occurrence() {
        let source = "def twin():\n    return 1\n\ndef twin():\n    return 2\n";
        let result = replace_function(source, "twin", "def twin():\n    return 9\n").unwrap();
        assert_eq!(result, "def twin():\n    return 9\n\ndef twin():\n    return 2\n");
    }

    #[test]
    fn second_application_with_same_replacement_is_stable() {
        let replacement = "def foo():\n    return 99\n";
        let once = replace_function(TWO_FUNCTIONS, "foo", replacement).unwrap();
        let twice = replace_function(&once, "foo", replacement).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_name_never_matches() {
        assert_eq!(locate_function(TWO_FUNCTIONS, ""), None);
        assert!(locate_all(TWO_FUNCTIONS, "").is_empty());
    }

    proptest! {
        // Text that cannot contain a parameter list cannot contain a header.
        #[test]
        fn no_header_means_identity(text in "[A-Za-z0-9_ \n]{0,200}") {
            prop_assert_eq!(locate_function(&text, "target"), None);
            prop_assert_eq!(replace_function(&text, "target", "def target(): pass\n"), None);
        }

        #[test]
        fn trailing_code_survives_replacement(name in "[a-z_][a-z0-9_]{0,12}") {
            let source = format!("def {name}():\n    pass\n\nrest = 1\n");
            let replacement = format!("def {name}():\n    return 0\n");
            let result = replace_function(&source, &name, &replacement).unwrap();
            prop_assert_eq!(result, format!("def {name}():\n    return 0\n\nrest = 1\n"));
        }
    }
}
