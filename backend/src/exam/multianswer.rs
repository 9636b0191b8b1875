// src/exam/multianswer.rs

use serde::Serialize;

/// Marker that flags a correct option in the canonical answer text.
const CORRECT_MARKER: &str = "++";

/// One option of a `Test_multianswer` question, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// Parses a single line of the canonical answer.
///
/// A line whose space-free form starts with `++` is a correct option; the first
/// `++` is removed from the text and leading spaces are stripped. Lines that are
/// blank once the marker and all spaces are gone yield `None`.
pub fn parse_line(line: &str) -> Option<AnswerOption> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let no_spaces = line.replace(' ', "");
    let is_correct = no_spaces.starts_with(CORRECT_MARKER);

    let (text, rest) = if is_correct {
        (
            line.replacen(CORRECT_MARKER, "", 1),
            &no_spaces[CORRECT_MARKER.len()..],
        )
    } else {
        (line.to_string(), no_spaces.as_str())
    };

    if rest.is_empty() {
        return None;
    }

    Some(AnswerOption {
        text: text.trim_start_matches(' ').to_string(),
        is_correct,
    })
}

/// Parses the whole canonical answer into its ordered options.
pub fn parse_options(answer: &str) -> Vec<AnswerOption> {
    answer.split('\n').filter_map(parse_line).collect()
}

/// The bit-string a fully correct submission must match, e.g. `"101"`.
pub fn canonical_bits(options: &[AnswerOption]) -> String {
    options
        .iter()
        .map(|o| if o.is_correct { '1' } else { '0' })
        .collect()
}

/// Whether the submitted bit-string marks option `index`.
/// Out of range and anything other than `'1'` count as unmarked.
pub fn is_marked(bits: &str, index: usize) -> bool {
    bits.as_bytes().get(index) == Some(&b'1')
}

pub fn check(options: &[AnswerOption], submitted: &str) -> bool {
    canonical_bits(options) == submitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marks_correct_options() {
        let options = parse_options("++cat\ndog\n++fish");

        let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        let flags: Vec<bool> = options.iter().map(|o| o.is_correct).collect();

        assert_eq!(texts, vec!["cat", "dog", "fish"]);
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(canonical_bits(&options), "101");
    }

    #[test]
    fn test_parse_strips_spaces_and_skips_blank_lines() {
        let options = parse_options("  + + big cat  \n\n   \n   small dog\r\n++");

        assert_eq!(
            options,
            vec![
                AnswerOption {
                    text: "+ + big cat  ".to_string(),
                    is_correct: true,
                },
                AnswerOption {
                    text: "small dog".to_string(),
                    is_correct: false,
                },
            ]
        );
    }

    #[test]
    fn test_parse_removes_only_one_marker() {
        let option = parse_line(" ++ ++x").unwrap();
        assert!(option.is_correct);
        assert_eq!(option.text, "++x");
    }

    #[test]
    fn test_check_against_canonical_bits() {
        let options = parse_options("++cat\ndog\n++fish");

        assert!(check(&options, "101"));
        assert!(!check(&options, "110"));
        assert!(!check(&options, "1"));
        assert!(!check(&options, ""));
    }

    #[test]
    fn test_is_marked_never_panics() {
        assert!(is_marked("101", 0));
        assert!(!is_marked("101", 1));
        assert!(!is_marked("1", 5));
        assert!(!is_marked("x", 0));
    }
}
