// src/exam/multi_right.rs

/// Parses a submitted `"3,1,2"` answer into answer IDs.
/// Returns `None` when any piece is not an integer (including empty input).
pub fn parse_sequence(submitted: &str) -> Option<Vec<i64>> {
    submitted
        .split(',')
        .map(|piece| piece.trim().parse::<i64>().ok())
        .collect()
}

/// Order-sensitive match of the submission against every registered right answer.
pub fn check(submitted: &str, right_sequences: &[Vec<i64>]) -> bool {
    match parse_sequence(submitted) {
        Some(ids) => right_sequences.iter().any(|seq| *seq == ids),
        None => false,
    }
}
