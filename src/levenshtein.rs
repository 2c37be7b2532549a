// 📏 Edit-Distance Matcher
//
// Levenshtein distance = minimum number of single-character edits
// (insertions, deletions, substitutions) to change one string into another.
// Characters are Unicode scalar values, so "josé" vs "jose" is one edit.

/// Calculate Levenshtein distance between two strings
///
/// Example:
/// - score("kitten", "sitting") = 3
/// - score("admin", "admin") = 0
pub fn score(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Two rows are enough: each row only reads the one above it
    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };

            curr_row[j + 1] = std::cmp::min(
                std::cmp::min(
                    prev_row[j + 1] + 1, // deletion
                    curr_row[j] + 1,     // insertion
                ),
                prev_row[j] + cost, // substitution
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(score("", ""), 0);
        assert_eq!(score("abc", "abc"), 0);
        assert_eq!(score("abc", "ab"), 1);
        assert_eq!(score("abc", "abcd"), 1);
        assert_eq!(score("kitten", "sitting"), 3);
        assert_eq!(score("flaw", "lawn"), 2);
    }

    #[test]
    fn test_empty_side_costs_full_length() {
        assert_eq!(score("", "admin"), 5);
        assert_eq!(score("admin", ""), 5);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(score("jdoe", "john.doe"), score("john.doe", "jdoe"));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(score("josé", "jose"), 1);
        assert_eq!(score("ñandú", "nandu"), 2);
    }
}
