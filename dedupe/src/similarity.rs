/// Levenshtein edit distance between `a` and `b`, counted in chars.
///
/// Keeps a single DP row sized to the shorter input, so memory is
/// O(min(|a|, |b|)).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let (long, short) = if a_chars.len() >= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return long.len();
    }

    // row[j] holds the distance between the processed prefix of `long`
    // and the first j chars of `short`.
    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let cost = if lc == sc { 0 } else { 1 };

            row[j + 1] = (above + 1) // deletion
                .min(row[j] + 1) // insertion
                .min(diagonal + cost); // substitution

            diagonal = above;
        }
    }

    row[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_distances() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("jon smith", "john smith"), 1);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abcd"), 4);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("josé", "jose"), 1);
        assert_eq!(levenshtein_distance("ü", ""), 1);
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            prop_assert_eq!(levenshtein_distance(&a, &b), levenshtein_distance(&b, &a));
        }

        #[test]
        fn prop_identity(a in "\\PC{0,16}") {
            prop_assert_eq!(levenshtein_distance(&a, &a), 0);
        }

        #[test]
        fn prop_empty_is_length(s in "\\PC{0,16}") {
            prop_assert_eq!(levenshtein_distance("", &s), s.chars().count());
        }

        #[test]
        fn prop_triangle_inequality(
            a in "[a-e ]{0,8}",
            b in "[a-e ]{0,8}",
            c in "[a-e ]{0,8}",
        ) {
            let ab = levenshtein_distance(&a, &b);
            let bc = levenshtein_distance(&b, &c);
            let ac = levenshtein_distance(&a, &c);
            prop_assert!(ac <= ab + bc);
        }

        #[test]
        fn prop_bounded_by_longer_length(a in "[a-z]{0,10}", b in "[a-z]{0,10}") {
            let d = levenshtein_distance(&a, &b);
            prop_assert!(d <= a.len().max(b.len()));
            prop_assert!(d >= a.len().abs_diff(b.len()));
        }
    }
}
