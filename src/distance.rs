//! Levenshtein edit distance over bytes.

/// Minimum number of single-byte insertions, deletions and substitutions
/// turning `source` into `target`.
pub fn edit_distance(source: &str, target: &str) -> usize {
    let ceiling = source.len().max(target.len());
    // The distance never exceeds the longer length, so the bound never trips.
    bounded_edit_distance(source, target, ceiling).unwrap_or(ceiling)
}

/// Edit distance if it is at most `max`, `None` otherwise. Bails out as soon
/// as a whole DP row exceeds `max`.
pub fn bounded_edit_distance(source: &str, target: &str, max: usize) -> Option<usize> {
    let (s, t) = (source.as_bytes(), target.as_bytes());
    if s.len().abs_diff(t.len()) > max {
        return None;
    }
    if s.is_empty() || t.is_empty() {
        return Some(s.len().max(t.len()));
    }

    let mut prev: Vec<usize> = (0..=t.len()).collect();
    let mut curr = vec![0; t.len() + 1];
    for (i, &sc) in s.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, &tc) in t.iter().enumerate() {
            let substitute = prev[j] + usize::from(sc != tc);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let d = prev[t.len()];
    (d <= max).then_some(d)
}

/// The textbook recursion without memoization. Exponential; only for
/// cross-checking short inputs.
pub fn recursive_edit_distance(source: &str, target: &str) -> usize {
    fn go(s: &[u8], t: &[u8]) -> usize {
        match (s.split_last(), t.split_last()) {
            (None, _) => t.len(),
            (_, None) => s.len(),
            (Some((a, s_rest)), Some((b, t_rest))) => {
                let delete = go(s_rest, t) + 1;
                let insert = go(s, t_rest) + 1;
                let substitute = go(s_rest, t_rest) + usize::from(a != b);
                delete.min(insert).min(substitute)
            }
        }
    }
    go(source.as_bytes(), target.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: Distance to or from the empty string is the other length.
    #[test]
    fn empty_base_cases() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(recursive_edit_distance("", "abc"), 3);
        assert_eq!(recursive_edit_distance("abc", ""), 3);
    }

    /// Invariant: The classic kitten/sitting pair is three edits apart.
    #[test]
    fn kitten_sitting() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(recursive_edit_distance("kitten", "sitting"), 3);
    }

    /// Invariant: Identical strings are zero apart.
    #[test]
    fn identity_is_zero() {
        for w in ["a", "spell", "mississippi"] {
            assert_eq!(edit_distance(w, w), 0);
        }
    }

    /// Invariant: The bounded form agrees with the full distance when within
    /// the bound and reports `None` beyond it.
    #[test]
    fn bounded_agrees_or_bails() {
        assert_eq!(bounded_edit_distance("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_edit_distance("kitten", "sitting", 2), None);
        assert_eq!(bounded_edit_distance("a", "abcdef", 2), None);
        assert_eq!(bounded_edit_distance("", "ab", 2), Some(2));
        assert_eq!(bounded_edit_distance("cot", "the", 3), Some(3));
    }

    /// Invariant: The DP and the recursion agree on small mixed inputs.
    #[test]
    fn dp_matches_recursion() {
        let words = ["", "a", "ab", "ba", "cat", "cot", "hat", "the", "flaw", "lawn"];
        for a in words {
            for b in words {
                assert_eq!(edit_distance(a, b), recursive_edit_distance(a, b), "{a} vs {b}");
            }
        }
    }
}
