/// Edit-distance budget for a spoken word: 1 up to five characters, else 2.
pub(super) fn max_distance(word: &str) -> usize {
    if word.chars().count() <= 5 { 1 } else { 2 }
}

/// `true` if the first characters agree and the words are within the
/// distance budget of `spoken`.
pub(super) fn fuzzy_eq(spoken: &str, script: &str) -> bool {
    match (spoken.chars().next(), script.chars().next()) {
        (Some(a), Some(b)) if a == b => levenshtein_within(spoken, script, max_distance(spoken)),
        _ => false,
    }
}

/// Bounded Levenshtein: `true` iff `distance(a, b) <= max`.
///
/// Runs the two-row DP and bails out as soon as a whole row exceeds `max`.
pub(super) fn levenshtein_within(a: &str, b: &str, max: usize) -> bool {
    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return false;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > max {
            return false;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()] <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_bounds() {
        assert!(levenshtein_within("kitten", "kitten", 0));
        assert!(levenshtein_within("kitten", "sitten", 1));
        assert!(!levenshtein_within("kitten", "sitting", 2));
        assert!(levenshtein_within("kitten", "sitting", 3));
        assert!(!levenshtein_within("", "a", 2));
    }

    #[test]
    fn length_gap_short_circuits() {
        assert!(!levenshtein_within("abc", "abcdef", 2));
    }

    #[test]
    fn budget_depends_on_length() {
        assert_eq!(max_distance("store"), 1);
        assert_eq!(max_distance("stores"), 2);
    }

    #[test]
    fn teleprompter_variants() {
        assert!(fuzzy_eq("teleprompters", "teleprompter"));
        assert!(!fuzzy_eq("television", "teleprompter"));
    }

    #[test]
    fn first_character_must_agree() {
        assert!(!fuzzy_eq("xtore", "store"));
        assert!(fuzzy_eq("stor", "store"));
    }
}
