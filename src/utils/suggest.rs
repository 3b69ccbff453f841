//! Fuzzy suggestions for mistyped names.

/// Candidates resembling `input`: prefix or suffix matches first, then
/// anything within an edit distance of 3. Exact matches are not suggestions.
pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S]) -> Vec<String> {
    let input = input.to_lowercase();
    let mut close: Vec<(usize, String)> = Vec::new();

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let lower = candidate.to_lowercase();
        if lower == input {
            continue;
        }

        let rank = if lower.starts_with(&input) || lower.ends_with(&input) {
            0
        } else {
            match levenshtein(&input, &lower) {
                dist @ 1..=3 => dist,
                _ => continue,
            }
        };

        if !close.iter().any(|(_, c)| c == candidate) {
            close.push((rank, candidate.to_string()));
        }
    }

    close.sort();
    close.into_iter().map(|(_, c)| c).collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKS: &[&str] = &["pull", "full_pull", "full_deploy", "collectstatic"];

    #[test]
    fn prefix_and_suffix_matches_rank_first() {
        assert_eq!(suggest("full", TASKS), vec!["full_deploy", "full_pull", "pull"]);
        assert_eq!(suggest("static", TASKS), vec!["collectstatic"]);
    }

    #[test]
    fn typos_within_three_edits() {
        assert_eq!(suggest("pul", TASKS), vec!["pull"]);
        assert_eq!(suggest("full_deplyo", TASKS), vec!["full_deploy"]);
    }

    #[test]
    fn exact_and_distant_names_are_not_suggested() {
        assert!(suggest("pull", &["pull"]).is_empty());
        assert!(suggest("zzzzzzzz", TASKS).is_empty());
    }

    #[test]
    fn distance_counts_edits() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
