//! Anti-clustering: break up long runs of questions from one content item.

use crate::constants::{ANTI_CLUSTER_MIN_LEN, MAX_CONTENT_RUN};
use crate::question::Question;

/// Reorder so no more than `MAX_CONTENT_RUN` consecutive questions share a
/// content id. Selections of `ANTI_CLUSTER_MIN_LEN` or fewer are returned as-is.
///
/// Scanning forward, an item that would extend a run is swapped with the
/// nearest later item from different content. When no such item remains the
/// run is left in place.
pub fn anti_cluster(mut items: Vec<Question>) -> Vec<Question> {
    if items.len() <= ANTI_CLUSTER_MIN_LEN {
        return items;
    }

    for i in MAX_CONTENT_RUN..items.len() {
        let content = &items[i].content_id;
        let extends_run = items[i - MAX_CONTENT_RUN..i]
            .iter()
            .all(|q| &q.content_id == content);
        if !extends_run {
            continue;
        }

        match (i + 1..items.len()).find(|&j| &items[j].content_id != content) {
            Some(j) => items.swap(i, j),
            None => {
                tracing::debug!(content = %content, position = i, "no swap candidate left");
                break;
            }
        }
    }

    items
}

/// Length of the longest run of consecutive questions sharing a content id.
pub fn longest_run(items: &[Question]) -> usize {
    items
        .chunk_by(|a, b| a.content_id == b.content_id)
        .map(<[Question]>::len)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(contents: &str) -> Vec<Question> {
        contents
            .chars()
            .enumerate()
            .map(|(i, c)| Question::new(format!("q{i}"), c.to_string(), 3, 30, 1.0))
            .collect()
    }

    fn contents(items: &[Question]) -> String {
        items.iter().map(|q| q.content_id.as_str()).collect()
    }

    #[test]
    fn test_short_selection_untouched() {
        assert_eq!(contents(&anti_cluster(seq("AAA"))), "AAA");
    }

    #[test]
    fn test_run_of_three_broken() {
        assert_eq!(contents(&anti_cluster(seq("AAAB"))), "AABA");
    }

    #[test]
    fn test_longer_runs_interleaved() {
        let out = anti_cluster(seq("AAAAABB"));
        assert_eq!(contents(&out), "AABAABA");
        assert!(longest_run(&out) <= MAX_CONTENT_RUN);
    }

    #[test]
    fn test_no_candidate_leaves_tail() {
        let out = anti_cluster(seq("AAAAAB"));
        // one B can only break the first run
        assert_eq!(contents(&out), "AABAAA");
    }

    #[test]
    fn test_single_content_unchanged() {
        let out = anti_cluster(seq("AAAAA"));
        assert_eq!(contents(&out), "AAAAA");
    }

    #[test]
    fn test_preserves_members() {
        let input = seq("AAABBBCCC");
        let mut before: Vec<String> = input.iter().map(|q| q.id.clone()).collect();
        let mut after: Vec<String> = anti_cluster(input).iter().map(|q| q.id.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(longest_run(&seq("ABBBA")), 3);
    }

    proptest! {
        #[test]
        fn prop_runs_only_remain_without_candidates(raw in "[ABC]{4,30}") {
            let out = anti_cluster(seq(&raw));
            prop_assert_eq!(out.len(), raw.len());
            for end in MAX_CONTENT_RUN..out.len() {
                let window = &out[end - MAX_CONTENT_RUN..=end];
                if window.iter().all(|q| q.content_id == out[end].content_id) {
                    // a surviving run means everything after it is the same content
                    prop_assert!(out[end..].iter().all(|q| q.content_id == out[end].content_id));
                }
            }
        }
    }
}
