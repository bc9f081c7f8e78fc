//! Label unification.
//!
//! A pass walks the labels shortest first and folds each one into the first
//! already unified entry its [`MergePolicy`] accepts, or installs it as a new
//! entry. Passes repeat until the output equals the input.

use std::collections::BTreeSet;
use std::path::PathBuf;

use pdfsorter_shared::UnifyStrategy;
use tracing::{debug, trace, warn};

use crate::Groups;

/// Upper bound on unification passes.
pub const MAX_PASSES: usize = 32;

// ---------------------------------------------------------------------------
// Merge policies
// ---------------------------------------------------------------------------

/// Decides whether a label folds into an existing unified entry.
pub trait MergePolicy {
    /// Key the existing entry carries after absorbing `label`, or `None` when
    /// the two labels are unrelated.
    fn merged_key(&self, label: &str, existing: &str) -> Option<String>;
}

/// Labels merge when their lowercase word sets intersect.
///
/// The merged key is the sorted common words joined by spaces, capitalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordIntersection;

impl MergePolicy for WordIntersection {
    fn merged_key(&self, label: &str, existing: &str) -> Option<String> {
        common_words(label, existing)
    }
}

/// Labels merge when one contains the other, ignoring case.
///
/// The existing (shorter, earlier) key is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringContainment;

impl MergePolicy for SubstringContainment {
    fn merged_key(&self, label: &str, existing: &str) -> Option<String> {
        let label = label.trim().to_lowercase();
        let other = existing.trim().to_lowercase();
        if label.is_empty() || other.is_empty() {
            return None;
        }
        (label.contains(&other) || other.contains(&label)).then(|| existing.to_string())
    }
}

/// Common lowercase words of two labels as `"Word1 word2"`, or `None` if
/// they share nothing.
///
/// ```
/// use pdfsorter_grouping::common_words;
///
/// assert_eq!(common_words("Red Car", "Blue car").as_deref(), Some("Car"));
/// assert_eq!(common_words("Tax Return 2023", "2023 return").as_deref(), Some("2023 return"));
/// assert_eq!(common_words("Travel", "Invoice"), None);
/// ```
pub fn common_words(a: &str, b: &str) -> Option<String> {
    let left = word_set(a);
    let right = word_set(b);
    let common: Vec<&str> = left.intersection(&right).map(String::as_str).collect();
    if common.is_empty() {
        None
    } else {
        Some(capitalize(&common.join(" ")))
    }
}

fn word_set(label: &str) -> BTreeSet<String> {
    label.split_whitespace().map(str::to_lowercase).collect()
}

/// First character uppercased, the rest lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Run a single unification pass.
///
/// Labels are visited by character length ascending, ties in first-seen
/// order. Unified entries keep the position where they were first installed;
/// merging rewrites an entry's key in place and appends the label's files.
pub fn unify_pass(groups: &Groups, policy: &dyn MergePolicy) -> Groups {
    let mut labels: Vec<(&str, &[PathBuf])> = groups.iter().collect();
    labels.sort_by_key(|(label, _)| label.chars().count());

    let mut unified: Vec<(String, Vec<PathBuf>)> = Vec::with_capacity(labels.len());

    for (label, files) in labels {
        let target = unified
            .iter()
            .enumerate()
            .find_map(|(idx, (key, _))| policy.merged_key(label, key).map(|merged| (idx, merged)));

        match target {
            Some((idx, merged)) => {
                let entry = &mut unified[idx];
                trace!(label, into = %entry.0, key = %merged, "merging label");
                entry.0 = merged;
                entry.1.extend(files.iter().cloned());
            }
            None => unified.push((label.to_string(), files.to_vec())),
        }
    }

    unified.into_iter().collect()
}

/// Repeat [`unify_pass`] until the groups stop changing.
pub fn unify_with(mut groups: Groups, policy: &dyn MergePolicy) -> Groups {
    for pass in 1..=MAX_PASSES {
        let next = unify_pass(&groups, policy);
        if next == groups {
            debug!(passes = pass, labels = groups.len(), "label unification settled");
            return groups;
        }
        groups = next;
    }

    warn!(
        passes = MAX_PASSES,
        labels = groups.len(),
        "label unification did not settle, using last pass"
    );
    groups
}

/// Unify `groups` with the policy selected by `strategy`.
pub fn unify(groups: Groups, strategy: UnifyStrategy) -> Groups {
    match strategy {
        UnifyStrategy::WordIntersection => unify_with(groups, &WordIntersection),
        UnifyStrategy::Substring => unify_with(groups, &SubstringContainment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(pairs: &[(&str, &[&str])]) -> Groups {
        pairs
            .iter()
            .map(|(label, files)| {
                (
                    label.to_string(),
                    files.iter().map(PathBuf::from).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn files(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn capitalize_lowercases_tail() {
        assert_eq!(capitalize("machine learning"), "Machine learning");
        assert_eq!(capitalize("éTUDE"), "Étude");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn common_words_is_sorted_and_case_insensitive() {
        assert_eq!(
            common_words("Quarterly FINANCE Report", "report finance").as_deref(),
            Some("Finance report")
        );
        assert_eq!(common_words("", "Anything"), None);
    }

    #[test]
    fn word_intersection_merges_shared_word() {
        let input = groups(&[("Red Car", &["a.pdf"]), ("Blue Car", &["b.pdf"])]);
        let out = unify(input, UnifyStrategy::WordIntersection);

        assert_eq!(out.len(), 1);
        assert_eq!(out.get("Car").unwrap(), files(&["a.pdf", "b.pdf"]).as_slice());
    }

    #[test]
    fn word_intersection_rewrites_key_in_place() {
        // "Travel" is installed first (shortest) and keeps position 0.
        let input = groups(&[
            ("Invoice 2023", &["a.pdf"]),
            ("Invoice 2024", &["b.pdf"]),
            ("Travel", &["c.pdf"]),
        ]);
        let out = unify_pass(&input, &WordIntersection);

        let labels: Vec<_> = out.labels().collect();
        assert_eq!(labels, vec!["Travel", "Invoice"]);
        assert_eq!(out.get("Invoice").unwrap(), files(&["a.pdf", "b.pdf"]).as_slice());
        assert_eq!(out.get("Travel").unwrap(), files(&["c.pdf"]).as_slice());
    }

    #[test]
    fn unrelated_labels_stay_apart() {
        let input = groups(&[
            ("Travel", &["a.pdf"]),
            ("Invoice", &["b.pdf", "c.pdf"]),
            ("Recipes", &["d.pdf"]),
        ]);
        let out = unify(input.clone(), UnifyStrategy::WordIntersection);
        assert_eq!(out, input);

        let out = unify(input.clone(), UnifyStrategy::Substring);
        assert_eq!(out, input);
    }

    #[test]
    fn first_matching_entry_wins() {
        // "Car" is seen before "Tax"; "Car Tax" folds into "Car" only.
        let input = groups(&[
            ("Car", &["a.pdf"]),
            ("Tax", &["b.pdf"]),
            ("Car Tax", &["c.pdf"]),
        ]);
        let out = unify(input, UnifyStrategy::WordIntersection);

        assert_eq!(out.get("Car").unwrap(), files(&["a.pdf", "c.pdf"]).as_slice());
        assert_eq!(out.get("Tax").unwrap(), files(&["b.pdf"]).as_slice());
    }

    #[test]
    fn merge_chain_collapses_through_shrinking_key() {
        // "Red Car" + "Red Car Loan" -> "Car red", then "Car Insurance" narrows it to "Car".
        let input = groups(&[
            ("Red Car", &["a.pdf"]),
            ("Red Car Loan", &["b.pdf"]),
            ("Car Insurance", &["c.pdf"]),
        ]);
        let out = unify(input, UnifyStrategy::WordIntersection);

        assert_eq!(out.len(), 1);
        assert_eq!(
            out.get("Car").unwrap(),
            files(&["a.pdf", "b.pdf", "c.pdf"]).as_slice()
        );
    }

    #[test]
    fn single_word_labels_over_merge() {
        let input = groups(&[("Report", &["a.pdf"]), ("Medical Report", &["b.pdf"])]);
        let out = unify(input, UnifyStrategy::WordIntersection);
        assert_eq!(out.len(), 1);
        assert!(out.get("Report").is_some());
    }

    #[test]
    fn substring_keeps_shorter_existing_key() {
        let input = groups(&[("Red Car", &["b.pdf"]), ("car", &["a.pdf"])]);
        let out = unify(input, UnifyStrategy::Substring);

        assert_eq!(out.len(), 1);
        assert_eq!(out.get("car").unwrap(), files(&["a.pdf", "b.pdf"]).as_slice());
    }

    #[test]
    fn substring_does_not_rewrite_keys() {
        let input = groups(&[("Red Car", &["a.pdf"]), ("Blue Car", &["b.pdf"])]);
        let out = unify(input.clone(), UnifyStrategy::Substring);
        assert_eq!(out, input);
    }

    #[test]
    fn substring_ignores_empty_labels() {
        let input = groups(&[("", &["a.pdf"]), ("Travel", &["b.pdf"])]);
        let out = unify(input.clone(), UnifyStrategy::Substring);
        assert_eq!(out, input);
    }

    #[test]
    fn policies_disagree_on_overlapping_labels() {
        let input = groups(&[
            ("Red X", &["a.pdf"]),
            ("X Y", &["b.pdf"]),
            ("Blue Y", &["c.pdf"]),
        ]);

        let words = unify(input.clone(), UnifyStrategy::WordIntersection);
        assert_eq!(words.len(), 2);
        assert_eq!(words.get("X").unwrap(), files(&["b.pdf", "a.pdf"]).as_slice());
        assert_eq!(words.get("Blue Y").unwrap(), files(&["c.pdf"]).as_slice());

        let substrings = unify(input, UnifyStrategy::Substring);
        assert_eq!(substrings.len(), 3);
    }

    #[test]
    fn unify_is_idempotent() {
        let input = groups(&[
            ("Invoice 2023", &["a.pdf"]),
            ("invoice", &["b.pdf"]),
            ("Travel Europe", &["c.pdf"]),
            ("Travel Asia", &["d.pdf"]),
            ("Recipes", &["e.pdf"]),
        ]);

        for strategy in [UnifyStrategy::WordIntersection, UnifyStrategy::Substring] {
            let once = unify(input.clone(), strategy);
            let twice = unify(once.clone(), strategy);
            assert_eq!(once, twice, "{strategy} is not idempotent");
            assert_eq!(once.file_count(), 5);
        }
    }

    #[test]
    fn empty_groups_unify_to_empty() {
        let out = unify(Groups::new(), UnifyStrategy::WordIntersection);
        assert!(out.is_empty());
    }
}
