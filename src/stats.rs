use std::collections::HashMap;

use crate::model::{CommitSet, Statistics};

/// Aggregate statistics over the selected repositories of `commits`.
///
/// Iterates the sorted `repo_list` so the result is deterministic; repos in
/// the selection map but absent from the set are ignored, and the
/// strictly-greater comparison makes the first repo (in sort order) win a
/// tie for most active.
pub fn compute(commits: &CommitSet, selected: &HashMap<String, bool>) -> Statistics {
    let mut stats = Statistics::default();

    for repo in &commits.repo_list {
        if !selected.get(repo).copied().unwrap_or(false) {
            continue;
        }
        let count = commits.commit_count(repo);
        stats.commits_per_repo.insert(repo.clone(), count);
        stats.total_commits += count;
        stats.total_repositories += 1;

        if count > stats.max_commits {
            stats.max_commits = count;
            stats.most_active_repo = repo.clone();
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Commit;
    use pretty_assertions::assert_eq;

    fn commit_set(repos: &[(&str, usize)]) -> CommitSet {
        let mut by_repo = HashMap::new();
        for (repo, count) in repos {
            let commits = (0..*count)
                .map(|i| Commit {
                    repository: repo.to_string(),
                    message: format!("commit {i}"),
                })
                .collect();
            by_repo.insert(repo.to_string(), commits);
        }
        CommitSet::from_commits(by_repo, None)
    }

    fn select_all(set: &CommitSet) -> HashMap<String, bool> {
        set.repo_list.iter().map(|r| (r.clone(), true)).collect()
    }

    #[test]
    fn totals_add_up_for_full_selection() {
        let set = commit_set(&[("A", 3), ("B", 2)]);
        let stats = compute(&set, &select_all(&set));

        assert_eq!(stats.total_commits, 5);
        assert_eq!(stats.total_repositories, 2);
        assert_eq!(stats.most_active_repo, "A");
        assert_eq!(stats.max_commits, 3);
        assert_eq!(
            stats.total_commits,
            stats.commits_per_repo.values().sum::<usize>()
        );
        assert_eq!(stats.total_repositories, stats.commits_per_repo.len());
    }

    #[test]
    fn unselected_repos_are_skipped() {
        let set = commit_set(&[("A", 3), ("B", 2)]);
        let mut selected = HashMap::new();
        selected.insert("B".to_string(), true);
        selected.insert("A".to_string(), false);

        let stats = compute(&set, &selected);
        assert_eq!(stats.total_commits, 2);
        assert_eq!(stats.total_repositories, 1);
        assert_eq!(stats.most_active_repo, "B");
    }

    #[test]
    fn stale_selection_entries_are_ignored() {
        let set = commit_set(&[("A", 1)]);
        let mut selected = select_all(&set);
        selected.insert("gone/repo".to_string(), true);

        let stats = compute(&set, &selected);
        assert_eq!(stats.total_repositories, 1);
        assert!(!stats.commits_per_repo.contains_key("gone/repo"));
    }

    #[test]
    fn first_repo_in_sorted_order_wins_ties() {
        let set = commit_set(&[("zeta", 4), ("alpha", 4)]);
        let stats = compute(&set, &select_all(&set));
        assert_eq!(stats.most_active_repo, "alpha");
        assert_eq!(stats.max_commits, 4);
    }

    #[test]
    fn empty_selection_yields_zeroes() {
        let set = commit_set(&[("A", 3)]);
        let stats = compute(&set, &HashMap::new());
        assert_eq!(stats, Statistics::default());
    }
}
