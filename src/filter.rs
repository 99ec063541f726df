use glob::{MatchOptions, Pattern};

const WILDCARD_CHARS: &[char] = &['*', '?', '[', ']'];

/// Match a repository name against a user-supplied pattern.
///
/// Comparison is case-insensitive. Patterns without wildcard characters are
/// substring matches; anything else compiles to an anchored glob where `*`
/// may cross `/`. Patterns that fail to compile degrade to a substring match
/// with the wildcard characters stripped.
pub fn matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();

    if !pattern.contains(WILDCARD_CHARS) {
        return name.contains(&pattern);
    }

    match Pattern::new(&pattern) {
        Ok(glob) => {
            let options = MatchOptions {
                case_sensitive: false,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            };
            glob.matches_with(&name, options)
        }
        Err(_) => {
            let stripped: String = pattern.chars().filter(|c| !WILDCARD_CHARS.contains(c)).collect();
            name.contains(&stripped)
        }
    }
}

/// Filter `repos` down to those matching `pattern`, preserving order.
/// An empty pattern returns the input unchanged.
pub fn filter_repos(repos: &[String], pattern: &str) -> Vec<String> {
    if pattern.is_empty() {
        return repos.to_vec();
    }
    repos
        .iter()
        .filter(|repo| matches(pattern, repo))
        .cloned()
        .collect()
}
