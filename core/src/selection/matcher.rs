use std::collections::BTreeSet;

use regex::Regex;

const MAX_SUGGESTIONS: usize = 5;

/// Result of matching a requested name against the names in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Found(String),
    /// More than one distinct name matched; sorted.
    Ambiguous(Vec<String>),
    /// Nothing matched; carries near candidates for a "did you mean" hint.
    NotFound(Vec<String>),
}

/// Matches user-typed names against known names.
///
/// Tiers, first hit wins: exact, case-insensitive, camel-case/kebab-case abbreviation
/// (`cT` -> `compileTest`, `c-t` -> `compile-test`, `comp` -> `compile`). Abbreviations
/// covering the whole name are tried before prefix abbreviations. Within a tier, several
/// hits are an ambiguity; there is no silent pick.
pub struct NameMatcher;

impl NameMatcher {
    pub fn find<'a, I>(pattern: &str, names: I) -> NameMatch
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: BTreeSet<&str> = names.into_iter().collect();

        if names.contains(pattern) {
            return NameMatch::Found(pattern.to_string());
        }

        let lower = pattern.to_lowercase();
        let insensitive: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| n.to_lowercase() == lower)
            .collect();
        if let Some(found) = single_or_ambiguous(&insensitive) {
            return found;
        }

        // whole-name abbreviations before prefix abbreviations
        for whole in [true, false] {
            if let Some(re) = abbreviation_pattern(pattern, whole) {
                let abbreviated: Vec<&str> =
                    names.iter().copied().filter(|n| re.is_match(n)).collect();
                if let Some(found) = single_or_ambiguous(&abbreviated) {
                    return found;
                }
            }
        }

        NameMatch::NotFound(suggestions(&lower, &names))
    }
}

fn single_or_ambiguous(hits: &[&str]) -> Option<NameMatch> {
    match hits {
        [] => None,
        [one] => Some(NameMatch::Found(one.to_string())),
        many => Some(NameMatch::Ambiguous(
            many.iter().map(|s| s.to_string()).collect(),
        )),
    }
}

/// Splits `cTeJ` into humps `c`, `Te`, `J` and allows lowercase letters or digits to
/// fill each hump. With `whole` the last hump may only be followed by lowercase letters or
/// digits, otherwise by anything.
fn abbreviation_pattern(pattern: &str, whole: bool) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    let mut humps: Vec<String> = Vec::new();
    for ch in pattern.chars() {
        let starts_hump = ch.is_uppercase() || ch == '-' || ch == '_';
        if starts_hump || humps.is_empty() {
            humps.push(String::new());
        }
        if let Some(hump) = humps.last_mut() {
            hump.push(ch);
        }
    }
    let body = humps
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join(r"[\p{Ll}\p{Nd}]*");
    let tail = if whole { r"[\p{Ll}\p{Nd}]*" } else { ".*" };
    Regex::new(&format!("^{body}{tail}$")).ok()
}

fn suggestions(lower_pattern: &str, names: &BTreeSet<&str>) -> Vec<String> {
    if lower_pattern.is_empty() {
        return Vec::new();
    }
    let max_distance = (lower_pattern.chars().count() / 3).max(2);
    names
        .iter()
        .filter(|n| {
            let n = n.to_lowercase();
            n.contains(lower_pattern) || edit_distance(lower_pattern, &n) <= max_distance
        })
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            row[j + 1] = substitution.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        prev = row;
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 6] = [
        "assemble",
        "build",
        "compile",
        "compileTest",
        "compile-docs",
        "check",
    ];

    fn find(pattern: &str) -> NameMatch {
        NameMatcher::find(pattern, NAMES)
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        assert_eq!(find("compile"), NameMatch::Found("compile".to_string()));
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(find("BUILD"), NameMatch::Found("build".to_string()));
    }

    #[test]
    fn test_camel_case_abbreviation() {
        assert_eq!(find("cT"), NameMatch::Found("compileTest".to_string()));
        assert_eq!(find("cTe"), NameMatch::Found("compileTest".to_string()));
        assert_eq!(find("as"), NameMatch::Found("assemble".to_string()));
    }

    #[test]
    fn test_kebab_case_abbreviation() {
        assert_eq!(find("c-d"), NameMatch::Found("compile-docs".to_string()));
    }

    #[test]
    fn test_whole_name_abbreviation_beats_prefix() {
        assert_eq!(find("comp"), NameMatch::Found("compile".to_string()));
        assert_eq!(
            NameMatcher::find("cJ", ["compileJava", "compileJavaDocs"]),
            NameMatch::Found("compileJava".to_string())
        );
        assert_eq!(
            NameMatcher::find("cJD", ["compileJava", "compileJavaDocs"]),
            NameMatch::Found("compileJavaDocs".to_string())
        );
    }

    #[test]
    fn test_ambiguous_abbreviation_lists_all_candidates() {
        assert_eq!(
            find("c"),
            NameMatch::Ambiguous(vec!["check".to_string(), "compile".to_string()])
        );
        assert_eq!(
            NameMatcher::find("cJ", ["compileJava", "copyJar", "compileJavaDocs"]),
            NameMatch::Ambiguous(vec!["compileJava".to_string(), "copyJar".to_string()])
        );
        assert_eq!(find("comT"), NameMatch::Found("compileTest".to_string()));
        assert_eq!(
            NameMatcher::find("cT", ["compileTestJava", "compileTestKotlin"]),
            NameMatch::Ambiguous(vec![
                "compileTestJava".to_string(),
                "compileTestKotlin".to_string(),
            ])
        );
    }

    #[test]
    fn test_not_found_suggests_near_names() {
        match find("bild") {
            NameMatch::NotFound(suggestions) => assert_eq!(suggestions, vec!["build".to_string()]),
            other => panic!("unexpected match: {other:?}"),
        }
        assert_eq!(find("zzzzz"), NameMatch::NotFound(Vec::new()));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("bild", "build"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("check", "check"), 0);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert_eq!(
            NameMatcher::find("a.b", ["axb", "a.bc"]),
            NameMatch::Found("a.bc".to_string())
        );
    }
}
