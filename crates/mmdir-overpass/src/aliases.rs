//! Multi-script name expansion for the name-matching clause.
//!
//! A single user query is widened into an alias set: the literal text, a
//! naive transliteration variant with `th` collapsed to `t`, and a fixed list
//! of monastic names and generic terms in Latin and Myanmar script. Recall is
//! preferred over precision: any alias matching a name is a hit.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static TH_DIGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)th").expect("valid regex"));

/// Known equivalents appended to viewport name searches.
const VIEWPORT_TERMS: &[&str] = &[
    "Sitagu",
    "သီတဂူ",
    "Thathudaza",
    "Thawtuzana",
    "သောတုဇန",
    "Sudhamma",
    "သုဓမ္မ",
    "Sasana",
    "သာသနာ",
    "Vihara",
    "Monastery",
    "Nunnery",
    "သီလရှင်",
];

/// Nationwide searches add spelling variants seen in monastic school names.
const NATIONWIDE_TERMS: &[&str] = &[
    "Sitagu",
    "သီတဂူ",
    "Thathudaza",
    "Thudaza",
    "Thawtuzana",
    "သောတုဇန",
    "Sudhamma",
    "သုဓမ္မ",
    "Sasana",
    "သာသနာ",
    "Vihara",
    "Viharaya",
    "Monastery",
    "Nunnery",
    "သီလရှင်",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasScope {
    Viewport,
    Nationwide,
}

impl AliasScope {
    fn terms(self) -> &'static [&'static str] {
        match self {
            AliasScope::Viewport => VIEWPORT_TERMS,
            AliasScope::Nationwide => NATIONWIDE_TERMS,
        }
    }
}

/// Alias set for `raw`, first occurrence kept on case-insensitive duplicates.
///
/// Returns an empty list for blank input.
#[must_use]
pub fn expand_aliases(raw: &str, scope: AliasScope) -> Vec<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let collapsed = TH_DIGRAPH.replace_all(query, "t").into_owned();
    let candidates = [query.to_owned(), collapsed]
        .into_iter()
        .chain(scope.terms().iter().map(|s| (*s).to_owned()));

    let mut seen = HashSet::new();
    candidates
        .filter(|alias| seen.insert(alias.to_lowercase()))
        .collect()
}

/// Backslash-escapes the characters that are special in Overpass regexes.
#[must_use]
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Single alternation group over every alias, e.g. `(Sitagu|သီတဂူ|...)`.
///
/// The result is a regex; it still needs QL string escaping before being
/// embedded in a query.
#[must_use]
pub fn name_pattern(raw: &str, scope: AliasScope) -> Option<String> {
    let aliases = expand_aliases(raw, scope);
    if aliases.is_empty() {
        return None;
    }
    let escaped: Vec<String> = aliases.iter().map(|a| escape_regex(a)).collect();
    Some(format!("({})", escaped.join("|")))
}
