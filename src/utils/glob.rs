//! Glob pattern matching for resolver path queries.
//!
//! Translates the glob dialect used by cataloger selectors (`*`, `?`, and
//! `**` spanning directory separators) into anchored regular expressions.

use regex::Regex;

/// Compile a glob pattern into an anchored [`Regex`].
///
/// Paths are matched against their `/`-separated form with no leading
/// separator. A leading `**/` also matches entries at the root, so
/// `**/Cargo.lock` matches both `Cargo.lock` and `vendor/foo/Cargo.lock`.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() * 2);
    expr.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        // `**/` spans zero or more whole directories
                        expr.push_str("(?:.*/)?");
                    } else {
                        expr.push_str(".*");
                    }
                } else {
                    expr.push_str("[^/]*");
                }
            }
            '?' => expr.push_str("[^/]"),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }

    expr.push('$');
    Regex::new(&expr)
}

/// Convenience check of one path against one glob pattern.
pub fn matches(pattern: &str, path: &str) -> bool {
    let normalized = path.trim_start_matches('/');
    match compile(pattern) {
        Ok(re) => re.is_match(normalized),
        Err(err) => {
            tracing::warn!("invalid glob pattern {pattern:?}: {err}");
            false
        }
    }
}
