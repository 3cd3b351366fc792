// Extraction patterns: a literal string with `{{name=REGEX}}` tokens.
// Literal text must match verbatim; each token becomes a named capture
// group whose value is bound as `caseName.name` for downstream steps.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)=(.+?)\}\}").expect("valid extraction token regex"));

/// Variables a pattern would bind, in token order. Used by the pre-run
/// analyzer to compute the provided-variable set.
pub fn pattern_variables(pattern: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(pattern)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Apply a pattern to an executor result value, returning `(name, captured)`
/// pairs. `Err` carries the failure message recorded on the case.
pub fn apply(pattern: &str, input: &str) -> Result<Vec<(String, String)>, String> {
    let mut source = String::new();
    let mut names = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(pattern) {
        let token = caps.get(0).expect("whole match");
        source.push_str(&regex::escape(&pattern[last..token.start()]));
        let name = &caps[1];
        source.push_str("(?P<");
        source.push_str(name);
        source.push('>');
        source.push_str(&caps[2]);
        source.push(')');
        names.push(name.to_string());
        last = token.end();
    }
    source.push_str(&regex::escape(&pattern[last..]));

    if names.is_empty() {
        return Err(format!(
            "extraction pattern '{pattern}' contains no {{{{name=regex}}}} token"
        ));
    }

    let compiled = Regex::new(&source)
        .map_err(|err| format!("extraction pattern '{pattern}' is invalid: {err}"))?;
    let caps = compiled
        .captures(input)
        .ok_or_else(|| format!("extraction pattern '{pattern}' did not match '{input}'"))?;

    Ok(names
        .into_iter()
        .map(|name| {
            let value = caps
                .name(&name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (name, value)
        })
        .collect())
}
