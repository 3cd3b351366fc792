// Assertion predicates over executor results.
// Grammar: `KEY OP [OPERAND]` where KEY is a lowercase dotted result key.
// Comparisons are numeric when both sides parse as f64, string otherwise.
// Every violation (and every malformed predicate) is an assertion failure,
// never a case error.

use regex::Regex;

use crate::executor::ExecutorResult;

/// Evaluate one assertion line against an executor result.
///
/// `Err` carries the human-readable failure message recorded on the case.
pub fn check(assertion: &str, result: &ExecutorResult) -> Result<(), String> {
    let (key, op, operand) = parse(assertion)?;

    let actual = result.get(key).map(String::as_str);

    if op == "exists" {
        return match actual {
            Some(_) => Ok(()),
            None => Err(format!(
                "assertion '{assertion}' failed: key '{key}' not found in result"
            )),
        };
    }

    let actual = actual.ok_or_else(|| {
        format!("assertion '{assertion}' failed: key '{key}' not found in result")
    })?;
    let operand =
        operand.ok_or_else(|| format!("assertion '{assertion}' is missing an operand"))?;

    let holds = match op {
        "eq" => loose_eq(actual, operand),
        "ne" => !loose_eq(actual, operand),
        "gt" | "ge" | "lt" | "le" => numeric(assertion, actual, operand, op)?,
        "contains" => actual.contains(operand),
        "matches" => Regex::new(operand)
            .map_err(|err| format!("assertion '{assertion}' has an invalid regex: {err}"))?
            .is_match(actual),
        other => {
            return Err(format!(
                "assertion '{assertion}' uses unknown operator '{other}'"
            ))
        }
    };

    if holds {
        Ok(())
    } else {
        Err(format!(
            "assertion '{assertion}' failed: actual value '{actual}'"
        ))
    }
}

fn parse(line: &str) -> Result<(&str, &str, Option<&str>), String> {
    let line = line.trim();
    let (key, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("assertion '{line}' is missing an operator"))?;
    let rest = rest.trim_start();
    match rest.split_once(char::is_whitespace) {
        Some((op, operand)) => Ok((key, op, Some(operand.trim()))),
        None => Ok((key, rest, None)),
    }
}

/// Numeric equality when both sides parse, string equality otherwise.
fn loose_eq(actual: &str, operand: &str) -> bool {
    match (actual.parse::<f64>(), operand.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => actual == operand,
    }
}

fn numeric(assertion: &str, actual: &str, operand: &str, op: &str) -> Result<bool, String> {
    let a = actual.parse::<f64>().map_err(|_| {
        format!("assertion '{assertion}' failed: actual value '{actual}' is not numeric")
    })?;
    let b = operand.parse::<f64>().map_err(|_| {
        format!("assertion '{assertion}' failed: operand '{operand}' is not numeric")
    })?;
    Ok(match op {
        "gt" => a > b,
        "ge" => a >= b,
        "lt" => a < b,
        _ => a <= b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(pairs: &[(&str, &str)]) -> ExecutorResult {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_eq_numeric_and_string() {
        let r = result(&[("result.code", "0"), ("result.systemout", "ready")]);
        assert!(check("result.code eq 0", &r).is_ok());
        assert!(check("result.code eq 0.0", &r).is_ok());
        assert!(check("result.systemout eq ready", &r).is_ok());
        assert!(check("result.code eq 1", &r).is_err());
    }

    #[test]
    fn test_ne() {
        let r = result(&[("result.code", "2")]);
        assert!(check("result.code ne 0", &r).is_ok());
        assert!(check("result.code ne 2", &r).is_err());
    }

    #[test]
    fn test_ordering_operators() {
        let r = result(&[("result.timeseconds", "1.5")]);
        assert!(check("result.timeseconds gt 1", &r).is_ok());
        assert!(check("result.timeseconds ge 1.5", &r).is_ok());
        assert!(check("result.timeseconds lt 2", &r).is_ok());
        assert!(check("result.timeseconds le 1.5", &r).is_ok());
        assert!(check("result.timeseconds gt 2", &r).is_err());
    }

    #[test]
    fn test_ordering_requires_numbers() {
        let r = result(&[("result.systemout", "ready")]);
        let message = check("result.systemout gt 1", &r).expect_err("not numeric");
        assert!(message.contains("not numeric"));
    }

    #[test]
    fn test_contains_and_matches() {
        let r = result(&[("result.systemout", "got token=abc here")]);
        assert!(check("result.systemout contains token=abc", &r).is_ok());
        assert!(check("result.systemout matches token=[a-z]+", &r).is_ok());
        assert!(check("result.systemout contains nope", &r).is_err());
    }

    #[test]
    fn test_exists() {
        let r = result(&[("result.code", "0")]);
        assert!(check("result.code exists", &r).is_ok());
        assert!(check("result.nothing exists", &r).is_err());
    }

    #[test]
    fn test_missing_key_is_a_failure() {
        let r = result(&[]);
        let message = check("result.code eq 0", &r).expect_err("missing key");
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_malformed_predicates_are_failures() {
        let r = result(&[("result.code", "0")]);
        assert!(check("result.code", &r).is_err());
        assert!(check("result.code eq", &r).is_err());
        assert!(check("result.code almost 0", &r).is_err());
    }

    #[test]
    fn test_operand_keeps_embedded_whitespace() {
        let r = result(&[("result.systemout", "hello brave world")]);
        assert!(check("result.systemout eq hello brave world", &r).is_ok());
        assert!(check("result.systemout contains brave world", &r).is_ok());
    }
}
