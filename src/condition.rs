//! Condition expression evaluator: a deliberately small subset of CEL-like
//! syntax, recognized by substring presence rather than a real parser. New
//! patterns are added explicitly; the parser is never generalized.

use chrono::{DateTime, Utc};

use crate::resource::ResourceType;

/// Evaluation context available to a condition: the resource being checked
/// and the instant the decision began.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub resource_name: String,
    pub resource_type: ResourceType,
    pub request_time: DateTime<Utc>,
}

/// Extracts the first double-quoted string literal from `s`, if any.
fn first_quoted(s: &str) -> Option<&str> {
    let start = s.find('"')?;
    let rest = &s[start + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Evaluates `expression` against `ctx`, returning `(allowed, reason)`.
/// A null/whitespace-only expression is vacuously true. An expression
/// outside the recognized grammar is false with an explanatory reason —
/// this function never panics or returns an error to the caller.
pub fn evaluate(expression: &str, ctx: &EvalContext) -> (bool, String) {
    let expr = expression.trim();
    if expr.is_empty() {
        return (true, "no condition".to_string());
    }

    if expr.contains("resource.name.startsWith(") {
        return match first_quoted(expr) {
            Some(prefix) => {
                let ok = ctx.resource_name.starts_with(prefix);
                (ok, format!("resource.name.startsWith(\"{prefix}\") = {ok}"))
            }
            None => (false, "malformed expression: missing prefix literal".to_string()),
        };
    }

    if expr.contains("resource.type ==") {
        return match first_quoted(expr) {
            Some(ty) => {
                let ok = ctx.resource_type.as_str() == ty;
                (ok, format!("resource.type == \"{ty}\" = {ok}"))
            }
            None => (false, "malformed expression: missing type literal".to_string()),
        };
    }

    if expr.contains("request.time <") {
        return match parse_timestamp_literal(expr) {
            Ok(t) => {
                let ok = ctx.request_time < t;
                (ok, format!("request.time < {t} = {ok}"))
            }
            Err(reason) => (false, reason),
        };
    }

    if expr.contains("request.time >") {
        return match parse_timestamp_literal(expr) {
            Ok(t) => {
                let ok = ctx.request_time > t;
                (ok, format!("request.time > {t} = {ok}"))
            }
            Err(reason) => (false, reason),
        };
    }

    (false, "unsupported expression".to_string())
}

fn parse_timestamp_literal(expr: &str) -> Result<DateTime<Utc>, String> {
    let literal = first_quoted(expr).ok_or_else(|| "malformed expression: missing timestamp literal".to_string())?;
    DateTime::parse_from_rfc3339(literal)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("malformed expression: invalid timestamp '{literal}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx(resource_name: &str, request_time: DateTime<Utc>) -> EvalContext {
        EvalContext {
            resource_name: resource_name.to_string(),
            resource_type: crate::resource::derive_type(resource_name),
            request_time,
        }
    }

    #[test]
    fn empty_expression_is_vacuously_true() {
        let c = ctx("projects/p/secrets/s", Utc::now());
        assert_eq!(evaluate("", &c).0, true);
        assert_eq!(evaluate("   ", &c).0, true);
    }

    #[test]
    fn starts_with_prefix_match() {
        let c = ctx("projects/test/secrets/prod-key", Utc::now());
        let (ok, _) = evaluate(r#"resource.name.startsWith("projects/test/secrets/prod-")"#, &c);
        assert!(ok);

        let c2 = ctx("projects/test/secrets/staging-key", Utc::now());
        let (ok2, _) = evaluate(r#"resource.name.startsWith("projects/test/secrets/prod-")"#, &c2);
        assert!(!ok2);
    }

    #[test]
    fn resource_type_equality() {
        let c = ctx("projects/p/secrets/s", Utc::now());
        assert!(evaluate(r#"resource.type == "SECRET""#, &c).0);
        assert!(!evaluate(r#"resource.type == "KEY_RING""#, &c).0);
    }

    #[test]
    fn request_time_comparisons() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let c = ctx("projects/p", now);
        assert!(evaluate(r#"request.time < timestamp("2027-01-01T00:00:00Z")"#, &c).0);
        assert!(!evaluate(r#"request.time > timestamp("2027-01-01T00:00:00Z")"#, &c).0);
        assert!(evaluate(r#"request.time > timestamp("2025-01-01T00:00:00Z")"#, &c).0);
    }

    #[test]
    fn malformed_literal_denies_without_panic() {
        let c = ctx("projects/p", Utc::now());
        let (ok, reason) = evaluate("resource.name.startsWith(nope)", &c);
        assert!(!ok);
        assert!(reason.contains("malformed"));

        let (ok2, reason2) = evaluate(r#"request.time < timestamp("not-a-time")"#, &c);
        assert!(!ok2);
        assert!(reason2.contains("malformed"));
    }

    #[test]
    fn unsupported_expression_denies_with_reason() {
        let c = ctx("projects/p", Utc::now());
        let (ok, reason) = evaluate("1 == 1", &c);
        assert!(!ok);
        assert_eq!(reason, "unsupported expression");
    }
}
