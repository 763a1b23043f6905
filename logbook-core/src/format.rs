//! Minimal message templating.
//!
//! `LogRecord::message` (spec.md §4.2) renders `msg` against `args` and
//! `kwargs` the way Python's `str.format` does: `{}` consumes the next
//! positional argument, `{name}` looks `name` up in the keyword arguments,
//! and `{{`/`}}` escape literal braces. No alignment/fill/precision
//! mini-language is supported — the original only ever uses plain
//! substitution for log templates, and nothing in the pack pulls in a
//! templating crate for this, so it's hand-rolled the same way
//! `tracing-subscriber`'s `fmt::format` module hand-rolls its own
//! line-formatting rather than reaching for one.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{FormatCause, FormatError};

/// Renders `msg` against `args`/`kwargs`. If both are empty, `msg` is
/// returned verbatim without being scanned for placeholders at all (spec.md
/// §4.2: "if `args` and `kwargs` are empty, equals `msg`").
pub fn render(
    msg: &str,
    args: &[Value],
    kwargs: &BTreeMap<String, Value>,
    filename: Option<&str>,
    lineno: Option<u32>,
) -> Result<String, FormatError> {
    if args.is_empty() && kwargs.is_empty() {
        return Ok(msg.to_owned());
    }
    render_template(msg, args, kwargs).map_err(|cause| {
        FormatError::new(
            msg,
            format!("{:?}", args),
            format!("{:?}", kwargs),
            filename.map(str::to_owned),
            lineno,
            cause,
        )
    })
}

fn render_template(
    msg: &str,
    args: &[Value],
    kwargs: &BTreeMap<String, Value>,
) -> Result<String, FormatCause> {
    let mut out = String::with_capacity(msg.len());
    let mut chars = msg.char_indices().peekable();
    let mut next_positional = 0usize;

    while let Some((_, ch)) = chars.next() {
        match ch {
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(FormatCause::UnterminatedPlaceholder),
                    }
                }
                if name.is_empty() {
                    let value = args
                        .get(next_positional)
                        .ok_or(FormatCause::MissingPositional {
                            index: next_positional,
                        })?;
                    write_value(&mut out, value);
                    next_positional += 1;
                } else if let Ok(index) = name.parse::<usize>() {
                    let value = args.get(index).ok_or(FormatCause::MissingPositional { index })?;
                    write_value(&mut out, value);
                } else {
                    let value = kwargs
                        .get(&name)
                        .ok_or_else(|| FormatCause::MissingNamed { name: name.clone() })?;
                    write_value(&mut out, value);
                }
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(FormatCause::UnexpectedCloseBrace);
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn empty_args_returns_msg_verbatim() {
        let out = render("hello {not a placeholder", &[], &BTreeMap::new(), None, None).unwrap();
        assert_eq!(out, "hello {not a placeholder");
    }

    #[test]
    fn positional_placeholders_consume_in_order() {
        let args = vec![json!("alice"), json!(42)];
        let out = render("user {} logged in, id {}", &args, &BTreeMap::new(), None, None).unwrap();
        assert_eq!(out, "user alice logged in, id 42");
    }

    #[test]
    fn named_placeholders_pull_from_kwargs() {
        let kw = kwargs(&[("ip", json!("127.0.0.1"))]);
        let out = render("connected from {ip}", &[], &kw, None, None).unwrap();
        assert_eq!(out, "connected from 127.0.0.1");
    }

    #[test]
    fn escaped_braces_are_literal() {
        let args = vec![json!(1)];
        let out = render("{{literal}} value={}", &args, &BTreeMap::new(), None, None).unwrap();
        assert_eq!(out, "{literal} value=1");
    }

    #[test]
    fn missing_positional_is_a_format_error() {
        let err = render("{} {}", &[json!(1)], &BTreeMap::new(), Some("x.rs"), Some(7)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing positional argument 1"));
        assert!(msg.contains("x.rs"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn missing_keyword_is_a_format_error() {
        let err = render("{ip}", &[], &BTreeMap::new(), None, None).unwrap_err();
        assert!(err.to_string().contains("missing keyword argument"));
    }
}
