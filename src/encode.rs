//! Substitution of typed parameters into query templates.
//!
//! Templates use `%s` for positional parameters, `%(name)s` for named ones
//! and `%%` for a literal percent sign. Values are rendered to SQL literals
//! first, then inserted verbatim in a single pass over the template.

use std::collections::HashMap;

use crate::{value::ISO_FORMAT, CommandoError, Params, Result, Value};

enum Placeholder<'a> {
    Positional,
    Named(&'a str),
}

/// Replaces placeholders in `template` with the literal rendering of `params`.
///
/// An empty parameter set returns the template untouched.
pub fn encode(template: &str, params: &Params) -> Result<String> {
    if params.is_empty() {
        return Ok(template.to_owned());
    }

    match params {
        Params::Positional(values) => {
            let rendered = values
                .iter()
                .map(render_literal)
                .collect::<Result<Vec<_>>>()?;
            let mut remaining = rendered.iter();
            let mut used = 0usize;

            let query = fill(template, |placeholder, offset, out| match placeholder {
                Placeholder::Positional => {
                    let literal = remaining.next().ok_or_else(|| {
                        mismatch(format!(
                            "template has more than {} positional placeholders",
                            rendered.len()
                        ))
                    })?;
                    used += 1;
                    out.push_str(literal);
                    Ok(())
                }
                Placeholder::Named(name) => Err(mismatch(format!(
                    "named placeholder '{name}' at offset {offset} with positional parameters"
                ))),
            })?;

            if used != rendered.len() {
                return Err(mismatch(format!(
                    "{} positional parameters for {used} placeholders",
                    rendered.len()
                )));
            }
            Ok(query)
        }
        Params::Named(pairs) => {
            // Later duplicates replace earlier ones.
            let mut rendered = HashMap::with_capacity(pairs.len());
            for (name, value) in pairs {
                rendered.insert(name.as_str(), render_literal(value)?);
            }

            fill(template, |placeholder, offset, out| match placeholder {
                Placeholder::Named(name) => {
                    let literal = rendered.get(name).ok_or_else(|| {
                        mismatch(format!("no value for placeholder '{name}' at offset {offset}"))
                    })?;
                    out.push_str(literal);
                    Ok(())
                }
                Placeholder::Positional => Err(mismatch(format!(
                    "positional placeholder at offset {offset} with named parameters"
                ))),
            })
        }
    }
}

/// Renders a single value as a SQL literal.
pub fn render_literal(value: &Value) -> Result<String> {
    render(value, false)
}

fn render(value: &Value, in_list: bool) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_owned()),
        Value::Integer(value) => Ok(value.to_string()),
        Value::Float(value) => {
            if !value.is_finite() {
                return Err(CommandoError::UnsupportedParameterType {
                    kind: "non-finite float",
                });
            }
            Ok(format!("{value:?}"))
        }
        Value::Text(value) => Ok(format!("'{}'", escape_string(value))),
        Value::Timestamp(value) => Ok(format!("'{}'", value.format(ISO_FORMAT))),
        Value::List(_) if in_list => Err(CommandoError::UnsupportedParameterType {
            kind: "nested list",
        }),
        Value::List(values) => {
            let items = values
                .iter()
                .map(|item| render(item, true))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", items.join(", ")))
        }
    }
}

/// Doubles every single quote; nothing else is escaped.
fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

fn fill<F>(template: &str, mut resolve: F) -> Result<String>
where
    F: FnMut(Placeholder<'_>, usize, &mut String) -> Result<()>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0usize;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let at = offset + pos;
        let tail = &rest[pos + 1..];

        let consumed = if tail.starts_with('s') {
            resolve(Placeholder::Positional, at, &mut out)?;
            2
        } else if tail.starts_with('%') {
            out.push('%');
            2
        } else if let Some(named) = tail.strip_prefix('(') {
            let close = named.find(')').ok_or_else(|| {
                mismatch(format!("unterminated named placeholder at offset {at}"))
            })?;
            if !named[close + 1..].starts_with('s') {
                return Err(mismatch(format!(
                    "unsupported named placeholder format at offset {at}"
                )));
            }
            resolve(Placeholder::Named(&named[..close]), at, &mut out)?;
            close + 4
        } else {
            return Err(mismatch(format!("unsupported placeholder at offset {at}")));
        };

        rest = &rest[pos + consumed..];
        offset = at + consumed;
    }

    out.push_str(rest);
    Ok(out)
}

fn mismatch(message: String) -> CommandoError {
    CommandoError::PlaceholderMismatch(message)
}
