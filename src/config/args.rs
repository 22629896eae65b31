// src/config/args.rs

//! Normalization of the loosely-typed `args` value into a flat argv.

use crate::config::model::ArgValue;

/// Turn a configured `args` value into the literal argument list.
///
/// - absent → `[]`
/// - scalar → one element
/// - list → flattened exactly one level, every element stringified
///
/// Anything still nested after the single flatten is joined with `,`.
/// Normalizing a list of plain strings returns it unchanged.
pub fn normalize_args(value: Option<&ArgValue>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    match value {
        ArgValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ArgValue::List(inner) => out.extend(inner.iter().map(stringify)),
                    scalar => out.push(stringify(scalar)),
                }
            }
            out
        }
        scalar => vec![stringify(scalar)],
    }
}

fn stringify(value: &ArgValue) -> String {
    match value {
        ArgValue::Text(s) => s.clone(),
        ArgValue::Integer(n) => n.to_string(),
        ArgValue::Float(f) => f.to_string(),
        ArgValue::Bool(b) => b.to_string(),
        ArgValue::List(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
    }
}
