use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static INTERPOLATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$|
        \$([[:word:].]+)|
        \$\{([[:word:].]+)(?:(:?-|:?\?)([^}]*))?\}",
    )
    .expect("static regex is valid")
});

/// All environment variables which are valid UTF-8.
pub fn vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
            (Ok(k), Ok(v)) => Some((k, v)),
            _ => None,
        })
        .collect()
}

/// Substitutes `$NAME` and `${NAME}` with the value of the variable, `$$`
/// escapes a literal `$`.
///
/// The braced form supports the shell expansions
///
/// - `${NAME:-default}` default if unset or empty
/// - `${NAME-default}` default if unset
/// - `${NAME:?message}` error if unset or empty
/// - `${NAME?message}` error if unset
///
/// Referencing an unset variable without a default is an error.
pub fn interpolate<'a>(
    input: &'a str,
    vars: &HashMap<String, String>,
) -> Result<Cow<'a, str>, Vec<String>> {
    let mut errs = Vec::new();

    let interpolated = INTERPOLATION_REGEX.replace_all(input, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            // `$$`
            return "$".to_string();
        };

        let value = vars.get(name).map(String::as_str);
        let flags = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        let arg = caps.get(4).map(|m| m.as_str()).unwrap_or_default();

        expand(name, value, flags, arg, &mut errs).to_string()
    });

    if errs.is_empty() {
        Ok(interpolated)
    } else {
        Err(errs)
    }
}

fn expand<'a>(
    name: &str,
    value: Option<&'a str>,
    flags: &str,
    arg: &'a str,
    errs: &mut Vec<String>,
) -> &'a str {
    let value = match flags {
        ":-" => return value.filter(|v| !v.is_empty()).unwrap_or(arg),
        "-" => return value.unwrap_or(arg),
        ":?" => value.filter(|v| !v.is_empty()),
        _ => value,
    };

    value.unwrap_or_else(|| {
        errs.push(match flags {
            ":?" => format!("non-empty environment variable {name:?} required, {arg}"),
            "?" => format!("environment variable {name:?} required, {arg}"),
            _ => format!("missing environment variable {name:?}"),
        });

        ""
    })
}
