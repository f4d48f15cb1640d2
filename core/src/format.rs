//! Positional template substitution for hrefs.
//!
//! # Design
//! `format_template` follows the printf-style rules of the host platform's
//! `format` helper: placeholders are consumed left to right, a placeholder
//! with no remaining parameter stays verbatim, and leftover parameters are
//! appended separated by a space. Parameters are always text, so the numeric
//! specifiers convert that text the way a dynamic runtime would.

use std::sync::LazyLock;

use regex::Regex;

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:]/)/+").expect("static regex"));

/// Substitute `params` into the `%` placeholders of `template`.
///
/// With no params the template is returned untouched, including any `%%`.
pub fn format_template(template: &str, params: &[&str]) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut next = 0usize;
    let mut last = 0usize;
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }

        let specifier = bytes[i + 1];
        let replacement = if specifier == b'%' {
            Some(String::from("%"))
        } else if let Some(param) = params.get(next) {
            let converted = convert(specifier, param);
            if converted.is_some() {
                next += 1;
            }
            converted
        } else {
            None
        };

        if let Some(replacement) = replacement {
            out.push_str(&template[last..i]);
            out.push_str(&replacement);
            last = i + 2;
        }
        i += 2;
    }

    out.push_str(&template[last..]);
    for param in &params[next..] {
        out.push(' ');
        out.push_str(param);
    }
    out
}

/// Collapse runs of `/` that do not directly follow a scheme colon.
///
/// Equivalent to replacing `([^:]/)/+` with `$1`, so `http://a//b` becomes
/// `http://a/b` while the `//` after `http:` survives.
pub fn collapse_slashes(href: &str) -> String {
    REPEATED_SLASHES.replace_all(href, "$1").into_owned()
}

fn convert(specifier: u8, param: &str) -> Option<String> {
    let value = match specifier {
        b's' => param.to_string(),
        b'd' => format_number(to_number(param)),
        b'i' => format_number(parse_int(param)),
        b'f' => format_number(parse_float(param)),
        b'j' => serde_json::to_string(param).unwrap_or_default(),
        b'o' | b'O' => inspect_string(param),
        b'c' => String::new(),
        _ => return None,
    };
    Some(value)
}

/// Quote a string the way an object inspector prints it.
///
/// Single quotes by default; double quotes when the text contains `'` but
/// no `"`; backticks when it contains both but no backtick or `${`.
/// Backslashes, the chosen quote, and control characters are escaped.
fn inspect_string(text: &str) -> String {
    let quote = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else if !text.contains('`') && !text.contains("${") {
        '`'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{n}")
    }
}

/// Whole-string numeric conversion: blank is zero, junk is NaN.
fn to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    if !text.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Leading integer prefix, NaN when there is none.
fn parse_int(text: &str) -> f64 {
    let text = text.trim_start();
    let (sign, rest) = split_sign(text);

    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        let digits: String = hex.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        return u64::from_str_radix(&digits, 16).map_or(f64::NAN, |n| sign * n as f64);
    }

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    digits.parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

/// Longest leading decimal literal, NaN when there is none.
fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let (sign, rest) = split_sign(text);
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        mantissa_digits += frac - end - 1;
        end = frac;
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits_start {
            end = exp;
        }
    }

    rest[..end].parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

fn split_sign(text: &str) -> (f64, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (-1.0, rest)
    } else {
        (1.0, text.strip_prefix('+').unwrap_or(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_params_returns_template_verbatim() {
        assert_eq!(format_template("http://a.com/%s/100%%", &[]), "http://a.com/%s/100%%");
    }

    #[test]
    fn string_placeholders_are_sequential() {
        assert_eq!(
            format_template("https://%s/users/%s", &["api.example.com", "42"]),
            "https://api.example.com/users/42"
        );
    }

    #[test]
    fn missing_params_leave_placeholders() {
        assert_eq!(format_template("/%s/%s", &["a"]), "/a/%s");
    }

    #[test]
    fn leftover_params_are_appended_with_spaces() {
        assert_eq!(format_template("a%sb", &["1", "2", "3"]), "a1b 2 3");
    }

    #[test]
    fn percent_percent_folds_only_with_params() {
        assert_eq!(format_template("%s 100%%", &["x"]), "x 100%");
        assert_eq!(format_template("100%%", &[]), "100%%");
    }

    #[test]
    fn unknown_specifier_is_kept() {
        assert_eq!(format_template("/a%20b/%s", &["c"]), "/a%20b/c");
    }

    #[test]
    fn numeric_specifiers_convert_text() {
        assert_eq!(format_template("%d", &["12"]), "12");
        assert_eq!(format_template("%d", &["1.5"]), "1.5");
        assert_eq!(format_template("%d", &[""]), "0");
        assert_eq!(format_template("%d", &["abc"]), "NaN");
        assert_eq!(format_template("%i", &["42px"]), "42");
        assert_eq!(format_template("%i", &["-7.9"]), "-7");
        assert_eq!(format_template("%f", &["3.25rem"]), "3.25");
        assert_eq!(format_template("%f", &["x"]), "NaN");
    }

    #[test]
    fn json_inspect_and_css_specifiers() {
        assert_eq!(format_template("%j", &["a\"b"]), r#""a\"b""#);
        assert_eq!(format_template("%o", &["v"]), "'v'");
        assert_eq!(format_template("%o", &["it's"]), r#""it's""#);
        assert_eq!(format_template("%O", &[r#"it's "x""#]), r#"`it's "x"`"#);
        assert_eq!(format_template("%o", &[r#"'"`"#]), r#"'\'"`'"#);
        assert_eq!(format_template("%o", &["a\\b\n"]), r#"'a\\b\n'"#);
        assert_eq!(format_template("a%cb", &["color: red"]), "ab");
    }

    #[test]
    fn collapse_keeps_scheme_separator() {
        assert_eq!(
            collapse_slashes("http://example.com//api//v1"),
            "http://example.com/api/v1"
        );
        assert_eq!(collapse_slashes("https://host///x"), "https://host/x");
    }

    #[test]
    fn collapse_after_colon_keeps_two() {
        assert_eq!(collapse_slashes("file:///etc"), "file://etc");
        assert_eq!(collapse_slashes("a:b//c"), "a:b/c");
    }
}
