use crate::treewalk::{types::Exception, DomainResult, TreewalkValue};

/// Render a float the way Python's `repr` does: always with a fractional part or exponent.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return python_exponent(&format!("{f:e}"));
    }
    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Rust writes exponents as `e-7`; Python writes `e-07`.
fn python_exponent(formatted: &str) -> String {
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted.to_string();
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Quote a string the way Python's `repr` does.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[derive(Debug, Default, PartialEq)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    alternate: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str) -> DomainResult<Self> {
        let invalid = || Exception::value_error(format!("Invalid format specifier '{spec}'"));
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec::default();
        let mut i = 0;

        let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
        if chars.len() >= 2 && is_align(chars[1]) {
            parsed.fill = Some(chars[0]);
            parsed.align = Some(chars[1]);
            i = 2;
        } else if !chars.is_empty() && is_align(chars[0]) {
            parsed.align = Some(chars[0]);
            i = 1;
        }

        if let Some(&c) = chars.get(i) {
            if matches!(c, '+' | '-' | ' ') {
                parsed.sign = Some(c);
                i += 1;
            }
        }
        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            parsed.fill.get_or_insert('0');
            parsed.align.get_or_insert('=');
            i += 1;
        }

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > start {
            parsed.width = chars[start..i]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| invalid())?;
        }

        if let Some(&c) = chars.get(i) {
            if c == ',' || c == '_' {
                parsed.grouping = Some(c);
                i += 1;
            }
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == start {
                return Err(invalid());
            }
            parsed.precision = Some(
                chars[start..i]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .map_err(|_| invalid())?,
            );
        }

        if let Some(&c) = chars.get(i) {
            parsed.kind = Some(c);
            i += 1;
        }
        if i != chars.len() {
            return Err(invalid());
        }
        Ok(parsed)
    }
}

/// Apply a format specification (the part after `:` in an f-string field or `format()` call).
/// `text` is the already computed `str()` of `value`, used for non-numeric values.
pub fn format_with_spec(value: &TreewalkValue, spec: &str, text: &str) -> DomainResult<String> {
    if spec.is_empty() {
        return Ok(text.to_string());
    }
    let spec = FormatSpec::parse(spec)?;
    let is_number = matches!(
        value,
        TreewalkValue::Int(_) | TreewalkValue::Float(_) | TreewalkValue::Bool(_)
    );

    let (negative, body) = match spec.kind {
        Some('s') | None if !is_number => {
            let body = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text.to_string(),
            };
            return Ok(pad(&spec, "", &body, '<'));
        }
        Some('d') => {
            let i = value.as_int()?;
            (i < 0, group(&i.unsigned_abs().to_string(), spec.grouping))
        }
        Some(kind @ ('x' | 'X' | 'o' | 'b')) => {
            let i = value.as_int()?;
            let magnitude = i.unsigned_abs();
            let digits = match kind {
                'x' => format!("{magnitude:x}"),
                'X' => format!("{magnitude:X}"),
                'o' => format!("{magnitude:o}"),
                _ => format!("{magnitude:b}"),
            };
            let prefix = match (spec.alternate, kind) {
                (false, _) => "",
                (true, 'x') => "0x",
                (true, 'X') => "0X",
                (true, 'o') => "0o",
                (true, _) => "0b",
            };
            (i < 0, format!("{prefix}{digits}"))
        }
        Some(kind @ ('f' | 'F' | '%' | 'e' | 'E' | 'g' | 'G')) => {
            let f = value.as_float()?;
            let f = if kind == '%' { f * 100.0 } else { f };
            let precision = spec.precision.unwrap_or(6);
            let magnitude = f.abs();
            let body = match kind {
                'e' | 'E' => {
                    let s = python_exponent(&format!("{magnitude:.precision$e}"));
                    if kind == 'E' {
                        s.to_uppercase()
                    } else {
                        s
                    }
                }
                'g' | 'G' => general(magnitude, precision),
                _ => fixed(magnitude, precision, spec.grouping),
            };
            let body = if kind == '%' { format!("{body}%") } else { body };
            (f.is_sign_negative() && f != 0.0, body)
        }
        None => match value {
            TreewalkValue::Float(f) => {
                let body = match spec.precision {
                    Some(p) => general(f.abs(), p),
                    None => format_float(f.abs()),
                };
                (*f < 0.0, body)
            }
            _ => {
                let i = value.as_int()?;
                (i < 0, group(&i.unsigned_abs().to_string(), spec.grouping))
            }
        },
        Some(other) => {
            return Err(Exception::value_error(format!(
                "Unknown format code '{other}' for object of type '{}'",
                value.type_name()
            )))
        }
    };

    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, Some('+')) => "+",
        (false, Some(' ')) => " ",
        _ => "",
    };
    Ok(pad(&spec, sign, &body, '>'))
}

fn fixed(magnitude: f64, precision: usize, grouping: Option<char>) -> String {
    let s = format!("{magnitude:.precision$}");
    match s.split_once('.') {
        Some((int, frac)) => format!("{}.{frac}", group(int, grouping)),
        None => group(&s, grouping),
    }
}

/// The `g` presentation: `precision` significant digits, trailing zeros removed.
fn general(magnitude: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if magnitude == 0.0 {
        return "0".into();
    }
    let exponent = magnitude.log10().floor() as i64;
    if exponent < -4 || exponent >= precision as i64 {
        let digits = precision - 1;
        let s = format!("{magnitude:.digits$e}");
        let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
        let mantissa = strip_zeros(mantissa);
        python_exponent(&format!("{mantissa}e{exp}"))
    } else {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{magnitude:.decimals$}"))
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn group(digits: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return digits.to_string();
    };
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

fn pad(spec: &FormatSpec, sign: &str, body: &str, default_align: char) -> String {
    let len = sign.chars().count() + body.chars().count();
    if len >= spec.width {
        return format!("{sign}{body}");
    }
    let fill = spec.fill.unwrap_or(' ');
    let padding = spec.width - len;
    let repeat = |n: usize| fill.to_string().repeat(n);
    match spec.align.unwrap_or(default_align) {
        '<' => format!("{sign}{body}{}", repeat(padding)),
        '^' => format!(
            "{}{sign}{body}{}",
            repeat(padding / 2),
            repeat(padding - padding / 2)
        ),
        '=' => format!("{sign}{}{body}", repeat(padding)),
        _ => format!("{}{sign}{body}", repeat(padding)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: TreewalkValue, spec: &str) -> String {
        let text = value.to_string();
        format_with_spec(&value, spec, &text).unwrap()
    }

    #[test]
    fn float_repr() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn string_repr() {
        assert_eq!(repr_str("plain"), "'plain'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("both ' and \""), "'both \\' and \"'");
        assert_eq!(repr_str("tab\there"), "'tab\\there'");
    }

    #[test]
    fn numeric_specs() {
        assert_eq!(fmt(TreewalkValue::Float(3.14159), ".2f"), "3.14");
        assert_eq!(fmt(TreewalkValue::Float(-3.14159), "8.3f"), "  -3.142");
        assert_eq!(fmt(TreewalkValue::Int(42), "05d"), "00042");
        assert_eq!(fmt(TreewalkValue::Int(-42), "05d"), "-0042");
        assert_eq!(fmt(TreewalkValue::Int(1234567), ","), "1,234,567");
        assert_eq!(fmt(TreewalkValue::Float(0.256), ".1%"), "25.6%");
        assert_eq!(fmt(TreewalkValue::Int(255), "#x"), "0xff");
        assert_eq!(fmt(TreewalkValue::Float(3.14159), ".3"), "3.14");
        assert_eq!(fmt(TreewalkValue::Int(7), "+d"), "+7");
    }

    #[test]
    fn alignment() {
        assert_eq!(fmt(TreewalkValue::str("ab"), ">5"), "   ab");
        assert_eq!(fmt(TreewalkValue::str("ab"), "<5"), "ab   ");
        assert_eq!(fmt(TreewalkValue::str("ab"), "*^6"), "**ab**");
        assert_eq!(fmt(TreewalkValue::Int(5), "3"), "  5");
        assert_eq!(fmt(TreewalkValue::str("abcdef"), ".3"), "abc");
    }

    #[test]
    fn invalid_spec() {
        let value = TreewalkValue::str("x");
        let e = format_with_spec(&value, "d", "x").unwrap_err();
        assert_eq!(e.message(), "'str' object cannot be interpreted as an integer");
        assert!(format_with_spec(&value, "5.q2", "x").is_err());
    }
}
