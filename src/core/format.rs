//! Runtime printf-style formatting
//!
//! Log templates are plain runtime strings, so they cannot go through
//! `format!`. [`sprintf`] expands `%`-verbs against a slice of [`Value`]s;
//! [`sprint`] concatenates values when no template is given.
//!
//! Supported verbs: `%v %s %d %x %X %o %b %f %F %e %E %g %t %q %c %%`, with
//! the `-`, `+`, `0` and space flags, a width and a `.precision`.
//! Mismatches are rendered inline rather than failing:
//! `%!d(string=abc)` for a wrong verb, `%!d(MISSING)` for a missing
//! argument and `%!(EXTRA int=1)` for unused ones. Widths or precisions
//! above [`MAX_WIDTH`] render `%!(BADWIDTH)` / `%!(BADPREC)` and are
//! ignored.

use super::value::Value;
use std::fmt::Write;

/// Largest width or precision accepted in a template.
pub const MAX_WIDTH: usize = 1_000_000;

/// Largest precision `core::fmt` accepts for floats.
const MAX_FLOAT_PRECISION: usize = u16::MAX as usize;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Expands `template` against `args`.
#[must_use]
pub fn sprintf(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    write_sprintf(&mut out, template, args);
    out
}

/// Expands `template` against `args`, appending to `out`.
pub fn write_sprintf(out: &mut String, template: &str, args: &[Value]) {
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                '0' => spec.zero = true,
                ' ' => spec.space = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = read_number(&mut chars);
        if spec.width.is_some_and(|w| w > MAX_WIDTH) {
            spec.width = None;
            out.push_str("%!(BADWIDTH)");
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(read_number(&mut chars).unwrap_or(0));
            if spec.precision.is_some_and(|p| p > MAX_WIDTH) {
                spec.precision = None;
                out.push_str("%!(BADPREC)");
            }
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        match args.get(next_arg) {
            Some(arg) => {
                next_arg += 1;
                format_one(out, verb, spec, arg);
            }
            None => {
                let _ = write!(out, "%!{}(MISSING)", verb);
            }
        }
    }

    if next_arg < args.len() {
        out.push_str("%!(EXTRA ");
        for (i, arg) in args[next_arg..].iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}={}", arg.type_name(), arg);
        }
        out.push(')');
    }
}

/// Concatenates `args`, adding a space between operands when neither side
/// is a string.
#[must_use]
pub fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    write_sprint(&mut out, args);
    out
}

pub fn write_sprint(out: &mut String, args: &[Value]) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_str() && !args[i - 1].is_str() {
            out.push(' ');
        }
        let _ = write!(out, "{}", arg);
    }
}

/// Renders a message the way the default marshaler does: template
/// expansion when `message` is non-empty, plain concatenation otherwise.
#[must_use]
pub fn render(message: &str, args: &[Value]) -> String {
    if message.is_empty() {
        sprint(args)
    } else {
        sprintf(message, args)
    }
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n
}

fn format_one(out: &mut String, verb: char, spec: Spec, arg: &Value) {
    let float_precision = spec.precision.map(|p| p.min(MAX_FLOAT_PRECISION));
    let rendered = match (verb, arg) {
        ('v', _) | ('s', _) => {
            let s = arg.to_string();
            match spec.precision {
                Some(p) if verb == 's' => s.chars().take(p).collect(),
                _ => s,
            }
        }
        ('d', Value::Int(i)) => signed(*i, spec),
        ('d', Value::Uint(u)) => unsigned(u.to_string(), spec),
        ('x', Value::Int(i)) => hex_signed(*i, false),
        ('X', Value::Int(i)) => hex_signed(*i, true),
        ('x', Value::Uint(u)) => format!("{:x}", u),
        ('X', Value::Uint(u)) => format!("{:X}", u),
        ('x', Value::Str(s)) => s.bytes().map(|b| format!("{:02x}", b)).collect(),
        ('X', Value::Str(s)) => s.bytes().map(|b| format!("{:02X}", b)).collect(),
        ('o', Value::Int(i)) if *i >= 0 => format!("{:o}", i),
        ('o', Value::Uint(u)) => format!("{:o}", u),
        ('b', Value::Int(i)) if *i >= 0 => format!("{:b}", i),
        ('b', Value::Uint(u)) => format!("{:b}", u),
        ('f' | 'F', Value::Float(f)) => float_with_sign(
            format!("{:.*}", float_precision.unwrap_or(6), f),
            *f,
            spec,
        ),
        ('e', Value::Float(f)) => float_with_sign(exponent(*f, float_precision, false), *f, spec),
        ('E', Value::Float(f)) => float_with_sign(exponent(*f, float_precision, true), *f, spec),
        ('g', Value::Float(f)) => float_with_sign(
            match float_precision {
                Some(p) => format!("{:.*}", p, f),
                None => f.to_string(),
            },
            *f,
            spec,
        ),
        ('t', Value::Bool(b)) => b.to_string(),
        ('q', Value::Str(s)) => format!("{:?}", s),
        ('q', Value::Char(c)) => format!("{:?}", c),
        ('c', Value::Char(c)) => c.to_string(),
        ('c', Value::Int(i)) => u32::try_from(*i)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
        ('c', Value::Uint(u)) => u32::try_from(*u)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
        (_, Value::Null) => {
            let _ = write!(out, "%!{}(<nil>)", verb);
            return;
        }
        _ => {
            let _ = write!(out, "%!{}({}={})", verb, arg.type_name(), arg);
            return;
        }
    };
    pad(out, &rendered, spec, is_numeric(arg));
}

fn signed(i: i64, spec: Spec) -> String {
    if i >= 0 && spec.plus {
        format!("+{}", i)
    } else if i >= 0 && spec.space {
        format!(" {}", i)
    } else {
        i.to_string()
    }
}

fn unsigned(s: String, spec: Spec) -> String {
    if spec.plus {
        format!("+{}", s)
    } else {
        s
    }
}

fn hex_signed(i: i64, upper: bool) -> String {
    let magnitude = i.unsigned_abs();
    let digits = if upper {
        format!("{:X}", magnitude)
    } else {
        format!("{:x}", magnitude)
    };
    if i < 0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

fn float_with_sign(s: String, f: f64, spec: Spec) -> String {
    if f.is_sign_positive() && spec.plus {
        format!("+{}", s)
    } else {
        s
    }
}

/// `1.234560e+03` style exponent notation.
fn exponent(f: f64, precision: Option<usize>, upper: bool) -> String {
    let precision = precision.unwrap_or(6).min(MAX_FLOAT_PRECISION);
    let s = format!("{:.*e}", precision, f);
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:0>2}", mantissa, e, sign, digits)
}

fn is_numeric(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Uint(_) | Value::Float(_))
}

fn pad(out: &mut String, s: &str, spec: Spec, numeric: bool) {
    let len = s.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        out.push_str(s);
        return;
    }
    let fill = width - len;
    if spec.minus {
        out.push_str(s);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && numeric {
        let (sign, rest) = match s.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (Some(c), &s[1..]),
            _ => (None, s),
        };
        if let Some(c) = sign {
            out.push(c);
        }
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(rest);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(s);
    }
}
