//! Canonical value text: the single renderer behind every oracle line.
//!
//! # Rendering rules
//!
//! 1. `byte`, `short`, `int`: decimal. `long`: decimal plus `n`.
//! 2. `boolean`: `true` / `false`.
//! 3. `double`: the reference `Double.toString` layout (`NaN`, `Infinity`,
//!    `-0.0`, `1000000.0`, `4.2E71`). `float` is widened to `double` first,
//!    so width is not visible in the text.
//! 4. `char`: single-quoted, string: double-quoted, both escaped per code
//!    unit (see [`escape_unit`]).
//! 5. Records: `{"label":value,...,}` in declaration order, trailing
//!    separator included. `null` for null fields.
//!
//! Rendering recurses without a cycle guard; cyclic records must never reach
//! this module.

use std::fmt::Write;

use unicode_general_category::{get_general_category, GeneralCategory};

use jser_wire::primitive::Primitive;

use crate::value::{Aggregate, Datum};

/// Render `datum`.
#[must_use]
pub fn render(datum: &Datum) -> String {
    let mut out = String::new();
    write_datum(&mut out, datum);
    out
}

/// Render one primitive.
#[must_use]
pub fn render_primitive(p: &Primitive) -> String {
    let mut out = String::new();
    write_primitive(&mut out, p);
    out
}

/// Render a UTF-16 string, quoted and escaped.
#[must_use]
pub fn render_string(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len() + 2);
    write_string(&mut out, units);
    out
}

fn write_datum(out: &mut String, datum: &Datum) {
    match datum {
        Datum::Prim(p) => write_primitive(out, p),
        Datum::Str(s) => write_string(out, s.units()),
        Datum::Aggregate(a) => write_aggregate(out, a),
        Datum::Null => out.push_str("null"),
    }
}

fn write_primitive(out: &mut String, p: &Primitive) {
    match *p {
        Primitive::Byte(v) => {
            let _ = write!(out, "{v}");
        }
        Primitive::Char(v) => {
            out.push('\'');
            escape_unit(v, out);
            out.push('\'');
        }
        Primitive::Double(v) => out.push_str(&render_double(v)),
        Primitive::Float(v) => out.push_str(&render_double(f64::from(v))),
        Primitive::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Primitive::Long(v) => {
            let _ = write!(out, "{v}n");
        }
        Primitive::Short(v) => {
            let _ = write!(out, "{v}");
        }
        Primitive::Boolean(v) => out.push_str(if v { "true" } else { "false" }),
    }
}

fn write_string(out: &mut String, units: &[u16]) {
    out.push('"');
    for &unit in units {
        escape_unit(unit, out);
    }
    out.push('"');
}

fn write_aggregate(out: &mut String, aggregate: &Aggregate) {
    out.push('{');
    for (label, datum) in &aggregate.fields {
        let units: Vec<u16> = label.encode_utf16().collect();
        write_string(out, &units);
        out.push(':');
        write_datum(out, datum);
        out.push(',');
    }
    out.push('}');
}

/// Append the escaped form of one UTF-16 code unit.
///
/// Structural characters get their two-character escape. Space and units
/// whose general category is a letter, mark, number, punctuation or symbol
/// are literal. Everything else, surrogate halves included, becomes
/// `\uXXXX` with lower-case hex.
pub fn escape_unit(unit: u16, out: &mut String) {
    let escaped = match unit {
        0x22 => "\\\"",
        0x27 => "\\'",
        0x08 => "\\b",
        0x0C => "\\f",
        0x0A => "\\n",
        0x0D => "\\r",
        0x09 => "\\t",
        0x5C => "\\\\",
        _ => "",
    };
    if !escaped.is_empty() {
        out.push_str(escaped);
        return;
    }
    match literal_char(unit) {
        Some(c) => out.push(c),
        None => {
            let _ = write!(out, "\\u{unit:04x}");
        }
    }
}

fn literal_char(unit: u16) -> Option<char> {
    let c = char::from_u32(u32::from(unit))?;
    if c == ' ' {
        return Some(c);
    }
    let printable = matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
            | GeneralCategory::DecimalNumber
            | GeneralCategory::LetterNumber
            | GeneralCategory::OtherNumber
            | GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
            | GeneralCategory::MathSymbol
            | GeneralCategory::CurrencySymbol
            | GeneralCategory::ModifierSymbol
            | GeneralCategory::OtherSymbol
    );
    printable.then_some(c)
}

/// `Double.toString` layout with shortest round-trip digits, widened to two
/// digits where a two-digit decimal is closer.
#[must_use]
pub fn render_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest digits as `d[.ddd]e<exp>`.
    let abs = v.abs();
    let sci = format!("{abs:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let mut exp = exp;
    if digits.len() == 1 {
        if let Some((closer, closer_exp)) = closest_two_digits(abs) {
            digits = closer;
            exp = closer_exp;
        }
    }
    let sign = if v < 0.0 { "-" } else { "" };

    if (1e-3..1e7).contains(&abs) {
        format!("{sign}{}", plain_notation(&digits, exp))
    } else {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        format!("{sign}{first}.{rest}E{exp}")
    }
}

/// The two-digit decimal nearest `abs`, when it still reads back as `abs`.
///
/// A one-digit shortest form is not always the closest short form: the
/// smallest subnormal is `4.9E-324`, not `5.0E-324`. Trailing zeros are
/// dropped, so exact one-digit values come back unchanged.
fn closest_two_digits(abs: f64) -> Option<(String, i32)> {
    let sci = format!("{abs:.1e}");
    if sci.parse::<f64>().ok()?.to_bits() != abs.to_bits() {
        return None;
    }
    let (mantissa, exp) = sci.split_once('e')?;
    let exp = exp.parse::<i32>().ok()?;
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_end_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    Some((digits.to_string(), exp))
}

/// `0.d1d2... x 10^(exp+1)` written without an exponent, with at least one
/// fractional digit.
fn plain_notation(digits: &str, exp: i32) -> String {
    if exp < 0 {
        let zeros = usize::try_from(-exp - 1).unwrap_or_default();
        return format!("0.{}{digits}", "0".repeat(zeros));
    }
    let int_len = usize::try_from(exp + 1).unwrap_or_default();
    if digits.len() <= int_len {
        format!("{digits}{}.0", "0".repeat(int_len - digits.len()))
    } else {
        let (int, frac) = digits.split_at(int_len);
        format!("{int}.{frac}")
    }
}
