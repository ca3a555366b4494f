use crate::error::PanelError;
use crate::panel::IndicatorFormat;

const BUTTON_LABEL_MAX: usize = 8;
const DEFAULT_PRECISION: usize = 6;
/// Widest width or precision a format may ask for.
const MAX_FIELD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    Integer,
    Unsigned,
    HexLower,
    HexUpper,
    Octal,
    Fixed {
        width: usize,
        precision: Option<usize>,
    },
    Exponent {
        width: usize,
        precision: Option<usize>,
        upper: bool,
    },
    General {
        width: usize,
        precision: Option<usize>,
        upper: bool,
    },
}

impl NumericFormat {
    /// Parses a printf-style conversion such as `%i`, `%#x` or `%8.3f`.
    /// Integer conversions truncate the value toward zero.
    pub fn parse(spec: &str) -> Result<Self, PanelError> {
        let wrong = || PanelError::WrongFormatType {
            format: spec.to_string(),
        };
        let spec = spec.trim();
        match spec {
            "%i" | "%d" => return Ok(NumericFormat::Integer),
            "%u" => return Ok(NumericFormat::Unsigned),
            "%#x" => return Ok(NumericFormat::HexLower),
            "%#X" => return Ok(NumericFormat::HexUpper),
            "%#o" => return Ok(NumericFormat::Octal),
            _ => {}
        }

        let body = spec.strip_prefix('%').ok_or_else(wrong)?;
        let mut chars = body.chars();
        let conversion = chars.next_back().ok_or_else(wrong)?;
        let modifiers = chars.as_str();
        let modifiers = modifiers.strip_suffix('l').unwrap_or(modifiers);
        let (width, precision) = match modifiers.find(|c: char| c == '.' || c == ',') {
            Some(pos) => (&modifiers[..pos], Some(&modifiers[pos + 1..])),
            None => (modifiers, None),
        };
        let width = parse_digits(width).ok_or_else(wrong)?.unwrap_or(0);
        let precision = match precision {
            Some(digits) => Some(parse_digits(digits).ok_or_else(wrong)?.unwrap_or(0)),
            None => None,
        };
        if width > MAX_FIELD || precision.is_some_and(|p| p > MAX_FIELD) {
            return Err(wrong());
        }

        match conversion {
            'f' | 'F' => Ok(NumericFormat::Fixed { width, precision }),
            'e' | 'E' => Ok(NumericFormat::Exponent {
                width,
                precision,
                upper: conversion == 'E',
            }),
            'g' | 'G' => Ok(NumericFormat::General {
                width,
                precision,
                upper: conversion == 'G',
            }),
            _ => Err(wrong()),
        }
    }

    pub fn format(&self, value: f64) -> String {
        match *self {
            NumericFormat::Integer => (value as i32).to_string(),
            NumericFormat::Unsigned => (value as i64 as u32).to_string(),
            NumericFormat::HexLower => match value as i32 {
                0 => "0".to_string(),
                v => format!("0x{v:x}"),
            },
            NumericFormat::HexUpper => match value as i32 {
                0 => "0".to_string(),
                v => format!("0X{v:X}"),
            },
            NumericFormat::Octal => match value as i32 {
                0 => "0".to_string(),
                v => format!("0{v:o}"),
            },
            NumericFormat::Fixed { width, precision } => pad(
                fixed(value, precision.unwrap_or(DEFAULT_PRECISION)),
                width,
            ),
            NumericFormat::Exponent {
                width,
                precision,
                upper,
            } => pad(
                exponent(value, precision.unwrap_or(DEFAULT_PRECISION), upper),
                width,
            ),
            NumericFormat::General {
                width,
                precision,
                upper,
            } => pad(
                general(value, precision.unwrap_or(DEFAULT_PRECISION), upper),
                width,
            ),
        }
    }

    /// Display mode and digits the panel indicator uses for this format.
    pub fn indicator_format(&self) -> (IndicatorFormat, Option<usize>) {
        match *self {
            NumericFormat::Fixed { precision, .. } => (IndicatorFormat::FloatingPoint, precision),
            NumericFormat::Exponent { precision, .. } => (IndicatorFormat::Scientific, precision),
            _ => (IndicatorFormat::Decimal, None),
        }
    }
}

/// `Ok(None)` for an empty field, `None` when the field is not all digits.
fn parse_digits(field: &str) -> Option<Option<usize>> {
    if field.is_empty() {
        return Some(None);
    }
    if !field.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    field.parse().ok().map(Some)
}

fn pad(text: String, width: usize) -> String {
    format!("{text:>width$}")
}

fn non_finite(value: f64, upper: bool) -> String {
    let text = if value.is_nan() {
        "nan"
    } else if value.is_sign_negative() {
        "-inf"
    } else {
        "inf"
    };
    if upper {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

fn fixed(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value, false);
    }
    format!("{value:.precision$}")
}

fn exponent(value: f64, precision: usize, upper: bool) -> String {
    if !value.is_finite() {
        return non_finite(value, upper);
    }
    let text = format!("{value:.precision$e}");
    let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let marker = if upper { 'E' } else { 'e' };
    format!("{mantissa}{marker}{sign}{:02}", exp.abs())
}

fn general(value: f64, precision: usize, upper: bool) -> String {
    if !value.is_finite() {
        return non_finite(value, upper);
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let exp: i32 = scientific
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);
    if exp < -4 || exp >= precision as i32 {
        let text = exponent(value, precision - 1, upper);
        let marker = if upper { 'E' } else { 'e' };
        match text.split_once(marker) {
            Some((mantissa, tail)) => format!("{}{marker}{tail}", strip_zeros(mantissa)),
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&fixed(value, decimals)).to_string()
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Button captions longer than eight characters keep nine and get an ellipsis.
pub fn button_label(text: &str) -> String {
    if text.chars().count() > BUTTON_LABEL_MAX {
        let mut label: String = text.chars().take(BUTTON_LABEL_MAX + 1).collect();
        label.push_str("...");
        label
    } else {
        text.to_string()
    }
}

pub fn limit_label(prefix: &str, format: &NumericFormat, value: f64, unit: &str) -> String {
    format!("{prefix}: {} {unit}", format.format(value))
}
