//! Turns one raw country record into a [`CleanedRecord`], or explains why it
//! was dropped.
//!
//! Nothing in here does I/O or returns an error: every problem with a record
//! ends up as a [`SkipReason`].

use crate::domain::model::{CleanedRecord, RawRecord, SkipReason};
use serde_json::{Map, Value};

const DEFAULT_REGION: &str = "Unknown";

/// The `name` field arrives either as `{"common": ..., "official": ...}` or as a plain value.
#[derive(Debug)]
enum NameField<'a> {
    Nested(&'a Map<String, Value>),
    Plain(&'a Value),
    Missing,
}

impl<'a> NameField<'a> {
    fn resolve(record: &'a Map<String, Value>) -> Self {
        match record.get("name") {
            Some(Value::Object(inner)) => NameField::Nested(inner),
            Some(Value::Null) | None => NameField::Missing,
            Some(other) => NameField::Plain(other),
        }
    }

    fn text(&self) -> Result<String, SkipReason> {
        match self {
            NameField::Nested(inner) => match inner.get("common") {
                Some(Value::String(common)) => Ok(common.clone()),
                Some(Value::Null) | None => Ok(String::new()),
                Some(other) => Err(malformed(format!(
                    "name.common must be a string, got {}",
                    type_name(other)
                ))),
            },
            NameField::Plain(value) => coerce_to_string(value)
                .ok_or_else(|| malformed(format!("name cannot be a {}", type_name(value)))),
            NameField::Missing => Ok(String::new()),
        }
    }
}

pub fn normalize(raw: &RawRecord) -> Result<CleanedRecord, SkipReason> {
    let record = raw
        .as_object()
        .ok_or_else(|| malformed(format!("expected an object, got {}", type_name(raw))))?;

    let country = title_case(NameField::resolve(record).text()?.trim());
    if country.is_empty() {
        return Err(SkipReason::EmptyName);
    }

    let population = population(record)?;
    if population == 0 {
        return Err(SkipReason::NonPositivePopulation);
    }

    Ok(CleanedRecord {
        country,
        capital: capital(record)?,
        population,
        area: area(record),
        region: region(record)?,
    })
}

/// Non-numeric or missing populations count as zero; only fractional or
/// out-of-range numbers are treated as malformed.
fn population(record: &Map<String, Value>) -> Result<u64, SkipReason> {
    let Some(Value::Number(number)) = record.get("population") else {
        return Ok(0);
    };

    if let Some(value) = number.as_u64() {
        return Ok(value);
    }
    if number.as_i64().is_some() {
        // 只有負數會走到這裡
        return Ok(0);
    }

    let value = number.as_f64().unwrap_or(0.0);
    if value <= 0.0 {
        Ok(0)
    } else if value.fract() != 0.0 {
        Err(malformed(format!("population {} is not a whole number", value)))
    } else if value >= u64::MAX as f64 {
        Err(malformed(format!("population {} is out of range", value)))
    } else {
        Ok(value as u64)
    }
}

fn region(record: &Map<String, Value>) -> Result<String, SkipReason> {
    match record.get("region") {
        Some(Value::String(region)) => {
            let region = title_case(region.trim());
            Ok(if region.is_empty() {
                DEFAULT_REGION.to_string()
            } else {
                region
            })
        }
        Some(Value::Null) | None => Ok(DEFAULT_REGION.to_string()),
        Some(other) => Err(malformed(format!(
            "region must be a string, got {}",
            type_name(other)
        ))),
    }
}

/// Area is passed through untouched when positive; zero, negative or
/// non-numeric values become `N/A`.
fn area(record: &Map<String, Value>) -> Option<serde_json::Number> {
    match record.get("area") {
        Some(Value::Number(number)) if number.as_f64().is_some_and(|v| v > 0.0) => {
            Some(number.clone())
        }
        _ => None,
    }
}

fn capital(record: &Map<String, Value>) -> Result<Option<String>, SkipReason> {
    let first = match record.get("capital") {
        Some(Value::Array(capitals)) => capitals.first(),
        Some(value @ Value::String(_)) => Some(value),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(malformed(format!(
                "capital must be a list, got {}",
                type_name(other)
            )))
        }
    };

    match first {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(Some(name.trim().to_string())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(malformed(format!(
            "capital entries must be strings, got {}",
            type_name(other)
        ))),
    }
}

/// Title-cases the way the upstream tooling does: a letter is title-cased
/// when the character before it is not cased, lower-cased otherwise.
pub fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_cased = false;

    for ch in input.chars() {
        if previous_cased {
            output.extend(ch.to_lowercase());
        } else {
            push_titlecase(&mut output, ch);
        }
        previous_cased = is_cased(ch);
    }

    output
}

/// Unicode `Cased`: lowercase, uppercase or titlecase (`Lt`).
fn is_cased(ch: char) -> bool {
    ch.is_lowercase() || ch.is_uppercase() || is_titlecase_letter(ch)
}

fn is_titlecase_letter(ch: char) -> bool {
    matches!(
        ch,
        '\u{01C5}'
            | '\u{01C8}'
            | '\u{01CB}'
            | '\u{01F2}'
            | '\u{1F88}'..='\u{1F8F}'
            | '\u{1F98}'..='\u{1F9F}'
            | '\u{1FA8}'..='\u{1FAF}'
            | '\u{1FBC}'
            | '\u{1FCC}'
            | '\u{1FFC}'
    )
}

/// Titlecase mapping. It only differs from the uppercase mapping for
/// digraphs, ligatures, Georgian and Greek letters with iota subscript.
fn push_titlecase(output: &mut String, ch: char) {
    let mapped: &str = match ch {
        // ǅ ǈ ǋ ǲ
        '\u{01C4}'..='\u{01C6}' => "\u{01C5}",
        '\u{01C7}'..='\u{01C9}' => "\u{01C8}",
        '\u{01CA}'..='\u{01CC}' => "\u{01CB}",
        '\u{01F1}'..='\u{01F3}' => "\u{01F2}",
        'ß' => "Ss",
        'ﬀ' => "Ff",
        'ﬁ' => "Fi",
        'ﬂ' => "Fl",
        'ﬃ' => "Ffi",
        'ﬄ' => "Ffl",
        'ﬅ' | 'ﬆ' => "St",
        'և' => "Եւ",
        'ﬓ' => "Մն",
        'ﬔ' => "Մե",
        'ﬕ' => "Մի",
        'ﬖ' => "Վն",
        'ﬗ' => "Մխ",
        '\u{1FB2}' => "\u{1FBA}\u{0345}",
        '\u{1FB4}' => "\u{0386}\u{0345}",
        '\u{1FB7}' => "\u{0391}\u{0342}\u{0345}",
        '\u{1FC2}' => "\u{1FCA}\u{0345}",
        '\u{1FC4}' => "\u{0389}\u{0345}",
        '\u{1FC7}' => "\u{0397}\u{0342}\u{0345}",
        '\u{1FF2}' => "\u{1FFA}\u{0345}",
        '\u{1FF4}' => "\u{038F}\u{0345}",
        '\u{1FF7}' => "\u{03A9}\u{0342}\u{0345}",
        _ => {
            if let Some(titled) = simple_titlecase(ch) {
                output.push(titled);
            } else {
                output.extend(ch.to_uppercase());
            }
            return;
        }
    };
    output.push_str(mapped);
}

fn simple_titlecase(ch: char) -> Option<char> {
    let code = ch as u32;
    match code {
        // Georgian Mkhedruli has an uppercase (Mtavruli) but titlecases to itself
        0x10D0..=0x10FA | 0x10FD..=0x10FF => Some(ch),
        // Greek with ypogegrammeni: lower and title forms map to the prosgegrammeni form
        0x1F80..=0x1F87 | 0x1F90..=0x1F97 | 0x1FA0..=0x1FA7 => char::from_u32(code + 8),
        0x1F88..=0x1F8F | 0x1F98..=0x1F9F | 0x1FA8..=0x1FAF => Some(ch),
        0x1FB3 | 0x1FBC => Some('\u{1FBC}'),
        0x1FC3 | 0x1FCC => Some('\u{1FCC}'),
        0x1FF3 | 0x1FFC => Some('\u{1FFC}'),
        _ => None,
    }
}

fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn malformed(detail: String) -> SkipReason {
    SkipReason::MalformedRecord(detail)
}
