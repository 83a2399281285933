use std::fmt;

use audkyefo_core::parse_time;

/// Parse a segment length into seconds.
///
/// # Grammar
///
/// ```text
/// length    = clock | seconds | component { separators component } ;
/// clock     = minutes ":" two-digit-seconds ;
/// seconds   = number ;
/// component = number separators? unit ;
/// number    = digits [ "." digits ] ;
/// unit      = "ms" | "s" | "m" | "h" ;
/// separators = { whitespace | "_" } ;
/// ```
///
/// A bare number counts as seconds. Each unit may appear at most once and the
/// total has to be greater than zero.
pub fn parse_length(value: &str) -> Result<f64, LengthParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LengthParseError::Empty);
    }

    let seconds = if trimmed.contains(':') {
        parse_time(trimmed).map_err(|err| LengthParseError::Clock(err.to_string()))?
    } else if trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        let (value, consumed) = parse_number(trimmed, 0)?;
        if consumed != trimmed.len() {
            return Err(LengthParseError::UnexpectedChar {
                index: consumed,
                found: '.',
            });
        }
        value
    } else {
        parse_components(trimmed)?
    };

    if !seconds.is_finite() {
        return Err(LengthParseError::TooLarge);
    }
    if seconds <= 0.0 {
        return Err(LengthParseError::Zero);
    }
    Ok(seconds)
}

fn parse_components(input: &str) -> Result<f64, LengthParseError> {
    let bytes = input.as_bytes();
    let mut index = 0;
    let mut seen = [false; Unit::ALL.len()];
    let mut total = 0.0;

    while index < bytes.len() {
        skip_separators(bytes, &mut index);
        if index >= bytes.len() {
            break;
        }

        let (number, consumed) = parse_number(input, index)?;
        index += consumed;
        skip_separators(bytes, &mut index);

        let (unit, unit_len) = parse_unit(input, index)?;
        index += unit_len;
        if std::mem::replace(&mut seen[unit as usize], true) {
            return Err(LengthParseError::DuplicateUnit { unit });
        }

        total += number * unit.seconds();
    }

    Ok(total)
}

/// Returns the value of the number at `index` and how many bytes it spans.
fn parse_number(input: &str, index: usize) -> Result<(f64, usize), LengthParseError> {
    let rest = &input[index..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return Err(LengthParseError::ExpectedNumber {
            index,
            found: rest.chars().next(),
        });
    }

    let mut end = digits_end;
    if rest[end..].starts_with('.') {
        let fraction = rest[end + 1..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - end - 1);
        if fraction == 0 {
            return Err(LengthParseError::MissingFractionDigits { index: index + end });
        }
        end += 1 + fraction;
    }

    rest[..end]
        .parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| LengthParseError::TooLarge)
}

fn parse_unit(input: &str, index: usize) -> Result<(Unit, usize), LengthParseError> {
    let rest = &input[index..];
    let word_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    if word_len == 0 {
        return Err(LengthParseError::ExpectedUnit {
            index,
            found: rest.chars().next(),
        });
    }

    let word = &rest[..word_len];
    Unit::ALL
        .into_iter()
        .find(|unit| unit.symbol() == word)
        .map(|unit| (unit, word_len))
        .ok_or_else(|| LengthParseError::UnknownUnit {
            index,
            found: word.to_owned(),
        })
}

fn skip_separators(bytes: &[u8], index: &mut usize) {
    while *index < bytes.len() && (bytes[*index] == b'_' || bytes[*index].is_ascii_whitespace()) {
        *index += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl Unit {
    const ALL: [Unit; 4] = [Unit::Millisecond, Unit::Second, Unit::Minute, Unit::Hour];

    fn symbol(self) -> &'static str {
        match self {
            Unit::Millisecond => "ms",
            Unit::Second => "s",
            Unit::Minute => "m",
            Unit::Hour => "h",
        }
    }

    fn seconds(self) -> f64 {
        match self {
            Unit::Millisecond => 0.001,
            Unit::Second => 1.0,
            Unit::Minute => 60.0,
            Unit::Hour => 3_600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthParseError {
    Empty,
    Clock(String),
    ExpectedNumber { index: usize, found: Option<char> },
    ExpectedUnit { index: usize, found: Option<char> },
    UnknownUnit { index: usize, found: String },
    DuplicateUnit { unit: Unit },
    MissingFractionDigits { index: usize },
    UnexpectedChar { index: usize, found: char },
    Zero,
    TooLarge,
}

impl std::error::Error for LengthParseError {}

impl fmt::Display for LengthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthParseError::Empty => write!(f, "length cannot be empty"),
            LengthParseError::Clock(reason) => write!(f, "{reason}"),
            LengthParseError::ExpectedNumber { index, found } => match found {
                Some(ch) => write!(f, "expected a number at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a number at position {}", index + 1),
            },
            LengthParseError::ExpectedUnit { index, found } => match found {
                Some(ch) => write!(f, "expected a unit at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a unit at position {}", index + 1),
            },
            LengthParseError::UnknownUnit { index, found } => {
                write!(f, "unknown unit '{found}' at position {}", index + 1)
            }
            LengthParseError::DuplicateUnit { unit } => {
                write!(f, "unit '{}' appears more than once", unit.symbol())
            }
            LengthParseError::MissingFractionDigits { index } => write!(
                f,
                "expected digits after decimal point at position {}",
                index + 1
            ),
            LengthParseError::UnexpectedChar { index, found } => {
                write!(f, "unexpected character '{found}' at position {}", index + 1)
            }
            LengthParseError::Zero => write!(f, "length must be greater than zero"),
            LengthParseError::TooLarge => write!(f, "length is too large"),
        }
    }
}
