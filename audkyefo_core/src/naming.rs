//! Output file names rendered from naming patterns.
//!
//! A pattern is plain text with `{placeholder}` fields:
//!
//! | placeholder       | value                                          |
//! |-------------------|------------------------------------------------|
//! | `{original_name}` | input file name without its extension          |
//! | `{number}`        | 1-based segment index, accepts `{number:03d}`  |
//! | `{start_time}`    | segment start as `MM:SS`                       |
//! | `{end_time}`      | segment end as `MM:SS`                         |
//!
//! `{{` and `}}` produce literal braces.

use crate::error::SplitError;
use crate::time::format_time;

/// Pattern used when the caller does not provide one.
pub const DEFAULT_NAMING_PATTERN: &str = "{original_name}_part_{number:03d}";

const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

// Longest file name component accepted by common filesystems.
const MAX_NUMBER_WIDTH: usize = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placeholder {
    OriginalName,
    Number,
    StartTime,
    EndTime,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "original_name" => Some(Self::OriginalName),
            "number" => Some(Self::Number),
            "start_time" => Some(Self::StartTime),
            "end_time" => Some(Self::EndTime),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct NumberFormat {
    zero_pad: bool,
    width: usize,
}

impl NumberFormat {
    /// Accepts the integer subset of Python-style specs: `d`, `3`, `03`, `03d`.
    fn parse(spec: &str) -> Result<Self, SplitError> {
        let digits = spec.strip_suffix('d').unwrap_or(spec);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(template_error(format!(
                "unsupported format '{spec}' for {{number}}"
            )));
        }
        if digits.is_empty() {
            return Ok(Self::default());
        }

        let width = digits
            .parse::<usize>()
            .ok()
            .filter(|width| *width <= MAX_NUMBER_WIDTH)
            .ok_or_else(|| {
                template_error(format!(
                    "width of {{number}} must not exceed {MAX_NUMBER_WIDTH}"
                ))
            })?;

        Ok(Self {
            zero_pad: digits.starts_with('0'),
            width,
        })
    }

    fn apply(self, value: usize) -> String {
        if self.zero_pad {
            format!("{value:0width$}", width = self.width)
        } else {
            format!("{value:>width$}", width = self.width)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Field(Placeholder, NumberFormat),
}

fn template_error(reason: impl Into<String>) -> SplitError {
    SplitError::TemplateError(reason.into())
}

fn parse_pattern(pattern: &str) -> Result<Vec<Piece<'_>>, SplitError> {
    let mut pieces = Vec::new();
    let mut rest = pattern;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        if pos > 0 {
            pieces.push(Piece::Text(&rest[..pos]));
        }
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            pieces.push(Piece::Text("{"));
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            pieces.push(Piece::Text("}"));
            rest = after;
            continue;
        }
        if tail.starts_with('}') {
            return Err(template_error("single '}' encountered in pattern"));
        }

        let close = tail
            .find('}')
            .ok_or_else(|| template_error("unmatched '{' in pattern"))?;
        let body = &tail[1..close];
        if body.contains('{') {
            return Err(template_error("unmatched '{' in pattern"));
        }

        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (name, Some(spec)),
            None => (body, None),
        };
        let placeholder = Placeholder::from_name(name)
            .ok_or_else(|| template_error(format!("unknown placeholder '{{{name}}}'")))?;

        let format = match (placeholder, spec) {
            (_, None) | (_, Some("")) => NumberFormat::default(),
            (Placeholder::Number, Some(spec)) => NumberFormat::parse(spec)?,
            (_, Some(spec)) => {
                return Err(template_error(format!(
                    "format '{spec}' is only supported for {{number}}"
                )))
            }
        };

        pieces.push(Piece::Field(placeholder, format));
        rest = &tail[close + 1..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }

    Ok(pieces)
}

/// Drop the extension from a file name the way `song.mp3` becomes `song`.
///
/// Leading dots belong to the name, so `.hidden` is returned unchanged.
fn strip_extension(name: &str) -> &str {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => &name[..leading + pos],
        None => name,
    }
}

/// Render the file name of one segment.
///
/// `start_seconds` and `end_seconds` are formatted with
/// [`format_time`]; a missing value renders as an empty string. The result
/// always ends with `.{extension}`.
pub fn render(
    original_name: &str,
    index: usize,
    start_seconds: Option<f64>,
    end_seconds: Option<f64>,
    pattern: &str,
    extension: &str,
) -> Result<String, SplitError> {
    let original_name = strip_extension(original_name);
    let mut file_name = String::with_capacity(pattern.len() + original_name.len());

    for piece in parse_pattern(pattern)? {
        match piece {
            Piece::Text(text) => file_name.push_str(text),
            Piece::Field(Placeholder::OriginalName, _) => file_name.push_str(original_name),
            Piece::Field(Placeholder::Number, format) => file_name.push_str(&format.apply(index)),
            Piece::Field(Placeholder::StartTime, _) => {
                file_name.push_str(&start_seconds.map(format_time).unwrap_or_default())
            }
            Piece::Field(Placeholder::EndTime, _) => {
                file_name.push_str(&end_seconds.map(format_time).unwrap_or_default())
            }
        }
    }

    file_name.push('.');
    file_name.push_str(extension);
    Ok(file_name)
}

fn is_known_field(body: &str) -> bool {
    match body.split_once(':') {
        Some((name, _)) => name == "number",
        None => Placeholder::from_name(body).is_some(),
    }
}

/// Iterate over the text between each `{` and the next `}`, skipping `{{` escapes.
fn field_bodies(pattern: &str) -> impl Iterator<Item = &str> {
    let mut rest = pattern;
    std::iter::from_fn(move || loop {
        let tail = &rest[rest.find('{')?..];
        if let Some(after) = tail.strip_prefix("{{") {
            rest = after;
            continue;
        }
        let close = tail.find('}')?;
        rest = &tail[close + 1..];
        return Some(&tail[1..close]);
    })
}

/// Pattern text with every known placeholder removed.
fn literal_text(pattern: &str) -> String {
    let mut literal = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{{") {
            literal.push('{');
            rest = after;
            continue;
        }
        match tail.find('}') {
            Some(close) if is_known_field(&tail[1..close]) => rest = &tail[close + 1..],
            _ => {
                literal.push('{');
                rest = &tail[1..];
            }
        }
    }

    literal.push_str(rest);
    literal
}

/// Check that a naming pattern can produce distinct, legal file names.
///
/// The pattern must reference `{original_name}` and at least one of
/// `{number}`, `{start_time}` or `{end_time}`, and its literal text must not
/// contain characters that are reserved in file names.
pub fn validate_naming_pattern(pattern: &str) -> Result<(), SplitError> {
    if pattern.is_empty() {
        return Err(SplitError::EmptyPattern);
    }

    if !field_bodies(pattern).any(|body| body == "original_name") {
        return Err(SplitError::MissingOriginalNameVar);
    }

    let has_index_or_time = field_bodies(pattern).any(|body| {
        matches!(body, "start_time" | "end_time")
            || body.split(':').next() == Some("number")
    });
    if !has_index_or_time {
        return Err(SplitError::MissingIndexOrTimeVar);
    }

    if literal_text(pattern).contains(&RESERVED_CHARS[..]) {
        return Err(SplitError::InvalidCharacters);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_default_pattern() {
        let name = render("song.mp3", 7, None, None, DEFAULT_NAMING_PATTERN, "wav").unwrap();
        assert_eq!(name, "song_part_007.wav");
    }

    #[test]
    fn renders_times_and_missing_times() {
        let pattern = "{original_name} [{start_time} - {end_time}]";
        let name = render("talk", 1, Some(65.0), Some(125.4), pattern, "mp3").unwrap();
        assert_eq!(name, "talk [01:05 - 02:05].mp3");

        let name = render("talk", 1, None, None, pattern, "mp3").unwrap();
        assert_eq!(name, "talk [ - ].mp3");
    }

    #[test]
    fn renders_number_widths() {
        let render_number =
            |pattern: &str| render("a", 42, None, None, pattern, "wav").unwrap();
        assert_eq!(render_number("{original_name}{number}"), "a42.wav");
        assert_eq!(render_number("{original_name}{number:d}"), "a42.wav");
        assert_eq!(render_number("{original_name}{number:05d}"), "a00042.wav");
        assert_eq!(render_number("{original_name}{number:4}"), "a  42.wav");
        assert_eq!(render_number("{original_name}{number:1d}"), "a42.wav");
    }

    #[test]
    fn strips_only_the_last_extension() {
        assert_eq!(strip_extension("a.b.mp3"), "a.b");
        assert_eq!(strip_extension("plain"), "plain");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension(".hidden.wav"), ".hidden");
    }

    #[test]
    fn renders_escaped_braces() {
        let name = render("a", 1, None, None, "{{{original_name}}}_{number}", "wav").unwrap();
        assert_eq!(name, "{a}_1.wav");
    }

    #[test]
    fn rejects_broken_templates() {
        for pattern in [
            "{original_name}_{index}",
            "{original_name}_{number",
            "{original_name}_number}",
            "{original_name}_{number:x}",
            "{original_name}_{start_time:>5}",
            "{original_name}_{{number}",
        ] {
            assert!(
                matches!(
                    render("a", 1, None, None, pattern, "wav"),
                    Err(SplitError::TemplateError(_))
                ),
                "pattern {pattern:?} should not render"
            );
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let first = render("x.flac", 3, Some(1.0), Some(2.0), "{original_name}-{number}-{end_time}", "flac");
        let second = render("x.flac", 3, Some(1.0), Some(2.0), "{original_name}-{number}-{end_time}", "flac");
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn accepts_valid_patterns() {
        for pattern in [
            "{original_name}_part_{number:03d}",
            "{original_name}_{number}",
            "{original_name} {start_time}-{end_time}",
            "{end_time} {original_name}",
        ] {
            assert!(validate_naming_pattern(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn rejects_invalid_patterns() {
        assert!(matches!(validate_naming_pattern(""), Err(SplitError::EmptyPattern)));
        assert!(matches!(
            validate_naming_pattern("track_{number}"),
            Err(SplitError::MissingOriginalNameVar)
        ));
        assert!(matches!(
            validate_naming_pattern("{original_name}_copy"),
            Err(SplitError::MissingIndexOrTimeVar)
        ));
        for reserved in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            let pattern = format!("{{original_name}}{reserved}{{number}}");
            assert!(
                matches!(validate_naming_pattern(&pattern), Err(SplitError::InvalidCharacters)),
                "{pattern}"
            );
        }
    }

    #[test]
    fn escaped_braces_do_not_count_as_placeholders() {
        assert!(matches!(
            validate_naming_pattern("{{original_name}}_{number}"),
            Err(SplitError::MissingOriginalNameVar)
        ));
        assert!(matches!(
            validate_naming_pattern("{original_name}_{{number}}"),
            Err(SplitError::MissingIndexOrTimeVar)
        ));
        assert!(validate_naming_pattern("{{{original_name}}}_{number}").is_ok());
        assert_eq!(
            render("a.wav", 1, None, None, "{{{original_name}}}_{number}", "wav").unwrap(),
            "{a}_1.wav"
        );
    }

    #[test]
    fn number_format_colon_is_not_a_reserved_character() {
        assert!(validate_naming_pattern("{original_name}_{number:04d}").is_ok());
    }
}
