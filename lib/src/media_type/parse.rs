use crate::error::MediaTypeError;

/// RFC 6838 restricted-name characters, minus `.` and `+` which separate
/// subtype components and suffixes.
pub(crate) fn is_component_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_')
}

pub(crate) fn is_parameter_name_char(c: u8) -> bool {
    is_component_char(c) || matches!(c, b'.' | b'+')
}

/// RFC 2045 `token` characters: parameter values made only of these are
/// written without quotes.
pub(crate) fn is_token_char(c: u8) -> bool {
    c.is_ascii_graphic() && !matches!(c,
        b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\'
        | b'"' | b'/' | b'[' | b']' | b'?' | b'=')
}

pub(crate) fn validate_component(input: &str, what: &'static str, s: &str) -> Result<(), MediaTypeError> {
    if s.is_empty() {
        return Err(MediaTypeError::new(input, format!("empty {what}")));
    }

    if let Some(c) = s.bytes().find(|&c| !is_component_char(c)) {
        return Err(MediaTypeError::new(input, format!("illegal character {:?} in {what}", c as char)));
    }

    Ok(())
}

pub(crate) fn validate_parameter_name(input: &str, name: &str) -> Result<(), MediaTypeError> {
    let valid = name.bytes().next().map_or(false, |c| c.is_ascii_alphanumeric())
        && name.bytes().all(is_parameter_name_char);

    if !valid {
        return Err(MediaTypeError::new(input, format!("invalid parameter name {name:?}")));
    }

    Ok(())
}

pub(crate) fn validate_parameter_value(input: &str, value: &str) -> Result<(), MediaTypeError> {
    if value.bytes().any(|c| c.is_ascii_control() && c != b'\t') {
        return Err(MediaTypeError::new(input, "control character in parameter value"));
    }

    Ok(())
}

/// The pieces of a media type string, not yet validated or normalized.
#[derive(Debug, PartialEq)]
pub(crate) struct Parts<'a> {
    pub ty: &'a str,
    pub subtype: Vec<&'a str>,
    pub suffixes: Vec<&'a str>,
    pub parameters: Vec<(&'a str, String)>,
}

pub(crate) fn parse(input: &str) -> Result<Parts<'_>, MediaTypeError> {
    let trimmed = input.trim();
    let (essence, mut rest) = match trimmed.find(';') {
        Some(i) => (&trimmed[..i], &trimmed[i..]),
        None => (trimmed, ""),
    };

    let (ty, full_subtype) = essence.split_once('/')
        .ok_or_else(|| MediaTypeError::new(input, "missing `/` separator"))?;

    let mut plus = full_subtype.split('+');
    let subtype = plus.next().unwrap_or_default().split('.').collect();
    let suffixes = plus.collect();

    let mut parameters = vec![];
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        rest = rest.strip_prefix(';')
            .ok_or_else(|| MediaTypeError::new(input, "expected `;` before parameter"))?
            .trim_start();

        let eq = rest.find('=')
            .ok_or_else(|| MediaTypeError::new(input, "parameter is missing `=`"))?;

        let name = &rest[..eq];
        rest = &rest[eq + 1..];

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            let (value, remaining) = unquote(input, quoted)?;
            rest = remaining;
            value
        } else {
            let end = rest.find(|c: char| c == ';' || c.is_whitespace()).unwrap_or(rest.len());
            if end == 0 {
                return Err(MediaTypeError::new(input, format!("empty value for parameter {name:?}")));
            }

            let value = rest[..end].to_string();
            rest = &rest[end..];
            value
        };

        parameters.push((name, value));
    }

    Ok(Parts { ty, subtype, suffixes, parameters })
}

/// Reads a quoted string whose opening quote has been consumed. Returns the
/// unescaped value and the input following the closing quote.
fn unquote<'a>(input: &str, quoted: &'a str) -> Result<(String, &'a str), MediaTypeError> {
    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &quoted[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }

    Err(MediaTypeError::new(input, "unterminated quoted parameter value"))
}

/// Writes `value` as a parameter value, quoting and escaping only if needed.
pub(crate) fn quote_into(out: &mut String, value: &str) {
    if !value.is_empty() && value.bytes().all(is_token_char) {
        out.push_str(value);
        return;
    }

    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }

        out.push(c);
    }

    out.push('"');
}

const CHARSETS: &[(&str, &str)] = &[
    ("utf-8", "utf-8"),
    ("utf8", "utf-8"),
    ("unicode-1-1-utf-8", "utf-8"),
    ("us-ascii", "us-ascii"),
    ("ascii", "us-ascii"),
    ("iso-8859-1", "iso-8859-1"),
    ("iso8859-1", "iso-8859-1"),
    ("iso_8859-1", "iso-8859-1"),
    ("latin1", "iso-8859-1"),
    ("l1", "iso-8859-1"),
    ("utf-16", "utf-16"),
    ("utf16", "utf-16"),
    ("utf-16le", "utf-16le"),
    ("utf-16be", "utf-16be"),
    ("windows-1252", "windows-1252"),
    ("cp1252", "windows-1252"),
    ("shift_jis", "shift_jis"),
    ("sjis", "shift_jis"),
    ("euc-jp", "euc-jp"),
    ("euc-kr", "euc-kr"),
    ("ks_c_5601-1987", "euc-kr"),
    ("gbk", "gbk"),
    ("gb2312", "gbk"),
    ("big5", "big5"),
];

/// Canonical name for the charset `label`. Unknown labels are lowercased.
pub(crate) fn canonical_charset(label: &str) -> String {
    let label = label.trim().to_ascii_lowercase();
    CHARSETS.iter()
        .find(|(alias, _)| *alias == label)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(label)
}
