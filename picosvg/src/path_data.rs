//! Tokenizing SVG path data.
//!
//! See <https://www.w3.org/TR/SVG11/paths.html#PathDataBNF>

use crate::error::Error;

/// One command letter and the numbers that follow it, as written.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommand {
    pub letter: char,
    pub args: Vec<f64>,
}

impl RawCommand {
    fn new(letter: char, args: &[f64]) -> RawCommand {
        RawCommand {
            letter,
            args: args.to_vec(),
        }
    }
}

/// How many numbers one instance of the command takes.
pub fn num_args(letter: char) -> Option<usize> {
    let n = match letter.to_ascii_lowercase() {
        'm' | 'l' | 't' => 2,
        'z' => 0,
        'h' | 'v' => 1,
        'c' => 6,
        's' | 'q' => 4,
        'a' => 7,
        _ => return None,
    };
    Some(n)
}

/// If a moveto is followed by multiple pairs of coordinates the subsequent
/// pairs are implicit linetos.
fn implicit_repeat(letter: char) -> char {
    match letter {
        'm' => 'l',
        'M' => 'L',
        _ => letter,
    }
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_ascii_whitespace()
}

/// Parse path data into commands.
///
/// When `exploded` a command followed by repeated groups of arguments is
/// reported once per group, e.g. "M1,1 2,2 3,3" yields M, L, L.
pub fn parse(path_data: &str, exploded: bool) -> Result<Vec<RawCommand>, Error> {
    let mut commands = Vec::new();
    let mut starts = path_data
        .char_indices()
        .filter(|(_, c)| num_args(*c).is_some())
        .map(|(i, _)| i)
        .peekable();
    while let Some(start) = starts.next() {
        let end = starts.peek().copied().unwrap_or(path_data.len());
        let segment = &path_data[start..end];
        let letter = segment.chars().next().unwrap_or_default();
        let Some(arity) = num_args(letter) else {
            continue;
        };
        let args = parse_args(letter, &segment[1..], segment)?;

        if arity == 0 {
            if !args.is_empty() {
                return Err(Error::PathArity {
                    command: letter,
                    expected: 0,
                    found: args.len(),
                });
            }
            commands.push(RawCommand::new(letter, &args));
            continue;
        }
        if args.len() % arity != 0 {
            return Err(Error::PathArity {
                command: letter,
                expected: arity,
                found: args.len(),
            });
        }
        if !exploded {
            commands.push(RawCommand::new(letter, &args));
            continue;
        }
        for (i, group) in args.chunks(arity).enumerate() {
            let letter = if i > 0 { implicit_repeat(letter) } else { letter };
            commands.push(RawCommand::new(letter, group));
        }
    }
    Ok(commands)
}

/// Reads the numbers following one command letter.
///
/// Accepts the loose grammar browsers do: numbers may run together when the
/// next one starts with a sign or a second decimal point, and arc flags may be
/// written as bare digits with no separator.
fn parse_args(letter: char, raw: &str, context: &str) -> Result<Vec<f64>, Error> {
    let is_arc = letter.eq_ignore_ascii_case(&'a');
    let bytes = raw.as_bytes();
    let mut args = Vec::new();
    let mut pos = 0;
    loop {
        while pos < bytes.len() && is_separator(bytes[pos] as char) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        let end = if is_arc && matches!(args.len() % 7, 3 | 4) {
            pos + raw[pos..].chars().next().map_or(0, char::len_utf8)
        } else {
            scan_number(bytes, pos)
        };
        let token = &raw[pos..end];
        let value = if token.is_empty() {
            None
        } else {
            token.parse::<f64>().ok()
        };
        let Some(value) = value else {
            let bad_end = raw[pos..]
                .find(is_separator)
                .map(|i| pos + i)
                .unwrap_or(raw.len());
            return Err(Error::ParsePath {
                token: raw[pos..bad_end].to_string(),
                context: context.to_string(),
            });
        };
        args.push(value);
        pos = end;
    }
    Ok(args)
}

/// The end of the number starting at `start`: `[+-]? digits? (. digits)? ([eE] [+-]? digits)?`
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut pos = start;
    if pos < bytes.len() && matches!(bytes[pos], b'+' | b'-') {
        pos += 1;
    }
    pos = digits(pos);
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos = digits(pos + 1);
    }
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            pos = exp_end;
        }
    }
    pos
}
