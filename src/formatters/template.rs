use crate::error::FormatError;
use crate::values::{float_repr, Value, Values};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

impl Align {
    fn from_char(c: char) -> Option<Align> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        }
    }
}

/// Largest width or precision a spec may ask for
pub const MAX_SPEC_WIDTH: usize = 4096;

/// Presentation type, the trailing letter of a spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecType {
    /// `s`
    Str,
    /// `d`
    Decimal,
    /// `f` / `F`
    Fixed,
    /// `g`
    General,
}

impl SpecType {
    fn from_char(c: char) -> Option<SpecType> {
        match c {
            's' => Some(SpecType::Str),
            'd' => Some(SpecType::Decimal),
            'f' | 'F' => Some(SpecType::Fixed),
            'g' => Some(SpecType::General),
            _ => None,
        }
    }
}

/// `[[fill]align][width][.precision][type]`
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub width: usize,
    pub precision: Option<usize>,
    pub kind: Option<SpecType>,
}

impl FormatSpec {
    fn parse(field: &str, spec: &str) -> Result<FormatSpec, FormatError> {
        let invalid = || FormatError::InvalidSpec {
            field: field.to_string(),
            spec: spec.to_string(),
        };
        let number = |digits: &[char]| -> Result<usize, FormatError> {
            let n: usize = digits.iter().collect::<String>().parse().map_err(|_| invalid())?;
            if n > MAX_SPEC_WIDTH {
                return Err(invalid());
            }
            Ok(n)
        };

        let chars: Vec<char> = spec.chars().collect();
        let mut pos = 0;
        let mut fill = ' ';
        let mut align = None;

        if let Some(a) = chars.get(1).and_then(|&c| Align::from_char(c)) {
            fill = chars[0];
            align = Some(a);
            pos = 2;
        } else if let Some(a) = chars.first().and_then(|&c| Align::from_char(c)) {
            align = Some(a);
            pos = 1;
        }

        let width_start = pos;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
        let width = if pos > width_start {
            number(&chars[width_start..pos])?
        } else {
            0
        };

        let mut precision = None;
        if pos < chars.len() && chars[pos] == '.' {
            pos += 1;
            let precision_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == precision_start {
                return Err(invalid());
            }
            precision = Some(number(&chars[precision_start..pos])?);
        }

        let mut kind = None;
        if pos < chars.len() {
            kind = Some(SpecType::from_char(chars[pos]).ok_or_else(invalid)?);
            pos += 1;
        }

        if pos != chars.len() || (kind == Some(SpecType::Decimal) && precision.is_some()) {
            return Err(invalid());
        }

        Ok(FormatSpec {
            fill,
            align,
            width,
            precision,
            kind,
        })
    }

    fn apply(&self, field: &str, raw_spec: &str, value: &Value) -> Result<String, FormatError> {
        let invalid = || FormatError::InvalidSpec {
            field: field.to_string(),
            spec: raw_spec.to_string(),
        };

        let (body, default_align) = match (value, self.kind) {
            (Value::Text(s), None | Some(SpecType::Str)) => {
                let body = match self.precision {
                    Some(p) => s.chars().take(p).collect(),
                    None => s.clone(),
                };
                (body, Align::Left)
            }
            (Value::Int(n), None | Some(SpecType::Decimal)) => {
                if self.precision.is_some() {
                    return Err(invalid());
                }
                (n.to_string(), Align::Right)
            }
            (Value::Int(n), Some(kind @ (SpecType::Fixed | SpecType::General))) => {
                (self.render_float(*n as f64, Some(kind)), Align::Right)
            }
            (Value::Float(x), None | Some(SpecType::Fixed | SpecType::General)) => {
                (self.render_float(*x, self.kind), Align::Right)
            }
            _ => return Err(invalid()),
        };

        let len = body.chars().count();
        if len >= self.width {
            return Ok(body);
        }

        let padding = self.width - len;
        let (left, right) = match self.align.unwrap_or(default_align) {
            Align::Left => (0, padding),
            Align::Right => (padding, 0),
            Align::Center => (padding / 2, padding - padding / 2),
        };

        let mut out = String::with_capacity(body.len() + padding);
        out.extend(std::iter::repeat(self.fill).take(left));
        out.push_str(&body);
        out.extend(std::iter::repeat(self.fill).take(right));
        Ok(out)
    }

    fn render_float(&self, x: f64, kind: Option<SpecType>) -> String {
        if x.is_nan() {
            return "nan".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "inf" } else { "-inf" }.to_string();
        }
        match (kind, self.precision) {
            (Some(SpecType::Fixed), p) => format!("{:.*}", p.unwrap_or(6), x),
            (Some(SpecType::General), p) => general_float(x, p.unwrap_or(6), false),
            (_, Some(p)) => general_float(x, p, true),
            (_, None) => float_repr(x),
        }
    }
}

/// Python's `g` formatting with `precision` significant digits. With
/// `keep_point` (a spec without a type) fixed notation keeps at least one
/// fractional digit and switches to exponent form one digit earlier.
fn general_float(x: f64, precision: usize, keep_point: bool) -> String {
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, x);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i64>().unwrap_or(0)),
        None => (scientific.clone(), 0),
    };

    let limit = if keep_point { precision as i64 - 1 } else { precision as i64 };
    if exponent < -4 || exponent >= limit {
        let mantissa = strip_fraction_zeros(&mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
    let fixed = strip_fraction_zeros(&format!("{:.*}", decimals, x));
    if keep_point && !fixed.contains('.') {
        format!("{}.0", fixed)
    } else {
        fixed
    }
}

fn strip_fraction_zeros(number: &str) -> String {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        number.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field {
        name: String,
        spec: Option<(String, FormatSpec)>,
    },
}

/// A parsed line template: literal text with `{name}` or `{name:spec}`
/// placeholders, `{{` and `}}` for literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }

                    let mut field = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(FormatError::Malformed {
                                    position: inner_pos,
                                    message: "unexpected '{' in field name".to_string(),
                                });
                            }
                            _ => field.push(inner),
                        }
                    }
                    if !closed {
                        return Err(FormatError::Malformed {
                            position: pos,
                            message: "expected '}' before end of template".to_string(),
                        });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_field(pos, &field)?);
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(FormatError::Malformed {
                            position: pos,
                            message: "single '}' encountered".to_string(),
                        });
                    }
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    fn parse_field(position: usize, field: &str) -> Result<Segment, FormatError> {
        let (name, spec) = match field.split_once(':') {
            Some((name, spec)) => (name, Some(spec)),
            None => (field, None),
        };

        if name.is_empty() {
            return Err(FormatError::Malformed {
                position,
                message: "empty field name".to_string(),
            });
        }

        let spec = match spec {
            Some(raw) if !raw.is_empty() => Some((raw.to_string(), FormatSpec::parse(name, raw)?)),
            _ => None,
        };

        Ok(Segment::Field {
            name: name.to_string(),
            spec,
        })
    }

    /// Template printing just the named stream's line
    pub fn default_for(stream: &str) -> Template {
        Template {
            source: format!("{{{}}}\n", stream),
            segments: vec![
                Segment::Field {
                    name: stream.to_string(),
                    spec: None,
                },
                Segment::Literal("\n".to_string()),
            ],
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names referenced by placeholders, in template order
    pub fn fields(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn render(&self, values: &Values) -> Result<String, FormatError> {
        let mut out = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, spec } => {
                    let value = values.get(name).ok_or_else(|| FormatError::UnknownField {
                        field: name.clone(),
                    })?;
                    match spec {
                        Some((raw, spec)) => out.push_str(&spec.apply(name, raw, value)?),
                        None => out.push_str(&value.to_string()),
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Expand `\n`, `\r`, `\t` and `\\` typed on a command line.
/// Any other backslash sequence is kept as written.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }
    out
}
