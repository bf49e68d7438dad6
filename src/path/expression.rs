use crate::error::PathSyntaxError;
use std::fmt;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A mapping key, or a sequence index when it is all digits and meets a sequence.
    Literal(String),
    /// Every key (or index) present in the container met at this point.
    Wildcard,
    /// Every element of the container met at this point, in order.
    EachElement,
}

impl Segment {
    fn from_key(key: String) -> Self {
        if key == "*" {
            Segment::Wildcard
        } else {
            Segment::Literal(key)
        }
    }

    /// Whether this segment can produce more than one continuation.
    pub fn is_fan_out(&self) -> bool {
        matches!(self, Segment::Wildcard | Segment::EachElement)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(key) => write!(f, "{}", key),
            Segment::Wildcard => write!(f, "*"),
            Segment::EachElement => write!(f, "[]"),
        }
    }
}

/// A parsed path expression such as `Parameters.Prompts[]` or `Parameters.Attributes.*`.
///
/// Syntax:
/// * `.` separates mapping keys
/// * `*` as a whole segment (or `[*]`) is a wildcard
/// * `[]` fans out over every element of whatever container is found
/// * `[n]` selects a single sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    text: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PathSyntaxError::Empty);
        }
        let empty_segment = |position| PathSyntaxError::EmptySegment {
            path: text.to_string(),
            position,
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut after_bracket = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !after_bracket {
                        return Err(empty_segment(segments.len()));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::from_key(std::mem::take(&mut key)));
                    }
                    if chars.peek().is_none() {
                        return Err(empty_segment(segments.len()));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::from_key(std::mem::take(&mut key)));
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(PathSyntaxError::UnclosedBracket {
                            path: text.to_string(),
                        });
                    }
                    let segment = match inner.trim() {
                        "" => Segment::EachElement,
                        "*" => Segment::Wildcard,
                        index if index.chars().all(|c| c.is_ascii_digit()) => {
                            Segment::Literal(index.to_string())
                        }
                        other => {
                            return Err(PathSyntaxError::InvalidIndex {
                                path: text.to_string(),
                                index: other.to_string(),
                            });
                        }
                    };
                    segments.push(segment);
                    if let Some(&next) = chars.peek() {
                        if next != '.' && next != '[' {
                            return Err(PathSyntaxError::TrailingCharacters {
                                path: text.to_string(),
                                found: next,
                            });
                        }
                    }
                    after_bracket = true;
                }
                other => key.push(other),
            }
        }
        if !key.is_empty() {
            segments.push(Segment::from_key(key));
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the expression contains a wildcard or element fan-out.
    pub fn has_fan_out(&self) -> bool {
        self.segments.iter().any(Segment::is_fan_out)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for PathExpr {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
