use std::fmt;

use crate::reader::tokens::TokenStream;

/// A single attachment value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentValue {
    Double(f64),
    Float(f32),
    Int(i32),
    UInt(u32),
    Bool(bool),
    Char(i8),
    Byte(u8),
    /// Fixed-size vector; its length is given by the value type.
    Vector(Vec<f64>),
}

impl fmt::Display for AttachmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentValue::Double(v) => write!(f, "{v}"),
            AttachmentValue::Float(v) => write!(f, "{v}"),
            AttachmentValue::Int(v) => write!(f, "{v}"),
            AttachmentValue::UInt(v) => write!(f, "{v}"),
            AttachmentValue::Bool(v) => write!(f, "{}", u8::from(*v)),
            AttachmentValue::Char(v) => write!(f, "{v}"),
            AttachmentValue::Byte(v) => write!(f, "{v}"),
            AttachmentValue::Vector(v) => {
                for (i, c) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
        }
    }
}

/// Reads one value of the given width from a token stream.
pub type ReadFn = fn(&mut TokenStream<'_>, usize) -> Option<AttachmentValue>;

/// A value type that attachments can be declared with.
#[derive(Clone)]
pub struct AttachmentType {
    name: String,
    width: usize,
    default: AttachmentValue,
    read: ReadFn,
}

impl fmt::Debug for AttachmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentType")
            .field("name", &self.name)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl AttachmentType {
    /// Creates a value type.
    ///
    /// `read` receives the token stream and `width`, the number of tokens
    /// one value occupies.
    #[must_use]
    pub fn new(name: impl Into<String>, width: usize, default: AttachmentValue, read: ReadFn) -> Self {
        Self {
            name: name.into(),
            width,
            default,
            read,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_value(&self) -> &AttachmentValue {
        &self.default
    }

    /// Reads one value, or `None` at end of stream or on a malformed token.
    pub fn read(&self, tokens: &mut TokenStream<'_>) -> Option<AttachmentValue> {
        (self.read)(tokens, self.width)
    }

    pub(crate) fn builtin() -> Vec<AttachmentType> {
        let mut types = vec![
            AttachmentType::new("double", 1, AttachmentValue::Double(0.0), |t, _| {
                t.next_f64().map(AttachmentValue::Double)
            }),
            AttachmentType::new("float", 1, AttachmentValue::Float(0.0), |t, _| {
                t.next_value().map(AttachmentValue::Float)
            }),
            AttachmentType::new("int", 1, AttachmentValue::Int(0), |t, _| {
                t.next_value().map(AttachmentValue::Int)
            }),
            AttachmentType::new("uint", 1, AttachmentValue::UInt(0), |t, _| {
                t.next_value().map(AttachmentValue::UInt)
            }),
            AttachmentType::new("bool", 1, AttachmentValue::Bool(false), |t, _| {
                t.next_value::<String>().and_then(|s| match s.as_str() {
                    "0" | "false" => Some(AttachmentValue::Bool(false)),
                    "1" | "true" => Some(AttachmentValue::Bool(true)),
                    _ => None,
                })
            }),
            AttachmentType::new("char", 1, AttachmentValue::Char(0), |t, _| {
                t.next_value().map(AttachmentValue::Char)
            }),
            AttachmentType::new("byte", 1, AttachmentValue::Byte(0), |t, _| {
                t.next_value().map(AttachmentValue::Byte)
            }),
        ];
        for width in 1..=4 {
            types.push(AttachmentType::new(
                format!("vector{width}"),
                width,
                AttachmentValue::Vector(vec![0.0; width]),
                read_vector,
            ));
        }
        types
    }
}

fn read_vector(tokens: &mut TokenStream<'_>, width: usize) -> Option<AttachmentValue> {
    let mut v = Vec::with_capacity(width);
    for _ in 0..width {
        v.push(tokens.next_f64()?);
    }
    Some(AttachmentValue::Vector(v))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn builtin(name: &str) -> AttachmentType {
        AttachmentType::builtin()
            .into_iter()
            .find(|t| t.name() == name)
            .unwrap()
    }

    #[test]
    fn vector_values_consume_their_width() {
        let ty = builtin("vector3");
        let mut tokens = TokenStream::new("1 2 3 4 5");
        assert_eq!(
            ty.read(&mut tokens),
            Some(AttachmentValue::Vector(vec![1.0, 2.0, 3.0]))
        );
        assert_eq!(ty.read(&mut tokens), None);
    }

    #[test]
    fn bool_accepts_digits_and_words() {
        let ty = builtin("bool");
        let mut tokens = TokenStream::new("1 false 2");
        assert_eq!(ty.read(&mut tokens), Some(AttachmentValue::Bool(true)));
        assert_eq!(ty.read(&mut tokens), Some(AttachmentValue::Bool(false)));
        assert_eq!(ty.read(&mut tokens), None);
    }

    #[test]
    fn display_matches_file_syntax() {
        assert_eq!(AttachmentValue::Bool(true).to_string(), "1");
        assert_eq!(AttachmentValue::Vector(vec![0.5, 2.0]).to_string(), "0.5 2");
    }
}
