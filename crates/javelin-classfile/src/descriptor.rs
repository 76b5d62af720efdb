use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub(crate) fn from_tag(tag: u8) -> Option<BaseType> {
        Some(match tag {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    /// Internal name, e.g. `java/lang/String`.
    Object(String),
    Array(Box<FieldType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

/// Byte cursor shared by the descriptor and signature grammars.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub(crate) fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes up to (not including) the first byte in `stops`.
    pub(crate) fn take_until(&mut self, stops: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());
    let mut cursor = Cursor::new(desc);
    let ty = field_type(&mut cursor).ok_or_else(invalid)?;
    if !cursor.is_done() {
        return Err(invalid());
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());
    let mut cursor = Cursor::new(desc);
    if !cursor.eat(b'(') {
        return Err(invalid());
    }

    let mut params = Vec::new();
    while !cursor.eat(b')') {
        params.push(field_type(&mut cursor).ok_or_else(invalid)?);
    }

    let return_type = if cursor.eat(b'V') {
        ReturnType::Void
    } else {
        ReturnType::Type(field_type(&mut cursor).ok_or_else(invalid)?)
    };
    if !cursor.is_done() {
        return Err(invalid());
    }

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

fn field_type(cursor: &mut Cursor<'_>) -> Option<FieldType> {
    let tag = cursor.bump()?;
    if let Some(base) = BaseType::from_tag(tag) {
        return Some(FieldType::Base(base));
    }
    match tag {
        b'L' => {
            let name = cursor.take_until(b";");
            if name.is_empty() || !cursor.eat(b';') {
                return None;
            }
            Some(FieldType::Object(name.to_string()))
        }
        b'[' => Some(FieldType::Array(Box::new(field_type(cursor)?))),
        _ => None,
    }
}
