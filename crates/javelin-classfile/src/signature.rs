//! Generic signature grammar (`Signature` attribute payloads).

use crate::descriptor::{BaseType, Cursor};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Base(BaseType),
    Class(ClassTypeSignature),
    TypeVariable(String),
    Array(Box<TypeSignature>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Slash-separated package, empty for the default package.
    pub package: String,
    /// Outermost class first.
    pub segments: Vec<SimpleClassTypeSignature>,
}

impl ClassTypeSignature {
    /// Internal name of the erased class, e.g. `java/util/Map$Entry`.
    pub fn internal_name(&self) -> String {
        let mut out = self.package.clone();
        if !out.is_empty() {
            out.push('/');
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('$');
            }
            out.push_str(&segment.name);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Any,
    Extends(TypeSignature),
    Super(TypeSignature),
    Exact(TypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<TypeSignature>,
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    parse_all(sig, |c| {
        let type_parameters = type_parameters(c)?;
        let super_class = class_type(c)?;
        let mut interfaces = Vec::new();
        while !c.is_done() {
            interfaces.push(class_type(c)?);
        }
        Some(ClassSignature {
            type_parameters,
            super_class,
            interfaces,
        })
    })
}

pub fn parse_field_signature(sig: &str) -> Result<TypeSignature> {
    parse_all(sig, reference_type)
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    parse_all(sig, |c| {
        let type_parameters = type_parameters(c)?;
        if !c.eat(b'(') {
            return None;
        }
        let mut parameters = Vec::new();
        while !c.eat(b')') {
            parameters.push(java_type(c)?);
        }
        let return_type = if c.eat(b'V') {
            None
        } else {
            Some(java_type(c)?)
        };
        let mut throws = Vec::new();
        while c.eat(b'^') {
            throws.push(reference_type(c)?);
        }
        Some(MethodSignature {
            type_parameters,
            parameters,
            return_type,
            throws,
        })
    })
}

fn parse_all<T>(sig: &str, parse: impl FnOnce(&mut Cursor<'_>) -> Option<T>) -> Result<T> {
    let mut cursor = Cursor::new(sig);
    match parse(&mut cursor) {
        Some(value) if cursor.is_done() => Ok(value),
        _ => Err(Error::InvalidSignature(sig.to_string())),
    }
}

fn type_parameters(c: &mut Cursor<'_>) -> Option<Vec<TypeParameter>> {
    let mut params = Vec::new();
    if !c.eat(b'<') {
        return Some(params);
    }
    while !c.eat(b'>') {
        let name = c.take_until(b":>");
        if name.is_empty() || !c.eat(b':') {
            return None;
        }
        // The class bound may be empty when only interface bounds are present.
        let class_bound = match c.peek() {
            Some(b':') => None,
            _ => Some(reference_type(c)?),
        };
        let mut interface_bounds = Vec::new();
        while c.eat(b':') {
            interface_bounds.push(reference_type(c)?);
        }
        params.push(TypeParameter {
            name: name.to_string(),
            class_bound,
            interface_bounds,
        });
    }
    (!params.is_empty()).then_some(params)
}

fn java_type(c: &mut Cursor<'_>) -> Option<TypeSignature> {
    match c.peek().and_then(BaseType::from_tag) {
        Some(base) => {
            c.bump();
            Some(TypeSignature::Base(base))
        }
        None => reference_type(c),
    }
}

fn reference_type(c: &mut Cursor<'_>) -> Option<TypeSignature> {
    match c.peek()? {
        b'L' => class_type(c).map(TypeSignature::Class),
        b'T' => {
            c.bump();
            let name = c.take_until(b";");
            (!name.is_empty() && c.eat(b';')).then(|| TypeSignature::TypeVariable(name.to_string()))
        }
        b'[' => {
            c.bump();
            Some(TypeSignature::Array(Box::new(java_type(c)?)))
        }
        _ => None,
    }
}

fn class_type(c: &mut Cursor<'_>) -> Option<ClassTypeSignature> {
    if !c.eat(b'L') {
        return None;
    }
    let qualified = c.take_until(b"<.;");
    let (package, first) = match qualified.rfind('/') {
        Some(idx) => (&qualified[..idx], &qualified[idx + 1..]),
        None => ("", qualified),
    };
    let mut segments = vec![simple_class_type(c, first)?];
    while c.eat(b'.') {
        let name = c.take_until(b"<.;");
        segments.push(simple_class_type(c, name)?);
    }
    if !c.eat(b';') {
        return None;
    }
    Some(ClassTypeSignature {
        package: package.to_string(),
        segments,
    })
}

fn simple_class_type(c: &mut Cursor<'_>, name: &str) -> Option<SimpleClassTypeSignature> {
    if name.is_empty() {
        return None;
    }
    let mut type_arguments = Vec::new();
    if c.eat(b'<') {
        while !c.eat(b'>') {
            let arg = match c.peek()? {
                b'*' => {
                    c.bump();
                    TypeArgument::Any
                }
                b'+' => {
                    c.bump();
                    TypeArgument::Extends(reference_type(c)?)
                }
                b'-' => {
                    c.bump();
                    TypeArgument::Super(reference_type(c)?)
                }
                _ => TypeArgument::Exact(reference_type(c)?),
            };
            type_arguments.push(arg);
        }
        if type_arguments.is_empty() {
            return None;
        }
    }
    Some(SimpleClassTypeSignature {
        name: name.to_string(),
        type_arguments,
    })
}
