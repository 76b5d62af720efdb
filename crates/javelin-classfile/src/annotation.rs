use crate::constant_pool::{mismatch, ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface, e.g. `Ljavax/annotation/Nonnull;`.
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let count = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            elements.push((name, ElementValue::parse(reader, cp)?));
        }
        Ok(Self {
            type_descriptor,
            elements,
        })
    }

    /// Internal name of the annotation interface, if the descriptor is a class type.
    pub fn type_internal_name(&self) -> Option<&str> {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }

    /// Unqualified name of the annotation interface (`Nonnull` for `javax/annotation/Nonnull`).
    pub fn simple_name(&self) -> Option<&str> {
        let name = self.type_internal_name()?;
        Some(name.rsplit(['/', '$']).next().unwrap_or(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

const ATTRIBUTE: &str = "annotations";

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let tag = reader.read_u1()?;
        let value = match tag {
            b'B' | b'C' | b'I' | b'S' | b'Z' | b'J' | b'F' | b'D' => {
                let index = reader.read_u2()?;
                let entry = cp.get(index)?;
                match (tag, entry) {
                    (b'J', CpInfo::Long(v)) => ConstValue::Long(*v),
                    (b'F', CpInfo::Float(v)) => ConstValue::Float(*v),
                    (b'D', CpInfo::Double(v)) => ConstValue::Double(*v),
                    (b'B' | b'C' | b'I' | b'S' | b'Z', CpInfo::Integer(v)) => {
                        ConstValue::from_int(tag, *v)?
                    }
                    _ => {
                        let expected = match tag {
                            b'J' => "Long",
                            b'F' => "Float",
                            b'D' => "Double",
                            _ => "Integer",
                        };
                        return Err(mismatch(index, expected, entry));
                    }
                }
            }
            b's' => ConstValue::String(cp.get_utf8(reader.read_u2()?)?.to_string()),
            b'e' => {
                let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
                let const_name = cp.get_utf8(reader.read_u2()?)?.to_string();
                return Ok(ElementValue::Enum {
                    type_descriptor,
                    const_name,
                });
            }
            b'c' => return Ok(ElementValue::Class(cp.get_utf8(reader.read_u2()?)?.to_string())),
            b'@' => return Ok(ElementValue::Annotation(Box::new(Annotation::parse(reader, cp)?))),
            b'[' => {
                let count = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(ElementValue::parse(reader, cp)?);
                }
                return Ok(ElementValue::Array(values));
            }
            _ => return Err(Error::MalformedAttribute(ATTRIBUTE)),
        };
        Ok(ElementValue::Const(value))
    }
}

impl ConstValue {
    fn from_int(tag: u8, v: i32) -> Result<ConstValue> {
        Ok(match tag {
            b'B' => ConstValue::Byte(v as i8),
            b'C' => ConstValue::Char(
                char::from_u32(v as u32).ok_or(Error::MalformedAttribute(ATTRIBUTE))?,
            ),
            b'S' => ConstValue::Short(v as i16),
            b'Z' => ConstValue::Boolean(v != 0),
            _ => ConstValue::Int(v),
        })
    }
}
