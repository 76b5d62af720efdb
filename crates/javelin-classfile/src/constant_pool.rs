use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
    /// Second slot of an eight-byte constant.
    Unusable,
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String => "String",
            CpInfo::FieldRef => "Fieldref",
            CpInfo::MethodRef => "Methodref",
            CpInfo::InterfaceMethodRef => "InterfaceMethodref",
            CpInfo::NameAndType => "NameAndType",
            CpInfo::MethodHandle => "MethodHandle",
            CpInfo::MethodType => "MethodType",
            CpInfo::Dynamic => "Dynamic",
            CpInfo::InvokeDynamic => "InvokeDynamic",
            CpInfo::Module => "Module",
            CpInfo::Package => "Package",
            CpInfo::Unusable => "unusable",
        }
    }
}

/// Constant pool with the format's one-based indexing.
#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(CpInfo::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    CpInfo::Utf8(decode_modified_utf8(reader.read_bytes(len)?)?)
                }
                3 => CpInfo::Integer(reader.read_u4()? as i32),
                4 => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
                5 => CpInfo::Long(reader.read_u8()? as i64),
                6 => CpInfo::Double(f64::from_bits(reader.read_u8()?)),
                7 => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                8 | 16 | 19 | 20 => {
                    reader.read_u2()?;
                    match tag {
                        8 => CpInfo::String,
                        16 => CpInfo::MethodType,
                        19 => CpInfo::Module,
                        _ => CpInfo::Package,
                    }
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.read_u4()?;
                    match tag {
                        9 => CpInfo::FieldRef,
                        10 => CpInfo::MethodRef,
                        11 => CpInfo::InterfaceMethodRef,
                        12 => CpInfo::NameAndType,
                        17 => CpInfo::Dynamic,
                        _ => CpInfo::InvokeDynamic,
                    }
                }
                15 => {
                    reader.read_u1()?;
                    reader.read_u2()?;
                    CpInfo::MethodHandle
                }
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };

            let wide = matches!(entry, CpInfo::Long(_) | CpInfo::Double(_));
            entries.push(entry);
            if wide {
                entries.push(CpInfo::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            None | Some(CpInfo::Unusable) => Err(Error::InvalidConstantPoolIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(s) => Ok(s),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Internal (slash-separated) name of a `Class` entry.
    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(mismatch(index, "Class", other)),
        }
    }
}

pub(crate) fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// Decodes the container's modified UTF-8: `0` is encoded as two bytes and supplementary
/// characters as surrogate pairs of three bytes each.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        if !s.contains('\u{0}') {
            return Ok(s.to_string());
        }
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        let cont = |at: usize| -> Result<u16> {
            match bytes.get(at) {
                Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
                _ => Err(Error::InvalidModifiedUtf8),
            }
        };
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            units.push(((b0 & 0x1F) << 6) | cont(i + 1)?);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            units.push(((b0 & 0x0F) << 12) | (cont(i + 1)? << 6) | cont(i + 2)?);
            i += 3;
        } else {
            return Err(Error::InvalidModifiedUtf8);
        }
    }

    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}
