use crate::annotation::Annotation;
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::reader::Reader;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal name, e.g. `com/example/Outer$Inner`.
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub inner_classes: Vec<InnerClassInfo>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    /// Internal names from the `Exceptions` attribute (methods only).
    pub exceptions: Vec<String>,
    /// Visible and invisible annotations, in that order.
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    /// `None` for anonymous classes.
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class = optional(reader.read_u2()?, |i| cp.get_class_name(i))?;
        let interfaces = counted(&mut reader, |r| cp.get_class_name(r.read_u2()?))?;
        let fields = counted(&mut reader, |r| ClassMember::parse(r, &cp))?;
        let methods = counted(&mut reader, |r| ClassMember::parse(r, &cp))?;
        let attrs = Attributes::parse(&mut reader, &cp)?;
        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: attrs.signature,
            annotations: attrs.annotations,
            inner_classes: attrs.inner_classes,
        })
    }

    /// The `InnerClasses` entry describing this class itself, if it is nested.
    pub fn own_inner_class_entry(&self) -> Option<&InnerClassInfo> {
        self.inner_classes
            .iter()
            .find(|entry| entry.inner_class == self.this_class)
    }
}

impl ClassMember {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let access_flags = reader.read_u2()?;
        let name = cp.get_utf8(reader.read_u2()?)?.to_string();
        let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let attrs = Attributes::parse(reader, cp)?;
        Ok(Self {
            access_flags,
            name,
            descriptor,
            signature: attrs.signature,
            exceptions: attrs.exceptions,
            annotations: attrs.annotations,
        })
    }
}

fn optional<T>(index: u16, f: impl FnOnce(u16) -> Result<T>) -> Result<Option<T>> {
    match index {
        0 => Ok(None),
        i => f(i).map(Some),
    }
}

fn counted<'a, T>(
    reader: &mut Reader<'a>,
    mut f: impl FnMut(&mut Reader<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = reader.read_u2()? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(f(reader)?);
    }
    Ok(out)
}

#[derive(Default)]
struct Attributes {
    signature: Option<String>,
    exceptions: Vec<String>,
    annotations: Vec<Annotation>,
    inner_classes: Vec<InnerClassInfo>,
}

impl Attributes {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut parsed = Attributes::default();
        for _ in 0..count {
            let name = cp.get_utf8(reader.read_u2()?)?;
            let length = reader.read_u4()? as usize;
            let mut sub = Reader::new(reader.read_bytes(length)?);

            match name {
                "Signature" => {
                    parsed.signature = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
                }
                "Exceptions" => {
                    parsed.exceptions = counted(&mut sub, |r| cp.get_class_name(r.read_u2()?))?;
                }
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    let anns = counted(&mut sub, |r| Annotation::parse(r, cp))?;
                    parsed.annotations.extend(anns);
                }
                "InnerClasses" => {
                    parsed.inner_classes = counted(&mut sub, |r| {
                        let inner_class = cp.get_class_name(r.read_u2()?)?;
                        let outer_class = optional(r.read_u2()?, |i| cp.get_class_name(i))?;
                        let inner_name =
                            optional(r.read_u2()?, |i| cp.get_utf8(i).map(str::to_string))?;
                        Ok(InnerClassInfo {
                            inner_class,
                            outer_class,
                            inner_name,
                            access_flags: r.read_u2()?,
                        })
                    })?;
                }
                // Code, LineNumberTable and the rest are not needed for declarations.
                _ => continue,
            }
            sub.ensure_empty()
                .map_err(|_| Error::MalformedAttribute(attribute_label(name)))?;
        }
        Ok(parsed)
    }
}

fn attribute_label(name: &str) -> &'static str {
    match name {
        "Signature" => "Signature",
        "Exceptions" => "Exceptions",
        "InnerClasses" => "InnerClasses",
        _ => "annotations",
    }
}
