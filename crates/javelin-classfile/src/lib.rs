//! Reader for the binary class container format.
//!
//! Only the parts needed to rebuild declarations are decoded: the constant pool, member
//! tables, and the `Signature`, `Exceptions`, `InnerClasses` and annotation attributes.
//! Method bodies are skipped.

#![forbid(unsafe_code)]

mod annotation;
mod classfile;
mod constant_pool;
mod descriptor;
mod error;
mod reader;
mod signature;

pub use crate::annotation::{Annotation, ConstValue, ElementValue};
pub use crate::classfile::{ClassFile, ClassMember, InnerClassInfo};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    ClassTypeSignature, MethodSignature, SimpleClassTypeSignature, TypeArgument, TypeParameter,
    TypeSignature,
};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
