use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::modifiers::Modifiers;
use crate::ty::{Binding, ClassRef, Type};

/// Method name used for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub return_type: Type,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, return_type: Type) -> Self {
        Self {
            params,
            return_type,
        }
    }

    #[must_use]
    pub fn substitute(&self, binding: &Binding) -> FunctionType {
        FunctionType {
            params: self.params.iter().map(|p| p.substitute(binding)).collect(),
            return_type: self.return_type.substitute(binding),
        }
    }

    #[must_use]
    pub fn erase_free_vars(&self) -> FunctionType {
        FunctionType {
            params: self.params.iter().map(Type::erase_free_vars).collect(),
            return_type: self.return_type.erase_free_vars(),
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub signature: FunctionType,
    pub modifiers: Modifiers,
    #[serde(default)]
    pub thrown: Vec<ClassRef>,
    /// The last parameter is an array accepting zero or more trailing arguments.
    #[serde(default)]
    pub is_variable_arity: bool,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerClassDecl {
    pub ty: ClassRef,
    pub modifiers: Modifiers,
    pub is_anonymous: bool,
}

/// Where a descriptor came from. The resolver never looks at this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassOrigin {
    /// Produced by compiling the given source file.
    Source(PathBuf),
    /// Read from a binary found under the given search location.
    Binary(PathBuf),
    /// Constructed in memory (tests, synthesized classes).
    Synthetic,
}

/// The resolved shape of one class or interface.
///
/// `ty` is the declaration's own type: its type arguments are the declared type parameters,
/// so binding `ty` against an instantiation yields the substitution for member types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub ty: ClassRef,
    /// `None` only for the universal root type.
    pub super_type: Option<ClassRef>,
    #[serde(default)]
    pub interfaces: Vec<ClassRef>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub inner_classes: Vec<InnerClassDecl>,
    pub modifiers: Modifiers,
    pub origin: ClassOrigin,
}

impl ClassDecl {
    pub fn is_interface(&self) -> bool {
        self.modifiers.is_interface()
    }

    /// Superclass first, then interfaces in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &ClassRef> {
        self.super_type.iter().chain(self.interfaces.iter())
    }

    /// Substitution from this declaration's type parameters to the arguments of `view`.
    pub fn binding_for(&self, view: &ClassRef) -> Binding {
        let mut binding = Binding::new();
        self.ty.bind(view, &mut binding);
        binding
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDecl> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn inner_class(&self, ty: &ClassRef) -> Option<&InnerClassDecl> {
        self.inner_classes.iter().find(|inner| inner.ty.same_erasure(ty))
    }

    /// Rewrite every type mentioned by the declaration.
    #[must_use]
    pub fn map_types(&self, mut f: impl FnMut(&Type) -> Type) -> ClassDecl {
        let mut class = |c: &ClassRef| match f(&Type::Class(c.clone())) {
            Type::Class(mapped) => mapped,
            _ => c.clone(),
        };
        let ty = class(&self.ty);
        let super_type = self.super_type.as_ref().map(&mut class);
        let interfaces = self.interfaces.iter().map(&mut class).collect();
        let inner_classes = self
            .inner_classes
            .iter()
            .map(|inner| InnerClassDecl {
                ty: class(&inner.ty),
                ..inner.clone()
            })
            .collect();
        let methods = self
            .methods
            .iter()
            .map(|m| MethodDecl {
                thrown: m.thrown.iter().map(&mut class).collect(),
                ..m.clone()
            })
            .collect::<Vec<_>>();
        drop(class);

        ClassDecl {
            ty,
            super_type,
            interfaces,
            fields: self
                .fields
                .iter()
                .map(|field| FieldDecl {
                    ty: f(&field.ty),
                    ..field.clone()
                })
                .collect(),
            methods: methods
                .into_iter()
                .map(|m| MethodDecl {
                    signature: FunctionType {
                        params: m.signature.params.iter().map(&mut f).collect(),
                        return_type: f(&m.signature.return_type),
                    },
                    ..m
                })
                .collect(),
            inner_classes,
            modifiers: self.modifiers,
            origin: self.origin.clone(),
        }
    }
}

/// A descriptor that has been read or compiled but not yet published to the class cache.
///
/// Nested classes only learn their effective modifiers from their enclosing class's inner
/// class table, so publication goes through [`ProvisionalClassDecl::finalize`].
#[derive(Clone, Debug)]
pub struct ProvisionalClassDecl(ClassDecl);

impl ProvisionalClassDecl {
    pub fn new(decl: ClassDecl) -> Self {
        Self(decl)
    }

    pub fn ty(&self) -> &ClassRef {
        &self.0.ty
    }

    #[must_use]
    pub fn with_origin(mut self, origin: ClassOrigin) -> Self {
        self.0.origin = origin;
        self
    }

    /// Produce the published shape, taking modifiers declared for this class by `enclosing`.
    pub fn finalize(self, enclosing: Option<&ClassDecl>) -> ClassDecl {
        let mut decl = self.0;
        if let Some(inner) = enclosing.and_then(|outer| outer.inner_class(&decl.ty)) {
            decl.modifiers = inner.modifiers;
        }
        decl
    }
}
