use std::collections::HashMap;
use std::sync::Arc;

use javelin_types::{
    ClassDecl, ClassOrigin, ClassRef, FieldDecl, FunctionType, MethodDecl, Modifiers,
    PrimitiveType, ResolveError, SymbolProvider, Type, TypeVar, CONSTRUCTOR_NAME,
};

/// Fluent construction of in-memory class declarations.
#[derive(Debug, Clone)]
pub struct DeclBuilder {
    decl: ClassDecl,
}

impl DeclBuilder {
    pub fn class(binary_name: &str) -> Self {
        let ty = ClassRef::from_binary_name(binary_name);
        let super_type = (!ty.is_object()).then(ClassRef::object);
        Self {
            decl: ClassDecl {
                ty,
                super_type,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                inner_classes: Vec::new(),
                modifiers: Modifiers::PUBLIC,
                origin: ClassOrigin::Synthetic,
            },
        }
    }

    pub fn interface(binary_name: &str) -> Self {
        let mut builder = Self::class(binary_name);
        builder.decl.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        builder
    }

    pub fn type_param(self, name: &str) -> Self {
        self.push_type_param(TypeVar::new(name))
    }

    pub fn bounded_type_param(self, name: &str, bound: Type) -> Self {
        self.push_type_param(TypeVar::bounded(name, bound))
    }

    fn push_type_param(mut self, var: TypeVar) -> Self {
        let mut args = self.decl.ty.args().to_vec();
        args.push(Type::TypeVar(var));
        self.decl.ty = self.decl.ty.with_args(args);
        self
    }

    pub fn extends(mut self, super_type: ClassRef) -> Self {
        self.decl.super_type = Some(super_type);
        self
    }

    pub fn implements(mut self, interface: ClassRef) -> Self {
        self.decl.interfaces.push(interface);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.decl.modifiers = modifiers;
        self
    }

    pub fn field(mut self, name: &str, ty: Type) -> Self {
        self.decl.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers: Modifiers::PUBLIC,
        });
        self
    }

    pub fn method(self, name: &str, params: Vec<Type>, return_type: Type) -> Self {
        self.push_method(name, params, return_type, false)
    }

    /// A method whose last parameter (an array) accepts trailing arguments.
    pub fn varargs_method(self, name: &str, params: Vec<Type>, return_type: Type) -> Self {
        self.push_method(name, params, return_type, true)
    }

    pub fn constructor(self, params: Vec<Type>) -> Self {
        self.push_method(CONSTRUCTOR_NAME, params, Type::VOID, false)
    }

    fn push_method(
        mut self,
        name: &str,
        params: Vec<Type>,
        return_type: Type,
        is_variable_arity: bool,
    ) -> Self {
        let mut modifiers = Modifiers::PUBLIC;
        if is_variable_arity {
            modifiers |= Modifiers::VARARGS;
        }
        self.decl.methods.push(MethodDecl {
            name: name.to_string(),
            signature: FunctionType::new(params, return_type),
            modifiers,
            thrown: Vec::new(),
            is_variable_arity,
        });
        self
    }

    pub fn build(self) -> ClassDecl {
        self.decl
    }
}

/// [`SymbolProvider`] over a fixed set of declarations.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    classes: HashMap<String, Arc<ClassDecl>>,
    /// Binary names passed to `load_class`, in request order.
    pub requests: Vec<String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider preloaded with `Object`, `String`, `Number`, the boxed primitives and the
    /// interfaces they implement.
    pub fn with_builtins() -> Self {
        let mut provider = Self::new();
        let class = |name: &str| ClassRef::from_binary_name(name);
        let comparable_of = |name: &str| class("java.lang.Comparable").with_args(vec![class(name).into()]);

        provider.insert(DeclBuilder::class("java.lang.Object").build());
        provider.insert(DeclBuilder::interface("java.io.Serializable").build());
        provider.insert(DeclBuilder::interface("java.lang.CharSequence").build());
        provider.insert(
            DeclBuilder::interface("java.lang.Comparable")
                .type_param("T")
                .method("compareTo", vec![Type::type_var("T")], Type::INT)
                .build(),
        );
        provider.insert(
            DeclBuilder::class("java.lang.String")
                .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
                .implements(class("java.io.Serializable"))
                .implements(comparable_of("java.lang.String"))
                .implements(class("java.lang.CharSequence"))
                .build(),
        );
        provider.insert(
            DeclBuilder::class("java.lang.Number")
                .modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
                .implements(class("java.io.Serializable"))
                .build(),
        );

        for primitive in PrimitiveType::ALL {
            if primitive == PrimitiveType::Void {
                continue;
            }
            let name = primitive.boxed_name();
            let numeric = !matches!(primitive, PrimitiveType::Boolean | PrimitiveType::Char);
            let mut builder = DeclBuilder::class(name)
                .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
                .implements(class("java.io.Serializable"))
                .implements(comparable_of(name));
            if numeric {
                builder = builder.extends(class("java.lang.Number"));
            }
            provider.insert(builder.build());
        }
        provider
    }

    pub fn insert(&mut self, decl: ClassDecl) -> Arc<ClassDecl> {
        let decl = Arc::new(decl);
        self.classes.insert(decl.ty.binary_name(), decl.clone());
        decl
    }
}

impl SymbolProvider for MemoryProvider {
    fn load_class(&mut self, ty: &ClassRef) -> javelin_types::Result<Arc<ClassDecl>> {
        let name = ty.binary_name();
        self.requests.push(name.clone());
        self.classes
            .get(&name)
            .cloned()
            .ok_or_else(|| ResolveError::class_not_found(name))
    }
}
