use std::collections::{HashSet, VecDeque};

use javelin_types::{
    Binding, ClassRef, FunctionType, MethodDecl, PrimitiveType, ResolveError, Result,
    SymbolProvider, Type, TypeVar, CONSTRUCTOR_NAME,
};

use crate::hierarchy::{is_raw_view, supertypes_of};
use crate::ClassTable;

/// Overload resolution phase that selected a method. Phases run in declaration order and the
/// first one with an applicable candidate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Exact arity, no boxing or unboxing.
    Strict,
    /// Exact arity, boxing and unboxing allowed.
    Loose,
    /// Variable-arity methods with their trailing array expanded.
    VariableArity,
}

impl Phase {
    const ALL: [Phase; 3] = [Phase::Strict, Phase::Loose, Phase::VariableArity];

    fn allows_boxing(self) -> bool {
        self != Phase::Strict
    }
}

/// A method or constructor selected by overload resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// The declaring class, instantiated as seen from the queried owner.
    pub owner: ClassRef,
    pub method: MethodDecl,
    /// Signature after class and method type arguments are substituted and any remaining type
    /// variables are erased.
    pub signature: FunctionType,
    pub phase: Phase,
}

#[derive(Debug, Clone)]
struct Candidate {
    owner: ClassRef,
    method: MethodDecl,
    /// Declared signature with the owner's class type arguments applied.
    signature: FunctionType,
}

impl<P: SymbolProvider> ClassTable<P> {
    /// Selects the method `name` applicable to `args` on `owner` or its supertypes.
    pub fn resolve_method(
        &mut self,
        owner: &ClassRef,
        name: &str,
        args: &[Type],
    ) -> Result<ResolvedMethod> {
        let candidates = self.collect_methods(owner, name)?;
        self.select(owner, name, candidates, args)
    }

    /// Selects a constructor of `owner`. Constructors are never inherited.
    pub fn resolve_constructor(&mut self, owner: &ClassRef, args: &[Type]) -> Result<ResolvedMethod> {
        let decl = self.load(owner)?;
        let raw = is_raw_view(&decl, owner);
        let binding = decl.binding_for(owner);
        let candidates = decl
            .methods_named(CONSTRUCTOR_NAME)
            .map(|method| Candidate {
                owner: owner.clone(),
                method: method.clone(),
                signature: class_signature(method, &binding, raw),
            })
            .collect();
        self.select(owner, CONSTRUCTOR_NAME, candidates, args)
    }

    /// Methods named `name` along the hierarchy of `owner`, nearest first. A method whose
    /// erased parameters match one already collected is overridden by it and skipped.
    fn collect_methods(&mut self, owner: &ClassRef, name: &str) -> Result<Vec<Candidate>> {
        let mut queue = VecDeque::from([owner.clone()]);
        let mut seen = HashSet::new();
        let mut out: Vec<Candidate> = Vec::new();
        while let Some(view) = queue.pop_front() {
            if !seen.insert(view.erasure()) {
                continue;
            }
            let decl = self.load(&view)?;
            let raw = is_raw_view(&decl, &view);
            let binding = decl.binding_for(&view);
            for method in decl.methods_named(name) {
                let signature = class_signature(method, &binding, raw);
                let erased = erased_params(&signature);
                if out.iter().any(|c| erased_params(&c.signature) == erased) {
                    continue;
                }
                out.push(Candidate {
                    owner: view.clone(),
                    method: method.clone(),
                    signature,
                });
            }
            queue.extend(supertypes_of(&decl, &view));
        }
        Ok(out)
    }

    fn select(
        &mut self,
        owner: &ClassRef,
        name: &str,
        candidates: Vec<Candidate>,
        args: &[Type],
    ) -> Result<ResolvedMethod> {
        for phase in Phase::ALL {
            if let Some(found) = self.run_phase(phase, &candidates, args)? {
                tracing::trace!(
                    target: "javelin.resolve",
                    owner = %owner,
                    method = name,
                    ?phase,
                    declared_in = %found.owner,
                    "resolved method"
                );
                return Ok(found);
            }
            tracing::trace!(
                target: "javelin.resolve",
                owner = %owner,
                method = name,
                ?phase,
                candidates = candidates.len(),
                "no applicable method in phase"
            );
        }
        Err(ResolveError::MethodNotFound {
            owner: owner.qualified_name(),
            name: name.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        })
    }

    /// Applicable candidates in traversal order; each one at least as specific as every
    /// earlier survivor replaces the current choice.
    fn run_phase(
        &mut self,
        phase: Phase,
        candidates: &[Candidate],
        args: &[Type],
    ) -> Result<Option<ResolvedMethod>> {
        let mut accepted: Vec<Vec<Type>> = Vec::new();
        let mut best = None;
        for candidate in candidates {
            let params = &candidate.signature.params;
            let variable_arity = phase == Phase::VariableArity;
            if variable_arity {
                if !candidate.method.is_variable_arity || params.len() > args.len() + 1 {
                    continue;
                }
            } else if params.len() != args.len() {
                continue;
            }

            let Some(signature) = self.instantiate(&candidate.signature, args, variable_arity)?
            else {
                continue;
            };
            if !self.is_applicable(&signature.params, args, phase)? {
                continue;
            }

            let expanded = if variable_arity {
                expand_variable_arity(&signature.params, args.len())
            } else {
                signature.params.clone()
            };
            let mut most_specific = true;
            for previous in &accepted {
                if !self.params_more_specific(&expanded, previous)? {
                    most_specific = false;
                    break;
                }
            }
            if most_specific {
                accepted.push(expanded);
                best = Some(ResolvedMethod {
                    owner: candidate.owner.clone(),
                    method: candidate.method.clone(),
                    signature,
                    phase,
                });
            }
        }
        Ok(best)
    }

    /// Infers method type arguments from `args`, then erases whatever is still free. `None`
    /// when an inferred argument is outside its variable's declared bound.
    fn instantiate(
        &mut self,
        signature: &FunctionType,
        args: &[Type],
        variable_arity: bool,
    ) -> Result<Option<FunctionType>> {
        if !signature.params.iter().any(Type::has_type_vars)
            && !signature.return_type.has_type_vars()
        {
            return Ok(Some(signature.clone()));
        }

        let mut binding = Binding::new();
        for (param, arg) in pair_arguments(&signature.params, args, variable_arity) {
            self.bind_argument(param, arg, &mut binding)?;
        }
        if !self.within_bounds(signature, &binding)? {
            return Ok(None);
        }
        Ok(Some(signature.substitute(&binding).erase_free_vars()))
    }

    fn within_bounds(&mut self, signature: &FunctionType, binding: &Binding) -> Result<bool> {
        let mut vars = Vec::new();
        for param in &signature.params {
            collect_type_vars(param, &mut vars);
        }
        for var in vars {
            let (Some(bound), Some(inferred)) = (&var.bound, binding.get(&var.name)) else {
                continue;
            };
            // Capture conversion is not modelled; wildcard inferences are taken as given.
            if matches!(inferred, Type::Wildcard(_)) {
                continue;
            }
            if !self.is_subtype(inferred, &bound.substitute(binding))? {
                tracing::trace!(
                    target: "javelin.resolve",
                    var = %var.name,
                    %inferred,
                    bound = %bound,
                    "inferred type argument outside its bound"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn bind_argument(&mut self, param: &Type, arg: &Type, out: &mut Binding) -> Result<()> {
        if !param.has_type_vars() {
            return Ok(());
        }
        match (param, arg) {
            (Type::TypeVar(_), Type::Primitive(p)) => {
                if *p != PrimitiveType::Void {
                    param.bind(&Type::Class(p.boxed()), out);
                }
            }
            (Type::Class(template), Type::Primitive(p)) if *p != PrimitiveType::Void => {
                if let Some(view) = self.as_super_type(&p.boxed(), template)? {
                    template.bind(&view, out);
                }
            }
            (Type::Class(template), Type::Class(concrete)) => {
                if let Some(view) = self.as_super_type(concrete, template)? {
                    template.bind(&view, out);
                }
            }
            (Type::Array(param), Type::Array(arg)) => self.bind_argument(param, arg, out)?,
            _ => param.bind(arg, out),
        }
        Ok(())
    }

    fn is_applicable(&mut self, params: &[Type], args: &[Type], phase: Phase) -> Result<bool> {
        if phase != Phase::VariableArity {
            return self.all_accept(params, args, phase.allows_boxing());
        }

        let Some((array, fixed)) = params.split_last() else {
            return Ok(false);
        };
        if args.len() < fixed.len() {
            return Ok(false);
        }
        let (fixed_args, rest) = args.split_at(fixed.len());
        if !self.all_accept(fixed, fixed_args, true)? {
            return Ok(false);
        }
        if let [single] = rest {
            if self.accepts(array, single, true)? {
                return Ok(true);
            }
        }
        let Some(element) = array.element_type() else {
            return Ok(false);
        };
        for arg in rest {
            if !self.accepts(element, arg, true)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn all_accept(&mut self, params: &[Type], args: &[Type], boxing: bool) -> Result<bool> {
        for (param, arg) in params.iter().zip(args) {
            if !self.accepts(param, arg, boxing)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Method invocation conversion of one argument.
    fn accepts(&mut self, param: &Type, arg: &Type, boxing: bool) -> Result<bool> {
        match (param, arg) {
            (Type::Primitive(_), Type::Primitive(_)) => Ok(param.supset_eq_of(arg)),
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) if !boxing => Ok(false),
            (Type::Primitive(_), arg) => Ok(arg
                .as_class()
                .and_then(PrimitiveType::unboxed)
                .is_some_and(|unboxed| param.supset_eq_of(&Type::Primitive(unboxed)))),
            (param, Type::Primitive(p)) => {
                if *p == PrimitiveType::Void {
                    return Ok(false);
                }
                self.is_subtype(&Type::Class(p.boxed()), param)
            }
            (param, arg) => self.is_subtype(arg, param),
        }
    }

    /// `a` is at least as specific as `b`: every parameter of `a` is a subtype of the
    /// corresponding parameter of `b`.
    fn params_more_specific(&mut self, a: &[Type], b: &[Type]) -> Result<bool> {
        for (a, b) in a.iter().zip(b) {
            let more_specific = match (a, b) {
                (Type::Primitive(_), Type::Primitive(_)) => b.supset_eq_of(a),
                (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
                (a, b) => self.is_subtype(a, b)?,
            };
            if !more_specific {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Declared signature of `method` seen through a class binding. Members of a raw type are
/// erased.
fn class_signature(method: &MethodDecl, binding: &Binding, raw: bool) -> FunctionType {
    if raw {
        method.signature.erase_free_vars()
    } else {
        method.signature.substitute(binding)
    }
}

fn erased_params(signature: &FunctionType) -> Vec<Type> {
    signature.params.iter().map(Type::erase_to_bounds).collect()
}

fn collect_type_vars<'a>(ty: &'a Type, out: &mut Vec<&'a TypeVar>) {
    match ty {
        Type::Primitive(_) => {}
        Type::TypeVar(var) => {
            if !out.iter().any(|seen| seen.name == var.name) {
                out.push(var);
            }
        }
        Type::Array(elem) => collect_type_vars(elem, out),
        Type::Class(class) => {
            for segment in &class.path {
                for arg in &segment.args {
                    collect_type_vars(arg, out);
                }
            }
        }
        Type::Wildcard(w) => {
            for bound in w.upper.iter().chain(w.lower.iter()) {
                collect_type_vars(bound, out);
            }
        }
        Type::Intersection(bounds) => {
            for bound in bounds {
                for segment in &bound.path {
                    for arg in &segment.args {
                        collect_type_vars(arg, out);
                    }
                }
            }
        }
    }
}

/// Parameter/argument pairs used for inference. Trailing arguments of a variable-arity call
/// pair with the array's element type unless a single array argument is passed.
fn pair_arguments<'a>(
    params: &'a [Type],
    args: &'a [Type],
    variable_arity: bool,
) -> Vec<(&'a Type, &'a Type)> {
    let Some((array, fixed)) = params.split_last().filter(|_| variable_arity) else {
        return params.iter().zip(args).collect();
    };
    let mut pairs: Vec<_> = fixed.iter().zip(args).collect();
    let rest = args.get(fixed.len()..).unwrap_or_default();
    match (rest, array.element_type()) {
        ([single @ Type::Array(_)], _) => pairs.push((array, single)),
        (rest, Some(element)) => pairs.extend(rest.iter().map(|arg| (element, arg))),
        (_, None) => {}
    }
    pairs
}

/// Parameters of a variable-arity signature stretched to `arity` positions.
fn expand_variable_arity(params: &[Type], arity: usize) -> Vec<Type> {
    let Some((array, fixed)) = params.split_last() else {
        return Vec::new();
    };
    let element = array.element_type().unwrap_or(array);
    let mut out = fixed.to_vec();
    while out.len() < arity.max(fixed.len() + 1) {
        out.push(element.clone());
    }
    out
}
