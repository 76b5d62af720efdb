use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use javelin_config::{JavelinConfig, SearchLocation};
use javelin_types::{
    ClassDecl, ClassRef, ProvisionalClassDecl, ResolveError, Result, SymbolProvider, Type,
    TypeVar, Wildcard,
};

use crate::compiler::{CommandCompiler, CompileRequest, SourceCompiler};
use crate::index::{
    self, is_newer, modified, top_level_name, ClasspathError, PackageInfo, BINARY_EXTENSION,
    SOURCE_EXTENSION,
};

/// Compilation progress of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    NotStarted,
    /// A compile of this file is on the stack; asking again yields nothing.
    InProgress,
    Done,
}

/// The symbol index: package map built eagerly from the search path, plus the permanent,
/// append-only cache of class descriptors materialized on demand.
pub struct ClassLoader {
    packages: BTreeMap<String, PackageInfo>,
    /// Keyed by binary name.
    classes: HashMap<String, Arc<ClassDecl>>,
    compile_states: HashMap<PathBuf, CompileState>,
    compiler: Option<Rc<dyn SourceCompiler>>,
}

impl std::fmt::Debug for ClassLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassLoader")
            .field("packages", &self.packages.len())
            .field("classes", &self.classes.len())
            .field("compile_states", &self.compile_states)
            .finish_non_exhaustive()
    }
}

impl ClassLoader {
    /// Scans `locations` (earlier entries shadow later ones). Without a compiler, a stale
    /// binary is read as is and a source-only class falls through to later locations.
    pub fn new(locations: &[SearchLocation], compiler: Option<Rc<dyn SourceCompiler>>) -> Self {
        Self {
            packages: index::build(locations),
            classes: HashMap::new(),
            compile_states: HashMap::new(),
            compiler,
        }
    }

    /// Loader over the configured search path, compiling with the configured command.
    pub fn from_config(config: &JavelinConfig) -> Result<Self> {
        let locations = config.search_locations();
        let compiler = CommandCompiler::from_config(&config.compiler, &locations)?;
        Ok(Self::new(&locations, Some(Rc::new(compiler))))
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn package_info(&self, package: &str) -> Option<&PackageInfo> {
        self.packages.get(package)
    }

    /// Class names (`Outer`, `Outer$Inner`) known in `package`, sorted.
    pub fn classes_in(&self, package: &str) -> impl Iterator<Item = &str> {
        self.packages
            .get(package)
            .into_iter()
            .flat_map(|info| info.classes.iter().map(String::as_str))
    }

    pub fn is_compiled(&self, package: &str, class_name: &str) -> bool {
        self.packages
            .get(package)
            .is_some_and(|info| info.compiled_classes.contains(class_name))
    }

    /// Number of descriptors in the permanent cache.
    pub fn loaded_count(&self) -> usize {
        self.classes.len()
    }

    pub fn compile_state(&self, source: &Path) -> CompileState {
        self.compile_states
            .get(source)
            .copied()
            .unwrap_or(CompileState::NotStarted)
    }

    /// Resolves an unqualified (possibly `.`- or `$`-nested) class name against `imports`,
    /// tried in order. `pkg.*` searches `pkg`; `*` alone is the default package; a single
    /// import `a.b.Name` searches `a.b`, which may itself name an outer class.
    pub fn resolve(&mut self, name: &str, imports: &[impl AsRef<str>]) -> Result<ClassRef> {
        let class_name = name.replace('.', "$");
        let head = top_level_name(&class_name);
        for import in imports {
            let import = import.as_ref();
            let package = if import == "*" {
                Some("")
            } else if let Some(package) = import.strip_suffix(".*") {
                Some(package)
            } else if import == head {
                Some("")
            } else {
                import
                    .strip_suffix(head)
                    .and_then(|prefix| prefix.strip_suffix('.'))
            };
            let Some(package) = package else {
                continue;
            };
            if let Some(found) = self.resolve_class_name(package, &class_name)? {
                return Ok(found);
            }
        }
        Err(ResolveError::class_not_found(name))
    }

    /// Walks from `package` upward, moving one trailing package component into the nested
    /// class path per step, until the index knows the class. A class known only as source is
    /// compiled once and the step retried.
    pub fn resolve_class_name(
        &mut self,
        package: &str,
        class_name: &str,
    ) -> Result<Option<ClassRef>> {
        let mut package = package.to_string();
        let mut class_name = class_name.replace('.', "$");
        loop {
            let mut retried = false;
            loop {
                let Some(info) = self.packages.get(&package) else {
                    break;
                };
                let top = top_level_name(&class_name);
                if info.compiled_classes.contains(&class_name) {
                    return Ok(Some(binary_ref(&package, &class_name)));
                }
                let known = info.classes.contains(&class_name);
                if !retried && info.classes.contains(top) && !info.compiled_classes.contains(top) {
                    retried = true;
                    tracing::debug!(
                        target: "javelin.classpath",
                        package = %package,
                        class = %class_name,
                        "compiling outer class before retrying lookup"
                    );
                    match self.load_class(&binary_ref(&package, top)) {
                        Ok(_) => continue,
                        Err(err) if err.is_class_not_found() => {}
                        Err(err) => return Err(err),
                    }
                }
                if known || self.classes.contains_key(&binary_name(&package, &class_name)) {
                    return Ok(Some(binary_ref(&package, &class_name)));
                }
                break;
            }

            if package.is_empty() {
                return Ok(None);
            }
            let (parent, last) = match package.rsplit_once('.') {
                Some((parent, last)) => (parent.to_string(), last.to_string()),
                None => (String::new(), package.clone()),
            };
            class_name = format!("{last}${class_name}");
            package = parent;
        }
    }

    /// Materializes the descriptor for `ty` (type arguments are ignored), loading enclosing
    /// classes first so nested classes are published with their final modifiers.
    pub fn load_class(&mut self, ty: &ClassRef) -> Result<Arc<ClassDecl>> {
        let name = ty.binary_name();
        if let Some(decl) = self.classes.get(&name) {
            return Ok(decl.clone());
        }

        let enclosing = match ty.erasure().outer() {
            Some(outer) => {
                let outer = self.load_class(&outer)?;
                // Compiling the enclosing class may have produced this one.
                if let Some(decl) = self.classes.get(&name) {
                    return Ok(decl.clone());
                }
                Some(outer)
            }
            None => None,
        };

        tracing::debug!(target: "javelin.classpath", class = %name, "class cache miss");
        let class_name = ty.class_name();
        if !self.packages.contains_key(&ty.package) {
            return Err(ResolveError::class_not_found(name));
        }
        match self.load_from_locations(&ty.package, &class_name, enclosing.as_deref())? {
            Some(decl) => Ok(decl),
            None => Err(ResolveError::class_not_found(name)),
        }
    }

    /// Compiles `source` (a top-level class file in `package`) and registers everything it
    /// produces. Yields nothing if the file is already being compiled or was compiled before.
    pub fn compile_source(
        &mut self,
        source: &Path,
        package: &str,
    ) -> Result<Vec<Arc<ClassDecl>>> {
        let Some(compiler) = self.compiler.clone() else {
            return Ok(Vec::new());
        };
        match self.compile_state(source) {
            CompileState::NotStarted => {}
            state => {
                tracing::debug!(
                    target: "javelin.compiler",
                    source = %source.display(),
                    ?state,
                    "skipping compile"
                );
                return Ok(Vec::new());
            }
        }
        let Some(top_level) = source.file_stem().and_then(|s| s.to_str()) else {
            return Ok(Vec::new());
        };

        let request = CompileRequest {
            source: source.to_path_buf(),
            package: package.to_string(),
            top_level: top_level.to_string(),
        };
        self.compile_states
            .insert(source.to_path_buf(), CompileState::InProgress);
        let produced = compiler.compile(&request, self);
        self.compile_states
            .insert(source.to_path_buf(), CompileState::Done);
        let produced = produced?;

        tracing::debug!(
            target: "javelin.compiler",
            source = %source.display(),
            classes = produced.len(),
            "compiled source"
        );
        Ok(self.register_all(produced))
    }

    /// Publishes descriptors produced together. Enclosing classes are published before the
    /// classes nested in them; names already in the cache keep their first descriptor.
    pub fn register_all(&mut self, produced: Vec<ProvisionalClassDecl>) -> Vec<Arc<ClassDecl>> {
        let mut produced = produced;
        produced.sort_by_key(|decl| decl.ty().path.len());

        let mut published = Vec::with_capacity(produced.len());
        for provisional in produced {
            let ty = provisional.ty().erasure();
            let name = ty.binary_name();
            if let Some(existing) = self.classes.get(&name) {
                published.push(existing.clone());
                continue;
            }
            let enclosing = ty
                .outer()
                .and_then(|outer| self.classes.get(&outer.binary_name()).cloned());
            published.push(self.publish(provisional.finalize(enclosing.as_deref())));
        }
        published
    }

    fn publish(&mut self, decl: ClassDecl) -> Arc<ClassDecl> {
        let class_name = decl.ty.class_name();
        let info = self.packages.entry(decl.ty.package.clone()).or_default();
        info.classes.insert(class_name.clone());
        info.compiled_classes.insert(class_name);

        let decl = Arc::new(decl);
        self.classes
            .entry(decl.ty.binary_name())
            .or_insert(decl)
            .clone()
    }

    fn load_from_locations(
        &mut self,
        package: &str,
        class_name: &str,
        enclosing: Option<&ClassDecl>,
    ) -> Result<Option<Arc<ClassDecl>>> {
        let name = binary_name(package, class_name);
        let locations = self
            .packages
            .get(package)
            .map(|info| info.search_locations.clone())
            .unwrap_or_default();

        for location in locations {
            match &location {
                SearchLocation::Archive(archive) => {
                    let entry = archive_entry(package, class_name);
                    let Some(bytes) = read_archive_entry(archive, &entry).map_err(|err| {
                        ResolveError::internal(format!("failed to read {}", archive.display()), err)
                    })?
                    else {
                        continue;
                    };
                    let decl = javelin_types_bridge::read_class(&bytes, archive)?;
                    if !declares(&decl, package, class_name, archive) {
                        continue;
                    }
                    return Ok(Some(self.publish(decl.finalize(enclosing))));
                }
                SearchLocation::Directory(root) => {
                    let mut dir = root.clone();
                    dir.extend(package.split('.').filter(|part| !part.is_empty()));
                    let source = dir.join(format!("{}.{SOURCE_EXTENSION}", top_level_name(class_name)));
                    let binary = dir.join(format!("{class_name}.{BINARY_EXTENSION}"));

                    let source_time = modified(&source);
                    let binary_time = modified(&binary);
                    if source_time.is_some()
                        && is_newer(source_time, binary_time)
                        && self.compiler.is_some()
                    {
                        self.compile_source(&source, package)?;
                        if let Some(decl) = self.classes.get(&name) {
                            return Ok(Some(decl.clone()));
                        }
                        tracing::debug!(
                            target: "javelin.classpath",
                            class = %name,
                            source = %source.display(),
                            "compile produced no descriptor; trying next location"
                        );
                        continue;
                    }
                    if binary_time.is_none() {
                        continue;
                    }

                    let bytes = std::fs::read(&binary).map_err(|err| {
                        ResolveError::internal(format!("failed to read {}", binary.display()), err)
                    })?;
                    let decl = javelin_types_bridge::read_class(&bytes, &binary)?;
                    if !declares(&decl, package, class_name, &binary) {
                        continue;
                    }
                    return Ok(Some(self.publish(decl.finalize(enclosing))));
                }
            }
        }
        Ok(None)
    }

    /// Rewrites every default-package class reference in `ty` by resolving its outermost
    /// name against `imports`. Nested segments, type arguments and attributes are kept.
    pub fn resolve_type(&mut self, ty: &Type, imports: &[impl AsRef<str>]) -> Result<Type> {
        Ok(match ty {
            Type::Primitive(_) => ty.clone(),
            Type::TypeVar(var) => Type::TypeVar(TypeVar {
                name: var.name.clone(),
                bound: match &var.bound {
                    Some(bound) => Some(Box::new(self.resolve_type(bound, imports)?)),
                    None => None,
                },
            }),
            Type::Array(elem) => Type::array(self.resolve_type(elem, imports)?),
            Type::Class(class) => Type::Class(self.resolve_class_ref(class, imports)?),
            Type::Wildcard(w) => Type::Wildcard(Wildcard {
                lower: match &w.lower {
                    Some(t) => Some(Box::new(self.resolve_type(t, imports)?)),
                    None => None,
                },
                upper: match &w.upper {
                    Some(t) => Some(Box::new(self.resolve_type(t, imports)?)),
                    None => None,
                },
            }),
            Type::Intersection(bounds) => Type::Intersection(
                bounds
                    .iter()
                    .map(|b| self.resolve_class_ref(b, imports))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    fn resolve_class_ref(
        &mut self,
        class: &ClassRef,
        imports: &[impl AsRef<str>],
    ) -> Result<ClassRef> {
        let mut path = Vec::with_capacity(class.path.len());
        for segment in &class.path {
            let mut segment = segment.clone();
            segment.args = segment
                .args
                .iter()
                .map(|arg| self.resolve_type(arg, imports))
                .collect::<Result<_>>()?;
            path.push(segment);
        }

        let Some((head, rest)) = path.split_first() else {
            return Ok(class.clone());
        };
        if !class.package.is_empty() {
            return Ok(ClassRef::new(class.package.clone(), path).with_attrs(class.attrs));
        }

        let resolved = self.resolve(&head.name, imports)?;
        let mut resolved_path = resolved.path;
        if let Some(last) = resolved_path.last_mut() {
            last.args = head.args.clone();
        }
        resolved_path.extend(rest.iter().cloned());
        Ok(ClassRef::new(resolved.package, resolved_path).with_attrs(class.attrs))
    }

    /// Closes a source-derived descriptor over `imports`, failing on the first name that
    /// does not resolve.
    pub fn resolve_decl(&mut self, decl: &ClassDecl, imports: &[impl AsRef<str>]) -> Result<ClassDecl> {
        let mut error = None;
        let resolved = decl.map_types(|ty| match self.resolve_type(ty, imports) {
            Ok(resolved) => resolved,
            Err(err) => {
                error.get_or_insert(err);
                ty.clone()
            }
        });
        match error {
            Some(err) => Err(err),
            None => Ok(resolved),
        }
    }
}

impl SymbolProvider for ClassLoader {
    fn load_class(&mut self, ty: &ClassRef) -> Result<Arc<ClassDecl>> {
        ClassLoader::load_class(self, ty)
    }
}

fn binary_name(package: &str, class_name: &str) -> String {
    if package.is_empty() {
        class_name.to_string()
    } else {
        format!("{package}.{class_name}")
    }
}

fn binary_ref(package: &str, class_name: &str) -> ClassRef {
    ClassRef::from_binary_name(&binary_name(package, class_name))
}

/// Whether a binary found at the expected path really declares `package.class_name`.
fn declares(decl: &ProvisionalClassDecl, package: &str, class_name: &str, path: &Path) -> bool {
    let expected = binary_ref(package, class_name);
    if decl.ty().erasure() == expected {
        return true;
    }
    tracing::warn!(
        target: "javelin.classpath",
        expected = %expected,
        found = %decl.ty(),
        path = %path.display(),
        "binary declares a different class; skipping"
    );
    false
}

fn archive_entry(package: &str, class_name: &str) -> String {
    if package.is_empty() {
        format!("{class_name}.{BINARY_EXTENSION}")
    } else {
        format!("{}/{class_name}.{BINARY_EXTENSION}", package.replace('.', "/"))
    }
}

fn read_archive_entry(archive: &Path, entry: &str) -> std::result::Result<Option<Vec<u8>>, ClasspathError> {
    let mut archive = zip::ZipArchive::new(File::open(archive)?)?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}
