use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use javelin_config::{CompilerConfig, SearchLocation};
use javelin_types::{ClassOrigin, ProvisionalClassDecl, ResolveError, Result};
use tempfile::TempDir;

use crate::index::BINARY_EXTENSION;
use crate::loader::ClassLoader;

/// A source file the loader wants compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source: PathBuf,
    /// Dotted package the file lives in, empty for the default package.
    pub package: String,
    /// Top-level class named by the file.
    pub top_level: String,
}

impl CompileRequest {
    /// Binary name of the requested top-level class.
    pub fn binary_name(&self) -> String {
        if self.package.is_empty() {
            self.top_level.clone()
        } else {
            format!("{}.{}", self.package, self.top_level)
        }
    }
}

/// Turns a source file into descriptors for every class it declares.
///
/// The loader is handed back so a compiler can resolve names the source refers to; doing so
/// may recursively compile other files. Returning an empty list means "nothing for this
/// location" and makes the loader move on.
pub trait SourceCompiler {
    fn compile(
        &self,
        request: &CompileRequest,
        loader: &mut ClassLoader,
    ) -> Result<Vec<ProvisionalClassDecl>>;
}

/// Runs an external compiler (`javac` by default) and reads back the binaries it writes.
#[derive(Debug)]
pub struct CommandCompiler {
    command: String,
    args: Vec<String>,
    output_dir: PathBuf,
    classpath: Vec<PathBuf>,
    sourcepath: Vec<PathBuf>,
    _scratch: Option<TempDir>,
}

impl CommandCompiler {
    pub fn new(command: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            output_dir,
            classpath: Vec::new(),
            sourcepath: Vec::new(),
            _scratch: None,
        }
    }

    /// Compiler for `config`, searching `locations`. Without a configured output directory a
    /// temporary one is created and kept for the compiler's lifetime.
    pub fn from_config(config: &CompilerConfig, locations: &[SearchLocation]) -> Result<Self> {
        let (output_dir, scratch) = match &config.output_dir {
            Some(dir) => (dir.clone(), None),
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix("javelin-classes")
                    .tempdir()
                    .map_err(|err| ResolveError::internal("failed to create output directory", err))?;
                (scratch.path().to_path_buf(), Some(scratch))
            }
        };

        let mut compiler = Self::new(config.command.clone(), output_dir);
        compiler.args = config.args.clone();
        compiler._scratch = scratch;
        for location in locations {
            match location {
                SearchLocation::Directory(dir) => {
                    compiler.sourcepath.push(dir.clone());
                    compiler.classpath.push(dir.clone());
                }
                SearchLocation::Archive(path) => compiler.classpath.push(path.clone()),
            }
        }
        Ok(compiler)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn command(&self, source: &Path) -> Result<Command> {
        // Never inherit `CLASSPATH`: the search path is always explicit.
        let mut classpath = vec![self.output_dir.clone()];
        classpath.extend(self.classpath.iter().cloned());
        let classpath = std::env::join_paths(classpath)
            .map_err(|err| ResolveError::internal("invalid compiler classpath", err))?;
        let sourcepath = std::env::join_paths(&self.sourcepath)
            .map_err(|err| ResolveError::internal("invalid compiler sourcepath", err))?;

        let mut cmd = Command::new(&self.command);
        cmd.env_remove("CLASSPATH")
            .arg("-implicit:none")
            .arg("-d")
            .arg(&self.output_dir)
            .arg("-classpath")
            .arg(classpath)
            .arg("-sourcepath")
            .arg(sourcepath)
            .args(&self.args)
            .arg(source);
        Ok(cmd)
    }

    /// Binaries for `top_level` and its nested classes under the package directory.
    fn outputs(&self, request: &CompileRequest) -> Result<Vec<PathBuf>> {
        let mut dir = self.output_dir.clone();
        dir.extend(request.package.split('.').filter(|part| !part.is_empty()));

        let nested_prefix = format!("{}$", request.top_level);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ResolveError::internal(
                    format!("failed to list {}", dir.display()),
                    err,
                ))
            }
        };

        let mut outputs = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.extension() != Some(OsStr::new(BINARY_EXTENSION)) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            if stem == request.top_level || stem.starts_with(&nested_prefix) {
                outputs.push(path);
            }
        }
        outputs.sort();
        Ok(outputs)
    }
}

impl SourceCompiler for CommandCompiler {
    fn compile(
        &self,
        request: &CompileRequest,
        _loader: &mut ClassLoader,
    ) -> Result<Vec<ProvisionalClassDecl>> {
        let source = &request.source;
        tracing::debug!(
            target: "javelin.compiler",
            command = %self.command,
            source = %source.display(),
            "invoking compiler"
        );

        let output = self
            .command(source)?
            .output()
            .map_err(|err| ResolveError::internal(format!("failed to run {}", self.command), err))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ResolveError::internal(
                format!("{} failed on {}", self.command, source.display()),
                stderr,
            ));
        }

        self.outputs(request)?
            .into_iter()
            .map(|path| {
                let bytes = std::fs::read(&path).map_err(|err| {
                    ResolveError::internal(format!("failed to read {}", path.display()), err)
                })?;
                Ok(javelin_types_bridge::read_class(&bytes, &path)?
                    .with_origin(ClassOrigin::Source(source.clone())))
            })
            .collect()
    }
}
