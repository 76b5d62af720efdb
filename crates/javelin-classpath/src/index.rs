use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;

use javelin_config::SearchLocation;
use thiserror::Error;

pub(crate) const SOURCE_EXTENSION: &str = "java";
pub(crate) const BINARY_EXTENSION: &str = "class";

#[derive(Debug, Error)]
pub(crate) enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Index entry for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// Class names (`Outer`, `Outer$Inner`) known to live in the package.
    pub classes: BTreeSet<String>,
    /// Classes whose binary form is current in the location that provides them.
    pub compiled_classes: HashSet<String>,
    /// Locations holding this package, in search order.
    pub search_locations: Vec<SearchLocation>,
}

/// What one location holds for one package. Archives only ever contribute binaries.
#[derive(Default)]
struct LocationContents {
    sources: HashMap<String, Option<SystemTime>>,
    binaries: HashMap<String, Option<SystemTime>>,
}

impl LocationContents {
    fn is_current(&self, class_name: &str) -> bool {
        let Some(binary) = self.binaries.get(class_name) else {
            return false;
        };
        match self.sources.get(top_level_name(class_name)) {
            None => true,
            Some(source) => !is_newer(*source, *binary),
        }
    }
}

/// `Outer` for `Outer$Inner$Deep`.
pub(crate) fn top_level_name(class_name: &str) -> &str {
    class_name.split('$').next().unwrap_or(class_name)
}

/// Whether `source` must be recompiled against `binary`. Unknown times count as newer.
pub(crate) fn is_newer(source: Option<SystemTime>, binary: Option<SystemTime>) -> bool {
    match (source, binary) {
        (Some(source), Some(binary)) => source > binary,
        _ => true,
    }
}

pub(crate) fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn is_ignored_class(class_name: &str) -> bool {
    class_name == "module-info" || class_name == "package-info"
}

/// Scans every location once. The first location to provide a class decides whether it is
/// compiled; later locations only add themselves to the package's search order.
pub(crate) fn build(locations: &[SearchLocation]) -> BTreeMap<String, PackageInfo> {
    let mut packages = BTreeMap::<String, PackageInfo>::new();
    for location in locations {
        let contents = match location {
            SearchLocation::Directory(dir) => scan_dir(dir),
            SearchLocation::Archive(path) => match scan_archive(path) {
                Ok(contents) => contents,
                Err(err) => {
                    tracing::warn!(
                        target: "javelin.classpath",
                        path = %path.display(),
                        error = %err,
                        "ignoring unreadable archive"
                    );
                    continue;
                }
            },
        };

        for (package, contents) in contents {
            let info = packages.entry(package).or_default();
            info.search_locations.push(location.clone());
            let names = contents.sources.keys().chain(contents.binaries.keys());
            for name in names {
                if info.classes.insert(name.clone()) && contents.is_current(name) {
                    info.compiled_classes.insert(name.clone());
                }
            }
        }
    }

    tracing::debug!(
        target: "javelin.classpath",
        locations = locations.len(),
        packages = packages.len(),
        "built package index"
    );
    packages
}

fn scan_dir(root: &Path) -> HashMap<String, LocationContents> {
    let mut out = HashMap::<String, LocationContents>::new();
    for entry in walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(OsStr::to_str),
            path.extension().and_then(OsStr::to_str),
        ) else {
            continue;
        };
        if is_ignored_class(stem) {
            continue;
        }
        let Some(package) = path
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .and_then(package_of)
        else {
            continue;
        };

        let contents = out.entry(package).or_default();
        let mtime = modified(path);
        match ext {
            SOURCE_EXTENSION => {
                contents.sources.insert(stem.to_string(), mtime);
            }
            BINARY_EXTENSION => {
                contents.binaries.insert(stem.to_string(), mtime);
            }
            _ => {}
        }
    }
    out
}

fn scan_archive(path: &Path) -> Result<HashMap<String, LocationContents>, ClasspathError> {
    let archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut out = HashMap::<String, LocationContents>::new();
    for name in archive.file_names() {
        let Some(internal) = name.strip_suffix(".class") else {
            continue;
        };
        if internal.starts_with("META-INF/") {
            continue;
        }
        let (package, class_name) = match internal.rsplit_once('/') {
            Some((package, class_name)) => (package.replace('/', "."), class_name),
            None => (String::new(), internal),
        };
        if is_ignored_class(class_name) {
            continue;
        }
        out.entry(package)
            .or_default()
            .binaries
            .insert(class_name.to_string(), None);
    }
    Ok(out)
}

/// Dotted package name for a relative directory, `None` if a component is not valid UTF-8.
fn package_of(rel: &Path) -> Option<String> {
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("."))
}
