use std::ops::Deref;

/// Import strings in the order [`ClassLoader::resolve`](crate::ClassLoader::resolve) tries
/// them for one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportList(Vec<String>);

impl ImportList {
    /// Single-type imports, then the unit's own package, then on-demand imports, then
    /// `java.lang.*`.
    pub fn for_compilation_unit<S: AsRef<str>>(
        package: &str,
        single_type: &[S],
        on_demand: &[S],
    ) -> Self {
        let mut imports: Vec<String> = single_type
            .iter()
            .map(|import| import.as_ref().to_string())
            .collect();
        imports.push(if package.is_empty() {
            "*".to_string()
        } else {
            format!("{package}.*")
        });
        for package in on_demand {
            let package = package.as_ref();
            let import = if package.ends_with(".*") {
                package.to_string()
            } else {
                format!("{package}.*")
            };
            if !imports.contains(&import) {
                imports.push(import);
            }
        }
        let lang = "java.lang.*".to_string();
        if !imports.contains(&lang) {
            imports.push(lang);
        }
        Self(imports)
    }
}

impl Deref for ImportList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}
