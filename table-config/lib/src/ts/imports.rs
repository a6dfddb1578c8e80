use std::collections::{BTreeMap, BTreeSet};

/// Names a generated file imports, grouped by module specifier.
///
/// Ordered collections keep the rendered import block stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    modules: BTreeMap<String, ModuleImports>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ModuleImports {
    values: BTreeSet<String>,
    types: BTreeSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports `name` for use as a value (e.g. an enum member access).
    pub fn add_value(&mut self, module: &str, name: &str) {
        let entry = self.modules.entry(module.to_string()).or_default();
        entry.types.remove(name);
        entry.values.insert(name.to_string());
    }

    /// Imports `name` for use in type positions only.
    pub fn add_type(&mut self, module: &str, name: &str) {
        let entry = self.modules.entry(module.to_string()).or_default();
        if !entry.values.contains(name) {
            entry.types.insert(name.to_string());
        }
    }

    pub fn with_value(mut self, module: &str, name: &str) -> Self {
        self.add_value(module, name);
        self
    }

    pub fn with_type(mut self, module: &str, name: &str) -> Self {
        self.add_type(module, name);
        self
    }

    /// Merges every import of `other` into `self`.
    pub fn extend(&mut self, other: ImportSet) {
        for (module, imports) in other.modules {
            for name in imports.values {
                self.add_value(&module, &name);
            }
            for name in imports.types {
                self.add_type(&module, &name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Whether `name` is imported from `module` in any form.
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|imports| imports.values.contains(name) || imports.types.contains(name))
    }

    /// Renders one import statement per module, sorted by module specifier.
    pub fn render(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, imports)| !imports.values.is_empty() || !imports.types.is_empty())
            .map(|(module, imports)| {
                if imports.values.is_empty() {
                    let names: Vec<&str> = imports.types.iter().map(String::as_str).collect();
                    format!("import type {{ {} }} from '{}';", names.join(", "), module)
                } else {
                    let mut names: Vec<(&str, bool)> = imports
                        .values
                        .iter()
                        .map(|name| (name.as_str(), false))
                        .chain(imports.types.iter().map(|name| (name.as_str(), true)))
                        .collect();
                    names.sort();

                    let names: Vec<String> = names
                        .into_iter()
                        .map(|(name, type_only)| {
                            if type_only {
                                format!("type {name}")
                            } else {
                                name.to_string()
                            }
                        })
                        .collect();

                    format!("import {{ {} }} from '{}';", names.join(", "), module)
                }
            })
            .collect()
    }
}
