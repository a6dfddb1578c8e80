//! Top-level statement indexing with tree-sitter.

use std::collections::BTreeSet;

use tree_sitter::{Node, Parser};
use xxhash_rust::xxh64::xxh64;

use crate::error::TableConfigError;

/// Identity of a top-level statement.
///
/// Values and types live in separate namespaces, so `enum Status` and
/// `type Status` never match each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementKey {
    /// `const`/`let`/`var`, functions, classes, enums.
    Value(String),
    /// Interfaces and type aliases.
    Type(String),
    /// Imports, keyed by module specifier.
    Import(String),
    /// Everything else, keyed by a hash of its normalized text.
    Anonymous(u64),
}

/// One name of a named import: `Foo`, `type Foo` or `Foo as Bar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    /// The specifier without the `type` modifier, e.g. `Foo as Bar`.
    pub text: String,
    /// The binding it introduces, e.g. `Bar`.
    pub local: String,
    pub type_only: bool,
}

/// One top-level statement, including the comments attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
    key: StatementKey,
    /// Further names declared by the same statement (`const a = 1, b = 2;`).
    aliases: Vec<StatementKey>,
    import: bool,
    /// Named specifiers of an `import { ... } from` statement. `None` for other
    /// statements and for imports with default or namespace bindings.
    specifiers: Option<Vec<ImportSpecifier>>,
    /// Identifiers the statement mentions.
    references: BTreeSet<String>,
    generated: bool,
}

impl Statement {
    fn new(text: String, mut keys: Vec<StatementKey>, parts: Parts) -> Self {
        let key = if keys.is_empty() {
            StatementKey::Anonymous(xxh64(text.as_bytes(), 0))
        } else {
            keys.remove(0)
        };

        Self {
            text,
            key,
            aliases: keys,
            import: parts.import,
            specifiers: parts.specifiers,
            references: parts.references,
            generated: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> &StatementKey {
        &self.key
    }

    /// Every key the statement answers to, primary key first.
    pub fn keys(&self) -> impl Iterator<Item = &StatementKey> {
        std::iter::once(&self.key).chain(self.aliases.iter())
    }

    pub fn is_import(&self) -> bool {
        self.import
    }

    pub fn specifiers(&self) -> Option<&[ImportSpecifier]> {
        self.specifiers.as_deref()
    }

    pub fn references(&self) -> &BTreeSet<String> {
        &self.references
    }

    /// Whether the statement is, or has the identity of, a declaration this
    /// generator emits.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn mark_generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Whether any key of the statement names a value in `names`.
    pub fn declares_any(&self, names: &BTreeSet<String>) -> bool {
        self.keys()
            .any(|key| matches!(key, StatementKey::Value(name) if names.contains(name)))
    }

    /// Whether `candidate` declares this statement's primary key.
    pub fn matches(&self, candidate: &Statement) -> bool {
        candidate.keys().any(|key| *key == self.key)
    }

    /// The same statement with different source text. Identity and parsed
    /// details are kept so the result still occupies the original slot.
    pub fn with_text(&self, text: impl AsRef<str>) -> Self {
        Self {
            text: normalize(text.as_ref()),
            ..self.clone()
        }
    }

    /// This statement's identity carrying the text and parsed details of
    /// `resolved`.
    pub(crate) fn adopt(&self, resolved: &Statement) -> Self {
        Self {
            text: resolved.text.clone(),
            key: self.key.clone(),
            aliases: self.aliases.clone(),
            import: self.import,
            specifiers: resolved.specifiers.clone(),
            references: resolved.references.clone(),
            generated: self.generated,
        }
    }

    /// The import rewritten to bind exactly `specifiers`. Comments attached
    /// above the import are kept.
    ///
    /// Returns `None` for statements that are not imports keyed by module.
    pub(crate) fn with_specifiers(&self, mut specifiers: Vec<ImportSpecifier>) -> Option<Self> {
        let StatementKey::Import(module) = &self.key else {
            return None;
        };

        specifiers.sort_by(|a, b| a.local.cmp(&b.local));
        let text = if specifiers.iter().all(|specifier| specifier.type_only) {
            let names: Vec<&str> = specifiers.iter().map(|specifier| specifier.text.as_str()).collect();
            format!("import type {{ {} }} from '{}';", names.join(", "), module)
        } else {
            let names: Vec<String> = specifiers
                .iter()
                .map(|specifier| {
                    if specifier.type_only {
                        format!("type {}", specifier.text)
                    } else {
                        specifier.text.clone()
                    }
                })
                .collect();
            format!("import {{ {} }} from '{}';", names.join(", "), module)
        };

        let leading = self.text.rfind("\nimport").map_or("", |at| &self.text[..=at]);

        Some(Self {
            text: format!("{leading}{text}"),
            specifiers: Some(specifiers),
            ..self.clone()
        })
    }
}

/// Strips trailing whitespace from every line and surrounding blank lines.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

/// What indexing learned about a statement beyond its identity.
#[derive(Default)]
struct Parts {
    import: bool,
    specifiers: Option<Vec<ImportSpecifier>>,
    references: BTreeSet<String>,
}

/// A statement or comment run before its text is cut out of the source.
struct Span {
    start: usize,
    end: usize,
    end_row: usize,
    keys: Vec<StatementKey>,
    parts: Parts,
    comment: bool,
}

/// Splits TypeScript source into top-level statements.
///
/// Comments directly above a statement (no blank line between) become part of
/// it; a comment on the same line after a statement is kept with that
/// statement. Other comments are statements of their own.
///
/// ## Returns
/// `None` when the source has syntax errors.
///
/// ## Errors
/// Returns an error if the TypeScript grammar cannot be loaded.
pub fn index(source: &str) -> Result<Option<Vec<Statement>>, TableConfigError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;

    let Some(tree) = parser.parse(source, None) else {
        return Ok(None);
    };

    let root = tree.root_node();
    if root.has_error() {
        return Ok(None);
    }

    let mut spans: Vec<Span> = Vec::new();
    let mut comments: Option<Span> = None;
    let mut cursor = root.walk();

    for node in root.named_children(&mut cursor) {
        let start_row = node.start_position().row;

        if node.kind() == "comment" {
            if let Some(run) = comments.as_mut()
                && start_row <= run.end_row + 1
            {
                run.end = node.end_byte();
                run.end_row = node.end_position().row;
                continue;
            }

            if comments.is_none()
                && let Some(previous) = spans.last_mut()
                && !previous.comment
                && previous.end_row == start_row
            {
                previous.end = node.end_byte();
                continue;
            }

            spans.extend(comments.take());
            comments = Some(Span {
                start: node.start_byte(),
                end: node.end_byte(),
                end_row: node.end_position().row,
                keys: Vec::new(),
                parts: Parts::default(),
                comment: true,
            });
            continue;
        }

        let start = match comments.take() {
            Some(run) if start_row <= run.end_row + 1 => run.start,
            Some(run) => {
                spans.push(run);
                node.start_byte()
            }
            None => node.start_byte(),
        };

        let import = node.kind() == "import_statement";
        let mut references = BTreeSet::new();
        collect_references(node, source, &mut references);

        spans.push(Span {
            start,
            end: node.end_byte(),
            end_row: node.end_position().row,
            keys: statement_keys(node, source),
            parts: Parts {
                import,
                specifiers: if import { import_specifiers(node, source) } else { None },
                references,
            },
            comment: false,
        });
    }
    spans.extend(comments.take());

    Ok(Some(
        spans
            .into_iter()
            .map(|span| Statement::new(normalize(&source[span.start..span.end]), span.keys, span.parts))
            .collect(),
    ))
}

fn statement_keys(node: Node<'_>, source: &str) -> Vec<StatementKey> {
    match node.kind() {
        "import_statement" => node
            .child_by_field_name("source")
            .and_then(|module| text(module, source))
            .map(|module| vec![StatementKey::Import(unquote(module).to_string())])
            .unwrap_or_default(),
        "export_statement" => node
            .child_by_field_name("declaration")
            .map(|declaration| declaration_keys(declaration, source))
            .unwrap_or_default(),
        _ => declaration_keys(node, source),
    }
}

fn declaration_keys(node: Node<'_>, source: &str) -> Vec<StatementKey> {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|child| child.kind() == "variable_declarator")
                .filter_map(|declarator| name(declarator, source))
                .map(StatementKey::Value)
                .collect()
        }
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration" => name(node, source).map(StatementKey::Value).into_iter().collect(),
        "interface_declaration" | "type_alias_declaration" => {
            name(node, source).map(StatementKey::Type).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

/// Named specifiers of `import [type] { ... } from '...'`.
///
/// Returns `None` for side-effect imports and imports with a default or
/// namespace binding; those are never rewritten.
fn import_specifiers(node: Node<'_>, source: &str) -> Option<Vec<ImportSpecifier>> {
    let statement_type_only = has_type_modifier(node);

    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "import_clause")?;

    let mut clause_cursor = clause.walk();
    let children: Vec<Node<'_>> = clause.named_children(&mut clause_cursor).collect();
    let [named_imports] = children.as_slice() else {
        return None;
    };
    if named_imports.kind() != "named_imports" {
        return None;
    }

    let mut specifiers = Vec::new();
    let mut named_cursor = named_imports.walk();
    for specifier in named_imports.named_children(&mut named_cursor) {
        if specifier.kind() != "import_specifier" {
            continue;
        }

        let name = specifier.child_by_field_name("name").and_then(|name| text(name, source))?;
        let alias = specifier.child_by_field_name("alias").and_then(|alias| text(alias, source));

        specifiers.push(ImportSpecifier {
            text: match alias {
                Some(alias) => format!("{name} as {alias}"),
                None => name.to_string(),
            },
            local: alias.unwrap_or(name).to_string(),
            type_only: statement_type_only || has_type_modifier(specifier),
        });
    }

    Some(specifiers)
}

/// Whether `node` carries a direct `type` keyword child.
fn has_type_modifier(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == "type");
    found
}

fn collect_references(node: Node<'_>, source: &str, out: &mut BTreeSet<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if matches!(
            child.kind(),
            "identifier" | "type_identifier" | "shorthand_property_identifier"
        ) && let Some(name) = text(child, source)
        {
            out.insert(name.to_string());
        }
        collect_references(child, source, out);
    }
}

fn name(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|name| text(name, source))
        .map(str::to_string)
}

fn text<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '\'' || c == '"' || c == '`')
}
