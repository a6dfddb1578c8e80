//! Reconciliation of freshly generated content with an existing file.
//!
//! Both sides are split into top-level statements and paired by identity:
//! named declarations by name, imports by module, everything else by text.
//! Pairs are never diffed line by line; a [`ConflictResolver`] picks the
//! surviving statement whenever the two sides differ.
//!
//! ## Passes
//!
//! 1. **Forward**: every generated statement is paired with the first
//!    unclaimed existing statement of the same identity. Identical pairs are
//!    kept; otherwise the resolver decides (keep, replace or drop).
//! 2. **Backward**: every existing statement nobody claimed is offered to the
//!    resolver again, either against a generated statement of the same
//!    identity or alone. Resolved orphans are appended to the output.
//! 3. **Imports**: a surviving named import regains every specifier, from
//!    either side, that a surviving statement still references.
//!
//! Existing statements whose identity the generator owns (one of its
//! declaration names or import modules) are flagged with
//! [`Statement::is_generated`] so resolvers can tell stale generated output
//! from hand-written code.
//!
//! The result depends only on the two inputs and the resolver, so running the
//! merge against its own output is a fixed point.

mod reader;
mod resolver;
mod statement;

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

pub use reader::{ExistingFileReader, FsReader};
pub use resolver::{ConflictPolicy, ConflictResolver};
pub use statement::{ImportSpecifier, Statement, StatementKey, index, normalize};

use crate::error::TableConfigError;

/// Joins rendered statements: imports stay on consecutive lines, everything
/// else is separated by a blank line. Output ends with a newline.
pub fn render_blocks<'a>(blocks: impl IntoIterator<Item = (&'a str, bool)>) -> String {
    let mut out = String::new();
    let mut previous_import: Option<bool> = None;

    for (text, is_import) in blocks {
        match previous_import {
            None => {}
            Some(true) if is_import => out.push('\n'),
            Some(_) => out.push_str("\n\n"),
        }
        out.push_str(text);
        previous_import = Some(is_import);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

pub fn render_statements(statements: &[Statement]) -> String {
    render_blocks(statements.iter().map(|statement| (statement.text(), statement.is_import())))
}

/// Merges generated statements into existing ones.
pub fn merge_statements(
    generated: &[Statement],
    existing: &[Statement],
    resolver: &dyn ConflictResolver,
) -> Vec<Statement> {
    let mut output: Vec<Option<Statement>> = generated.iter().cloned().map(Some).collect();
    let mut claimed = vec![false; existing.len()];
    let mut appended = Vec::new();

    for (slot, new) in generated.iter().enumerate() {
        let counterpart = existing
            .iter()
            .enumerate()
            .find(|(index, candidate)| !claimed[*index] && new.matches(candidate))
            .map(|(index, candidate)| {
                claimed[index] = true;
                candidate
            });

        if counterpart.is_some_and(|old| old.text() == new.text()) {
            continue;
        }

        match resolver.resolve(Some(new), counterpart) {
            Some(resolved) if resolved.text() == new.text() => {}
            Some(resolved) => {
                tracing::debug!(key = ?new.key(), "replacing generated statement with resolved text");
                output[slot] = Some(new.adopt(&resolved));
            }
            None => {
                tracing::debug!(key = ?new.key(), "dropping generated statement");
                output[slot] = None;
            }
        }
    }

    for (index, old) in existing.iter().enumerate() {
        if claimed[index] {
            continue;
        }

        match generated.iter().position(|new| old.matches(new)) {
            Some(slot) => {
                let new = &generated[slot];
                if old.text() == new.text() {
                    continue;
                }

                if let Some(resolved) = resolver.resolve(Some(new), Some(old)) {
                    let current = output[slot].as_ref().map(Statement::text);
                    if current != Some(resolved.text()) {
                        tracing::debug!(key = ?new.key(), "existing statement resolved onto generated slot");
                        output[slot] = Some(new.adopt(&resolved));
                    }
                }
            }
            None => match resolver.resolve(None, Some(old)) {
                Some(resolved) => {
                    tracing::debug!(key = ?old.key(), "keeping statement not produced by generation");
                    appended.push(resolved);
                }
                None => {
                    tracing::debug!(key = ?old.key(), "dropping stale statement");
                }
            },
        }
    }

    let merged: Vec<Statement> = output.into_iter().flatten().chain(appended).collect();
    restore_imports(merged, generated, existing)
}

/// Re-adds import specifiers that surviving statements still reference.
///
/// A kept import line only gains names; lines that already bind everything
/// they need are left byte-identical. A module whose line was dropped
/// altogether comes back after the last import when something still uses it.
fn restore_imports(mut merged: Vec<Statement>, generated: &[Statement], existing: &[Statement]) -> Vec<Statement> {
    let referenced: BTreeSet<String> = merged
        .iter()
        .filter(|statement| !statement.is_import())
        .flat_map(|statement| statement.references().iter().cloned())
        .collect();

    let available = |key: &StatementKey| -> Vec<ImportSpecifier> {
        generated
            .iter()
            .chain(existing)
            .filter(|statement| statement.key() == key)
            .filter_map(Statement::specifiers)
            .flatten()
            .filter(|specifier| referenced.contains(&specifier.local))
            .cloned()
            .collect()
    };

    for statement in merged.iter_mut() {
        let Some(present) = statement.specifiers() else {
            continue;
        };

        let mut specifiers = present.to_vec();
        add_missing(&mut specifiers, available(statement.key()));

        if specifiers.len() > present.len()
            && let Some(restored) = statement.with_specifiers(specifiers)
        {
            tracing::debug!(key = ?statement.key(), "restoring referenced import specifiers");
            *statement = restored;
        }
    }

    let kept: HashSet<StatementKey> = merged.iter().map(|statement| statement.key().clone()).collect();
    let mut missing: Vec<Statement> = Vec::new();
    for template in generated.iter().chain(existing) {
        if template.specifiers().is_none()
            || kept.contains(template.key())
            || missing.iter().any(|statement| statement.key() == template.key())
        {
            continue;
        }

        let mut specifiers = Vec::new();
        add_missing(&mut specifiers, available(template.key()));

        if !specifiers.is_empty()
            && let Some(restored) = template.with_specifiers(specifiers)
        {
            tracing::debug!(key = ?template.key(), "restoring dropped import still in use");
            missing.push(restored);
        }
    }

    if !missing.is_empty() {
        let at = merged
            .iter()
            .rposition(Statement::is_import)
            .map_or(0, |index| index + 1);
        merged.splice(at..at, missing);
    }

    merged
}

fn add_missing(specifiers: &mut Vec<ImportSpecifier>, candidates: Vec<ImportSpecifier>) {
    for candidate in candidates {
        if specifiers.iter().all(|specifier| specifier.local != candidate.local) {
            specifiers.push(candidate);
        }
    }
}

/// Flags each statement with whether the generator owns its identity.
fn mark_owned(statements: Vec<Statement>, owned: &HashSet<StatementKey>) -> Vec<Statement> {
    statements
        .into_iter()
        .map(|statement| {
            let generated = statement.keys().any(|key| owned.contains(key));
            statement.mark_generated(generated)
        })
        .collect()
}

/// Reconciles generated content with the previous content of `path`.
///
/// `owned` lists the identities the generator may emit for this file. An
/// existing statement with one of them counts as generated output even when
/// the current run no longer produces it, so the default policy drops it.
/// Every statement of `generated` counts as owned regardless.
///
/// ## Returns
/// The generated content verbatim when there is no usable baseline: the file
/// did not exist, could not be read, or does not parse.
///
/// ## Errors
/// Returns an error if the generated content itself does not parse.
pub fn reconcile(
    path: &Path,
    generated: &str,
    existing: Option<&str>,
    owned: &HashSet<StatementKey>,
    resolver: &dyn ConflictResolver,
) -> Result<String, TableConfigError> {
    let Some(existing) = existing else {
        return Ok(generated.to_string());
    };

    let generated_statements = index(generated)?.ok_or_else(|| TableConfigError::ParseFailed {
        path: path.to_path_buf(),
    })?;

    let Some(existing_statements) = index(existing)? else {
        tracing::warn!(path = %path.display(), "existing file does not parse, regenerating from scratch");
        return Ok(generated.to_string());
    };

    let generated_statements: Vec<Statement> = generated_statements
        .into_iter()
        .map(|statement| statement.mark_generated(true))
        .collect();
    let existing_statements = mark_owned(existing_statements, owned);

    let merged = merge_statements(&generated_statements, &existing_statements, resolver);
    Ok(render_statements(&merged))
}

/// Reads the previous content of `path` with `reader`, then reconciles.
///
/// ## Errors
/// Returns an error if the generated content does not parse.
pub async fn reconcile_file<R: ExistingFileReader>(
    reader: &R,
    path: &Path,
    generated: &str,
    owned: &HashSet<StatementKey>,
    resolver: &dyn ConflictResolver,
) -> Result<String, TableConfigError> {
    let existing = reader.read(path).await;
    reconcile(path, generated, existing.as_deref(), owned, resolver)
}
