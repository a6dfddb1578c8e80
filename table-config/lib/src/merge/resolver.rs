use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::statement::Statement;

/// Decides what survives when a generated statement meets an existing one.
///
/// Either side may be absent: `generated` is `None` for statements only the
/// existing file has, `existing` is `None` for newly generated statements.
/// Returning `None` drops the statement from the output.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, generated: Option<&Statement>, existing: Option<&Statement>) -> Option<Statement>;
}

impl<F> ConflictResolver for F
where
    F: Fn(Option<&Statement>, Option<&Statement>) -> Option<Statement> + Send + Sync,
{
    fn resolve(&self, generated: Option<&Statement>, existing: Option<&Statement>) -> Option<Statement> {
        self(generated, existing)
    }
}

/// The built-in resolvers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Generated statements win. Statements only the existing file has are
    /// kept when hand-written and dropped when they are stale generated
    /// output ([`Statement::is_generated`]).
    #[default]
    PreferGenerated,
    /// Output is exactly the generated content.
    Regenerate,
    /// Existing statements win; new statements are added.
    PreferExisting,
}

impl ConflictResolver for ConflictPolicy {
    fn resolve(&self, generated: Option<&Statement>, existing: Option<&Statement>) -> Option<Statement> {
        match self {
            Self::PreferGenerated => generated
                .or(existing.filter(|statement| !statement.is_generated()))
                .cloned(),
            Self::Regenerate => generated.cloned(),
            Self::PreferExisting => existing.or(generated).cloned(),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreferGenerated => "prefer-generated",
            Self::Regenerate => "regenerate",
            Self::PreferExisting => "prefer-existing",
        };
        f.write_str(name)
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefer-generated" => Ok(Self::PreferGenerated),
            "regenerate" => Ok(Self::Regenerate),
            "prefer-existing" => Ok(Self::PreferExisting),
            other => Err(format!(
                "unknown conflict policy `{other}` (expected prefer-generated, regenerate or prefer-existing)"
            )),
        }
    }
}
