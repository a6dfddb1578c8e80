//! TypeScript source model for generated table configuration.
//!
//! The generator never concatenates TypeScript by hand: builders produce
//! [`Expr`] values, the assembler wraps them in [`Declaration`]s and collects
//! an [`ImportSet`], and the [`print`] module renders everything to text.

pub mod declaration;
pub mod expr;
pub mod imports;
pub mod print;

pub use declaration::Declaration;
pub use expr::{Expr, Parameter, Property, TypeNode};
pub use imports::ImportSet;
pub use print::{print_expr, print_type};
