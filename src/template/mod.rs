//! # Template Module
//!
//! Path templates compile resource and operation paths such as
//! `/widgets/{id}` into anchored regexes and extract variables from
//! request paths.
//!
//! ## Matching
//!
//! A template only has to match a prefix of the path. Whatever follows is
//! kept as the *final group* and handed to the next stage: resource
//! templates leave a suffix for operation templates, and locator operations
//! leave a suffix for the sub-resource they return.
//!
//! | Template          | Path             | Variables     | Remaining |
//! |-------------------|------------------|---------------|-----------|
//! | `/widgets`        | `/widgets/7`     |               | `/7`      |
//! | `/{id}`           | `/7`             | `id = 7`      |           |
//! | `/files/{p: .+}`  | `/files/a/b.txt` | `p = a/b.txt` |           |
//!
//! ## Specificity
//!
//! When several templates match, the one with more literal characters wins;
//! ties go to fewer variables, then to more regex-constrained variables.

mod core;
#[cfg(test)]
mod tests;

pub use core::{MultiMap, PathTemplate, PathValues, TemplateError};
