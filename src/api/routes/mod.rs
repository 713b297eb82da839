//! Route handlers, one module per resource.

pub mod health;
pub mod note_types;
pub mod opponents;
pub mod records;
pub mod stats;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_support;
