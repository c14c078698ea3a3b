pub mod catalog;
pub mod question;

pub use catalog::{Catalog, CatalogError};
pub use question::{Dependency, QuestionKind, QuestionSpec, StepSpec};
