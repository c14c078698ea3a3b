#![allow(missing_docs)]

pub mod answers;
pub mod export;
pub mod flow;
pub mod image;
pub mod render;
pub mod settings;
pub mod spec;
pub mod store;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, AnswerValue, Entry, Record};
pub use export::{ExportError, ExportMode, Exporter, default_file_name, export_html, write_export};
pub use flow::{Action, BlockState, FlowEngine, FlowError, Input, Progress, Prompt, Transition};
pub use image::{ImageError, ImageUpload, encode_data_uri, read_upload};
pub use render::{
    Document, EntryBlock, ListFragment, Section, SectionBody, SectionKind, is_list_field, render,
    render_list_fragment, render_text,
};
pub use settings::{ImageAlign, ListMode, Settings, Theme};
pub use spec::{Catalog, CatalogError, Dependency, QuestionKind, QuestionSpec, StepSpec};
pub use store::{DirStore, KeyValueStore, MemoryStore, StoreError, StoreFormat};
pub use validate::{ValidationError, ValidationResult, validate};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility, visible_answers};
