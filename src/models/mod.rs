pub mod artifact;
pub mod catalog;
pub mod difficulty;
pub mod document;
pub mod exercise;
pub mod loaders;
pub mod template;

pub use artifact::{Artifact, ArtifactKey, ContentSummary, ExamRecord, GroupSummary};
pub use catalog::{Catalog, Locator, Section};
pub use difficulty::Difficulty;
pub use document::{ComposedDocument, ExerciseGroup};
pub use exercise::{Block, Exercise};
pub use loaders::{load_templates, parse_templates};
pub use template::{builtin_templates, DifficultyCounts, DrawRequest, ExamLength, Template};
