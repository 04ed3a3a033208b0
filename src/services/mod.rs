//! 业务能力层（Services Layer）
//!
//! 每个服务只提供一种能力：抓取、解析、抽题、模板展开、渲染、记录。
//! 不持有流程状态，不关心调用顺序。

pub mod exercise_fetcher;
pub mod exercise_parser;
pub mod markup;
pub mod record_writer;
pub mod renderer;
pub mod sampler;
pub mod template_resolver;

pub use exercise_fetcher::ExerciseFetcher;
pub use exercise_parser::ExerciseParser;
pub use markup::MarkupConverter;
pub use record_writer::{JsonlRecordWriter, MemoryRecordSink, RecordSink};
pub use renderer::Renderer;
pub use sampler::{derive_seed, sample};
pub use template_resolver::TemplateResolver;
