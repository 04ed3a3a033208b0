//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `exam_engine` - 组卷引擎
//! - 对外入口：组卷并渲染、读取产物
//! - 持有产物缓存，保证同一个键只生产一次
//! - 控制单次请求的总超时
//!
//! ### `batch_processor` - 批量组卷处理器
//! - 管理命令行程序生命周期（初始化、运行、统计）
//! - 控制并发数量（Semaphore）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理多个种子)
//!     ↓
//! exam_engine (处理一份试卷，缓存)
//!     ↓
//! workflow::ComposeFlow (抓取 + 抽题)
//!     ↓
//! services (能力层：fetch / parse / sample / render / record)
//!     ↓
//! infrastructure (基础设施：ContentSource / ArtifactCache / BlobStore)
//! ```

pub mod batch_processor;
pub mod exam_engine;

pub use batch_processor::App;
pub use exam_engine::{ExamEngine, ExamEngineBuilder, ExamRequest};
