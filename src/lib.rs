//! # CLP Exam
//!
//! 从 CLP-1 微积分教材的在线练习页抽题，按模板组成练习试卷并渲染为 LaTeX。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `ContentSource` - 按地址取回 HTML（每个引擎一个 reqwest Client）
//! - `ArtifactCache` - 渲染产物缓存，同一个键同一时刻只生产一次
//! - `BlobStore` - 产物存储
//!
//! ### ② 业务能力层（Services）
//! - `ExerciseFetcher` / `ExerciseParser` - 取回并解析一个题组
//! - `sample` - 按种子确定性抽题
//! - `TemplateResolver` - 模板展开为抽题请求
//! - `Renderer` - 渲染 LaTeX
//! - `RecordSink` - 交出试卷记录
//!
//! ### ③ 流程层（Workflow）
//! - `ComposeFlow` - 去重抓取 + 抽题，组成一份试卷
//!
//! ### ④ 编排层（Orchestration）
//! - `ExamEngine` - 对外入口（组卷并渲染、读取产物）
//! - `App` - 按种子列表批量组卷
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{DrawFailure, EngineError, EngineResult};
pub use infrastructure::{ArtifactCache, BlobStore, ContentSource, FsBlobStore, HttpContentSource, MemoryBlobStore};
pub use models::{Artifact, ArtifactKey, Catalog, Difficulty, ExamLength, ExamRecord, Exercise, Template};
pub use orchestrator::{App, ExamEngine, ExamRequest};
pub use services::{JsonlRecordWriter, MemoryRecordSink, RecordSink};
pub use workflow::ComposeFlow;
