//! 试卷记录写入服务 - 业务能力层
//!
//! 只负责"把一条试卷记录交出去"的能力，不关心流程

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::ExamRecord;

/// 试卷记录的去处（外部数据库、文件等）
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, record: &ExamRecord) -> EngineResult<()>;
}

/// JSON Lines 记录文件
///
/// 职责：
/// - 每条记录一行 JSON，追加写入
/// - 只处理单条记录
pub struct JsonlRecordWriter {
    path: PathBuf,
}

impl JsonlRecordWriter {
    pub fn new() -> Self {
        Self::with_path("exam_records.jsonl")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for JsonlRecordWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSink for JsonlRecordWriter {
    async fn emit(&self, record: &ExamRecord) -> EngineResult<()> {
        debug!(
            "写入试卷记录: {} | 种子 {} | {}",
            record.name, record.seed, record.length
        );

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// 内存记录（测试与嵌入使用）
#[derive(Default)]
pub struct MemoryRecordSink {
    records: Mutex<Vec<ExamRecord>>,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExamRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn emit(&self, record: &ExamRecord) -> EngineResult<()> {
        let mut records = self.records.lock().map_err(|_| EngineError::Storage {
            reason: "记录锁已损坏".to_string(),
        })?;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentSummary, ExamLength};
    use chrono::Utc;

    fn record(seed: &str) -> ExamRecord {
        ExamRecord {
            name: "short".into(),
            seed: seed.into(),
            length: ExamLength::Short,
            rendered_content_summary: ContentSummary {
                groups: vec![],
                byte_len: 10,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn jsonl_writer_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let writer = JsonlRecordWriter::with_path(&path);

        writer.emit(&record("abc")).await.unwrap();
        writer.emit(&record("xyz")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "short");
        assert_eq!(first["seed"], "abc");
        assert_eq!(first["length"], "short");
        assert_eq!(first["renderedContentSummary"]["byteLen"], 10);
        assert!(first["createdAt"].is_string());
    }

    #[tokio::test]
    async fn memory_sink_keeps_records_in_order() {
        let sink = MemoryRecordSink::new();
        sink.emit(&record("a")).await.unwrap();
        sink.emit(&record("b")).await.unwrap();
        let seeds: Vec<String> = sink.records().into_iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec!["a", "b"]);
    }
}
