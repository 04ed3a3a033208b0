use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{ComposedDocument, Difficulty, ExamLength};

/// 产物缓存键：（模板, 长度, 种子）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub template: String,
    pub length: ExamLength,
    pub seed: String,
}

impl ArtifactKey {
    pub fn new(template: impl Into<String>, length: ExamLength, seed: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            length,
            seed: seed.into(),
        }
    }

    /// 存储用名称，种子以哈希表示，保证可用作文件名
    pub fn storage_name(&self) -> String {
        let digest = Sha256::digest(self.seed.as_bytes());
        let hash: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}-{}-{}", self.template, self.length, hash)
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_name())
    }
}

/// 单个题组的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub section: String,
    pub difficulty: Difficulty,
    pub exercise_ids: Vec<String>,
}

/// 渲染内容摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub groups: Vec<GroupSummary>,
    pub byte_len: usize,
}

impl ContentSummary {
    pub fn of(doc: &ComposedDocument, byte_len: usize) -> Self {
        Self {
            groups: doc
                .groups
                .iter()
                .map(|g| GroupSummary {
                    section: g.section.clone(),
                    difficulty: g.difficulty,
                    exercise_ids: g.exercises.iter().map(|e| e.id.clone()).collect(),
                })
                .collect(),
            byte_len,
        }
    }
}

/// 渲染产物
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub key: ArtifactKey,
    pub bytes: Arc<Vec<u8>>,
    /// 存储位置（由产物存储返回）
    pub location: String,
    pub summary: ContentSummary,
    pub created_at: DateTime<Utc>,
}

/// 交给外部存储的试卷记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub name: String,
    pub seed: String,
    pub length: ExamLength,
    pub rendered_content_summary: ContentSummary,
    pub created_at: DateTime<Utc>,
}

impl ExamRecord {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            name: artifact.key.template.clone(),
            seed: artifact.key.seed.clone(),
            length: artifact.key.length,
            rendered_content_summary: artifact.summary.clone(),
            created_at: artifact.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_name_is_stable_and_filesystem_safe() {
        let key = ArtifactKey::new("short", ExamLength::Short, "a/b c?");
        let name = key.storage_name();
        assert_eq!(name, key.clone().storage_name());
        assert!(name.starts_with("short-short-"));
        assert_eq!(name.len(), "short-short-".len() + 16);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn different_seeds_give_different_names() {
        let a = ArtifactKey::new("short", ExamLength::Short, "abc");
        let b = ArtifactKey::new("short", ExamLength::Short, "abd");
        let c = ArtifactKey::new("short", ExamLength::Long, "abc");
        assert_ne!(a.storage_name(), b.storage_name());
        assert_ne!(a.storage_name(), c.storage_name());
    }
}
