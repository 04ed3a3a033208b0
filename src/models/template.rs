use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Difficulty;

/// 试卷长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamLength {
    Short,
    Long,
}

impl ExamLength {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamLength::Short => "short",
            ExamLength::Long => "long",
        }
    }

    /// 从长度标志解析（不区分大小写，支持 s / l 缩写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" | "s" => Some(ExamLength::Short),
            "long" | "l" => Some(ExamLength::Long),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExamLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每个难度抽取的题数
pub type DifficultyCounts = BTreeMap<Difficulty, usize>;

/// 试卷模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    /// 章节顺序即试卷中的顺序
    pub sections: Vec<String>,
    pub short: DifficultyCounts,
    pub long: DifficultyCounts,
}

impl Template {
    /// 指定长度下的题数表
    pub fn counts(&self, length: ExamLength) -> &DifficultyCounts {
        match length {
            ExamLength::Short => &self.short,
            ExamLength::Long => &self.long,
        }
    }
}

/// 单个抽题请求：某章节某难度抽多少道
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrawRequest {
    pub section: String,
    pub difficulty: Difficulty,
    pub count: usize,
}

impl DrawRequest {
    pub fn new(section: impl Into<String>, difficulty: Difficulty, count: usize) -> Self {
        Self {
            section: section.into(),
            difficulty,
            count,
        }
    }
}

impl std::fmt::Display for DrawRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} x{}", self.section, self.difficulty, self.count)
    }
}

/// 内置模板
pub fn builtin_templates() -> Vec<Template> {
    let counts = |pairs: &[(Difficulty, usize)]| pairs.iter().copied().collect::<DifficultyCounts>();
    let sections = vec!["1.6".to_string(), "2.7".to_string()];

    vec![
        Template {
            name: "short".to_string(),
            sections: sections.clone(),
            short: counts(&[(Difficulty::Stage1, 2), (Difficulty::Stage2, 1)]),
            long: counts(&[
                (Difficulty::Stage1, 3),
                (Difficulty::Stage2, 2),
                (Difficulty::Stage3, 1),
            ]),
        },
        Template {
            name: "long".to_string(),
            sections,
            short: counts(&[
                (Difficulty::Stage1, 3),
                (Difficulty::Stage2, 2),
                (Difficulty::Stage3, 1),
            ]),
            long: counts(&[
                (Difficulty::Stage1, 4),
                (Difficulty::Stage2, 3),
                (Difficulty::Stage3, 2),
            ]),
        },
    ]
}
