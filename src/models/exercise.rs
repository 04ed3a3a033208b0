use serde::{Deserialize, Serialize};

use crate::models::Difficulty;

/// 题目内容块，保持原页面中的先后顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// 题干文字（已转换为 LaTeX 标记）
    Text(String),
    /// 行间公式（不含 `\[ \]` 定界符）
    DisplayMath(String),
    /// 图片绝对地址
    Image(String),
}

/// 一道练习题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// 题目标识，同一题池内唯一且稳定
    pub id: String,
    pub section: String,
    pub difficulty: Difficulty,
    pub body: Vec<Block>,
}

impl Exercise {
    /// 题干文字，多个文字块以空行连接
    pub fn prompt(&self) -> String {
        self.body
            .iter()
            .filter_map(|b| match b {
                Block::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 全部行间公式
    pub fn display_math(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|b| match b {
                Block::DisplayMath(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 全部图片地址
    pub fn images(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|b| match b {
                Block::Image(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }
}
