use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::models::Difficulty;

/// 组卷引擎错误类型
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// 章节 / 难度 / 资源不存在
    #[error("未找到: {what}")]
    NotFound { what: String },

    /// 模板名称无法识别
    #[error("未知模板: {name}")]
    UnknownTemplate { name: String },

    /// 网络请求失败（含超时、非 2xx 状态码）
    #[error("抓取失败 ({url}): {reason}")]
    Fetch { url: String, reason: String },

    /// 页面结构无法识别
    #[error("页面解析失败 ({url}): {reason}")]
    Parse { url: String, reason: String },

    /// 抽题数量超过题池大小
    #[error("题池不足: 需要 {requested} 道，仅有 {available} 道")]
    InsufficientPool { requested: usize, available: usize },

    /// 中间标记格式错误
    #[error("渲染失败: {reason}")]
    Render { reason: String },

    /// 一个或多个抽题请求失败
    #[error("组卷失败: {}", DrawFailures(.failures))]
    Compose { failures: Vec<DrawFailure> },

    /// 整个请求超时
    #[error("请求超时 ({seconds} 秒)")]
    Timeout { seconds: u64 },

    /// 缓存生产过程中的错误（转发给所有等待者）
    #[error("生成缓存产物失败 ({key}): {source}")]
    CacheProduce {
        key: String,
        #[source]
        source: Arc<EngineError>,
    },

    /// 产物存储 / 记录写入失败
    #[error("存储失败: {reason}")]
    Storage { reason: String },
}

/// 单个抽题请求的失败信息
#[derive(Debug, Clone)]
pub struct DrawFailure {
    pub section: String,
    pub difficulty: Difficulty,
    pub error: EngineError,
}

impl fmt::Display for DrawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.section, self.difficulty, self.error)
    }
}

struct DrawFailures<'a>(&'a [DrawFailure]);

impl fmt::Display for DrawFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl EngineError {
    /// 是否属于调用方输入错误（4xx 语义）
    pub fn is_client_error(&self) -> bool {
        match self {
            EngineError::NotFound { .. }
            | EngineError::UnknownTemplate { .. }
            | EngineError::InsufficientPool { .. } => true,
            EngineError::Compose { failures } => {
                !failures.is_empty() && failures.iter().all(|f| f.error.is_client_error())
            }
            EngineError::CacheProduce { source, .. } => source.is_client_error(),
            _ => false,
        }
    }

    /// 调用方是否可以稍后重试
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Fetch { .. }
            | EngineError::Parse { .. }
            | EngineError::Timeout { .. }
            | EngineError::Storage { .. } => true,
            EngineError::Compose { failures } => failures.iter().any(|f| f.error.is_retryable()),
            EngineError::CacheProduce { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// 剥掉缓存包装后的原始错误
    pub fn root_cause(&self) -> &EngineError {
        match self {
            EngineError::CacheProduce { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_default();
        EngineError::Fetch {
            url,
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Storage {
            reason: format!("JSON 序列化失败: {}", err),
        }
    }
}

impl From<regex::Error> for EngineError {
    fn from(err: regex::Error) -> Self {
        EngineError::Parse {
            url: String::new(),
            reason: format!("正则表达式无效: {}", err),
        }
    }
}

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> Self {
        EngineError::NotFound {
            what: format!("无效的地址: {}", err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl EngineError {
    /// 创建“未找到”错误
    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound { what: what.into() }
    }

    /// 创建抓取错误
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        EngineError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建解析错误
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// 创建渲染错误
    pub fn render(reason: impl Into<String>) -> Self {
        EngineError::Render {
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 引擎结果类型
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_error_lists_every_failed_draw() {
        let err = EngineError::Compose {
            failures: vec![
                DrawFailure {
                    section: "1.6".into(),
                    difficulty: Difficulty::Stage1,
                    error: EngineError::InsufficientPool {
                        requested: 3,
                        available: 1,
                    },
                },
                DrawFailure {
                    section: "2.7".into(),
                    difficulty: Difficulty::Stage2,
                    error: EngineError::fetch("http://x/exercises-12.html", "timed out"),
                },
            ],
        };

        let text = err.to_string();
        assert!(text.contains("[1.6 Stage 1]"));
        assert!(text.contains("[2.7 Stage 2]"));
        assert!(!err.is_client_error());
        assert!(err.is_retryable());
    }

    #[test]
    fn cache_errors_classify_by_their_source() {
        let err = EngineError::CacheProduce {
            key: "short-short-00".into(),
            source: Arc::new(EngineError::UnknownTemplate {
                name: "nope".into(),
            }),
        };
        assert!(err.is_client_error());
        assert!(!err.is_retryable());
    }
}
