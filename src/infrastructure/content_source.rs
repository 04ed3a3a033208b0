//! 内容源 - 基础设施层
//!
//! 持有网络客户端，只暴露“按地址取回 HTML”的能力

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};

/// 远程页面来源
///
/// 职责：
/// - 只做 HTTP GET
/// - 不认识 Exercise / Template
/// - 不做解析
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_html(&self, url: &Url) -> EngineResult<String>;
}

/// 基于 reqwest 的内容源
///
/// 每个引擎实例持有自己的 Client，不使用进程级全局会话
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: Client,
}

impl HttpContentSource {
    /// 按配置创建客户端（超时、User-Agent）
    pub fn new(config: &Config) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// 使用已有客户端
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn get_html(&self, url: &Url) -> EngineResult<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| EngineError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::fetch(url.as_str(), format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EngineError::fetch(url.as_str(), e))?;

        debug!("GET {} 完成，页面长度: {} 字节", url, body.len());
        Ok(body)
    }
}
