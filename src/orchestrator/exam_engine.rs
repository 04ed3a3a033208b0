//! 组卷引擎 - 编排层
//!
//! ## 职责
//!
//! 对外唯一入口：接收（模板, 长度, 种子），返回渲染产物。
//!
//! ## 处理顺序
//!
//! 1. 展开模板（未知模板直接报错，不进入缓存）
//! 2. 缓存命中则直接返回
//! 3. 否则由唯一的生产者完成：组卷（带总超时）→ 渲染 → 存储 → 写记录
//!
//! 生产失败或超时不会留下缓存条目，下一次请求重新生产。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::infrastructure::{ArtifactCache, BlobStore, ContentSource, FsBlobStore, HttpContentSource};
use crate::models::{Artifact, ArtifactKey, Catalog, ContentSummary, DrawRequest, ExamLength, ExamRecord, Template};
use crate::services::{JsonlRecordWriter, RecordSink, Renderer, TemplateResolver};
use crate::workflow::ComposeFlow;

/// 组卷请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRequest {
    pub template: String,
    pub length: ExamLength,
    pub seed: String,
}

impl ExamRequest {
    pub fn new(template: impl Into<String>, length: ExamLength, seed: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            length,
            seed: seed.into(),
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.template.clone(), self.length, self.seed.clone())
    }
}

/// 组卷引擎
///
/// 每个实例持有自己的网络客户端与缓存，实例之间不共享状态
pub struct ExamEngine {
    resolver: TemplateResolver,
    flow: ComposeFlow,
    renderer: Renderer,
    cache: ArtifactCache,
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordSink>,
    request_timeout: Duration,
}

impl ExamEngine {
    /// 按配置组装默认组件（HTTP 内容源、本地目录存储、JSONL 记录）
    pub fn new(config: &Config) -> EngineResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: &Config) -> ExamEngineBuilder {
        ExamEngineBuilder {
            config: config.clone(),
            catalog: None,
            source: None,
            blobs: None,
            records: None,
            templates: Vec::new(),
            request_timeout: None,
        }
    }

    /// 组卷并渲染
    pub async fn compose_and_render(&self, request: &ExamRequest) -> EngineResult<Artifact> {
        let draws = self.resolver.resolve(&request.template, request.length)?;
        let key = request.key();

        self.cache
            .get_or_create(&key, || self.produce(&key, request, draws))
            .await
    }

    /// 读取已生成的产物：先查缓存，再查存储
    pub async fn read_artifact(&self, key: &ArtifactKey) -> EngineResult<Arc<Vec<u8>>> {
        if let Some(artifact) = self.cache.get(key) {
            debug!("从缓存读取产物: {}", key);
            return Ok(artifact.bytes);
        }

        match self.blobs.get(&key.storage_name()).await? {
            Some(bytes) => {
                debug!("从存储读取产物: {}", key);
                Ok(Arc::new(bytes))
            }
            None => Err(EngineError::not_found(format!("产物 {}", key))),
        }
    }

    /// 缓存中的产物（不触发生产）
    pub fn cached(&self, key: &ArtifactKey) -> Option<Artifact> {
        self.cache.get(key)
    }

    /// 已缓存的产物数量
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn template(&self, name: &str) -> EngineResult<&Template> {
        self.resolver.template(name)
    }

    // ========== 生产产物 ==========

    async fn produce(
        &self,
        key: &ArtifactKey,
        request: &ExamRequest,
        draws: Vec<DrawRequest>,
    ) -> EngineResult<Artifact> {
        info!("[种子 {}] 📦 开始组卷: {} ({})", request.seed, request.template, request.length);

        let compose = self
            .flow
            .compose(&request.template, request.length, &draws, &request.seed);
        let doc = tokio::time::timeout(self.request_timeout, compose)
            .await
            .map_err(|_| {
                warn!("[种子 {}] ⚠️ 组卷超时，放弃本次结果", request.seed);
                EngineError::Timeout {
                    seconds: self.request_timeout.as_secs(),
                }
            })??;

        let bytes = self.renderer.render(&doc)?;
        let location = self.blobs.put(&key.storage_name(), &bytes).await?;

        let artifact = Artifact {
            key: key.clone(),
            summary: ContentSummary::of(&doc, bytes.len()),
            bytes: Arc::new(bytes),
            location,
            created_at: Utc::now(),
        };
        if let Err(e) = self.records.emit(&ExamRecord::from_artifact(&artifact)).await {
            warn!(
                "[种子 {}] ⚠️ 写入试卷记录失败，存储中的产物 {} 没有对应记录: {}",
                request.seed,
                key.storage_name(),
                e
            );
            return Err(e);
        }

        info!("[种子 {}] ✓ 产物已保存: {}", request.seed, artifact.location);
        Ok(artifact)
    }
}

/// 引擎构建器，未指定的组件按配置创建默认实现
pub struct ExamEngineBuilder {
    config: Config,
    catalog: Option<Catalog>,
    source: Option<Arc<dyn ContentSource>>,
    blobs: Option<Arc<dyn BlobStore>>,
    records: Option<Arc<dyn RecordSink>>,
    templates: Vec<Template>,
    request_timeout: Option<Duration>,
}

impl ExamEngineBuilder {
    /// 覆盖配置中的总超时
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn content_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn record_sink(mut self, records: Arc<dyn RecordSink>) -> Self {
        self.records = Some(records);
        self
    }

    /// 额外模板，同名覆盖内置模板
    pub fn templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn build(self) -> EngineResult<ExamEngine> {
        let config = self.config;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Catalog::clp1_at(&config.base_url)?,
        };
        let source: Arc<dyn ContentSource> = match self.source {
            Some(source) => source,
            None => Arc::new(HttpContentSource::new(&config)?),
        };
        let blobs: Arc<dyn BlobStore> = match self.blobs {
            Some(blobs) => blobs,
            None => Arc::new(FsBlobStore::new(&config.output_dir)),
        };
        let records: Arc<dyn RecordSink> = match self.records {
            Some(records) => records,
            None => Arc::new(JsonlRecordWriter::with_path(&config.records_file)),
        };
        let request_timeout = self
            .request_timeout
            .unwrap_or_else(|| Duration::from_secs(config.request_timeout_secs));

        Ok(ExamEngine {
            resolver: TemplateResolver::with_templates(self.templates),
            flow: ComposeFlow::new(Arc::new(catalog), source, config.max_concurrent_fetches)?,
            renderer: Renderer::new(),
            cache: ArtifactCache::new(),
            blobs,
            records,
            request_timeout,
        })
    }
}
