//! 批量组卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，负责按配置中的种子列表批量组卷。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、加载额外模板、创建引擎
//! 2. **并发控制**：使用 Semaphore 限制同时组卷的数量
//! 3. **全局统计**：汇总所有种子的处理结果
//!
//! 单份试卷的细节全部委托给 `ExamEngine`。

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{load_templates, Catalog, ExamLength};
use crate::orchestrator::exam_engine::{ExamEngine, ExamRequest};
use crate::utils::logging::{init_log_file, log_seeds_loaded, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    engine: Arc<ExamEngine>,
    length: ExamLength,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(
            config.max_concurrent_exams,
            &config.exam_template,
            &config.exam_length,
        );

        let length = ExamLength::parse(&config.exam_length)
            .ok_or_else(|| anyhow!("无法识别的试卷长度: {}", config.exam_length))?;

        let catalog = Catalog::clp1_at(&config.base_url)?;
        let templates = match &config.templates_file {
            Some(path) => load_templates(Path::new(path), &catalog)
                .await
                .with_context(|| format!("加载模板文件失败: {}", path))?,
            None => Vec::new(),
        };

        let engine = ExamEngine::builder(&config)
            .catalog(catalog)
            .templates(templates)
            .build()?;
        // 提前校验模板名，避免每个种子各报一次
        engine.template(&config.exam_template)?;

        Ok(Self {
            config,
            engine: Arc::new(engine),
            length,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let seeds = self.config.exam_seeds.clone();
        if seeds.is_empty() {
            warn!("⚠️ 没有配置种子，程序结束");
            return Ok(());
        }

        log_seeds_loaded(seeds.len(), self.config.max_concurrent_exams);

        let stats = self.process_all_seeds(seeds).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        if stats.failed > 0 {
            return Err(anyhow!("{} 份试卷组卷失败", stats.failed));
        }
        Ok(())
    }

    /// 并发处理所有种子
    async fn process_all_seeds(&self, seeds: Vec<String>) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_exams));
        let mut stats = ProcessingStats {
            total: seeds.len(),
            ..Default::default()
        };

        let mut handles = Vec::with_capacity(seeds.len());
        for (idx, seed) in seeds.into_iter().enumerate() {
            let exam_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let engine = self.engine.clone();
            let request = ExamRequest::new(self.config.exam_template.clone(), self.length, seed);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match engine.compose_and_render(&request).await {
                    Ok(artifact) => {
                        info!(
                            "[试卷 {}] ✅ 种子 {} -> {} ({} 字节)",
                            exam_index,
                            request.seed,
                            artifact.location,
                            artifact.bytes.len()
                        );
                        true
                    }
                    Err(e) => {
                        error!("[试卷 {}] ❌ 种子 {} 组卷失败: {}", exam_index, request.seed, e);
                        false
                    }
                }
            });
            handles.push((exam_index, handle));
        }

        for (exam_index, handle) in handles {
            match handle.await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("[试卷 {}] 任务执行失败: {}", exam_index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}
