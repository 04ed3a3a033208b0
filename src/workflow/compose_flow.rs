//! 组卷流程 - 流程层
//!
//! 核心职责：把一组抽题请求变成一份组好的试卷
//!
//! 流程顺序：
//! 1. 收集不同的（章节, 难度），每个只抓取一次，并发但有上限
//! 2. 按抽题请求顺序，用各自的子种子从题池中抽题
//! 3. 任何一个抽题请求失败，整份试卷失败并列出全部失败项

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{DrawFailure, EngineError, EngineResult};
use crate::infrastructure::ContentSource;
use crate::models::{Catalog, ComposedDocument, Difficulty, DrawRequest, ExamLength, Exercise, ExerciseGroup};
use crate::services::{sample, ExerciseFetcher};
use crate::utils::truncate_text;
use crate::workflow::draw_ctx::DrawCtx;

type PoolKey = (String, Difficulty);

/// 组卷流程
///
/// - 编排抓取与抽题
/// - 不持有缓存，不做渲染
/// - 只依赖业务能力（services）
pub struct ComposeFlow {
    catalog: Arc<Catalog>,
    fetcher: ExerciseFetcher,
    max_concurrent_fetches: usize,
}

impl ComposeFlow {
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn ContentSource>,
        max_concurrent_fetches: usize,
    ) -> EngineResult<Self> {
        Ok(Self {
            catalog,
            fetcher: ExerciseFetcher::new(source)?,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        })
    }

    pub async fn compose(
        &self,
        template: &str,
        length: ExamLength,
        draws: &[DrawRequest],
        seed: &str,
    ) -> EngineResult<ComposedDocument> {
        let pools = self.fetch_pools(draws).await;

        let mut occurrences: HashMap<PoolKey, usize> = HashMap::new();
        let mut groups = Vec::with_capacity(draws.len());
        let mut failures = Vec::new();

        for (i, draw) in draws.iter().enumerate() {
            let key = (draw.section.clone(), draw.difficulty);
            let occurrence = occurrences.entry(key.clone()).or_insert(0);
            let ctx = DrawCtx::new(seed, i + 1, *occurrence, draw.clone());
            *occurrence += 1;

            match self.draw_group(&ctx, pools.get(&key)) {
                Ok(group) => groups.push(group),
                Err(error) => {
                    warn!("{} ⚠️ 抽题失败: {}", ctx, error);
                    failures.push(DrawFailure {
                        section: draw.section.clone(),
                        difficulty: draw.difficulty,
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(EngineError::Compose { failures });
        }

        let doc = ComposedDocument {
            template: template.to_string(),
            length,
            seed: seed.to_string(),
            groups,
        };
        info!(
            "[种子 {}] ✓ 组卷完成: {} 个题组, {} 道题",
            seed,
            doc.groups.len(),
            doc.exercise_count()
        );
        Ok(doc)
    }

    // ========== 抓取题池 ==========

    /// 每个不同的（章节, 难度）抓取一次，结果按键保存
    async fn fetch_pools(&self, draws: &[DrawRequest]) -> HashMap<PoolKey, EngineResult<Vec<Exercise>>> {
        let mut keys: Vec<PoolKey> = Vec::new();
        for draw in draws {
            let key = (draw.section.clone(), draw.difficulty);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        debug!("需要抓取 {} 个题池", keys.len());

        stream::iter(keys)
            .map(|key| async move {
                let result = match self.catalog.locator(&key.0, key.1) {
                    Ok(locator) => self.fetcher.fetch(locator).await,
                    Err(e) => Err(e),
                };
                (key, result)
            })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await
    }

    // ========== 抽题 ==========

    fn draw_group(
        &self,
        ctx: &DrawCtx,
        pool: Option<&EngineResult<Vec<Exercise>>>,
    ) -> EngineResult<ExerciseGroup> {
        let pool = match pool {
            Some(Ok(pool)) => pool,
            Some(Err(e)) => return Err(e.clone()),
            None => {
                return Err(EngineError::not_found(format!(
                    "{} {} 的题池",
                    ctx.draw.section, ctx.draw.difficulty
                )))
            }
        };

        let exercises = sample(pool, ctx.draw.count, &ctx.sub_seed())?;
        for exercise in &exercises {
            debug!("{} 抽中 {}: {}", ctx, exercise.id, truncate_text(&exercise.prompt(), 40));
        }

        let topic = self.catalog.section(&ctx.draw.section)?.topic.clone();
        Ok(ExerciseGroup {
            section: ctx.draw.section.clone(),
            topic,
            difficulty: ctx.draw.difficulty,
            exercises,
        })
    }
}
