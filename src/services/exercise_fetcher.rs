//! 题池抓取服务 - 业务能力层
//!
//! 只负责“给定位置取回题池”的能力，不关心抽题与组卷

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::infrastructure::ContentSource;
use crate::models::{Exercise, Locator};
use crate::services::exercise_parser::ExerciseParser;

/// 题池抓取服务
///
/// 职责：
/// - 每次调用只发一次 GET
/// - 解析出题组内的全部题目，顺序与页面一致
/// - 失败时带上位置信息记录日志，错误原样返回
pub struct ExerciseFetcher {
    source: Arc<dyn ContentSource>,
    parser: ExerciseParser,
}

impl ExerciseFetcher {
    pub fn new(source: Arc<dyn ContentSource>) -> EngineResult<Self> {
        Ok(Self {
            source,
            parser: ExerciseParser::new()?,
        })
    }

    /// 抓取并解析一个题组
    pub async fn fetch(&self, locator: &Locator) -> EngineResult<Vec<Exercise>> {
        debug!("抓取题池: {}", locator);

        let html = self.source.get_html(&locator.page_url).await.map_err(|e| {
            warn!("⚠️ 抓取失败 {}: {}", locator, e);
            e
        })?;

        let exercises = self.parser.parse(&html, locator).map_err(|e| {
            warn!("⚠️ 解析失败 {}: {}", locator, e);
            e
        })?;

        info!("✓ {} 题池共 {} 道题", locator, exercises.len());
        Ok(exercises)
    }
}
