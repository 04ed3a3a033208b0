//! 模板展开服务 - 业务能力层

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{builtin_templates, DrawRequest, ExamLength, Template};

/// 模板展开服务
///
/// 把（模板名, 长度）展开为有序的抽题请求列表：
/// 章节按模板顺序，章节内难度升序，题数为 0 的略过
pub struct TemplateResolver {
    templates: BTreeMap<String, Template>,
}

impl TemplateResolver {
    /// 只含内置模板
    pub fn new() -> Self {
        Self::with_templates(Vec::new())
    }

    /// 内置模板 + 额外模板（同名覆盖内置）
    pub fn with_templates(extra: Vec<Template>) -> Self {
        let templates = builtin_templates()
            .into_iter()
            .chain(extra)
            .map(|t| (t.name.clone(), t))
            .collect();
        Self { templates }
    }

    /// 查找模板
    pub fn template(&self, name: &str) -> EngineResult<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| EngineError::UnknownTemplate {
                name: name.to_string(),
            })
    }

    /// 全部模板名称
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// 展开模板
    ///
    /// 该长度下没有任何正题数时返回 `NotFound`，不会产生空试卷
    pub fn resolve(&self, name: &str, length: ExamLength) -> EngineResult<Vec<DrawRequest>> {
        let template = self.template(name)?;
        let counts = template.counts(length);

        let draws: Vec<DrawRequest> = template
            .sections
            .iter()
            .flat_map(|section| {
                counts
                    .iter()
                    .filter(|(_, count)| **count > 0)
                    .map(move |(difficulty, count)| DrawRequest::new(section.clone(), *difficulty, *count))
            })
            .collect();

        if draws.is_empty() {
            return Err(EngineError::not_found(format!(
                "模板 {} 在 {} 长度下没有任何题目",
                name, length
            )));
        }

        debug!("模板 {} ({}) 展开为 {} 个抽题请求", name, length, draws.len());
        Ok(draws)
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}
