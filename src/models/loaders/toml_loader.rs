use crate::models::{Catalog, Difficulty, DifficultyCounts, Template};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// 模板文件结构
#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: Vec<TemplateDef>,
}

#[derive(Debug, Deserialize)]
struct TemplateDef {
    name: String,
    sections: Vec<String>,
    #[serde(default)]
    short: BTreeMap<String, usize>,
    #[serde(default)]
    long: BTreeMap<String, usize>,
}

/// 从 TOML 文件加载模板
pub async fn load_templates(toml_file_path: &Path, catalog: &Catalog) -> Result<Vec<Template>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取模板文件: {}", toml_file_path.display()))?;

    let templates = parse_templates(&content, catalog)
        .with_context(|| format!("无法解析模板文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "从 {} 加载了 {} 个模板",
        toml_file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy(),
        templates.len()
    );

    Ok(templates)
}

/// 解析模板 TOML 文本
pub fn parse_templates(content: &str, catalog: &Catalog) -> Result<Vec<Template>> {
    let file: TemplateFile = toml::from_str(content)?;

    file.templates
        .into_iter()
        .map(|def| {
            let name = def.name.clone();
            to_template(def, catalog).with_context(|| format!("模板 {} 无效", name))
        })
        .collect()
}

fn to_template(def: TemplateDef, catalog: &Catalog) -> Result<Template> {
    if def.name.is_empty()
        || !def
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!("模板名称只能包含字母、数字、- 和 _: {:?}", def.name);
    }

    for code in &def.sections {
        catalog.section(code)?;
    }

    Ok(Template {
        name: def.name,
        sections: def.sections,
        short: to_counts(&def.short).context("short 题数表无效")?,
        long: to_counts(&def.long).context("long 题数表无效")?,
    })
}

fn to_counts(raw: &BTreeMap<String, usize>) -> Result<DifficultyCounts> {
    raw.iter()
        .map(|(key, count)| {
            let difficulty =
                Difficulty::parse(key).with_context(|| format!("未知难度: {}", key))?;
            Ok((difficulty, *count))
        })
        .collect()
}
