//! 练习页解析
//!
//! 页面结构约定：
//! - `<h1>`..`<h6>` 中文字包含 `Stage N` 的为题组标题，题组延续到下一个题组标题
//! - 题组内 class 含 `exercise` 的 `<article>` 为一道题，`id` 属性为题目标识
//! - `<details>` 以及 class 含 solution / hint / answer 的元素之后的内容是解答，丢弃
//! - 题内 `\[..\]` 为行间公式，`<img>` 为图片，其余为题干

use regex::Regex;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Block, Exercise, Locator};
use crate::services::markup::MarkupConverter;

pub struct ExerciseParser {
    heading: Regex,
    stage: Regex,
    article: Regex,
    id_attr: Regex,
    class_attr: Regex,
    src_attr: Regex,
    solution_start: Regex,
    inner_heading: Regex,
    content_token: Regex,
    markup: MarkupConverter,
}

impl ExerciseParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            heading: Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>")?,
            stage: Regex::new(r"(?i)\bstage\s*(\d)\b")?,
            article: Regex::new(r"(?is)<article\b([^>]*)>(.*?)</article\s*>")?,
            id_attr: Regex::new(r#"(?i)\bid\s*=\s*["']([^"']*)["']"#)?,
            class_attr: Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#)?,
            src_attr: Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']*)["']"#)?,
            solution_start: Regex::new(
                r#"(?i)<details\b|<(?:div|section|aside)\b[^>]*\bclass\s*=\s*["'][^"']*\b(?:solutions?|hints?|answers?)\b"#,
            )?,
            inner_heading: Regex::new(r"(?is)<h[1-6]\b[^>]*>.*?</h[1-6]\s*>")?,
            content_token: Regex::new(r"(?is)\\\[(.*?)\\\]|<img\b([^>]*)>")?,
            markup: MarkupConverter::new()?,
        })
    }

    /// 解析练习页中指定题组的全部题目，顺序与页面一致
    pub fn parse(&self, html: &str, locator: &Locator) -> EngineResult<Vec<Exercise>> {
        let group = self.stage_group(html, locator)?;

        let mut exercises = Vec::new();
        for cap in self.article.captures_iter(group) {
            let attrs = cap.get(1).map_or("", |m| m.as_str());
            if !self.is_exercise(attrs) {
                continue;
            }
            let inner = cap.get(2).map_or("", |m| m.as_str());

            let ordinal = exercises.len() + 1;
            let id = self
                .id_attr
                .captures(attrs)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "{}-s{}-{}",
                        locator.section,
                        locator.difficulty.rank(),
                        ordinal
                    )
                });

            let body = self.parse_body(inner, locator)?;
            exercises.push(Exercise {
                id,
                section: locator.section.clone(),
                difficulty: locator.difficulty,
                body,
            });
        }

        debug!("{} 解析出 {} 道题", locator, exercises.len());
        Ok(exercises)
    }

    /// 截取指定 Stage 的题组片段
    fn stage_group<'h>(&self, html: &'h str, locator: &Locator) -> EngineResult<&'h str> {
        let wanted = locator.difficulty.rank();

        let stages: Vec<(u8, usize, usize)> = self
            .heading
            .captures_iter(html)
            .filter_map(|cap| {
                let whole = cap.get(0)?;
                let text = self.markup.decode_entities(&strip_tags(cap.get(1)?.as_str()));
                let rank = self.stage.captures(&text)?.get(1)?.as_str().parse().ok()?;
                Some((rank, whole.start(), whole.end()))
            })
            .collect();

        let Some(pos) = stages.iter().position(|(rank, _, _)| *rank == wanted) else {
            return Err(EngineError::parse(
                locator.page_url.as_str(),
                format!("未找到 Stage {} 题组标题", wanted),
            ));
        };

        let start = stages[pos].2;
        let end = stages.get(pos + 1).map_or(html.len(), |(_, s, _)| *s);
        Ok(&html[start..end])
    }

    fn is_exercise(&self, attrs: &str) -> bool {
        self.class_attr
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().split_whitespace().any(|t| t == "exercise"))
            .unwrap_or(false)
    }

    /// 题目内部：去掉解答与编号标题后按公式 / 图片切块
    fn parse_body(&self, inner: &str, locator: &Locator) -> EngineResult<Vec<Block>> {
        let statement = match self.solution_start.find(inner) {
            Some(m) => &inner[..m.start()],
            None => inner,
        };
        let statement = self.inner_heading.replace_all(statement, "");

        let mut body = Vec::new();
        let mut last = 0;
        for cap in self.content_token.captures_iter(&statement) {
            let Some(whole) = cap.get(0) else {
                continue;
            };
            self.push_text(&mut body, &statement[last..whole.start()]);
            last = whole.end();

            if let Some(math) = cap.get(1) {
                let math = self.markup.display_math(math.as_str());
                if !math.is_empty() {
                    body.push(Block::DisplayMath(math));
                }
            } else if let Some(attrs) = cap.get(2) {
                let Some(src) = self.src_attr.captures(attrs.as_str()).and_then(|c| c.get(1)) else {
                    continue;
                };
                let src = self.markup.decode_entities(src.as_str());
                let url = locator.page_url.join(src.trim()).map_err(|e| {
                    EngineError::parse(
                        locator.page_url.as_str(),
                        format!("无法解析图片地址 {}: {}", src, e),
                    )
                })?;
                body.push(Block::Image(url.to_string()));
            }
        }
        self.push_text(&mut body, &statement[last..]);

        Ok(body)
    }

    fn push_text(&self, body: &mut Vec<Block>, html: &str) {
        let text = self.markup.text(html);
        if !text.is_empty() {
            body.push(Block::Text(text));
        }
    }
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
