//! 试卷渲染服务 - 业务能力层
//!
//! 把组好的试卷转换为 LaTeX 文档，纯函数，不做任何 I/O

use std::fmt::Write as _;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Block, ComposedDocument, Exercise};
use crate::services::markup::escape_latex;

const PREAMBLE: &str = r"\documentclass[11pt]{article}
\usepackage[margin=2.5cm]{geometry}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{graphicx}
\usepackage{enumitem}
";

/// 试卷渲染服务
///
/// 职责：
/// - 校验每道题的标记是否完整（花括号配对、`$` 成对、公式非空）
/// - 每个题组一个无编号小节，题号在全卷内连续
/// - 题组之间分页
#[derive(Debug, Default, Clone)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// 渲染试卷，同一输入总是得到相同字节
    pub fn render(&self, doc: &ComposedDocument) -> EngineResult<Vec<u8>> {
        if doc.groups.is_empty() {
            return Err(EngineError::render("试卷不含任何题组"));
        }

        let mut out = String::new();
        out.push_str(PREAMBLE);
        out.push_str("\n\\title{Practice Exam}\n");
        let _ = writeln!(
            out,
            "\\date{{Template: {} \\quad Length: {} \\quad Seed: \\texttt{{{}}}}}",
            escape_latex(&doc.template),
            doc.length,
            escape_latex(&doc.seed)
        );
        out.push_str("\\author{}\n\n\\begin{document}\n\\maketitle\n");

        let mut number = 1;
        for (i, group) in doc.groups.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\\clearpage\n");
            }
            let _ = writeln!(out, "\n\\section*{{{}}}", escape_latex(&group.heading()));

            if group.exercises.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\\begin{{enumerate}}[start={}]", number);
            for exercise in &group.exercises {
                render_exercise(&mut out, exercise)?;
                number += 1;
            }
            out.push_str("\\end{enumerate}\n");
        }

        out.push_str("\n\\end{document}\n");

        debug!(
            "渲染完成: {} 个题组, {} 道题, {} 字节",
            doc.groups.len(),
            doc.exercise_count(),
            out.len()
        );
        Ok(out.into_bytes())
    }
}

fn render_exercise(out: &mut String, exercise: &Exercise) -> EngineResult<()> {
    let _ = writeln!(out, "\\item % {}", exercise.id.replace(['\n', '\r'], " "));

    for block in &exercise.body {
        match block {
            Block::Text(text) => {
                check_text(text).map_err(|reason| invalid(exercise, reason))?;
                let _ = writeln!(out, "{}\n", text);
            }
            Block::DisplayMath(math) => {
                let math = math.trim();
                if math.is_empty() {
                    return Err(invalid(exercise, "行间公式为空".to_string()));
                }
                if !braces_balanced(math) {
                    return Err(invalid(exercise, "行间公式花括号不配对".to_string()));
                }
                if math.contains(r"\\") && !math.contains(r"\begin{") {
                    let _ = writeln!(out, "\\[\n\\begin{{gathered}}\n{}\n\\end{{gathered}}\n\\]", math);
                } else {
                    let _ = writeln!(out, "\\[\n{}\n\\]", math);
                }
            }
            Block::Image(url) => {
                check_image(url).map_err(|reason| invalid(exercise, reason))?;
                let _ = writeln!(
                    out,
                    "\\begin{{center}}\n\\includegraphics[width=0.6\\linewidth]{{\\detokenize{{{}}}}}\n\\end{{center}}",
                    url
                );
            }
        }
    }
    Ok(())
}

fn invalid(exercise: &Exercise, reason: String) -> EngineError {
    EngineError::render(format!("题目 {}: {}", exercise.id, reason))
}

fn check_text(text: &str) -> Result<(), String> {
    if !braces_balanced(text) {
        return Err("题干花括号不配对".to_string());
    }
    if unescaped(text, '$') % 2 != 0 {
        return Err("题干 $ 不成对".to_string());
    }
    if has_display_toggle(text) {
        return Err("题干含有 $$".to_string());
    }
    Ok(())
}

/// `\detokenize` 只能处理已读入的记号，`%` `#` `\` 与花括号在读入时就会破坏结构
fn check_image(url: &str) -> Result<(), String> {
    match url.chars().find(|c| matches!(c, '%' | '#' | '\\' | '{' | '}')) {
        Some(c) => Err(format!("图片地址含有无法写入 LaTeX 的字符 {:?}: {}", c, url)),
        None => Ok(()),
    }
}

/// 两个相邻且未转义的 `$`
fn has_display_toggle(s: &str) -> bool {
    let mut escaped = false;
    let mut prev_dollar = false;
    for c in s.chars() {
        if escaped {
            escaped = false;
            prev_dollar = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                prev_dollar = false;
            }
            '$' if prev_dollar => return true,
            '$' => prev_dollar = true,
            _ => prev_dollar = false,
        }
    }
    false
}

/// 统计未被反斜杠转义的字符
fn unescaped(s: &str, target: char) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            count += 1;
        }
    }
    count
}

fn braces_balanced(s: &str) -> bool {
    let mut depth: i64 = 0;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, ExamLength, ExerciseGroup};

    fn exercise(id: &str, body: Vec<Block>) -> Exercise {
        Exercise {
            id: id.into(),
            section: "1.6".into(),
            difficulty: Difficulty::Stage1,
            body,
        }
    }

    fn doc(groups: Vec<Vec<Exercise>>) -> ComposedDocument {
        ComposedDocument {
            template: "short".into(),
            length: ExamLength::Short,
            seed: "abc_1".into(),
            groups: groups
                .into_iter()
                .enumerate()
                .map(|(i, exercises)| ExerciseGroup {
                    section: "1.6".into(),
                    topic: "Continuity".into(),
                    difficulty: Difficulty::from_rank(i as u8 + 1).unwrap_or(Difficulty::Stage1),
                    exercises,
                })
                .collect(),
        }
    }

    fn text(s: &str) -> Block {
        Block::Text(s.into())
    }

    #[test]
    fn numbering_runs_across_groups_with_page_breaks() {
        let d = doc(vec![
            vec![exercise("a", vec![text("One")]), exercise("b", vec![text("Two")])],
            vec![exercise("c", vec![text("Three $x$")])],
        ]);
        let out = String::from_utf8(Renderer::new().render(&d).unwrap()).unwrap();

        assert!(out.starts_with("\\documentclass"));
        assert!(out.contains("\\title{Practice Exam}"));
        assert!(out.contains(r"Seed: \texttt{abc\_1}"));
        assert!(out.contains("\\section*{1.6 Continuity (Stage 1)}"));
        assert!(out.contains("\\section*{1.6 Continuity (Stage 2)}"));
        assert!(out.contains("[start=1]"));
        assert!(out.contains("[start=3]"));
        assert_eq!(out.matches("\\clearpage").count(), 1);
        assert_eq!(out.matches("\\item").count(), 3);
        assert!(out.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn math_and_images_are_laid_out() {
        let d = doc(vec![vec![exercise(
            "m",
            vec![
                Block::DisplayMath(r"a = b \\ c = d".into()),
                Block::DisplayMath(r"\begin{cases} 1 \\ 0 \end{cases}".into()),
                Block::Image("https://example.org/g.png".into()),
            ],
        )]]);
        let out = String::from_utf8(Renderer::new().render(&d).unwrap()).unwrap();

        assert_eq!(out.matches("\\begin{gathered}").count(), 1);
        assert!(out.contains("\\[\n\\begin{cases} 1 \\\\ 0 \\end{cases}\n\\]"));
        assert!(out.contains("\\includegraphics[width=0.6\\linewidth]{\\detokenize{https://example.org/g.png}}"));
    }

    #[test]
    fn image_paths_with_tilde_and_underscore_are_protected() {
        let url = "https://personal.math.ubc.ca/~CLP/CLP1/clp_1_dc/images/graph_1.svg";
        let d = doc(vec![vec![exercise("img", vec![Block::Image(url.into())])]]);
        let out = String::from_utf8(Renderer::new().render(&d).unwrap()).unwrap();
        assert!(out.contains(&format!("{{\\detokenize{{{}}}}}", url)));
    }

    #[test]
    fn escaped_dollars_are_not_display_math() {
        assert!(check_text(r"costs \$\$5").is_ok());
        assert!(check_text("$a$ $b$").is_ok());
        assert!(check_text("$$a$$").is_err());
    }

    #[test]
    fn rendering_is_deterministic() {
        let d = doc(vec![vec![exercise("a", vec![text("Same")])]]);
        let r = Renderer::new();
        assert_eq!(r.render(&d).unwrap(), r.render(&d).unwrap());
    }

    #[test]
    fn malformed_markup_names_the_exercise() {
        let r = Renderer::new();
        let cases = vec![
            exercise("brace", vec![text(r"\emph{open")]),
            exercise("dollar", vec![text("cost $5")]),
            exercise("empty-math", vec![Block::DisplayMath("  ".into())]),
            exercise("math-brace", vec![Block::DisplayMath(r"\frac{1}{2".into())]),
            exercise("double-dollar", vec![text("Let $$ be blank and $$ too.")]),
            exercise(
                "spaced-image",
                vec![Block::Image("https://example.org/clp/images/graph%201.svg".into())],
            ),
            exercise("hash-image", vec![Block::Image("https://example.org/g.svg#part".into())]),
        ];
        for ex in cases {
            let id = ex.id.clone();
            let err = r.render(&doc(vec![vec![ex]])).unwrap_err();
            assert!(matches!(err, EngineError::Render { .. }));
            assert!(err.to_string().contains(&id), "{}", err);
        }

        assert!(r.render(&doc(vec![vec![exercise("ok", vec![text(r"costs \$5")])]])).is_ok());
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(Renderer::new().render(&doc(vec![])).is_err());
    }
}
