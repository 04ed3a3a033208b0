//! HTML → LaTeX 标记转换
//!
//! 只处理单段文字 / 单个公式，不关心题目结构

use regex::{Captures, Regex};

const EMPH_OPEN: char = '\u{1}';
const EMPH_CLOSE: char = '\u{2}';
const BOLD_OPEN: char = '\u{3}';
const BOLD_CLOSE: char = '\u{4}';

/// 标记转换器，正则只编译一次
pub struct MarkupConverter {
    inline_math: Regex,
    block_close: Regex,
    line_break: Regex,
    emph: Regex,
    bold: Regex,
    any_tag: Regex,
    numeric_entity: Regex,
    hex_entity: Regex,
    row_break: Regex,
    paragraph_break: Regex,
}

impl MarkupConverter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            inline_math: Regex::new(r"(?s)\\\((.*?)\\\)")?,
            block_close: Regex::new(r"(?i)</(?:p|div|li|ul|ol|blockquote|table|tr)\s*>")?,
            line_break: Regex::new(r"(?i)<br\s*/?>")?,
            emph: Regex::new(r"(?is)<(em|i)\b[^>]*>(.*?)</(?:em|i)\s*>")?,
            bold: Regex::new(r"(?is)<(strong|b)\b[^>]*>(.*?)</(?:strong|b)\s*>")?,
            any_tag: Regex::new(r"(?s)<[^>]*>")?,
            numeric_entity: Regex::new(r"&#(\d+);")?,
            hex_entity: Regex::new(r"(?i)&#x([0-9a-f]+);")?,
            row_break: Regex::new(r"\\(?:cr|newline)\b")?,
            paragraph_break: Regex::new(r"\n[ \t\r]*\n")?,
        })
    }

    /// 题干 HTML 片段 → LaTeX 文字
    ///
    /// 行内公式 `\(..\)` 原样变为 `$..$`，其余文字转义 LaTeX 特殊字符
    pub fn text(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for cap in self.inline_math.captures_iter(html) {
            let (Some(whole), Some(math)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            out.push_str(&self.plain(&html[last..whole.start()]));
            last = whole.end();

            // 空公式写成 `$$` 会变成行间公式开关，直接丢弃
            let math = self.decode_entities(math.as_str());
            let math = math.trim();
            if math.is_empty() {
                continue;
            }
            out.push('$');
            out.push_str(math);
            out.push('$');
        }
        out.push_str(&self.plain(&html[last..]));

        self.normalize_whitespace(&out)
    }

    /// 行间公式：解码实体，统一换行写法为 `\\`
    pub fn display_math(&self, raw: &str) -> String {
        let decoded = self.decode_entities(raw);
        self.row_break
            .replace_all(&decoded, r"\\")
            .trim()
            .to_string()
    }

    /// 解码常见 HTML 实体，`&amp;` 最后处理
    pub fn decode_entities(&self, s: &str) -> String {
        let s = self.numeric_entity.replace_all(s, |c: &Captures| {
            decode_code_point(&c[1], 10).unwrap_or_else(|| c[0].to_string())
        });
        let s = self.hex_entity.replace_all(&s, |c: &Captures| {
            decode_code_point(&c[1], 16).unwrap_or_else(|| c[0].to_string())
        });
        s.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&minus;", "-")
            .replace("&amp;", "&")
    }

    /// 不含公式的文字片段
    fn plain(&self, html: &str) -> String {
        let s = self.block_close.replace_all(html, "\n\n");
        let s = self.line_break.replace_all(&s, "\n");
        let s = self.emph.replace_all(&s, |c: &Captures| {
            format!("{}{}{}", EMPH_OPEN, &c[2], EMPH_CLOSE)
        });
        let s = self.bold.replace_all(&s, |c: &Captures| {
            format!("{}{}{}", BOLD_OPEN, &c[2], BOLD_CLOSE)
        });
        let s = self.any_tag.replace_all(&s, "");
        let s = self.decode_entities(&s);
        escape_latex(&s)
    }

    fn normalize_whitespace(&self, s: &str) -> String {
        self.paragraph_break
            .split(s)
            .map(|para| para.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|para| !para.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn decode_code_point(digits: &str, radix: u32) -> Option<String> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .map(|c| c.to_string())
}

/// 转义 LaTeX 特殊字符，并把强调占位符换成命令
pub(crate) fn escape_latex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' | '}' | '%' | '#' | '&' | '_' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            EMPH_OPEN => out.push_str(r"\emph{"),
            BOLD_OPEN => out.push_str(r"\textbf{"),
            EMPH_CLOSE | BOLD_CLOSE => out.push('}'),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv() -> MarkupConverter {
        MarkupConverter::new().unwrap()
    }

    #[test]
    fn drops_empty_inline_math() {
        let out = conv().text(r"<p>Let \(\) be blank and \( \) too, but keep \(x\).</p>");
        assert_eq!(out, "Let be blank and too, but keep $x$.");
        assert!(!out.contains("$$"));
    }

    #[test]
    fn converts_inline_math_and_emphasis() {
        let out = conv().text(
            r#"<p>Find <em>all</em> values of \(a &lt; b\) so that <b>f</b> is continuous.</p>"#,
        );
        assert_eq!(out, r"Find \emph{all} values of $a < b$ so that \textbf{f} is continuous.");
    }

    #[test]
    fn escapes_specials_outside_math_only() {
        let out = conv().text(r"50% of \(x_1 &amp; y\) &amp; 3_rd #1");
        assert_eq!(out, r"50\% of $x_1 & y$ \& 3\_rd \#1");
    }

    #[test]
    fn keeps_paragraph_breaks_and_collapses_whitespace() {
        let out = conv().text("<p>First   line\n more</p>\n\n<div class=\"para\">Second</div>");
        assert_eq!(out, "First line more\n\nSecond");
    }

    #[test]
    fn display_math_normalizes_row_breaks() {
        let out = conv().display_math(r" f(x) = \begin{cases} x &amp; x &lt; 0 \cr 1 &amp; x \geq 0 \end{cases} ");
        assert_eq!(out, r"f(x) = \begin{cases} x & x < 0 \\ 1 & x \geq 0 \end{cases}");
        assert_eq!(conv().display_math(r"a \newline b"), r"a \\ b");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(conv().decode_entities("&#8217;s &#x3C0;"), "\u{2019}s \u{3c0}");
    }
}
