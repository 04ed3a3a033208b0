//! CLP 教材目录
//!
//! 静态参考数据：章节列表、难度、以及每个（章节, 难度）对应的远程练习题位置。
//! 进程启动时构建一次，之后只读。

use std::collections::BTreeMap;

use url::Url;

use crate::error::{EngineError, EngineResult};
use crate::models::Difficulty;

/// CLP-1 默认站点
pub const DEFAULT_BASE_URL: &str = "https://personal.math.ubc.ca/~CLP/CLP1/clp_1_dc/";

/// CLP-1 全部章节（编号, 主题），按教材顺序
const CLP1_SECTIONS: &[(&str, &str)] = &[
    // 第 0 章：基础
    ("0.1", "numbers"),
    ("0.2", "sets"),
    ("0.3", "other important sets"),
    ("0.4", "functions"),
    ("0.5", "parsing formulas"),
    ("0.6", "inverse functions"),
    // 第 1 章：极限
    ("1.1", "drawing tangents"),
    ("1.2", "computing velocity"),
    ("1.3", "limits"),
    ("1.4", "limit laws"),
    ("1.5", "limits at infinity"),
    ("1.6", "continuity"),
    ("1.7", "formal limits"),
    ("1.8", "formal infinite limits"),
    ("1.9", "proving limit laws"),
    // 第 2 章：导数
    ("2.1", "revisiting tangent lines"),
    ("2.2", "definition of the derivative"),
    ("2.3", "interpretations of the derivative"),
    ("2.4", "arithmetic of derivatives"),
    ("2.5", "proofs of the arithmetic of derivatives"),
    ("2.6", "using the arithmetic of derivatives"),
    ("2.7", "derivatives, exponential functions"),
    ("2.8", "derivatives of trigonometric functions"),
    ("2.9", "chain rule"),
    ("2.10", "natural logarithm"),
    ("2.11", "implicit differentiation"),
    ("2.12", "inverse trigonometric functions"),
    ("2.13", "mean value theorem"),
    ("2.14", "higher order derivatives"),
    ("2.15", "limit of the differential"),
    // 第 3 章：导数的应用
    ("3.1", "velocity and acceleration"),
    ("3.2", "related rates"),
    ("3.3", "exponential growth and decay"),
    ("3.4", "taylor polynomials"),
    ("3.5", "optimization"),
    ("3.6", "sketching graphs"),
    ("3.7", "l'hopital's rule"),
];

/// 已配置练习题页面的章节 → 练习页编号
static EXERCISE_PAGES: phf::Map<&'static str, u32> = phf::phf_map! {
    "1.6" => 6,
    "2.7" => 12,
};

/// 教材章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 章节编号，如 "1.6"
    pub code: String,
    /// 主题
    pub topic: String,
    /// 练习页编号（没有配置时为 None）
    pub exercise_page: Option<u32>,
}

/// 远程练习题组的位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    /// 所属章节编号
    pub section: String,
    /// 练习页绝对地址，也用作图片相对路径的基准
    pub page_url: Url,
    /// 需要的题组
    pub difficulty: Difficulty,
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}] {}", self.section, self.difficulty, self.page_url)
    }
}

/// 目录
#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<Section>,
    locators: BTreeMap<(String, Difficulty), Locator>,
}

impl Catalog {
    /// 以默认站点构建 CLP-1 目录
    pub fn clp1() -> EngineResult<Self> {
        Self::clp1_at(DEFAULT_BASE_URL)
    }

    /// 以指定站点构建 CLP-1 目录
    pub fn clp1_at(base_url: &str) -> EngineResult<Self> {
        let base = normalize_base(base_url)?;

        let sections: Vec<Section> = CLP1_SECTIONS
            .iter()
            .map(|(code, topic)| Section {
                code: code.to_string(),
                topic: topic.to_string(),
                exercise_page: EXERCISE_PAGES.get(*code).copied(),
            })
            .collect();

        let mut locators = BTreeMap::new();
        for section in &sections {
            let Some(page) = section.exercise_page else {
                continue;
            };
            let page_url = base.join(&format!("exercises-{}.html", page))?;
            for difficulty in Difficulty::ALL {
                locators.insert(
                    (section.code.clone(), difficulty),
                    Locator {
                        section: section.code.clone(),
                        page_url: page_url.clone(),
                        difficulty,
                    },
                );
            }
        }

        Ok(Self { sections, locators })
    }

    /// 全部章节（有序）
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// 按编号查找章节
    pub fn section(&self, code: &str) -> EngineResult<&Section> {
        self.sections
            .iter()
            .find(|s| s.code == code)
            .ok_or_else(|| EngineError::not_found(format!("章节 {}", code)))
    }

    /// 查找（章节, 难度）的练习题位置
    pub fn locator(&self, section: &str, difficulty: Difficulty) -> EngineResult<&Locator> {
        self.locators
            .get(&(section.to_string(), difficulty))
            .ok_or_else(|| EngineError::not_found(format!("章节 {} {} 的练习题", section, difficulty)))
    }
}

/// 保证基准地址以 `/` 结尾，否则 join 会替换掉最后一段
fn normalize_base(base_url: &str) -> EngineResult<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?)
}
