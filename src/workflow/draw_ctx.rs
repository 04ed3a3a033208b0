//! 抽题上下文
//!
//! 封装"我正在为哪个种子处理第几个抽题请求"这一信息

use std::fmt::Display;

use crate::models::DrawRequest;
use crate::services::derive_seed;

/// 抽题上下文
#[derive(Debug, Clone)]
pub struct DrawCtx {
    /// 本次组卷的种子
    pub seed: String,

    /// 抽题请求在展开结果中的位置（从1开始，仅用于日志显示）
    pub position: usize,

    /// 同一（章节, 难度）在此之前出现的次数
    pub occurrence: usize,

    pub draw: DrawRequest,
}

impl DrawCtx {
    pub fn new(seed: impl Into<String>, position: usize, occurrence: usize, draw: DrawRequest) -> Self {
        Self {
            seed: seed.into(),
            position,
            occurrence,
            draw,
        }
    }

    /// 本抽题请求使用的子种子
    pub fn sub_seed(&self) -> String {
        derive_seed(
            &self.seed,
            &self.draw.section,
            self.draw.difficulty,
            self.occurrence,
        )
    }
}

impl Display for DrawCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[种子 {} 抽题#{} {} {}]",
            self.seed, self.position, self.draw.section, self.draw.difficulty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    #[test]
    fn sub_seed_includes_occurrence() {
        let draw = DrawRequest::new("2.7", Difficulty::Stage2, 1);
        let first = DrawCtx::new("abc", 3, 0, draw.clone());
        let repeat = DrawCtx::new("abc", 5, 1, draw);

        assert_eq!(first.sub_seed(), "abc/2.7/2/0");
        assert_ne!(first.sub_seed(), repeat.sub_seed());
        assert_eq!(first.to_string(), "[种子 abc 抽题#3 2.7 Stage 2]");
    }
}
