/// 题目难度（CLP 练习题的 Stage）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Difficulty {
    /// 基础题
    Stage1 = 1,
    /// 中等题
    Stage2 = 2,
    /// 提高题
    Stage3 = 3,
}

impl Difficulty {
    /// 全部难度，按升序排列
    pub const ALL: [Difficulty; 3] = [Difficulty::Stage1, Difficulty::Stage2, Difficulty::Stage3];

    /// 获取难度等级（1..3）
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Stage1 => "Stage 1",
            Difficulty::Stage2 => "Stage 2",
            Difficulty::Stage3 => "Stage 3",
        }
    }

    /// 从等级解析难度
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(Difficulty::Stage1),
            2 => Some(Difficulty::Stage2),
            3 => Some(Difficulty::Stage3),
            _ => None,
        }
    }

    /// 从字符串解析难度，支持 "1" / "stage 1" / "stage1"
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        let digits = normalized
            .strip_prefix("stage")
            .unwrap_or(&normalized)
            .trim();
        digits.parse::<u8>().ok().and_then(Self::from_rank)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rank_and_stage_names() {
        assert_eq!(Difficulty::parse("2"), Some(Difficulty::Stage2));
        assert_eq!(Difficulty::parse("Stage 3"), Some(Difficulty::Stage3));
        assert_eq!(Difficulty::parse("stage1"), Some(Difficulty::Stage1));
        assert_eq!(Difficulty::parse("4"), None);
        assert_eq!(Difficulty::parse("hard"), None);
    }

    #[test]
    fn orders_by_rank() {
        assert!(Difficulty::Stage1 < Difficulty::Stage2);
        assert_eq!(Difficulty::ALL.iter().map(|d| d.rank()).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
