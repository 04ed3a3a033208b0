use crate::models::{Difficulty, ExamLength, Exercise};

/// 一个抽题请求对应的题组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseGroup {
    pub section: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub exercises: Vec<Exercise>,
}

impl ExerciseGroup {
    /// 题组标题，如 "1.6 continuity (Stage 1)"
    pub fn heading(&self) -> String {
        format!("{} {} ({})", self.section, self.topic, self.difficulty)
    }
}

/// 组好的试卷，只在一次渲染中存活
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    pub template: String,
    pub length: ExamLength,
    pub seed: String,
    /// 顺序与抽题请求顺序一致
    pub groups: Vec<ExerciseGroup>,
}

impl ComposedDocument {
    /// 题目总数
    pub fn exercise_count(&self) -> usize {
        self.groups.iter().map(|g| g.exercises.len()).sum()
    }
}
