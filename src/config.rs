use crate::models::catalog::DEFAULT_BASE_URL;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 教材站点根地址
    pub base_url: String,
    /// 单次抓取超时（秒）
    pub fetch_timeout_secs: u64,
    /// 单次组卷请求总超时（秒）
    pub request_timeout_secs: u64,
    /// 单次组卷内同时抓取的题池数量
    pub max_concurrent_fetches: usize,
    /// 同时组卷的试卷数量
    pub max_concurrent_exams: usize,
    /// 渲染产物目录
    pub output_dir: String,
    /// 试卷记录文件（JSON Lines）
    pub records_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 额外模板文件（TOML）
    pub templates_file: Option<String>,
    // --- 批量组卷参数 ---
    pub exam_template: String,
    pub exam_length: String,
    pub exam_seeds: Vec<String>,
    /// 请求头 User-Agent
    pub user_agent: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout_secs: 20,
            request_timeout_secs: 120,
            max_concurrent_fetches: 4,
            max_concurrent_exams: 4,
            output_dir: "output_exams".to_string(),
            records_file: "exam_records.jsonl".to_string(),
            output_log_file: "output.txt".to_string(),
            templates_file: None,
            exam_template: "short".to_string(),
            exam_length: "short".to_string(),
            exam_seeds: vec!["abc".to_string()],
            user_agent: concat!("clp_exam/", env!("CARGO_PKG_VERSION")).to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("CLP_BASE_URL").unwrap_or(default.base_url),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fetch_timeout_secs),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            max_concurrent_fetches: std::env::var("MAX_CONCURRENT_FETCHES").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_fetches),
            max_concurrent_exams: std::env::var("MAX_CONCURRENT_EXAMS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_exams),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            records_file: std::env::var("RECORDS_FILE").unwrap_or(default.records_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            templates_file: std::env::var("TEMPLATES_FILE").ok().filter(|v| !v.trim().is_empty()).or(default.templates_file),
            exam_template: std::env::var("EXAM_TEMPLATE").unwrap_or(default.exam_template),
            exam_length: std::env::var("EXAM_LENGTH").unwrap_or(default.exam_length),
            exam_seeds: std::env::var("EXAM_SEEDS").ok().map(|v| split_seeds(&v)).filter(|s| !s.is_empty()).unwrap_or(default.exam_seeds),
            user_agent: std::env::var("USER_AGENT").unwrap_or(default.user_agent),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

/// 逗号分隔的种子列表，去掉空白项
fn split_seeds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_split_on_commas() {
        assert_eq!(split_seeds(" abc, ,xyz,"), vec!["abc", "xyz"]);
        assert!(split_seeds(" , ").is_empty());
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.fetch_timeout_secs, 20);
        assert_eq!(c.request_timeout_secs, 120);
        assert_eq!(c.max_concurrent_fetches, 4);
        assert_eq!(c.exam_seeds, vec!["abc"]);
        assert!(c.templates_file.is_none());
    }
}
