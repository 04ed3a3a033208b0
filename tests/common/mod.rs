#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clp_exam::{
    Catalog, Config, ContentSource, EngineError, EngineResult, ExamEngine, MemoryBlobStore,
    MemoryRecordSink,
};
use url::Url;

pub const BASE: &str = "http://clp.test/clp1/";
pub const PAGE_1_6: &str = "http://clp.test/clp1/exercises-6.html";
pub const PAGE_2_7: &str = "http://clp.test/clp1/exercises-12.html";

/// 内存内容源：按地址返回固定页面，并记录每个地址的请求次数
#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<String, String>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    /// 两个练习页，每个 Stage 的题数相同
    pub fn clp(per_stage: usize) -> Self {
        Self::new()
            .page(PAGE_1_6, exercise_page("1.6", &[per_stage, per_stage, per_stage]))
            .page(PAGE_2_7, exercise_page("2.7", &[per_stage, per_stage, per_stage]))
    }

    pub fn set_delay(&self, url: &str, delay: Option<Duration>) {
        let mut delays = self.delays.lock().unwrap();
        match delay {
            Some(d) => delays.insert(url.to_string(), d),
            None => delays.remove(url),
        };
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn get_html(&self, url: &Url) -> EngineResult<String> {
        let key = url.as_str().to_string();
        *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::fetch(key, "HTTP 404 Not Found"))
    }
}

/// 生成练习页：`counts[i]` 为 Stage i+1 的题数
pub fn exercise_page(section: &str, counts: &[usize]) -> String {
    let slug = section.replace('.', "-");
    let mut html = format!(
        "<html><body>\n<h2 class=\"heading\">Exercises for {}</h2>\n",
        section
    );
    for (stage, count) in counts.iter().enumerate() {
        let stage = stage + 1;
        html.push_str(&format!("<h3 class=\"heading\"><span class=\"title\">Stage {}</span></h3>\n", stage));
        for i in 1..=*count {
            html.push_str(&format!(
                concat!(
                    "<article class=\"exercise exercise-like\" id=\"ex-{slug}-{stage}-{i}\">\n",
                    "  <h4 class=\"heading\"><span class=\"codenumber\">{i}</span></h4>\n",
                    "  <div class=\"para\">Section {section}, stage {stage}, problem {i}: evaluate \\(x^{i}\\).</div>\n",
                    "  \\[ \\lim_{{x \\to {i}}} f(x) \\]\n",
                    "  <div class=\"solutions\"><details><summary>Answer</summary>{i}</details></div>\n",
                    "</article>\n"
                ),
                slug = slug,
                stage = stage,
                i = i,
                section = section,
            ));
        }
    }
    html.push_str("</body></html>\n");
    html
}

pub struct Harness {
    pub engine: ExamEngine,
    pub source: Arc<FakeSource>,
    pub blobs: Arc<MemoryBlobStore>,
    pub records: Arc<MemoryRecordSink>,
}

pub fn harness(source: FakeSource) -> Harness {
    harness_with(source, Arc::new(MemoryBlobStore::new()), None)
}

pub fn harness_with(
    source: FakeSource,
    blobs: Arc<MemoryBlobStore>,
    timeout: Option<Duration>,
) -> Harness {
    let source = Arc::new(source);
    let records = Arc::new(MemoryRecordSink::new());

    let mut builder = ExamEngine::builder(&Config::default())
        .catalog(Catalog::clp1_at(BASE).unwrap())
        .content_source(source.clone())
        .blob_store(blobs.clone())
        .record_sink(records.clone());
    if let Some(timeout) = timeout {
        builder = builder.request_timeout(timeout);
    }

    Harness {
        engine: builder.build().unwrap(),
        source,
        blobs,
        records,
    }
}
