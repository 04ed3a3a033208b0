//! 产物缓存 - 基础设施层
//!
//! 按 (模板, 长度, 种子) 缓存渲染产物，同一个键同一时刻只允许一个生产者。
//! 这是引擎内唯一的共享可变状态。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Artifact, ArtifactKey};

type Outcome = Option<Result<Artifact, Arc<EngineError>>>;

enum Slot {
    Ready(Artifact),
    /// 正在生产，等待者订阅该通道
    Pending(watch::Receiver<Outcome>),
}

enum Claim {
    Done(EngineResult<Artifact>),
    Lead(watch::Sender<Outcome>),
}

/// 单次生产的产物缓存
///
/// - 生产成功：结果永久保存，之后的请求直接命中
/// - 生产失败：错误转发给所有等待者，条目被移除，下次请求重新生产
/// - 生产者被取消：等待者重新选出生产者
#[derive(Default)]
pub struct ArtifactCache {
    slots: Mutex<HashMap<ArtifactKey, Slot>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 锁只在 map 操作期间持有，从不跨越 await
    fn slots(&self) -> MutexGuard<'_, HashMap<ArtifactKey, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 查询已完成的产物
    pub fn get(&self, key: &ArtifactKey) -> Option<Artifact> {
        match self.slots().get(key) {
            Some(Slot::Ready(artifact)) => Some(artifact.clone()),
            _ => None,
        }
    }

    /// 已完成的产物数量
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取或生产产物
    ///
    /// 同一个键的并发请求中只有一个会调用 `produce`，其余等待它的结果
    pub async fn get_or_create<F, Fut>(&self, key: &ArtifactKey, produce: F) -> EngineResult<Artifact>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<Artifact>>,
    {
        let tx = match self.claim(key).await {
            Claim::Done(result) => return result,
            Claim::Lead(tx) => tx,
        };

        debug!("缓存未命中，开始生产: {}", key);
        let guard = LeaderGuard {
            cache: self,
            key,
            tx: Some(tx),
        };

        let outcome = produce().await.map_err(Arc::new);
        guard.finish(outcome.clone());

        outcome.map_err(|source| EngineError::CacheProduce {
            key: key.to_string(),
            source,
        })
    }

    /// 命中、等待或成为生产者
    async fn claim(&self, key: &ArtifactKey) -> Claim {
        loop {
            let mut rx = {
                let mut slots = self.slots();
                match slots.get(key) {
                    Some(Slot::Ready(artifact)) => {
                        debug!("缓存命中: {}", key);
                        return Claim::Done(Ok(artifact.clone()));
                    }
                    Some(Slot::Pending(rx)) => rx.clone(),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        slots.insert(key.clone(), Slot::Pending(rx));
                        return Claim::Lead(tx);
                    }
                }
            };

            debug!("等待进行中的生产: {}", key);
            let outcome = match rx.wait_for(Option::is_some).await {
                Ok(value) => value.clone(),
                Err(_) => None,
            };

            match outcome {
                Some(Ok(artifact)) => return Claim::Done(Ok(artifact)),
                Some(Err(source)) => {
                    return Claim::Done(Err(EngineError::CacheProduce {
                        key: key.to_string(),
                        source,
                    }))
                }
                // 生产者被取消，重新竞争
                None => continue,
            }
        }
    }
}

/// 生产者守卫：未正常结束（被取消）时移除 Pending 条目
struct LeaderGuard<'a> {
    cache: &'a ArtifactCache,
    key: &'a ArtifactKey,
    tx: Option<watch::Sender<Outcome>>,
}

impl LeaderGuard<'_> {
    fn finish(mut self, outcome: Result<Artifact, Arc<EngineError>>) {
        {
            let mut slots = self.cache.slots();
            match &outcome {
                Ok(artifact) => {
                    slots.insert(self.key.clone(), Slot::Ready(artifact.clone()));
                }
                Err(_) => {
                    slots.remove(self.key);
                }
            }
        }
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(outcome));
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!("生产被取消: {}", self.key);
            self.cache.slots().remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentSummary, ExamLength};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn artifact(key: &ArtifactKey, body: &str) -> Artifact {
        Artifact {
            key: key.clone(),
            bytes: Arc::new(body.as_bytes().to_vec()),
            location: format!("mem://{}", key),
            summary: ContentSummary {
                groups: Vec::new(),
                byte_len: body.len(),
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn concurrent_requests_produce_once() {
        let cache = ArtifactCache::new();
        let key = ArtifactKey::new("short", ExamLength::Short, "abc");
        let key = &key;
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let requests = (0..8).map(|_| {
            cache.get_or_create(key, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(artifact(key, "exam"))
            })
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for r in &results {
            assert_eq!(r.as_ref().unwrap(), first);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(key).as_ref(), Some(first));
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_does_not_poison() {
        let cache = ArtifactCache::new();
        let key = ArtifactKey::new("short", ExamLength::Short, "boom");
        let key = &key;
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let requests = (0..4).map(|_| {
            cache.get_or_create(key, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Err(EngineError::render("unbalanced"))
            })
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for r in results {
            match r {
                Err(EngineError::CacheProduce { source, .. }) => {
                    assert!(matches!(*source, EngineError::Render { .. }))
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
        assert!(cache.is_empty());

        let retried = cache
            .get_or_create(key, move || async move { Ok(artifact(key, "second")) })
            .await
            .unwrap();
        assert_eq!(retried.bytes.as_slice(), b"second");
    }

    #[tokio::test]
    async fn different_keys_do_not_wait_on_each_other() {
        let cache = ArtifactCache::new();
        let slow = ArtifactKey::new("short", ExamLength::Short, "slow");
        let fast = ArtifactKey::new("short", ExamLength::Short, "fast");
        let (slow, fast) = (&slow, &fast);

        let slow_fut = cache.get_or_create(slow, move || async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(artifact(slow, "slow"))
        });
        let fast_fut = async {
            let started = std::time::Instant::now();
            let a = cache
                .get_or_create(fast, move || async move { Ok(artifact(fast, "fast")) })
                .await
                .unwrap();
            (a, started.elapsed())
        };

        let (slow_res, (fast_art, fast_elapsed)) = tokio::join!(slow_fut, fast_fut);
        assert!(slow_res.is_ok());
        assert_eq!(fast_art.bytes.as_slice(), b"fast");
        assert!(fast_elapsed < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn cancelled_leader_hands_over_to_waiter() {
        let cache = Arc::new(ArtifactCache::new());
        let key = ArtifactKey::new("short", ExamLength::Short, "cancel");

        let leader = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let key = &key;
                cache
                    .get_or_create(key, move || async move {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Ok(artifact(key, "never"))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        let waiter = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let key = &key;
                cache
                    .get_or_create(key, move || async move { Ok(artifact(key, "waiter")) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        leader.abort();

        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(result.bytes.as_slice(), b"waiter");
        assert_eq!(cache.len(), 1);
    }
}
