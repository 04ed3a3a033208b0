//! 产物存储 - 基础设施层
//!
//! 渲染产物按键交给外部存储，引擎不负责保留策略

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// 产物存储
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 保存产物，返回存储位置
    async fn put(&self, key: &str, bytes: &[u8]) -> EngineResult<String>;

    /// 读取产物，不存在时返回 None
    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
}

/// 本地目录存储：`{dir}/{key}.tex`
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.tex", key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> EngineResult<String> {
        fs::create_dir_all(&self.dir).await?;

        // 先写临时文件再改名，读者不会看到写了一半的产物
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.tex.partial", key));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;

        debug!("产物已写入: {} ({} 字节)", path.display(), bytes.len());
        Ok(path.to_string_lossy().to_string())
    }

    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// 内存存储，用于嵌入和测试
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已保存的产物数量
    pub fn len(&self) -> usize {
        self.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.blobs.lock().map_err(|_| EngineError::Storage {
            reason: "内存存储锁已损坏".to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> EngineResult<String> {
        self.lock()?.insert(key.to_string(), bytes.to_vec());
        Ok(format!("memory://{}", key))
    }

    async fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }
}
