//! 抽题服务 - 业务能力层
//!
//! 纯函数：给定题池、数量与种子，确定性地无放回抽取

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};
use crate::models::Difficulty;

/// 每个抽题请求的子种子
///
/// `occurrence` 为同一（章节, 难度）在本次模板展开中出现的序号，通常为 0
pub fn derive_seed(seed: &str, section: &str, difficulty: Difficulty, occurrence: usize) -> String {
    format!("{}/{}/{}/{}", seed, section, difficulty.rank(), occurrence)
}

/// 由种子字符串构造随机数生成器，每次调用都是全新状态
///
/// 直接使用 ChaCha12，算法随依赖版本固定，重启或升级后抽题结果不变
fn rng_for(seed: &str) -> ChaCha12Rng {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    ChaCha12Rng::from_seed(bytes)
}

/// 从题池中无放回地抽取 `n` 个元素
///
/// 按下标均匀抽样；`n` 超过题池大小时返回 `InsufficientPool`，不截断
pub fn sample<T: Clone>(pool: &[T], n: usize, seed: &str) -> EngineResult<Vec<T>> {
    if n > pool.len() {
        return Err(EngineError::InsufficientPool {
            requested: n,
            available: pool.len(),
        });
    }

    let mut rng = rng_for(seed);
    let picked = rand::seq::index::sample(&mut rng, pool.len(), n);
    Ok(picked.into_iter().map(|i| pool[i].clone()).collect())
}
