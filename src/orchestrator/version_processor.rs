//! 版本管理服务 - 编排层
//!
//! ## 职责
//!
//! 面向调用方的全部版本操作：批量生成、列表、预览、删除、答案键。
//!
//! ## 并发模型
//!
//! 1. **纯计算并行**：每次试验只依赖题库快照和自己的随机源，
//!    在 `spawn_blocking` 上并行执行，由 Semaphore 限制并发数
//! 2. **持久化串行**：同一测试的批量生成持有该测试的异步锁，
//!    试验按顺序逐个落库，版本号由存储在写锁内分配
//! 3. **随机源**：主随机源只用来派生每次试验的种子，
//!    设置 `RNG_SEED` 时整批结果可复现

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::{Clock, SystemClock, TtlCache, VersionStore};
use crate::models::{
    AnswerKey, GeneratedVersion, MaterializedVersion, QuestionBank, TestId, VersionId,
    VersionPreview, VersionSummary,
};
use crate::services::{materializer, reconstruct_answer_key, render_preview};
use crate::workflow::{ProcessResult, VersionCtx, VersionFlow};

/// 版本管理服务
pub struct VersionService<S: VersionStore> {
    store: Arc<S>,
    max_versions_per_batch: u32,
    max_concurrent_trials: usize,
    verbose_logging: bool,
    test_locks: Mutex<HashMap<TestId, Arc<AsyncMutex<()>>>>,
    bank_cache: TtlCache<TestId, Arc<QuestionBank>>,
    seeder: Mutex<StdRng>,
}

impl<S: VersionStore> VersionService<S> {
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// 使用自定义时钟创建（题库缓存按该时钟过期）
    pub fn with_clock(store: Arc<S>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let seeder = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            store,
            max_versions_per_batch: config.max_versions_per_batch,
            max_concurrent_trials: config.max_concurrent_trials,
            verbose_logging: config.verbose_logging,
            test_locks: Mutex::new(HashMap::new()),
            bank_cache: TtlCache::with_clock(
                Duration::from_secs(config.bank_cache_ttl_secs),
                clock,
            ),
            seeder: Mutex::new(seeder),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 批量生成版本
    ///
    /// 返回成功持久化的版本；写入失败的试验被跳过，
    /// 因此结果可能少于 `version_count`。
    pub async fn generate_versions(
        &self,
        test_id: TestId,
        version_count: u32,
        questions_per_version: Option<usize>,
    ) -> AppResult<Vec<GeneratedVersion>> {
        if !(1..=self.max_versions_per_batch).contains(&version_count) {
            return Err(ValidationError::VersionCountOutOfRange {
                requested: version_count,
                max: self.max_versions_per_batch,
            }
            .into());
        }

        let bank = self.bank(test_id).await?;
        materializer::check_preconditions(&bank, questions_per_version)?;

        let lock = self.test_lock(test_id);
        let generated = {
            let _guard = lock.lock().await;
            self.generate_locked(test_id, bank, version_count, questions_per_version)
                .await
        };
        drop(lock);
        self.release_test_lock(test_id);

        generated
    }

    /// 持有测试锁时执行：并行打乱 → 串行落库
    async fn generate_locked(
        &self,
        test_id: TestId,
        bank: Arc<QuestionBank>,
        version_count: u32,
        questions_per_version: Option<usize>,
    ) -> AppResult<Vec<GeneratedVersion>> {
        info!(
            "📦 测试 {}: 开始生成 {} 个版本 (题库 {} 题)",
            test_id,
            version_count,
            bank.len()
        );

        let trials = self
            .run_trials(bank, version_count as usize, questions_per_version)
            .await?;

        let flow = VersionFlow::new(self.store.as_ref(), self.verbose_logging);
        let total = trials.len();
        let mut generated = Vec::with_capacity(total);

        for (index, trial) in trials.iter().enumerate() {
            let ctx = VersionCtx::new(test_id, index + 1, total);
            match flow.run(&ctx, test_id, trial).await {
                ProcessResult::Success(version) => generated.push(version),
                ProcessResult::Skipped => {}
            }
        }

        if generated.len() < total {
            warn!(
                "⚠️ 测试 {}: 请求 {} 个版本，仅生成 {} 个",
                test_id,
                total,
                generated.len()
            );
        }

        Ok(generated)
    }

    /// 按版本号升序列出测试的全部版本
    pub async fn list_versions(&self, test_id: TestId) -> AppResult<Vec<VersionSummary>> {
        self.store.list_versions(test_id).await
    }

    /// 版本预览
    pub async fn get_version(&self, version_id: VersionId) -> AppResult<VersionPreview> {
        let version = self.store.load_version(version_id).await?;
        let bank = self.bank(version.record.test_id).await?;
        Ok(render_preview(&version, &bank))
    }

    /// 整体删除版本
    pub async fn delete_version(&self, version_id: VersionId) -> AppResult<()> {
        self.store.delete_version(version_id).await?;
        info!("🗑️ 已删除版本 (id {})", version_id);
        Ok(())
    }

    /// 重建版本的答案键
    pub async fn answer_key(&self, version_id: VersionId) -> AppResult<AnswerKey> {
        let version = self.store.load_version(version_id).await?;
        let bank = self.bank(version.record.test_id).await?;
        Ok(reconstruct_answer_key(&version, &bank))
    }

    /// 丢弃测试的题库缓存（题库被编辑后调用）
    pub fn invalidate_bank(&self, test_id: TestId) {
        debug!("清除测试 {} 的题库缓存", test_id);
        self.bank_cache.invalidate(&test_id);
    }

    async fn bank(&self, test_id: TestId) -> AppResult<Arc<QuestionBank>> {
        if let Some(bank) = self.bank_cache.get(&test_id) {
            return Ok(bank);
        }

        let bank = Arc::new(self.store.load_bank(test_id).await?);
        self.bank_cache.insert(test_id, bank.clone());
        Ok(bank)
    }

    fn test_lock(&self, test_id: TestId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.test_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(test_id).or_default().clone()
    }

    /// 没有其他批次持有或等待该锁时移除，锁表只保留进行中的测试
    fn release_test_lock(&self, test_id: TestId) {
        let mut locks = self.test_locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&test_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&test_id);
        }
    }

    fn next_seed(&self) -> u64 {
        self.seeder
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .gen()
    }

    /// 并行执行全部试验，结果按试验顺序返回
    async fn run_trials(
        &self,
        bank: Arc<QuestionBank>,
        count: usize,
        questions_per_version: Option<usize>,
    ) -> AppResult<Vec<MaterializedVersion>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_trials));
        let mut handles = Vec::with_capacity(count);

        for _ in 0..count {
            let seed = self.next_seed();
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AppError::Other(e.to_string()))?;
            let bank = bank.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let mut rng = StdRng::seed_from_u64(seed);
                materializer::materialize_version(&bank, questions_per_version, &mut rng)
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.map_err(|e| AppError::Other(format!("打乱任务异常退出: {}", e)))?
            })
            .collect()
    }
}
