//! Model Host - 模型句柄的生命周期管理
//!
//! - 冷启动：首次获取时通过 `ModelLoaderPort` 加载全部模型
//! - 串行：同一时刻只发放一个租约，其余请求排队
//! - 空闲回收：超过空闲窗口且无租约时显式释放模型
//! - 关闭：等待进行中的请求结束后释放模型，之后拒绝新的租约

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::{LoadedModels, ModelError, ModelLoaderPort};

/// Model Host 配置
#[derive(Debug, Clone)]
pub struct ModelHostConfig {
    /// 空闲多久后释放模型
    pub idle_teardown: Duration,
}

impl Default for ModelHostConfig {
    fn default() -> Self {
        Self {
            idle_teardown: Duration::from_secs(15),
        }
    }
}

/// 当前常驻的模型
struct ResidentModels {
    models: LoadedModels,
    loaded_at: DateTime<Utc>,
}

/// 模型状态快照
#[derive(Debug, Clone, Serialize)]
pub struct ModelHostStatus {
    pub loaded: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub idle_secs: u64,
    pub idle_teardown_secs: u64,
    pub cold_starts: u64,
    pub music_model: Option<String>,
    pub language_model: Option<String>,
    pub image_model: Option<String>,
}

/// 模型租约
///
/// 持有期间独占模型；释放时刷新最近使用时间
pub struct ModelLease<'a> {
    models: LoadedModels,
    host: &'a ModelHost,
    _permit: SemaphorePermit<'a>,
}

impl Deref for ModelLease<'_> {
    type Target = LoadedModels;

    fn deref(&self) -> &Self::Target {
        &self.models
    }
}

impl Drop for ModelLease<'_> {
    fn drop(&mut self) {
        self.host.touch();
    }
}

/// 模型宿主
pub struct ModelHost {
    loader: Arc<dyn ModelLoaderPort>,
    config: ModelHostConfig,
    resident: Mutex<Option<ResidentModels>>,
    gate: Semaphore,
    epoch: Instant,
    last_used_ms: AtomicU64,
    cold_starts: AtomicU64,
}

impl ModelHost {
    pub fn new(loader: Arc<dyn ModelLoaderPort>, config: ModelHostConfig) -> Self {
        Self {
            loader,
            config,
            resident: Mutex::new(None),
            gate: Semaphore::new(1),
            epoch: Instant::now(),
            last_used_ms: AtomicU64::new(0),
            cold_starts: AtomicU64::new(0),
        }
    }

    /// 预热：立即加载模型（进程启动时调用）
    pub async fn warm_up(&self) -> Result<(), ModelError> {
        let _permit = self.acquire_permit().await?;
        self.ensure_loaded().await.map(|_| ())
    }

    /// 获取模型租约，必要时触发冷启动
    pub async fn acquire(&self) -> Result<ModelLease<'_>, ModelError> {
        let permit = self.acquire_permit().await?;
        let models = self.ensure_loaded().await?;
        Ok(ModelLease {
            models,
            host: self,
            _permit: permit,
        })
    }

    async fn acquire_permit(&self) -> Result<SemaphorePermit<'_>, ModelError> {
        self.gate
            .acquire()
            .await
            .map_err(|_| ModelError::Unavailable("model host is shut down".to_string()))
    }

    async fn ensure_loaded(&self) -> Result<LoadedModels, ModelError> {
        let mut resident = self.resident.lock().await;
        if let Some(current) = resident.as_ref() {
            return Ok(current.models.clone());
        }

        tracing::info!("Cold start: loading models");
        let started = Instant::now();
        let models = self.loader.load().await?;
        self.cold_starts.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            music = %models.music.model_id(),
            language = %models.language.model_id(),
            image = %models.image.model_id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Models loaded"
        );

        *resident = Some(ResidentModels {
            models: models.clone(),
            loaded_at: Utc::now(),
        });
        self.touch();
        Ok(models)
    }

    fn touch(&self) {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.last_used_ms.store(now, Ordering::Relaxed);
    }

    /// 距最近一次使用的时长
    pub fn idle_for(&self) -> Duration {
        let now = self.epoch.elapsed();
        let last = Duration::from_millis(self.last_used_ms.load(Ordering::Relaxed));
        now.saturating_sub(last)
    }

    pub async fn is_loaded(&self) -> bool {
        self.resident.lock().await.is_some()
    }

    /// 不等待锁；冷启动进行中视为未加载
    pub fn is_resident(&self) -> bool {
        self.resident
            .try_lock()
            .map(|resident| resident.is_some())
            .unwrap_or(false)
    }

    pub fn is_shut_down(&self) -> bool {
        self.gate.is_closed()
    }

    /// 若已空闲超过窗口且无进行中的请求，则释放模型
    ///
    /// 返回是否发生了释放
    pub async fn teardown_if_idle(&self) -> bool {
        let Ok(_permit) = self.gate.try_acquire() else {
            return false;
        };
        if self.idle_for() < self.config.idle_teardown {
            return false;
        }

        let taken = self.resident.lock().await.take();
        match taken {
            Some(current) => {
                tracing::info!(
                    idle_secs = self.idle_for().as_secs(),
                    "Idle window elapsed, releasing models"
                );
                current.models.release_all().await;
                true
            }
            None => false,
        }
    }

    /// 关闭：等待当前请求结束，释放模型，拒绝后续租约
    pub async fn shutdown(&self) {
        match self.gate.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.gate.close();
            }
            Err(_) => return,
        }

        if let Some(current) = self.resident.lock().await.take() {
            tracing::info!("Releasing models on shutdown");
            current.models.release_all().await;
        }
    }

    /// 启动空闲回收任务，关闭后自动退出
    pub fn spawn_idle_reaper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if host.is_shut_down() {
                    break;
                }
                if host.teardown_if_idle().await {
                    tracing::debug!("Idle reaper released models");
                }
            }
            tracing::debug!("Idle reaper stopped");
        })
    }

    pub async fn status(&self) -> ModelHostStatus {
        let resident = self.resident.lock().await;
        let models = resident.as_ref().map(|r| &r.models);
        ModelHostStatus {
            loaded: resident.is_some(),
            loaded_at: resident.as_ref().map(|r| r.loaded_at),
            idle_secs: self.idle_for().as_secs(),
            idle_teardown_secs: self.config.idle_teardown.as_secs(),
            cold_starts: self.cold_starts.load(Ordering::Relaxed),
            music_model: models.map(|m| m.music.model_id().to_string()),
            language_model: models.map(|m| m.language.model_id().to_string()),
            image_model: models.map(|m| m.image.model_id().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::models::{FakeModelConfig, FakeModelLoader};

    fn host_with(idle_teardown: Duration) -> (Arc<FakeModelLoader>, ModelHost) {
        let loader = Arc::new(FakeModelLoader::new(FakeModelConfig::default()));
        let host = ModelHost::new(loader.clone(), ModelHostConfig { idle_teardown });
        (loader, host)
    }

    #[tokio::test]
    async fn test_lazy_cold_start_loads_once() {
        let (loader, host) = host_with(Duration::from_secs(3600));
        assert!(!host.is_loaded().await);

        {
            let lease = host.acquire().await.unwrap();
            assert_eq!(lease.music.model_id(), "fake-ace-step");
        }
        {
            let _lease = host.acquire().await.unwrap();
        }

        assert!(host.is_loaded().await);
        assert_eq!(loader.load_count(), 1);
        assert_eq!(host.status().await.cold_starts, 1);
    }

    #[tokio::test]
    async fn test_is_resident_does_not_wait_for_cold_start() {
        let (_loader, host) = host_with(Duration::from_secs(3600));
        assert!(!host.is_resident());

        {
            // 冷启动持锁期间视为未加载
            let _resident = host.resident.lock().await;
            assert!(!host.is_resident());
        }

        host.warm_up().await.unwrap();
        assert!(host.is_resident());
        host.shutdown().await;
        assert!(!host.is_resident());
        assert!(host.is_shut_down());
    }

    #[tokio::test]
    async fn test_teardown_respects_idle_window() {
        let (loader, host) = host_with(Duration::from_secs(3600));
        host.warm_up().await.unwrap();
        assert!(!host.teardown_if_idle().await);
        assert!(host.is_loaded().await);
        assert_eq!(loader.release_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_teardown_then_reload() {
        let (loader, host) = host_with(Duration::ZERO);
        host.warm_up().await.unwrap();

        assert!(host.teardown_if_idle().await);
        assert!(!host.is_loaded().await);
        assert_eq!(loader.release_count(), 1);

        let _lease = host.acquire().await.unwrap();
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn test_no_teardown_while_lease_held() {
        let (loader, host) = host_with(Duration::ZERO);
        let lease = host.acquire().await.unwrap();
        assert!(!host.teardown_if_idle().await);
        drop(lease);
        assert!(host.teardown_if_idle().await);
        assert_eq!(loader.release_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_and_rejects() {
        let (loader, host) = host_with(Duration::from_secs(3600));
        host.warm_up().await.unwrap();

        host.shutdown().await;
        assert!(host.is_shut_down());
        assert!(!host.is_loaded().await);
        assert_eq!(loader.release_count(), 1);
        assert!(matches!(
            host.acquire().await,
            Err(ModelError::Unavailable(_))
        ));

        // 重复关闭无副作用
        host.shutdown().await;
        assert_eq!(loader.release_count(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_host_empty() {
        let loader = Arc::new(FakeModelLoader::new(FakeModelConfig {
            fail_load: true,
            ..Default::default()
        }));
        let host = ModelHost::new(loader, ModelHostConfig::default());
        assert!(matches!(
            host.warm_up().await,
            Err(ModelError::LoadFailed { .. })
        ));
        assert!(!host.is_loaded().await);
    }

    #[tokio::test]
    async fn test_reaper_stops_after_shutdown() {
        let (_loader, host) = host_with(Duration::ZERO);
        let host = Arc::new(host);
        host.warm_up().await.unwrap();
        let reaper = host.spawn_idle_reaper(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!host.is_loaded().await);

        host.shutdown().await;
        tokio::time::timeout(Duration::from_secs(1), reaper)
            .await
            .unwrap()
            .unwrap();
    }
}
