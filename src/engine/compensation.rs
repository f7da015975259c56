// ==========================================
// 制造工单生命周期引擎 - 最终一致性补偿
// ==========================================
// 远端生成调用返回时，派生行可能尚未可见
// 补偿策略: 固定等待后由编排器重新读取并校验
// ==========================================

use async_trait::async_trait;
use std::time::Duration;

use crate::config::config_manager::DEFAULT_COMPENSATION_DELAY_MS;
use crate::config::LifecycleConfigReader;
use crate::domain::types::GenerationKind;

/// 一致性补偿策略
#[async_trait]
pub trait ConsistencyCompensation: Send + Sync {
    /// 等待后端完成提交；返回后编排器执行校验读取
    async fn settle(&self, order_id: &str, kind: GenerationKind);
}

/// 固定间隔等待
#[derive(Debug, Clone)]
pub struct FixedDelayCompensation {
    delay: Duration,
}

impl FixedDelayCompensation {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// 从配置读取等待间隔，读取失败时使用默认值
    pub async fn from_config(config: &dyn LifecycleConfigReader) -> Self {
        let ms = match config.get_compensation_delay_ms().await {
            Ok(ms) => ms,
            Err(e) => {
                tracing::warn!(error = %e, "读取补偿等待配置失败，使用默认值");
                DEFAULT_COMPENSATION_DELAY_MS
            }
        };
        Self::from_millis(ms)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelayCompensation {
    fn default() -> Self {
        Self::from_millis(DEFAULT_COMPENSATION_DELAY_MS)
    }
}

#[async_trait]
impl ConsistencyCompensation for FixedDelayCompensation {
    async fn settle(&self, order_id: &str, kind: GenerationKind) {
        tracing::debug!(
            order_id,
            kind = %kind,
            delay_ms = self.delay.as_millis() as u64,
            "一致性补偿等待"
        );
        tokio::time::sleep(self.delay).await;
    }
}

/// 不等待（后端同步提交或测试环境）
#[derive(Debug, Clone, Default)]
pub struct ImmediateCompensation;

#[async_trait]
impl ConsistencyCompensation for ImmediateCompensation {
    async fn settle(&self, _order_id: &str, _kind: GenerationKind) {}
}
