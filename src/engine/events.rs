// ==========================================
// 制造工单生命周期引擎 - 通知事件
// ==========================================
// 职责: 定义通知接收方 trait，引擎只通过注入的 sink 发通知
// 红线: 通知失败只记日志，不影响核心操作结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::domain::types::GenerationKind;

// ==========================================
// 事件类型
// ==========================================

/// 事件主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    /// 状态流转
    Transition,
    /// BOM 生成
    BomGeneration,
    /// 下料单生成
    CutListGeneration,
}

impl EventTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTopic::Transition => "transition",
            EventTopic::BomGeneration => "bom_generation",
            EventTopic::CutListGeneration => "cut_list_generation",
        }
    }

    pub fn for_generation(kind: GenerationKind) -> Self {
        match kind {
            GenerationKind::Bom => EventTopic::BomGeneration,
            GenerationKind::CutList => EventTopic::CutListGeneration,
        }
    }
}

/// 事件级别，UI 据此区分阻断错误与提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Success,
    Rejection,
    Warning,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Success => "success",
            EventLevel::Rejection => "rejection",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 生命周期通知事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub order_id: String,
    pub topic: EventTopic,
    pub level: EventLevel,
    pub message: String,
}

impl LifecycleEvent {
    pub fn new(
        order_id: impl Into<String>,
        topic: EventTopic,
        level: EventLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            topic,
            level,
            message: message.into(),
        }
    }
}

// ==========================================
// NotificationSink Trait
// ==========================================

/// 通知接收方
///
/// 由外部（UI 适配层）实现；引擎从不直接访问全局通知中心
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: LifecycleEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作接收方
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, event: LifecycleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpNotificationSink: 跳过通知 - order_id={}, topic={}",
            event.order_id,
            event.topic.as_str()
        );
        Ok(())
    }
}

/// 把通知写入日志的接收方（运维工具使用）
#[derive(Debug, Clone, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, event: LifecycleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match event.level {
            EventLevel::Success => tracing::info!(
                order_id = %event.order_id,
                topic = event.topic.as_str(),
                "{}",
                event.message
            ),
            _ => tracing::warn!(
                order_id = %event.order_id,
                topic = event.topic.as_str(),
                level = event.level.as_str(),
                "{}",
                event.message
            ),
        }
        Ok(())
    }
}

/// 在内存中收集事件的接收方
#[derive(Debug, Default)]
pub struct CollectingNotificationSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl CollectingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出已收集的事件快照
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl NotificationSink for CollectingNotificationSink {
    fn notify(&self, event: LifecycleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut guard = self
            .events
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        guard.push(event);
        Ok(())
    }
}

/// 可选的通知接收方包装
///
/// 简化 Option<Arc<dyn NotificationSink>> 的使用
#[derive(Clone)]
pub struct OptionalNotificationSink {
    inner: Option<Arc<dyn NotificationSink>>,
}

impl OptionalNotificationSink {
    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        Self { inner: Some(sink) }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发送通知；失败只记 warn 日志
    pub fn emit(&self, event: LifecycleEvent) {
        let Some(sink) = &self.inner else {
            tracing::debug!(
                "OptionalNotificationSink: 未配置接收方，跳过通知 - order_id={}, topic={}",
                event.order_id,
                event.topic.as_str()
            );
            return;
        };

        let order_id = event.order_id.clone();
        let topic = event.topic;
        if let Err(e) = sink.notify(event) {
            tracing::warn!(
                order_id = %order_id,
                topic = topic.as_str(),
                error = %e,
                "通知发送失败（已忽略）"
            );
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalNotificationSink {
    fn default() -> Self {
        Self::none()
    }
}
