// ==========================================
// 制造工单生命周期引擎 - 生成在途锁
// ==========================================
// 键: (order_id, GenerationKind)
// 不变量: 同一键任意时刻至多一个持有者；仅驻留内存，不持久化
// 释放: 守卫 Drop 时释放，覆盖所有退出路径
// ==========================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::domain::types::GenerationKind;

type LockKey = (String, GenerationKind);

#[derive(Debug, Default)]
pub struct GenerationLockRegistry {
    held: Mutex<HashSet<LockKey>>,
}

impl GenerationLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // 集合内容只有插入/删除，中毒后数据仍一致
    fn held(&self) -> MutexGuard<'_, HashSet<LockKey>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 尝试获取锁；已被持有时立即返回 None（不排队、不阻塞）
    pub fn try_acquire(&self, order_id: &str, kind: GenerationKind) -> Option<GenerationLockGuard<'_>> {
        let key = (order_id.to_string(), kind);
        if !self.held().insert(key.clone()) {
            return None;
        }
        tracing::debug!(order_id, kind = %kind, "获取生成锁");
        Some(GenerationLockGuard {
            registry: self,
            key,
        })
    }

    pub fn is_held(&self, order_id: &str, kind: GenerationKind) -> bool {
        self.held().contains(&(order_id.to_string(), kind))
    }

    /// 当前持有的锁数量
    pub fn held_count(&self) -> usize {
        self.held().len()
    }
}

/// 锁守卫
#[derive(Debug)]
pub struct GenerationLockGuard<'a> {
    registry: &'a GenerationLockRegistry,
    key: LockKey,
}

impl GenerationLockGuard<'_> {
    pub fn order_id(&self) -> &str {
        &self.key.0
    }

    pub fn kind(&self) -> GenerationKind {
        self.key.1
    }
}

impl Drop for GenerationLockGuard<'_> {
    fn drop(&mut self) {
        self.registry.held().remove(&self.key);
        tracing::debug!(order_id = %self.key.0, kind = %self.key.1, "释放生成锁");
    }
}
