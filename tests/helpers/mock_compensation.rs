// ==========================================
// Mock 一致性补偿 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use mo_lifecycle::domain::types::GenerationKind;
use mo_lifecycle::engine::ConsistencyCompensation;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::mock_remote::MaterializingRemote;

/// 记录 settle 次数；绑定远端时在等待期间落地延迟写入
pub struct RecordingCompensation {
    remote: Option<Arc<MaterializingRemote>>,
    settled: AtomicUsize,
}

impl RecordingCompensation {
    pub fn new() -> Self {
        Self {
            remote: None,
            settled: AtomicUsize::new(0),
        }
    }

    pub fn flushing(remote: Arc<MaterializingRemote>) -> Self {
        Self {
            remote: Some(remote),
            settled: AtomicUsize::new(0),
        }
    }

    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsistencyCompensation for RecordingCompensation {
    async fn settle(&self, _order_id: &str, _kind: GenerationKind) {
        self.settled.fetch_add(1, Ordering::SeqCst);
        if let Some(remote) = &self.remote {
            remote.flush();
        }
    }
}
