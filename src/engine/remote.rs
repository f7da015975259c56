// ==========================================
// 制造工单生命周期引擎 - 远端生成过程端口
// ==========================================
// 远端过程对引擎不透明: 同步返回"请求是否受理"，
// 派生行在其后异步落地
// ==========================================

use async_trait::async_trait;

use crate::domain::types::GenerationKind;
use crate::engine::error::RemoteCallError;

#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    /// 创建/替换销售订单行下的 BomInstance + BomInstanceLine
    async fn generate_bom(&self, order_id: &str) -> Result<(), RemoteCallError>;

    /// 创建/替换工单的 CutJob + CutJobLine
    async fn generate_cut_list(&self, order_id: &str) -> Result<(), RemoteCallError>;
}

/// 按生成类型分派
pub async fn invoke(
    remote: &dyn RemoteGenerator,
    order_id: &str,
    kind: GenerationKind,
) -> Result<(), RemoteCallError> {
    tracing::debug!(order_id, kind = %kind, "调用远端生成过程");
    let result = match kind {
        GenerationKind::Bom => remote.generate_bom(order_id).await,
        GenerationKind::CutList => remote.generate_cut_list(order_id).await,
    };
    if let Err(e) = &result {
        tracing::debug!(order_id, kind = %kind, procedure = %e.procedure, "远端生成过程返回失败");
    }
    result
}

/// 未配置远端时的占位实现，所有调用都失败
#[derive(Debug, Clone, Default)]
pub struct UnavailableRemoteGenerator;

#[async_trait]
impl RemoteGenerator for UnavailableRemoteGenerator {
    async fn generate_bom(&self, _order_id: &str) -> Result<(), RemoteCallError> {
        Err(RemoteCallError::new(
            "generate_bom",
            "remote generation endpoint is not configured",
        ))
    }

    async fn generate_cut_list(&self, _order_id: &str) -> Result<(), RemoteCallError> {
        Err(RemoteCallError::new(
            "generate_cut_list",
            "remote generation endpoint is not configured",
        ))
    }
}
