// ==========================================
// 制造工单生命周期引擎 - 生命周期配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// LifecycleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait LifecycleConfigReader: Send + Sync {
    // ===== 派生数据生成 =====

    /// 远端生成成功后的一致性补偿等待（毫秒）
    ///
    /// # 默认值
    /// - 2000
    async fn get_compensation_delay_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    // ===== 汇总展示 =====

    /// BOM 物料分组的类别优先顺序
    ///
    /// # 默认值
    /// - fabric, tube, motor, bracket, cassette, side_channel, bottom_channel, accessory
    async fn get_materials_category_precedence(
        &self,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;

    /// 下料单分组的类别优先顺序
    ///
    /// # 默认值
    /// - fabric, tube, bottom_bar, side_channel, bottom_channel, cassette, bracket, accessory
    async fn get_cut_list_category_precedence(
        &self,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;

    // ===== 租户 =====

    /// 运维工具未指定租户时使用的默认租户
    ///
    /// # 默认值
    /// - default
    async fn get_default_tenant_id(&self) -> Result<String, Box<dyn Error + Send + Sync>>;
}
