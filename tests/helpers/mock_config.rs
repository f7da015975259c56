// ==========================================
// Mock 配置读取器 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use mo_lifecycle::config::LifecycleConfigReader;
use std::error::Error;

/// 内存配置，字段直接给出返回值
pub struct MockConfig {
    pub compensation_delay_ms: u64,
    pub materials_precedence: Vec<String>,
    pub cut_list_precedence: Vec<String>,
    pub default_tenant_id: String,
    /// 为 true 时所有读取都失败
    pub fail: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            compensation_delay_ms: 0,
            materials_precedence: vec![
                "fabric".to_string(),
                "tube".to_string(),
                "motor".to_string(),
            ],
            cut_list_precedence: vec!["tube".to_string(), "fabric".to_string()],
            default_tenant_id: "t1".to_string(),
            fail: false,
        }
    }
}

impl MockConfig {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.fail {
            return Err("mock config unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl LifecycleConfigReader for MockConfig {
    async fn get_compensation_delay_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(self.compensation_delay_ms)
    }

    async fn get_materials_category_precedence(
        &self,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(self.materials_precedence.clone())
    }

    async fn get_cut_list_category_precedence(
        &self,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(self.cut_list_precedence.clone())
    }

    async fn get_default_tenant_id(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.check()?;
        Ok(self.default_tenant_id.clone())
    }
}
