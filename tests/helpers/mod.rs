// ==========================================
// 集成测试辅助模块
// ==========================================
#![allow(dead_code)]

pub mod flaky_store;
pub mod mock_compensation;
pub mod mock_config;
pub mod mock_remote;
pub mod test_data_builder;
pub mod test_env;
