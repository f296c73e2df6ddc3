// ==========================================
// 施工项目管理系统 - 配置层
// ==========================================
// 职责: 引擎参数配置（容差/哨兵值/日期格式）
// 存储: JSON 配置文件,由宿主进程决定路径
// ==========================================

pub mod engine_profile;

// 重导出核心配置类型
pub use engine_profile::{ConfigError, EngineProfile};
