// ==========================================
// 施工项目管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod record;
pub mod settings;
pub mod types;
pub mod valuation;

// 重导出核心类型
pub use catalog::RateCatalogEntry;
pub use record::ProgressRecord;
pub use settings::{ScopeMapping, SettingsSnapshot};
pub use types::{InputType, RateSource, ScopeSource, ValueBasis};
pub use valuation::{Aggregate, KpiEvaluation, ScopeResolution, Valuation};
