// ==========================================
// 施工项目管理系统 - KPI计量与汇总引擎核心库
// ==========================================
// 系统定位: 纯计算引擎 (持久化/传输/界面由外部协作方承担)
// 输入: 进度记录快照 + 单价目录快照 + 设置快照
// 输出: 计价结果 + 业务范围分类 + 日/周/月汇总
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{InputType, RateSource, ScopeSource, ValueBasis};

// 领域实体
pub use domain::{
    Aggregate, KpiEvaluation, ProgressRecord, RateCatalogEntry, ScopeMapping, ScopeResolution,
    SettingsSnapshot, Valuation,
};

// 引擎
pub use engine::{
    AggregationEngine, AggregationIndex, EffectiveDateResolver, NormalizedZone,
    RateCatalogMatcher, ScopeResolver, ValuationOrchestrator, ValueResolver,
    VirtualMaterialAugmenter, ZoneNormalizer,
};

// 配置
pub use config::{ConfigError, EngineProfile};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "KPI计量与汇总引擎";

// ==========================================
// 预编译检查
// ==========================================
