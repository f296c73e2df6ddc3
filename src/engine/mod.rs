// ==========================================
// 施工项目管理系统 - 引擎层
// ==========================================
// 职责: 实现 KPI 计价与汇总的业务规则引擎
// 红线: 引擎不做 I/O,所有派生结果必须输出来源标记
// ==========================================

pub mod aggregation;
pub mod effective_date;
pub mod matcher;
pub mod orchestrator;
pub mod scope;
pub mod value;
pub mod virtual_material;
pub mod zone;

// 重导出核心引擎
pub use aggregation::{window_keys, AggregationEngine, AggregationIndex, WindowKeys};
pub use effective_date::{EffectiveDateResolver, BUILTIN_DATE_FORMATS};
pub use matcher::{project_equivalent, RateCatalogMatcher};
pub use orchestrator::ValuationOrchestrator;
pub use scope::ScopeResolver;
pub use value::{ResolvedValue, ValueResolver};
pub use virtual_material::{VirtualMaterialAugmenter, VirtualMaterialResult};
pub use zone::{NormalizedZone, ZoneNormalizer};
