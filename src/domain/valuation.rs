// ==========================================
// 施工项目管理系统 - 计价与汇总派生对象
// ==========================================
// 用途: 引擎输出的纯计算视图,不落库
// 红线: 0 值必须可解释（携带 basis/source 标记）
// ==========================================

use crate::domain::types::{RateSource, ScopeSource, ValueBasis};
use serde::{Deserialize, Serialize};

// ==========================================
// Valuation - 单条记录的计价结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valuation {
    pub record_id: String,

    // ===== 计价 =====
    pub rate: f64,                     // 解析得到的单价（0 = 无单价）
    pub base_value: f64,               // 基础价值
    pub virtual_material_pct: f64,     // 实际生效的虚拟材料比例（%）
    pub virtual_material_amount: f64,  // 虚拟材料附加额
    pub total_value: f64,              // base_value + virtual_material_amount

    // ===== 可解释性标记 =====
    pub value_basis: ValueBasis,       // base_value 的计算依据
    pub rate_source: RateSource,       // 单价来源
    pub suspect_reported_value: bool,  // reported_value ≈ quantity,疑似数量误录为价值
    pub used_zone_fallback: bool,      // 单价来自放弃区域约束后的回退匹配
}

// ==========================================
// ScopeResolution - 范围分类结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeResolution {
    pub scope_label: String,   // 分类标签（未命中时为哨兵值）
    pub source: ScopeSource,   // 命中层级
}

// ==========================================
// Aggregate - 时间窗汇总结果
// ==========================================
// 相对该记录生效日期的日/周/月窗口,同键记录求和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub record_id: String,

    pub daily_quantity: f64,
    pub weekly_quantity: f64,
    pub monthly_quantity: f64,

    pub daily_value: f64,
    pub weekly_value: f64,
    pub monthly_value: f64,
}

impl Aggregate {
    /// 生效日期无法解析时的空汇总
    pub fn empty(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            daily_quantity: 0.0,
            weekly_quantity: 0.0,
            monthly_quantity: 0.0,
            daily_value: 0.0,
            weekly_value: 0.0,
            monthly_value: 0.0,
        }
    }
}

// ==========================================
// KpiEvaluation - 单条记录的完整计算视图
// ==========================================
// 对外协作方暴露的组合结果: 计价 + 分类 + 汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiEvaluation {
    pub valuation: Valuation,
    pub scope: ScopeResolution,
    pub aggregate: Aggregate,
}
