// ==========================================
// 施工项目管理系统 - 价值解析引擎
// ==========================================
// 职责: 单价多级回退解析 + 基础价值计算
// 回退链: 目录 totals → 目录直存 rate → 记录原始 rate 字段 → 放弃区域重匹配
// 红线: 数据不足时不虚构价值;原始数量禁止直接当货币价值
// ==========================================

use crate::config::engine_profile::DEFAULT_VALUE_QUANTITY_TOLERANCE;
use crate::domain::catalog::RateCatalogEntry;
use crate::domain::record::ProgressRecord;
use crate::domain::types::{InputType, RateSource, ValueBasis};
use crate::engine::matcher::RateCatalogMatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ==========================================
// ResolvedValue - 价值解析结果
// ==========================================
// 0 值必须可解释: basis 区分 "缺单价" 与 "数量为 0"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub rate: f64,
    pub base_value: f64,
    pub value_basis: ValueBasis,
    pub rate_source: RateSource,
    pub suspect_reported_value: bool, // reported_value ≈ quantity,疑似重复录入
    pub used_zone_fallback: bool,     // 单价来自放弃区域约束的重匹配
}

// ==========================================
// ValueResolver - 价值解析引擎
// ==========================================
pub struct ValueResolver {
    /// reported_value ≈ quantity 判定容差
    tolerance: f64,
}

impl ValueResolver {
    /// 构造函数（缺省容差 0.01）
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_VALUE_QUANTITY_TOLERANCE,
        }
    }

    /// 指定容差构造
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 解析单价与基础价值
    ///
    /// 规则（顺序执行）:
    /// 1) 从已匹配目录行推导单价: totals 优先,直存 rate 次之
    /// 2) 仍为 0: 取记录原始 rate 字段;再为 0: 放弃区域约束重匹配后重复 1)
    /// 3) quantity > 0 且 rate > 0 ⇒ base = quantity * rate（始终首选）
    ///    quantity > 0 且 rate = 0: reported_value ≈ quantity 视为脏数据不采用;
    ///    明显不同且 > 0 时作为最后兜底
    /// 4) quantity = 0 ⇒ 按录入类型回退 planned_value / actual_value
    pub fn resolve(
        &self,
        record: &ProgressRecord,
        matched: Option<&RateCatalogEntry>,
        matcher: &RateCatalogMatcher,
        catalog: &[RateCatalogEntry],
    ) -> ResolvedValue {
        // ===== 步骤1: 目录行推导单价 =====
        let (mut rate, mut rate_source) = match matched {
            Some(entry) => Self::rate_from_entry(entry),
            None => (0.0, RateSource::None),
        };

        // ===== 步骤2: 记录原始字段 → 放弃区域重匹配 =====
        if rate <= 0.0 {
            if let Some(raw_rate) = record.raw_rate_field() {
                rate = raw_rate;
                rate_source = RateSource::RecordField;
            }
        }

        // 放弃区域重匹配: 跳过同样无单价的行,取目录顺序里首个带单价的命中行,
        // 否则重匹配只会确定性地再次取到同一条无单价行
        let mut used_zone_fallback = false;
        if rate <= 0.0 {
            let rated_fallback = catalog
                .iter()
                .filter(|entry| matcher.matches_ignoring_zone(record, entry))
                .map(Self::rate_from_entry)
                .find(|(fb_rate, _)| *fb_rate > 0.0);

            if let Some((fb_rate, fb_source)) = rated_fallback {
                debug!(
                    record_id = %record.record_id,
                    rate = fb_rate,
                    "严格匹配行无单价,放弃区域重匹配后取得单价"
                );
                rate = fb_rate;
                rate_source = fb_source;
                used_zone_fallback = true;
            }
        }

        // ===== 步骤3/4: 基础价值 =====
        let quantity = if record.quantity.is_finite() {
            record.quantity
        } else {
            0.0
        };

        let mut suspect_reported_value = false;
        let (base_value, value_basis) = if quantity > 0.0 {
            if rate > 0.0 {
                // 有量有价,始终首选 quantity * rate
                (quantity * rate, ValueBasis::RateTimesQuantity)
            } else {
                match record.reported_value.filter(|v| *v > 0.0) {
                    Some(reported) if (reported - quantity).abs() <= self.tolerance => {
                        // 价值与数量几乎相等 ⇒ 疑似数量被重复录成价值,不采用
                        suspect_reported_value = true;
                        warn!(
                            record_id = %record.record_id,
                            quantity,
                            reported,
                            "reported_value ≈ quantity,按脏数据处理,base_value 置 0"
                        );
                        (0.0, ValueBasis::NoRate)
                    }
                    Some(reported) => (reported, ValueBasis::ReportedValue),
                    None => (0.0, ValueBasis::NoRate),
                }
            }
        } else {
            // 数量为 0: 按录入类型回退口径
            match record.input_type {
                InputType::Planned => match record.planned_value.filter(|v| *v > 0.0) {
                    Some(v) => (v, ValueBasis::PlannedValue),
                    None => (0.0, ValueBasis::NoData),
                },
                InputType::Actual => match record.actual_value.filter(|v| *v > 0.0) {
                    Some(v) => (v, ValueBasis::ActualValue),
                    None => (0.0, ValueBasis::NoData),
                },
            }
        };

        ResolvedValue {
            rate,
            base_value,
            value_basis,
            rate_source,
            suspect_reported_value,
            used_zone_fallback,
        }
    }

    // ==========================================
    // 单价推导
    // ==========================================

    /// 从目录行推导单价: totals 优先（两者为正才推导,禁止除零）,直存 rate 次之
    fn rate_from_entry(entry: &RateCatalogEntry) -> (f64, RateSource) {
        if entry.total_units > 0.0 && entry.total_value > 0.0 {
            return (
                entry.total_value / entry.total_units,
                RateSource::CatalogTotals,
            );
        }
        match entry.rate {
            Some(r) if r > 0.0 => (r, RateSource::CatalogRate),
            _ => (0.0, RateSource::None),
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ValueResolver {
    fn default() -> Self {
        Self::new()
    }
}
