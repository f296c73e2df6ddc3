// ==========================================
// 施工项目管理系统 - 单价目录领域模型
// ==========================================
// 用途: 合同约定的活动单位经济性（"Activity" 行）
// 红线: rate 推导禁止除零,totals 不可用时视为"无单价"
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RateCatalogEntry - 单价目录行
// ==========================================
// 同一活动可能同时存在分区域行与不分区域行,
// 目录顺序即匹配决胜顺序,调用方必须保证稳定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCatalogEntry {
    // ===== 项目信息 =====
    pub project_code: Option<String>,      // 项目短码
    pub project_full_code: Option<String>, // 项目全码

    // ===== 业务维度 =====
    pub activity_name: String,    // 活动名称
    pub zone_ref: Option<String>, // 区域引用（自由文本,可能带项目码前缀）

    // ===== 合同经济性 =====
    pub total_value: f64,  // 合同总价值
    pub total_units: f64,  // 合同总量
    pub rate: Option<f64>, // 直存单价（缺失时由 totals 推导）

    // ===== 虚拟材料 =====
    pub use_virtual_material: bool, // 是否按项目比例附加虚拟材料
}

impl RateCatalogEntry {
    /// 推导单价
    ///
    /// 优先 total_value / total_units（两者都为正才推导），
    /// 否则回退直存 rate，仍无则返回 0.0 表示"无可用单价"
    pub fn unit_rate(&self) -> f64 {
        if self.total_units > 0.0 && self.total_value > 0.0 {
            return self.total_value / self.total_units;
        }
        match self.rate {
            Some(r) if r > 0.0 => r,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(total_value: f64, total_units: f64, rate: Option<f64>) -> RateCatalogEntry {
        RateCatalogEntry {
            project_code: Some("P100".to_string()),
            project_full_code: None,
            activity_name: "Excavation".to_string(),
            zone_ref: None,
            total_value,
            total_units,
            rate,
            use_virtual_material: false,
        }
    }

    #[test]
    fn test_unit_rate_prefers_totals() {
        // totals 可用时忽略直存 rate
        assert_eq!(entry(5000.0, 500.0, Some(99.0)).unit_rate(), 10.0);
    }

    #[test]
    fn test_unit_rate_falls_back_to_stored_rate() {
        assert_eq!(entry(0.0, 500.0, Some(8.5)).unit_rate(), 8.5);
        assert_eq!(entry(5000.0, 0.0, Some(8.5)).unit_rate(), 8.5);
    }

    #[test]
    fn test_unit_rate_zero_units_never_divides() {
        // total_units = 0 且无直存 rate ⇒ 无单价
        assert_eq!(entry(5000.0, 0.0, None).unit_rate(), 0.0);
    }

    #[test]
    fn test_unit_rate_negative_rate_treated_as_missing() {
        assert_eq!(entry(0.0, 0.0, Some(-3.0)).unit_rate(), 0.0);
    }
}
