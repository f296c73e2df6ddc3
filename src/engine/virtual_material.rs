// ==========================================
// 施工项目管理系统 - 虚拟材料附加引擎
// ==========================================
// 职责: 对标记了虚拟材料的活动,按项目比例附加价值
// 输入: 基础价值 + 目录行 use_virtual_material 标记 + 项目比例字符串
// 输出: 附加额 + 最终价值
// 红线: 标记为 false（含未匹配到目录行）时比例强制为 0
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::warn;

// ==========================================
// VirtualMaterialResult - 虚拟材料计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMaterialResult {
    pub percentage: f64,  // 实际生效比例（%）
    pub amount: f64,      // 附加额 = base_value * percentage / 100
    pub total_value: f64, // base_value + amount
}

// ==========================================
// VirtualMaterialAugmenter - 虚拟材料附加引擎
// ==========================================
pub struct VirtualMaterialAugmenter {
    // 无状态引擎,不需要注入依赖
}

impl VirtualMaterialAugmenter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算虚拟材料附加额
    pub fn apply(
        &self,
        base_value: f64,
        use_virtual_material: bool,
        pct_text: Option<&str>,
    ) -> VirtualMaterialResult {
        let percentage = if use_virtual_material {
            pct_text.map(Self::parse_percentage).unwrap_or(0.0)
        } else {
            // 未标记（含未匹配到目录行）强制为 0
            0.0
        };

        let amount = base_value * percentage / 100.0;
        VirtualMaterialResult {
            percentage,
            amount,
            total_value: base_value + amount,
        }
    }

    // ==========================================
    // 比例字符串解析
    // ==========================================

    /// 解析项目比例字符串
    ///
    /// 规则:
    /// 1) 剥离 '%'、','、空白
    /// 2) 数值落在 (0, 1] 时按小数比例处理,×100（"0.15" 与 "15" 都表示 15%）
    /// 3) 其余按字面值处理
    /// 4) 无法解析按 0 处理并记日志
    pub fn parse_percentage(text: &str) -> f64 {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '%' && *c != ',')
            .collect();

        if cleaned.is_empty() {
            return 0.0;
        }

        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                if v > 0.0 && v <= 1.0 {
                    v * 100.0
                } else {
                    v
                }
            }
            _ => {
                warn!(raw = %text, "虚拟材料比例无法解析,按 0 处理");
                0.0
            }
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for VirtualMaterialAugmenter {
    fn default() -> Self {
        Self::new()
    }
}
