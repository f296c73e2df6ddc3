// ==========================================
// 施工项目管理系统 - 进度记录领域模型
// ==========================================
// 用途: 现场人员上报的 KPI 录入行,外部数据源按批次提供
// 红线: 引擎只读,一次调用一份不可变快照
// ==========================================

use crate::domain::types::InputType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// ProgressRecord - 进度记录 (KPI 录入)
// ==========================================
// 一条记录 = 某活动/区域/日期/录入类型下的一个上报数量
// 源数据录入不规范: 区域为自由文本,日期字段多个且互相竞争
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    // ===== 主键 =====
    pub record_id: String, // 记录唯一标识（外部数据源分配）

    // ===== 项目信息 =====
    pub project_code: Option<String>,      // 项目短码（如 "P100"）
    pub project_full_code: Option<String>, // 项目全码（哪个字段是权威的因项目而异）

    // ===== 业务维度 =====
    pub activity_name: String,     // 活动名称（自由文本）
    pub zone_label: Option<String>, // 区域标签（自由文本,可能带项目码前缀）
    pub input_type: InputType,     // 录入类型（计划/实际）

    // ===== 数量与价值 =====
    pub quantity: f64,                // 上报数量
    pub unit: Option<String>,         // 计量单位
    pub reported_value: Option<f64>,  // 上报价值（疑似被当作数量重复录入,需校验）
    pub planned_value: Option<f64>,   // 计划价值（数量为 0 时的回退口径）
    pub actual_value: Option<f64>,    // 实际价值（数量为 0 时的回退口径）

    // ===== 日期字段（原始文本,互相竞争）=====
    pub actual_date: Option<String>, // 实际日期（ACTUAL 优先口径）
    pub target_date: Option<String>, // 目标日期（PLANNED 优先口径）
    pub entry_date: Option<String>,  // 录入日期（最后兜底口径）

    // ===== 源字段影子列 =====
    #[serde(default)]
    pub raw_fields: Map<String, Value>, // 源行原样保留（记录级 rate 等字段从这里取）
}

impl ProgressRecord {
    /// 从源字段影子列中读取数值字段
    ///
    /// 源数据中数值常以字符串形式出现，两种形态都接受
    pub fn raw_numeric_field(&self, key: &str) -> Option<f64> {
        match self.raw_fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        }
    }

    /// 记录自带的原始单价字段（目录无单价时的回退口径）
    ///
    /// 依次尝试常见字段名，取第一个正数
    pub fn raw_rate_field(&self) -> Option<f64> {
        ["rate", "unit_rate", "unit_price"]
            .iter()
            .filter_map(|key| self.raw_numeric_field(key))
            .find(|v| *v > 0.0)
    }

    /// 录入类型对应的优先日期字段
    pub fn preferred_date_field(&self) -> Option<&str> {
        match self.input_type {
            InputType::Actual => self.actual_date.as_deref(),
            InputType::Planned => self.target_date.as_deref(),
        }
    }

    /// 全部日期字段，按回退顺序排列
    pub fn date_fields_in_fallback_order(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if let Some(d) = self.preferred_date_field() {
            fields.push(d);
        }
        // 非优先口径按固定顺序兜底
        for candidate in [
            self.actual_date.as_deref(),
            self.target_date.as_deref(),
            self.entry_date.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !fields.contains(&candidate) {
                fields.push(candidate);
            }
        }
        fields
    }
}
