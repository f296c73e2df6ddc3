// ==========================================
// 施工项目管理系统 - 领域类型定义
// ==========================================
// 红线: 每个派生结果必须携带可解释的来源标记
// 序列化格式: SCREAMING_SNAKE_CASE (与前端/数据源一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 录入类型 (Input Type)
// ==========================================
// 一条进度记录要么是计划目标,要么是实测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    Planned, // 计划量
    Actual,  // 实际量
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Planned => write!(f, "PLANNED"),
            InputType::Actual => write!(f, "ACTUAL"),
        }
    }
}

impl InputType {
    /// 从字符串解析录入类型（源数据大小写不一，宽松解析）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ACTUAL" => InputType::Actual,
            _ => InputType::Planned, // 默认值
        }
    }

    /// 转换为存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            InputType::Planned => "PLANNED",
            InputType::Actual => "ACTUAL",
        }
    }
}


// ==========================================
// 单价来源 (Rate Source)
// ==========================================
// 标记 rate 是从哪一级回退取得的
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    CatalogTotals, // 目录行 total_value / total_units 推导
    CatalogRate,   // 目录行直存 rate 字段
    RecordField,   // 记录自带的原始 rate 字段
    None,          // 无可用单价
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::CatalogTotals => write!(f, "CATALOG_TOTALS"),
            RateSource::CatalogRate => write!(f, "CATALOG_RATE"),
            RateSource::RecordField => write!(f, "RECORD_FIELD"),
            RateSource::None => write!(f, "NONE"),
        }
    }
}

// ==========================================
// 价值计算依据 (Value Basis)
// ==========================================
// 区分 "缺单价导致的 0" 与 "数量本身为 0"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueBasis {
    RateTimesQuantity, // quantity * rate（首选路径）
    ReportedValue,     // 记录申报价值兜底（与数量明显不同才采用）
    PlannedValue,      // 数量为 0 时回退计划价值
    ActualValue,       // 数量为 0 时回退实际价值
    NoRate,            // 有数量但全链路无单价, base_value = 0
    NoData,            // 无数量也无可回退价值, base_value = 0
}

impl fmt::Display for ValueBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueBasis::RateTimesQuantity => write!(f, "RATE_TIMES_QUANTITY"),
            ValueBasis::ReportedValue => write!(f, "REPORTED_VALUE"),
            ValueBasis::PlannedValue => write!(f, "PLANNED_VALUE"),
            ValueBasis::ActualValue => write!(f, "ACTUAL_VALUE"),
            ValueBasis::NoRate => write!(f, "NO_RATE"),
            ValueBasis::NoData => write!(f, "NO_DATA"),
        }
    }
}

// ==========================================
// 范围分类来源 (Scope Source)
// ==========================================
// 级联匹配命中的层级,未命中时落到项目默认或 UNKNOWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeSource {
    ExactMatch,     // 全名精确命中
    FirstSegment,   // 首个 '-' 分段命中
    StrippedTail,   // 去掉末段后命中
    PrefixMatch,    // 键与名称互为前缀命中
    ProjectDefault, // 项目级默认分类
    Unknown,        // 哨兵值
}

impl fmt::Display for ScopeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSource::ExactMatch => write!(f, "EXACT_MATCH"),
            ScopeSource::FirstSegment => write!(f, "FIRST_SEGMENT"),
            ScopeSource::StrippedTail => write!(f, "STRIPPED_TAIL"),
            ScopeSource::PrefixMatch => write!(f, "PREFIX_MATCH"),
            ScopeSource::ProjectDefault => write!(f, "PROJECT_DEFAULT"),
            ScopeSource::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
