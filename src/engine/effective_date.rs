// ==========================================
// 施工项目管理系统 - 生效日期解析引擎
// ==========================================
// 职责: 从互相竞争的原始日期字段中解析记录的生效日期
// 口径: 录入类型优先字段 → "Day N" 相对日期 → 其余字段兜底
// 红线: 不读墙钟,"Day N" 基准日由调用方传入;解析失败只影响汇总,不影响匹配
// ==========================================

use crate::domain::record::ProgressRecord;
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// 内置日期格式（源数据常见写法;斜杠日期按日在前的工地习惯）
pub const BUILTIN_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

// ==========================================
// EffectiveDateResolver - 生效日期解析引擎
// ==========================================
pub struct EffectiveDateResolver {
    extra_formats: Vec<String>,
}

impl EffectiveDateResolver {
    /// 构造函数（仅内置格式）
    pub fn new() -> Self {
        Self {
            extra_formats: Vec::new(),
        }
    }

    /// 附加配置格式构造（排在内置格式之后尝试）
    pub fn with_extra_formats(formats: &[String]) -> Self {
        Self {
            extra_formats: formats.to_vec(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 解析记录的生效日期
    ///
    /// 按记录的字段回退顺序逐个尝试,全部失败返回 None（该记录不参与汇总）
    pub fn resolve(&self, record: &ProgressRecord, today: NaiveDate) -> Option<NaiveDate> {
        for field in record.date_fields_in_fallback_order() {
            if let Some(date) = self.parse_field(field, today) {
                return Some(date);
            }
        }

        debug!(
            record_id = %record.record_id,
            "日期字段全部无法解析,该记录不参与汇总"
        );
        None
    }

    /// 解析单个日期字段: 先按日期格式,再按 "Day N" 相对日期
    pub fn parse_field(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(date) = self.parse_date_text(text) {
            return Some(date);
        }

        // "Day N" 相对日期: 基准日往回数 N 天
        if let Some(n) = Self::parse_day_token(text) {
            return today.checked_sub_signed(Duration::days(n));
        }

        None
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn parse_date_text(&self, text: &str) -> Option<NaiveDate> {
        // 带时间部分的先截到日期段
        let date_part = text
            .split(|c| c == 'T' || c == ' ')
            .next()
            .unwrap_or(text);

        BUILTIN_DATE_FORMATS
            .iter()
            .copied()
            .chain(self.extra_formats.iter().map(String::as_str))
            .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    }

    /// "Day 12" / "day12" / "DAY 12" → 12
    fn parse_day_token(text: &str) -> Option<i64> {
        let lower = text.to_lowercase();
        let rest = lower.strip_prefix("day")?.trim();
        rest.parse::<i64>().ok().filter(|n| *n >= 0)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for EffectiveDateResolver {
    fn default() -> Self {
        Self::new()
    }
}
