// ==========================================
// 施工项目管理系统 - 单价目录匹配引擎
// ==========================================
// 职责: 为一条进度记录找到最佳单价目录行（"Activity"）
// 匹配条件: 活动名 + 项目 + 区域,三者全满足
// 回退: 区域约束无命中时放弃区域重试（合同单价常与区域无关）
// 红线: 目录顺序即决胜顺序,多命中取首个,保证确定性
// ==========================================

use crate::domain::catalog::RateCatalogEntry;
use crate::domain::record::ProgressRecord;
use crate::engine::zone::{NormalizedZone, ZoneNormalizer};
use tracing::debug;

// ==========================================
// 项目等价判定
// ==========================================

/// 项目等价: 短码/全码四组交叉组合任一相等（trim + 大小写不敏感）
///
/// 哪个字段是权威字段因数据源而异,四组组合全部容忍;
/// 空字段不参与匹配
pub fn project_equivalent(
    a_code: Option<&str>,
    a_full: Option<&str>,
    b_code: Option<&str>,
    b_full: Option<&str>,
) -> bool {
    let normalize = |v: Option<&str>| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    };

    let a_ids: Vec<String> = [normalize(a_code), normalize(a_full)]
        .into_iter()
        .flatten()
        .collect();
    let b_ids: Vec<String> = [normalize(b_code), normalize(b_full)]
        .into_iter()
        .flatten()
        .collect();

    a_ids.iter().any(|a| b_ids.iter().any(|b| a == b))
}

// ==========================================
// RateCatalogMatcher - 单价目录匹配引擎
// ==========================================
pub struct RateCatalogMatcher {
    normalizer: ZoneNormalizer,
}

impl RateCatalogMatcher {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            normalizer: ZoneNormalizer::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 查找最佳目录行: 先带区域约束,无命中再放弃区域重试
    pub fn find_match<'a>(
        &self,
        record: &ProgressRecord,
        catalog: &'a [RateCatalogEntry],
    ) -> Option<&'a RateCatalogEntry> {
        if let Some(entry) = self.find_match_with_zone(record, catalog) {
            return Some(entry);
        }

        let fallback = self.find_match_ignoring_zone(record, catalog);
        if fallback.is_some() {
            debug!(
                record_id = %record.record_id,
                activity = %record.activity_name,
                "区域约束无命中,放弃区域后命中目录行"
            );
        }
        fallback
    }

    /// 带区域约束查找（记录无区域时区域不作为过滤条件）
    pub fn find_match_with_zone<'a>(
        &self,
        record: &ProgressRecord,
        catalog: &'a [RateCatalogEntry],
    ) -> Option<&'a RateCatalogEntry> {
        catalog.iter().find(|entry| self.matches(record, entry, true))
    }

    /// 放弃区域约束查找（同活动 + 同项目,任意区域）
    pub fn find_match_ignoring_zone<'a>(
        &self,
        record: &ProgressRecord,
        catalog: &'a [RateCatalogEntry],
    ) -> Option<&'a RateCatalogEntry> {
        catalog
            .iter()
            .find(|entry| self.matches(record, entry, false))
    }

    /// 放弃区域约束的匹配判定（价值解析引擎重匹配时逐行筛选用）
    pub fn matches_ignoring_zone(&self, record: &ProgressRecord, entry: &RateCatalogEntry) -> bool {
        self.matches(record, entry, false)
    }

    // ==========================================
    // 匹配规则
    // ==========================================

    fn matches(&self, record: &ProgressRecord, entry: &RateCatalogEntry, enforce_zone: bool) -> bool {
        if !Self::activity_matches(&record.activity_name, &entry.activity_name) {
            return false;
        }

        if !project_equivalent(
            record.project_code.as_deref(),
            record.project_full_code.as_deref(),
            entry.project_code.as_deref(),
            entry.project_full_code.as_deref(),
        ) {
            return false;
        }

        if !enforce_zone {
            return true;
        }

        let record_zone = self.record_zone(record);
        if record_zone.is_empty() {
            // 记录无区域时不按区域过滤
            return true;
        }

        let entry_zone = self.entry_zone(entry);
        // 记录有区域时,目录行必须也有区域且可比较相等
        !entry_zone.is_empty() && Self::zones_match(&record_zone, &entry_zone)
    }

    /// 活动名匹配: 相等（大小写不敏感）或互相包含
    fn activity_matches(a: &str, b: &str) -> bool {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a == b || a.contains(&b) || b.contains(&a)
    }

    /// 区域可比较相等: 区域号相等或 token 相等
    fn zones_match(a: &NormalizedZone, b: &NormalizedZone) -> bool {
        a.number == b.number || a.token == b.token
    }

    fn record_zone(&self, record: &ProgressRecord) -> NormalizedZone {
        let code = record
            .project_code
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(record.project_full_code.as_deref())
            .unwrap_or("");
        self.normalizer
            .normalize(record.zone_label.as_deref().unwrap_or(""), code)
    }

    fn entry_zone(&self, entry: &RateCatalogEntry) -> NormalizedZone {
        let code = entry
            .project_code
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(entry.project_full_code.as_deref())
            .unwrap_or("");
        self.normalizer
            .normalize(entry.zone_ref.as_deref().unwrap_or(""), code)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for RateCatalogMatcher {
    fn default() -> Self {
        Self::new()
    }
}
