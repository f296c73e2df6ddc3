// ==========================================
// 施工项目管理系统 - 时间窗汇总引擎
// ==========================================
// 职责: 按 (项目等价, 活动名, 录入类型) 分组,对数量与价值做日/周/月窗口求和
// 窗口基准: 焦点记录自身的生效日期
// 周口径: week = ceil((day_of_month + 1月1日星期序) / 7),与上游实现逐位一致,
//         非 ISO-8601,跨年边界可能与日历周不符,按既有口径复现
// ==========================================

use crate::domain::record::ProgressRecord;
use crate::domain::types::InputType;
use crate::domain::valuation::Aggregate;
use crate::engine::effective_date::EffectiveDateResolver;
use crate::engine::matcher::project_equivalent;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// 窗口键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowKeys {
    pub day: NaiveDate,
    pub week: (i32, u32),  // (年, 周序)
    pub month: (i32, u32), // (年, 月)
}

/// 计算一个日期的三级窗口键
pub fn window_keys(date: NaiveDate) -> WindowKeys {
    WindowKeys {
        day: date,
        week: (date.year(), week_of(date)),
        month: (date.year(), date.month()),
    }
}

/// 周序: ceil((day_of_month + 1月1日星期序) / 7)
///
/// 1月1日星期序按周日=0 口径取,与上游运行时一致
fn week_of(date: NaiveDate) -> u32 {
    // 每年1月1日恒为合法日期,兜底仅为满足 Option 类型
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let offset = jan1.weekday().num_days_from_sunday();
    // 整数向上取整
    (date.day() + offset + 6) / 7
}

// ==========================================
// AggregationEngine - 时间窗汇总引擎
// ==========================================
pub struct AggregationEngine {
    resolver: EffectiveDateResolver,
}

impl AggregationEngine {
    /// 构造函数（内置日期格式）
    pub fn new() -> Self {
        Self {
            resolver: EffectiveDateResolver::new(),
        }
    }

    /// 注入日期解析器构造（配置了附加格式时用）
    pub fn with_resolver(resolver: EffectiveDateResolver) -> Self {
        Self { resolver }
    }

    // ==========================================
    // 逐记录重扫口径（原始形态, 每条 O(n)）
    // ==========================================

    /// 对焦点记录做日/周/月汇总
    ///
    /// value_of 提供每条记录的已解析价值;生效日期无法解析的记录不参与,
    /// 焦点记录自身无法解析时返回全 0
    pub fn aggregate_for<F>(
        &self,
        focal: &ProgressRecord,
        records: &[ProgressRecord],
        value_of: F,
        today: NaiveDate,
    ) -> Aggregate
    where
        F: Fn(&ProgressRecord) -> f64,
    {
        let Some(focal_date) = self.resolver.resolve(focal, today) else {
            return Aggregate::empty(&focal.record_id);
        };
        let focal_keys = window_keys(focal_date);

        let mut aggregate = Aggregate::empty(&focal.record_id);
        for peer in records {
            if !Self::same_group(focal, peer) {
                continue;
            }
            let Some(peer_date) = self.resolver.resolve(peer, today) else {
                continue;
            };

            let quantity = if peer.quantity.is_finite() {
                peer.quantity
            } else {
                0.0
            };
            let value = value_of(peer);

            Self::accumulate(
                &mut aggregate,
                &focal_keys,
                &window_keys(peer_date),
                quantity,
                value,
            );
        }
        aggregate
    }

    // ==========================================
    // 预计算索引口径（整批 O(n log n), 输出契约与重扫一致）
    // ==========================================

    /// 为整批记录构建分组索引,生效日期与窗口键只解析一次
    #[instrument(skip_all, fields(record_count = records.len()))]
    pub fn build_index(
        &self,
        records: &[ProgressRecord],
        values: &HashMap<String, f64>,
        today: NaiveDate,
    ) -> AggregationIndex {
        let mut groups: HashMap<(String, InputType), Vec<IndexedRecord>> = HashMap::new();

        for record in records {
            let keys = self.resolver.resolve(record, today).map(window_keys);
            let quantity = if record.quantity.is_finite() {
                record.quantity
            } else {
                0.0
            };

            groups
                .entry((Self::activity_key(&record.activity_name), record.input_type))
                .or_default()
                .push(IndexedRecord {
                    record_id: record.record_id.clone(),
                    project_code: record.project_code.clone(),
                    project_full_code: record.project_full_code.clone(),
                    keys,
                    quantity,
                    value: values.get(&record.record_id).copied().unwrap_or(0.0),
                });
        }

        AggregationIndex { groups }
    }

    // ==========================================
    // 分组与累加规则
    // ==========================================

    /// 汇总同组判定: 项目等价 + 活动名相等（大小写不敏感） + 录入类型相等
    ///
    /// 注意: 与目录匹配不同,这里活动名不做互相包含判定
    fn same_group(a: &ProgressRecord, b: &ProgressRecord) -> bool {
        a.input_type == b.input_type
            && Self::activity_key(&a.activity_name) == Self::activity_key(&b.activity_name)
            && project_equivalent(
                a.project_code.as_deref(),
                a.project_full_code.as_deref(),
                b.project_code.as_deref(),
                b.project_full_code.as_deref(),
            )
    }

    fn activity_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    fn accumulate(
        aggregate: &mut Aggregate,
        focal_keys: &WindowKeys,
        peer_keys: &WindowKeys,
        quantity: f64,
        value: f64,
    ) {
        if peer_keys.month == focal_keys.month {
            aggregate.monthly_quantity += quantity;
            aggregate.monthly_value += value;
        }
        if peer_keys.week == focal_keys.week {
            aggregate.weekly_quantity += quantity;
            aggregate.weekly_value += value;
        }
        if peer_keys.day == focal_keys.day {
            aggregate.daily_quantity += quantity;
            aggregate.daily_value += value;
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// AggregationIndex - 预计算分组索引
// ==========================================
// 一批构建一次,整批记录复用;项目等价保持成对判定
// （按项目码直接分组会让成对匹配变成传递闭包,改变输出）
pub struct AggregationIndex {
    groups: HashMap<(String, InputType), Vec<IndexedRecord>>,
}

struct IndexedRecord {
    record_id: String,
    project_code: Option<String>,
    project_full_code: Option<String>,
    keys: Option<WindowKeys>,
    quantity: f64,
    value: f64,
}

impl AggregationIndex {
    /// 对焦点记录做汇总（焦点必须属于建索引的那批记录）
    pub fn aggregate_for(&self, focal: &ProgressRecord) -> Aggregate {
        let group_key = (
            AggregationEngine::activity_key(&focal.activity_name),
            focal.input_type,
        );
        let Some(group) = self.groups.get(&group_key) else {
            debug!(record_id = %focal.record_id, "焦点记录不在索引批次内,返回空汇总");
            return Aggregate::empty(&focal.record_id);
        };

        // 焦点的窗口键从索引里取,保证与建索引时的日期解析完全一致
        let focal_keys = group
            .iter()
            .find(|r| r.record_id == focal.record_id)
            .and_then(|r| r.keys);
        let Some(focal_keys) = focal_keys else {
            return Aggregate::empty(&focal.record_id);
        };

        let mut aggregate = Aggregate::empty(&focal.record_id);
        for peer in group {
            let Some(peer_keys) = peer.keys else {
                continue;
            };
            if !project_equivalent(
                focal.project_code.as_deref(),
                focal.project_full_code.as_deref(),
                peer.project_code.as_deref(),
                peer.project_full_code.as_deref(),
            ) {
                continue;
            }

            AggregationEngine::accumulate(
                &mut aggregate,
                &focal_keys,
                &peer_keys,
                peer.quantity,
                peer.value,
            );
        }
        aggregate
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_record(
        record_id: &str,
        project_code: Option<&str>,
        project_full_code: Option<&str>,
        activity_name: &str,
        input_type: InputType,
        quantity: f64,
        actual_date: Option<&str>,
    ) -> ProgressRecord {
        ProgressRecord {
            record_id: record_id.to_string(),
            project_code: project_code.map(|s| s.to_string()),
            project_full_code: project_full_code.map(|s| s.to_string()),
            activity_name: activity_name.to_string(),
            zone_label: None,
            input_type,
            quantity,
            unit: None,
            reported_value: None,
            planned_value: None,
            actual_value: None,
            actual_date: actual_date.map(|s| s.to_string()),
            target_date: None,
            entry_date: None,
            raw_fields: Map::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    /// 每条记录固定价值 10
    fn flat_value(_: &ProgressRecord) -> f64 {
        10.0
    }

    // ==========================================
    // 窗口键测试
    // ==========================================

    #[test]
    fn test_scenario_01_week_formula() {
        // 场景1: 2026年1月1日是周四(周日序=4)
        // day 1..3 → ceil((1..3+4)/7) = 1, day 4 → ceil(8/7) = 2
        for day in 1..=3 {
            let date = NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
            assert_eq!(week_of(date), 1, "day {}", day);
        }
        let date = NaiveDate::from_ymd_opt(2026, 1, 4).unwrap();

        // 断言
        assert_eq!(week_of(date), 2);
    }

    #[test]
    fn test_scenario_02_week_formula_uses_day_of_month() {
        // 场景2: 周序按月内日计算（既有口径,非 ISO 周）
        // 2026-02-01: 2月1日, ceil((1+4)/7) = 1
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        // 断言
        assert_eq!(week_of(date), 1);
    }

    // ==========================================
    // 逐记录重扫测试
    // ==========================================

    #[test]
    fn test_scenario_03_same_day_records_sum() {
        // 场景3: 同键同日 N 条记录,每条的日汇总都等于 N 条数量之和
        let engine = AggregationEngine::new();
        let records = vec![
            create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-10")),
            create_test_record("B", Some("P100"), None, "Excavation", InputType::Actual, 20.0, Some("2026-03-10")),
            create_test_record("C", Some("P100"), None, "excavation", InputType::Actual, 30.0, Some("2026-03-10")),
        ];

        for focal in &records {
            let aggregate = engine.aggregate_for(focal, &records, flat_value, today());

            // 断言: 活动名大小写不敏感,三条都计入
            assert_eq!(aggregate.daily_quantity, 60.0);
            assert_eq!(aggregate.daily_value, 30.0);
        }
    }

    #[test]
    fn test_scenario_04_group_key_filters() {
        // 场景4: 项目/活动/录入类型任一不同都不计入
        let engine = AggregationEngine::new();
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-10"));
        let records = vec![
            focal.clone(),
            // 项目不同
            create_test_record("B", Some("P200"), None, "Excavation", InputType::Actual, 100.0, Some("2026-03-10")),
            // 活动不同
            create_test_record("C", Some("P100"), None, "Backfill", InputType::Actual, 100.0, Some("2026-03-10")),
            // 录入类型不同
            create_test_record("D", Some("P100"), None, "Excavation", InputType::Planned, 100.0, Some("2026-03-10")),
        ];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言: 只有焦点自身
        assert_eq!(aggregate.daily_quantity, 10.0);
        assert_eq!(aggregate.monthly_quantity, 10.0);
    }

    #[test]
    fn test_scenario_05_project_equivalence_cross_fields() {
        // 场景5: 项目等价跨短码/全码字段成立
        let engine = AggregationEngine::new();
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-10"));
        let records = vec![
            focal.clone(),
            create_test_record("B", None, Some("P100"), "Excavation", InputType::Actual, 5.0, Some("2026-03-10")),
        ];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言
        assert_eq!(aggregate.daily_quantity, 15.0);
    }

    #[test]
    fn test_scenario_06_weekly_and_monthly_windows() {
        // 场景6: 日/周/月窗口逐级放宽
        let engine = AggregationEngine::new();
        // 2026-03: 3月1日是周日(序=0)... 1月1日序=4,周序按 (day+4)/7 向上取整
        // day 10 → ceil(14/7)=2; day 12 → ceil(16/7)=3; day 13 → ceil(17/7)=3
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-12"));
        let records = vec![
            focal.clone(),
            // 同日
            create_test_record("B", Some("P100"), None, "Excavation", InputType::Actual, 5.0, Some("2026-03-12")),
            // 同周不同日
            create_test_record("C", Some("P100"), None, "Excavation", InputType::Actual, 7.0, Some("2026-03-13")),
            // 同月不同周
            create_test_record("D", Some("P100"), None, "Excavation", InputType::Actual, 11.0, Some("2026-03-10")),
            // 不同月（2月12日周序同为 ceil(16/7)=3,按既有口径落入同一周窗口）
            create_test_record("E", Some("P100"), None, "Excavation", InputType::Actual, 13.0, Some("2026-02-12")),
        ];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言: 周键按 (年, 周序) 比较,月内日口径使同年不同月的相同周序互相可见
        assert_eq!(aggregate.daily_quantity, 15.0);
        assert_eq!(aggregate.weekly_quantity, 35.0);
        assert_eq!(aggregate.monthly_quantity, 33.0);
    }

    #[test]
    fn test_scenario_07_unparseable_peer_excluded() {
        // 场景7: 日期无法解析的记录不参与汇总
        let engine = AggregationEngine::new();
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-10"));
        let records = vec![
            focal.clone(),
            create_test_record("B", Some("P100"), None, "Excavation", InputType::Actual, 99.0, Some("not a date")),
        ];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言
        assert_eq!(aggregate.daily_quantity, 10.0);
    }

    #[test]
    fn test_scenario_08_unparseable_focal_is_empty() {
        // 场景8: 焦点记录日期无法解析,返回全 0
        let engine = AggregationEngine::new();
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, None);
        let records = vec![focal.clone()];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言
        assert_eq!(aggregate, Aggregate::empty("A"));
    }

    #[test]
    fn test_scenario_09_day_token_dates_aggregate() {
        // 场景9: "Day N" 相对日期参与汇总
        let engine = AggregationEngine::new();
        // today = 2026-03-15, Day 5 → 2026-03-10
        let focal = create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("Day 5"));
        let records = vec![
            focal.clone(),
            create_test_record("B", Some("P100"), None, "Excavation", InputType::Actual, 6.0, Some("2026-03-10")),
        ];

        let aggregate = engine.aggregate_for(&focal, &records, flat_value, today());

        // 断言
        assert_eq!(aggregate.daily_quantity, 16.0);
    }

    // ==========================================
    // 索引口径测试
    // ==========================================

    #[test]
    fn test_scenario_10_index_matches_rescan() {
        // 场景10: 索引口径与重扫口径输出一致
        let engine = AggregationEngine::new();
        let records = vec![
            create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-12")),
            create_test_record("B", Some("P100"), None, "excavation", InputType::Actual, 5.0, Some("2026-03-13")),
            create_test_record("C", None, Some("P100"), "Excavation", InputType::Actual, 7.0, Some("2026-03-10")),
            create_test_record("D", Some("P100"), None, "Excavation", InputType::Planned, 11.0, Some("2026-03-12")),
            create_test_record("E", Some("P200"), None, "Excavation", InputType::Actual, 13.0, Some("2026-03-12")),
            create_test_record("F", Some("P100"), None, "Backfill", InputType::Actual, 17.0, Some("bad date")),
        ];

        let mut values = HashMap::new();
        for record in &records {
            values.insert(record.record_id.clone(), 10.0);
        }
        let index = engine.build_index(&records, &values, today());

        for focal in &records {
            let from_scan = engine.aggregate_for(focal, &records, flat_value, today());
            let from_index = index.aggregate_for(focal);

            // 断言
            assert_eq!(from_scan, from_index, "record {}", focal.record_id);
        }
    }

    #[test]
    fn test_scenario_11_index_unknown_focal_is_empty() {
        // 场景11: 焦点不在索引批次内返回空汇总
        let engine = AggregationEngine::new();
        let records = vec![create_test_record("A", Some("P100"), None, "Excavation", InputType::Actual, 10.0, Some("2026-03-12"))];
        let values = HashMap::new();
        let index = engine.build_index(&records, &values, today());

        let outsider = create_test_record("X", Some("P100"), None, "Piling", InputType::Actual, 10.0, Some("2026-03-12"));

        // 断言
        assert_eq!(index.aggregate_for(&outsider), Aggregate::empty("X"));
    }
}
