// ==========================================
// 施工项目管理系统 - 计价引擎编排器
// ==========================================
// 用途: 协调六个核心引擎的执行顺序
// 流程: 目录匹配 → 价值解析 → 虚拟材料 → 范围分类 → 时间窗汇总
// 红线: 纯函数,输入是调用方提供的不可变快照,不做任何 I/O
// ==========================================

use crate::config::EngineProfile;
use crate::domain::catalog::RateCatalogEntry;
use crate::domain::record::ProgressRecord;
use crate::domain::settings::SettingsSnapshot;
use crate::domain::valuation::{KpiEvaluation, ScopeResolution, Valuation};
use crate::engine::aggregation::AggregationEngine;
use crate::engine::effective_date::EffectiveDateResolver;
use crate::engine::matcher::RateCatalogMatcher;
use crate::engine::scope::ScopeResolver;
use crate::engine::value::ValueResolver;
use crate::engine::virtual_material::VirtualMaterialAugmenter;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// ValuationOrchestrator - 计价引擎编排器
// ==========================================
pub struct ValuationOrchestrator {
    profile: EngineProfile,
    matcher: RateCatalogMatcher,
    value_resolver: ValueResolver,
    augmenter: VirtualMaterialAugmenter,
    aggregator: AggregationEngine,
}

impl ValuationOrchestrator {
    /// 构造函数（缺省参数）
    pub fn new() -> Self {
        Self::with_profile(EngineProfile::default())
    }

    /// 注入引擎参数构造
    pub fn with_profile(profile: EngineProfile) -> Self {
        let value_resolver = ValueResolver::with_tolerance(profile.value_quantity_tolerance());
        let aggregator = AggregationEngine::with_resolver(EffectiveDateResolver::with_extra_formats(
            profile.extra_date_formats(),
        ));

        Self {
            matcher: RateCatalogMatcher::new(),
            value_resolver,
            augmenter: VirtualMaterialAugmenter::new(),
            aggregator,
            profile,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算单条记录的完整视图（逐记录重扫口径）
    ///
    /// 汇总需要的同组记录价值按需现场计价,整批计算请用 evaluate_batch
    pub fn evaluate_single(
        &self,
        focal: &ProgressRecord,
        records: &[ProgressRecord],
        catalog: &[RateCatalogEntry],
        settings: &SettingsSnapshot,
        today: NaiveDate,
    ) -> KpiEvaluation {
        let valuation = self.valuate(focal, catalog, settings);
        let scope = self.resolve_scope(focal, settings);

        let aggregate = self.aggregator.aggregate_for(
            focal,
            records,
            |peer| {
                if peer.record_id == focal.record_id {
                    valuation.total_value
                } else {
                    self.valuate(peer, catalog, settings).total_value
                }
            },
            today,
        );

        KpiEvaluation {
            valuation,
            scope,
            aggregate,
        }
    }

    /// 整批计算（预计算索引口径,输出契约与 evaluate_single 一致）
    #[instrument(skip_all, fields(record_count = records.len(), catalog_count = catalog.len()))]
    pub fn evaluate_batch(
        &self,
        records: &[ProgressRecord],
        catalog: &[RateCatalogEntry],
        settings: &SettingsSnapshot,
        today: NaiveDate,
    ) -> Vec<KpiEvaluation> {
        info!("开始整批 KPI 计算");

        // ==========================================
        // 步骤1: 逐条计价（每条只算一次）
        // ==========================================
        debug!("步骤1: 逐条计价");
        let valuations: Vec<Valuation> = records
            .iter()
            .map(|record| self.valuate(record, catalog, settings))
            .collect();

        // ==========================================
        // 步骤2: 范围分类（快照构建一次,整批复用）
        // ==========================================
        debug!("步骤2: 范围分类");
        let scope_resolver = ScopeResolver::from_mappings(
            &settings.scope_mappings,
            self.profile.unknown_scope_label(),
        );

        // ==========================================
        // 步骤3: 构建汇总索引并逐条汇总
        // ==========================================
        debug!("步骤3: 构建汇总索引");
        let values: HashMap<String, f64> = records
            .iter()
            .zip(&valuations)
            .map(|(record, valuation)| (record.record_id.clone(), valuation.total_value))
            .collect();
        let index = self.aggregator.build_index(records, &values, today);

        records
            .iter()
            .zip(valuations)
            .map(|(record, valuation)| {
                let scope = scope_resolver.resolve(
                    &record.activity_name,
                    settings.default_scope_for(
                        record.project_code.as_deref(),
                        record.project_full_code.as_deref(),
                    ),
                );
                let aggregate = index.aggregate_for(record);

                KpiEvaluation {
                    valuation,
                    scope,
                    aggregate,
                }
            })
            .collect()
    }

    // ==========================================
    // 单条计价流水线
    // ==========================================

    /// 目录匹配 → 价值解析 → 虚拟材料
    pub fn valuate(
        &self,
        record: &ProgressRecord,
        catalog: &[RateCatalogEntry],
        settings: &SettingsSnapshot,
    ) -> Valuation {
        // ===== 步骤1: 目录匹配（先带区域,无命中放弃区域回退）=====
        let strict = self.matcher.find_match_with_zone(record, catalog);
        let (matched, matched_via_zone_fallback) = match strict {
            Some(entry) => (Some(entry), false),
            None => {
                let fallback = self.matcher.find_match_ignoring_zone(record, catalog);
                (fallback, fallback.is_some())
            }
        };

        // ===== 步骤2: 价值解析 =====
        let resolved = self
            .value_resolver
            .resolve(record, matched, &self.matcher, catalog);

        // ===== 步骤3: 虚拟材料附加 =====
        let use_virtual_material = matched.map(|e| e.use_virtual_material).unwrap_or(false);
        let pct_text = settings.virtual_material_pct_for(
            record.project_code.as_deref(),
            record.project_full_code.as_deref(),
        );
        let vm = self
            .augmenter
            .apply(resolved.base_value, use_virtual_material, pct_text);

        Valuation {
            record_id: record.record_id.clone(),
            rate: resolved.rate,
            base_value: resolved.base_value,
            virtual_material_pct: vm.percentage,
            virtual_material_amount: vm.amount,
            total_value: vm.total_value,
            value_basis: resolved.value_basis,
            rate_source: resolved.rate_source,
            suspect_reported_value: resolved.suspect_reported_value,
            used_zone_fallback: resolved.used_zone_fallback || matched_via_zone_fallback,
        }
    }

    /// 范围分类（单条口径;整批口径在 evaluate_batch 内复用快照）
    pub fn resolve_scope(
        &self,
        record: &ProgressRecord,
        settings: &SettingsSnapshot,
    ) -> ScopeResolution {
        let resolver = ScopeResolver::from_mappings(
            &settings.scope_mappings,
            self.profile.unknown_scope_label(),
        );
        resolver.resolve(
            &record.activity_name,
            settings.default_scope_for(
                record.project_code.as_deref(),
                record.project_full_code.as_deref(),
            ),
        )
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ValuationOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::ScopeMapping;
    use crate::domain::types::{InputType, ValueBasis};
    use serde_json::Map;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_record(
        record_id: &str,
        quantity: f64,
        activity_name: &str,
        zone_label: Option<&str>,
        project_code: &str,
    ) -> ProgressRecord {
        ProgressRecord {
            record_id: record_id.to_string(),
            project_code: Some(project_code.to_string()),
            project_full_code: None,
            activity_name: activity_name.to_string(),
            zone_label: zone_label.map(|s| s.to_string()),
            input_type: InputType::Actual,
            quantity,
            unit: Some("m3".to_string()),
            reported_value: None,
            planned_value: None,
            actual_value: None,
            actual_date: Some("2026-03-10".to_string()),
            target_date: None,
            entry_date: None,
            raw_fields: Map::new(),
        }
    }

    fn create_test_entry(
        activity_name: &str,
        zone_ref: Option<&str>,
        total_value: f64,
        total_units: f64,
        project_code: &str,
        use_virtual_material: bool,
    ) -> RateCatalogEntry {
        RateCatalogEntry {
            project_code: Some(project_code.to_string()),
            project_full_code: None,
            activity_name: activity_name.to_string(),
            zone_ref: zone_ref.map(|s| s.to_string()),
            total_value,
            total_units,
            rate: None,
            use_virtual_material,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    // ==========================================
    // 端到端场景测试
    // ==========================================

    #[test]
    fn test_scenario_01_e2e_rate_and_base_value() {
        // 场景1: 量100 × (5000/500) = 1000
        let orchestrator = ValuationOrchestrator::new();
        let record = create_test_record("R1", 100.0, "Excavation", Some("P100-Zone 2"), "P100");
        let catalog = vec![create_test_entry(
            "Excavation",
            Some("Zone 2"),
            5000.0,
            500.0,
            "P100",
            false,
        )];
        let settings = SettingsSnapshot::default();

        let result =
            orchestrator.evaluate_single(&record, &[record.clone()], &catalog, &settings, today());

        // 断言
        assert_eq!(result.valuation.rate, 10.0);
        assert_eq!(result.valuation.base_value, 1000.0);
        assert_eq!(result.valuation.total_value, 1000.0);
        assert_eq!(result.valuation.value_basis, ValueBasis::RateTimesQuantity);
        assert!(!result.valuation.used_zone_fallback);
    }

    #[test]
    fn test_scenario_02_e2e_virtual_material() {
        // 场景2: 同上 + 虚拟材料 20% ⇒ 附加 200,总值 1200
        let orchestrator = ValuationOrchestrator::new();
        let record = create_test_record("R1", 100.0, "Excavation", Some("P100-Zone 2"), "P100");
        let catalog = vec![create_test_entry(
            "Excavation",
            Some("Zone 2"),
            5000.0,
            500.0,
            "P100",
            true,
        )];
        let mut settings = SettingsSnapshot::default();
        settings
            .virtual_material_pct
            .insert("P100".to_string(), "20%".to_string());

        let result =
            orchestrator.evaluate_single(&record, &[record.clone()], &catalog, &settings, today());

        // 断言
        assert_eq!(result.valuation.virtual_material_pct, 20.0);
        assert_eq!(result.valuation.virtual_material_amount, 200.0);
        assert_eq!(result.valuation.total_value, 1200.0);
    }

    #[test]
    fn test_scenario_03_e2e_zone_fallback_rate() {
        // 场景3: 区域无命中,回退到同活动同项目不同区域的行
        let orchestrator = ValuationOrchestrator::new();
        let record = create_test_record("R1", 100.0, "Excavation", Some("Zone 2"), "P100");
        let catalog = vec![create_test_entry(
            "Excavation",
            Some("Zone 9"),
            5000.0,
            500.0,
            "P100",
            false,
        )];
        let settings = SettingsSnapshot::default();

        let result =
            orchestrator.evaluate_single(&record, &[record.clone()], &catalog, &settings, today());

        // 断言
        assert_eq!(result.valuation.rate, 10.0);
        assert_eq!(result.valuation.base_value, 1000.0);
        assert!(result.valuation.used_zone_fallback);
    }

    #[test]
    fn test_scenario_04_no_match_means_no_virtual_material() {
        // 场景4: 未匹配到目录行时虚拟材料强制为 0
        let orchestrator = ValuationOrchestrator::new();
        let mut record = create_test_record("R1", 100.0, "Excavation", None, "P100");
        record.reported_value = Some(777.0);
        let mut settings = SettingsSnapshot::default();
        settings
            .virtual_material_pct
            .insert("P100".to_string(), "20%".to_string());

        let result =
            orchestrator.evaluate_single(&record, &[record.clone()], &[], &settings, today());

        // 断言: reported_value 兜底,但无附加
        assert_eq!(result.valuation.base_value, 777.0);
        assert_eq!(result.valuation.virtual_material_amount, 0.0);
        assert_eq!(result.valuation.total_value, 777.0);
    }

    #[test]
    fn test_scenario_05_scope_and_aggregate_in_one_view() {
        // 场景5: 完整视图同时携带分类与汇总
        let orchestrator = ValuationOrchestrator::new();
        let record_a = create_test_record("A", 100.0, "Guide Wall - Infra", None, "P100");
        let record_b = create_test_record("B", 50.0, "guide wall - infra", None, "P100");
        let records = vec![record_a.clone(), record_b];
        let catalog = vec![create_test_entry(
            "Guide Wall - Infra",
            None,
            3000.0,
            300.0,
            "P100",
            false,
        )];
        let mut settings = SettingsSnapshot::default();
        settings.scope_mappings.push(ScopeMapping {
            activity_name_key: "guide wall".to_string(),
            scope_label: "Infra".to_string(),
        });

        let result =
            orchestrator.evaluate_single(&record_a, &records, &catalog, &settings, today());

        // 断言
        assert_eq!(result.scope.scope_label, "Infra");
        assert_eq!(result.aggregate.daily_quantity, 150.0);
        // 两条记录同单价: 100×10 + 50×10
        assert_eq!(result.aggregate.daily_value, 1500.0);
    }

    #[test]
    fn test_scenario_06_batch_matches_single() {
        // 场景6: 整批口径与单条口径输出一致
        let orchestrator = ValuationOrchestrator::new();
        let records = vec![
            create_test_record("A", 100.0, "Excavation", Some("Zone 2"), "P100"),
            create_test_record("B", 50.0, "Excavation", Some("Zone 2"), "P100"),
            create_test_record("C", 30.0, "Backfill", None, "P100"),
        ];
        let catalog = vec![
            create_test_entry("Excavation", Some("Zone 2"), 5000.0, 500.0, "P100", false),
            create_test_entry("Backfill", None, 800.0, 100.0, "P100", false),
        ];
        let settings = SettingsSnapshot::default();

        let batch = orchestrator.evaluate_batch(&records, &catalog, &settings, today());

        assert_eq!(batch.len(), 3);
        for (record, from_batch) in records.iter().zip(&batch) {
            let single =
                orchestrator.evaluate_single(record, &records, &catalog, &settings, today());

            // 断言
            assert_eq!(
                single.valuation.total_value,
                from_batch.valuation.total_value
            );
            assert_eq!(single.scope.scope_label, from_batch.scope.scope_label);
            assert_eq!(single.aggregate, from_batch.aggregate);
        }
    }
}
