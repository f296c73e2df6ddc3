// ==========================================
// 施工项目管理系统 - 业务范围解析引擎
// ==========================================
// 职责: 按活动名级联模糊匹配业务范围分类
// 级联: 全名 → 首段 → 去末段 → 前缀互含 → 项目默认 → UNKNOWN
// 红线: 永不抛错;查找表是显式构建的不可变快照,不做进程级缓存
// ==========================================

use crate::domain::settings::ScopeMapping;
use crate::domain::types::ScopeSource;
use crate::domain::valuation::ScopeResolution;
use std::collections::BTreeMap;

// ==========================================
// ScopeResolver - 业务范围解析引擎
// ==========================================
// BTreeMap 保证前缀扫描顺序确定,多候选时结果可复现
pub struct ScopeResolver {
    mappings: BTreeMap<String, String>,
    unknown_label: String,
}

impl ScopeResolver {
    /// 从映射行构建快照（键统一 trim + 小写;重复键首行优先）
    pub fn from_mappings(mappings: &[ScopeMapping], unknown_label: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        for mapping in mappings {
            let key = mapping.activity_name_key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            map.entry(key).or_insert_with(|| mapping.scope_label.clone());
        }

        Self {
            mappings: map,
            unknown_label: unknown_label.into(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 解析业务范围分类
    ///
    /// 级联顺序,命中即返回:
    /// (a) 全名精确匹配（小写）
    /// (b) 名称首个 '-' 分段
    /// (c) 名称去掉末个 '-' 分段
    /// (d) 任一映射键与名称互为前缀
    /// (e) 调用方提供的项目级默认分类
    /// (f) UNKNOWN 哨兵值
    pub fn resolve(&self, activity_name: &str, project_default: Option<&str>) -> ScopeResolution {
        let name = activity_name.trim().to_lowercase();

        if !name.is_empty() {
            // (a) 全名精确匹配
            if let Some(label) = self.mappings.get(&name) {
                return Self::hit(label, ScopeSource::ExactMatch);
            }

            // (b) 首个 '-' 分段
            if let Some(first) = name.split('-').next() {
                let first = first.trim();
                if !first.is_empty() && first != name {
                    if let Some(label) = self.mappings.get(first) {
                        return Self::hit(label, ScopeSource::FirstSegment);
                    }
                }
            }

            // (c) 去掉末个 '-' 分段
            if let Some(idx) = name.rfind('-') {
                let head = name[..idx].trim();
                if !head.is_empty() {
                    if let Some(label) = self.mappings.get(head) {
                        return Self::hit(label, ScopeSource::StrippedTail);
                    }
                }
            }

            // (d) 前缀互含,BTreeMap 顺序保证确定性
            for (key, label) in &self.mappings {
                if name.starts_with(key.as_str()) || key.starts_with(&name) {
                    return Self::hit(label, ScopeSource::PrefixMatch);
                }
            }
        }

        // (e) 项目级默认分类
        if let Some(default) = project_default.map(str::trim).filter(|s| !s.is_empty()) {
            return Self::hit(default, ScopeSource::ProjectDefault);
        }

        // (f) 哨兵值
        ScopeResolution {
            scope_label: self.unknown_label.clone(),
            source: ScopeSource::Unknown,
        }
    }

    fn hit(label: &str, source: ScopeSource) -> ScopeResolution {
        ScopeResolution {
            scope_label: label.to_string(),
            source,
        }
    }
}
