// ==========================================
// 施工项目管理系统 - 设置快照领域模型
// ==========================================
// 用途: 设置数据源每次调用提供的一份不可变快照
// 红线: 不做进程级缓存,目录刷新时由调用方重建快照
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// ScopeMapping - 业务范围映射行
// ==========================================
// 多个活动名可以映射到同一个范围分类
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeMapping {
    pub activity_name_key: String, // 活动名键（存储时即为小写）
    pub scope_label: String,       // 范围分类标签
}

// ==========================================
// SettingsSnapshot - 项目设置快照
// ==========================================
// 范围映射 + 项目级虚拟材料比例 + 项目级默认分类
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// 范围映射表（活动名 → 范围分类）
    #[serde(default)]
    pub scope_mappings: Vec<ScopeMapping>,

    /// 项目级虚拟材料比例（项目码 → 比例字符串,如 "15"/"15%"/"0.15"）
    #[serde(default)]
    pub virtual_material_pct: HashMap<String, String>,

    /// 项目级默认范围分类（项目码 → 分类标签）
    #[serde(default)]
    pub default_scope: HashMap<String, String>,
}

impl SettingsSnapshot {
    /// 按项目查虚拟材料比例字符串
    ///
    /// 短码/全码哪个是权威字段因项目而异，两个都查
    pub fn virtual_material_pct_for(
        &self,
        project_code: Option<&str>,
        project_full_code: Option<&str>,
    ) -> Option<&str> {
        self.lookup_by_project(&self.virtual_material_pct, project_code, project_full_code)
    }

    /// 按项目查默认范围分类
    pub fn default_scope_for(
        &self,
        project_code: Option<&str>,
        project_full_code: Option<&str>,
    ) -> Option<&str> {
        self.lookup_by_project(&self.default_scope, project_code, project_full_code)
    }

    fn lookup_by_project<'a>(
        &self,
        map: &'a HashMap<String, String>,
        project_code: Option<&str>,
        project_full_code: Option<&str>,
    ) -> Option<&'a str> {
        for code in [project_code, project_full_code].into_iter().flatten() {
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            if let Some(v) = map.get(code) {
                return Some(v.as_str());
            }
            // 设置端与录入端大小写可能不一致
            if let Some((_, v)) = map
                .iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(code))
            {
                return Some(v.as_str());
            }
        }
        None
    }
}
