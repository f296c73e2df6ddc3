// ==========================================
// 施工项目管理系统 - 引擎参数配置
// ==========================================
// 职责: 计价/汇总引擎的可调参数,全部带默认值
// 红线: 配置缺失不报错,按默认值运行
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 价值≈数量判定容差默认值
pub const DEFAULT_VALUE_QUANTITY_TOLERANCE: f64 = 0.01;

/// 范围分类未命中时的哨兵值
pub const DEFAULT_UNKNOWN_SCOPE_LABEL: &str = "UNKNOWN";

// ==========================================
// ConfigError - 配置加载错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

// ==========================================
// EngineProfile - 引擎参数
// ==========================================
/// 引擎参数（轻量版：只覆盖"无需查库"的计算维度）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineProfile {
    /// reported_value ≈ quantity 判定容差（缺省 0.01）
    #[serde(default)]
    pub value_quantity_tolerance: Option<f64>,

    /// 范围分类哨兵值（缺省 "UNKNOWN"）
    #[serde(default)]
    pub unknown_scope_label: Option<String>,

    /// 附加日期格式（chrono 格式串,排在内置格式之后尝试）
    #[serde(default)]
    pub extra_date_formats: Option<Vec<String>>,
}

impl EngineProfile {
    /// 从 JSON 文件加载
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 价值≈数量判定容差
    pub fn value_quantity_tolerance(&self) -> f64 {
        self.value_quantity_tolerance
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(DEFAULT_VALUE_QUANTITY_TOLERANCE)
    }

    /// 范围分类哨兵值
    pub fn unknown_scope_label(&self) -> &str {
        self.unknown_scope_label
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_UNKNOWN_SCOPE_LABEL)
    }

    /// 附加日期格式
    pub fn extra_date_formats(&self) -> &[String] {
        self.extra_date_formats.as_deref().unwrap_or(&[])
    }
}
