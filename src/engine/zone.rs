// ==========================================
// 施工项目管理系统 - 区域归一化引擎
// ==========================================
// 职责: 从自由文本区域标签中剥离项目码前缀,提取可比较的规范 token
// 输入: 原始区域标签 + 项目码
// 输出: 小写规范 token + 规范区域号（首个数字串,无数字则取 token 本身）
// 红线: 剥离不得丢失信息,剥空即回退原始标签
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// NormalizedZone - 归一化区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedZone {
    pub token: String,  // 小写规范 token（空串 = 无区域）
    pub number: String, // 规范区域号（首个数字串,否则为 token）
}

impl NormalizedZone {
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

// ==========================================
// ZoneNormalizer - 区域归一化引擎
// ==========================================
pub struct ZoneNormalizer {
    // 无状态引擎,不需要注入依赖
}

impl ZoneNormalizer {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 归一化区域标签
    ///
    /// 规则:
    /// 1) 去首尾空白,压缩连续空白
    /// 2) 项目码非空时,剥离与分隔符相邻的项目码（"P8888 - Zone 1" / "Zone 1 - P8888" 两个方向）
    /// 3) 剥离后为空或只剩孤立 '-' 时回退原始标签
    /// 4) 统一小写
    ///
    /// 对已归一化的输入幂等
    pub fn normalize(&self, raw_label: &str, project_code: &str) -> NormalizedZone {
        let token = self.canonical_token(raw_label, project_code);
        let number = Self::zone_number(&token);
        NormalizedZone { token, number }
    }

    /// 提取规范 token（小写）
    pub fn canonical_token(&self, raw_label: &str, project_code: &str) -> String {
        let original = Self::collapse_whitespace(raw_label.trim());
        if original.is_empty() {
            return String::new();
        }

        let code = project_code.trim();
        if code.is_empty() {
            // 项目码为空只做 trim/小写,不剥离
            return original.to_lowercase();
        }

        match Self::strip_project_code(&original, code) {
            Some(stripped) => {
                let cleaned = Self::collapse_whitespace(
                    stripped.trim_matches(|c: char| c.is_whitespace() || c == '-'),
                );
                if cleaned.is_empty() {
                    // 剥空即回退,不丢信息
                    original.to_lowercase()
                } else {
                    cleaned.to_lowercase()
                }
            }
            None => original.to_lowercase(),
        }
    }

    /// 规范区域号: 首个连续数字串,无数字则取 token 本身
    pub fn zone_number(token: &str) -> String {
        let digits: String = token
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();

        if digits.is_empty() {
            token.to_string()
        } else {
            digits
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 剥离与分隔符相邻的项目码出现（大小写不敏感,带边界检查）
    ///
    /// 返回 None 表示标签中没有可剥离的项目码
    fn strip_project_code(label: &str, code: &str) -> Option<String> {
        let label_chars: Vec<char> = label.chars().collect();
        let code_len = code.chars().count();
        if code_len == 0 || code_len > label_chars.len() {
            return None;
        }

        let mut out = String::with_capacity(label.len());
        let mut stripped_any = false;
        let mut i = 0;
        while i < label_chars.len() {
            if i + code_len <= label_chars.len() {
                let candidate: String = label_chars[i..i + code_len].iter().collect();
                let prev_ok = i == 0 || Self::is_separator(label_chars[i - 1]);
                let next_ok = i + code_len == label_chars.len()
                    || Self::is_separator(label_chars[i + code_len]);

                if prev_ok && next_ok && candidate.eq_ignore_ascii_case(code) {
                    // 用空格占位,避免左右单词粘连
                    out.push(' ');
                    stripped_any = true;
                    i += code_len;
                    continue;
                }
            }
            out.push(label_chars[i]);
            i += 1;
        }

        if stripped_any {
            Some(out)
        } else {
            None
        }
    }

    /// 项目码边界字符: 空白或 '-'
    fn is_separator(c: char) -> bool {
        c.is_whitespace() || c == '-'
    }

    /// 压缩连续空白为单个空格
    fn collapse_whitespace(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ZoneNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
