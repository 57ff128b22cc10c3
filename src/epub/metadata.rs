//! 包元数据修补
//!
//! 在OPF内容转换完成后，把简体语言标签替换为繁体语言标签。

/// 默认的源语言标签
pub const DEFAULT_SOURCE_LANGUAGE: &str = "zh-CN";

/// 默认的目标语言标签
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh-TW";

/// `<dc:language>` 标签的字面替换规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPatcher {
    from: String,
    to: String,
}

impl MetadataPatcher {
    /// 创建替换规则
    ///
    /// # 参数
    /// * `source_language` - 被替换的语言值，例如 `zh-CN`
    /// * `target_language` - 替换后的语言值，例如 `zh-TW`
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            from: language_element(source_language),
            to: language_element(target_language),
        }
    }

    /// 修补元数据文本
    ///
    /// 精确的字面子串替换；找不到标签时原样返回。
    pub fn patch(&self, text: &str) -> String {
        text.replace(&self.from, &self.to)
    }
}

impl Default for MetadataPatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE)
    }
}

fn language_element(language: &str) -> String {
    format!("<dc:language>{}</dc:language>", language)
}

/// 使用默认规则（zh-CN → zh-TW）修补元数据文本
pub fn patch_metadata(text: &str) -> String {
    MetadataPatcher::default().patch(text)
}
