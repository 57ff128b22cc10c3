//! 转换配置模块
//!
//! 提供转换参数的配置管理功能，支持从YAML文件加载配置。

use crate::epub::converter::ChineseConverter;
use crate::epub::error::{EpubError, Result};
use crate::epub::metadata::{DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE, MetadataPatcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "epubtc.yaml";

/// 转换配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// 目标中文变体（zh-TW、zh-HK、zh-Hant 等）
    pub target: String,
    /// OPF中被替换的语言标签
    pub source_language: String,
    /// OPF中替换后的语言标签
    pub target_language: String,
    /// 目录模式下的输出子目录
    pub output_dir: String,
    /// 单文件模式下文件名没有变化时追加的标记
    pub output_suffix: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target: "zh-TW".to_string(),
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            output_dir: "tc".to_string(),
            output_suffix: "-tc".to_string(),
        }
    }
}

impl ConvertConfig {
    /// 从指定的配置文件加载
    ///
    /// # 参数
    /// * `path` - YAML配置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 加载成功返回配置实例，失败返回错误
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EpubError::ConfigError(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&content)
    }

    /// 从YAML文本解析配置，缺省的字段使用默认值
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置
    ///
    /// 给出路径时从文件加载，否则使用默认配置。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// 生成默认配置文件
    ///
    /// # 参数
    /// * `path` - 配置文件的写入路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        // 在YAML内容前添加注释说明
        let content_with_header = format!(
            "# epubtc 转换配置文件\n# target: 目标中文变体 (zh-TW, zh-HK, zh-Hant)\n# source_language/target_language: OPF中 <dc:language> 的替换规则\n\n{}",
            yaml_content
        );

        fs::write(path, content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))
    }

    /// 检查配置取值
    fn validate(&self) -> Result<()> {
        if self.output_dir.trim().is_empty() {
            return Err(EpubError::ConfigError("output_dir 不能为空".to_string()));
        }
        // 输出目录必须是输入目录下的子目录，否则可能覆盖源文件
        let is_subdirectory = Path::new(&self.output_dir)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !is_subdirectory {
            return Err(EpubError::ConfigError(format!(
                "output_dir 必须是相对的子目录名: {}",
                self.output_dir
            )));
        }
        if self.output_suffix.is_empty() {
            return Err(EpubError::ConfigError("output_suffix 不能为空".to_string()));
        }
        Ok(())
    }

    /// 根据配置构建转换器
    pub fn converter(&self) -> Result<ChineseConverter> {
        ChineseConverter::from_name(&self.target)
    }

    /// 根据配置构建元数据修补规则
    pub fn metadata_patcher(&self) -> MetadataPatcher {
        MetadataPatcher::new(&self.source_language, &self.target_language)
    }
}
