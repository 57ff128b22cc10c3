//! 文本转换模块
//!
//! 封装简繁转换引擎。引擎构建代价较高（需要加载转换词表），
//! 因此每个进程只构建一次，然后以引用的方式传递给各个组件。

use crate::epub::error::{EpubError, Result};
use tracing::debug;
use zhconv::{Variant, ZhConverter};

/// 文本转换接口
///
/// 对任意字符串（包括空字符串）都是全函数，不会失败。
pub trait TextConverter: Send + Sync {
    /// 转换一段文本
    fn convert(&self, text: &str) -> String;
}

/// 基于 `zhconv` 的简繁转换器
pub struct ChineseConverter {
    variant: Variant,
    inner: &'static ZhConverter,
}

impl ChineseConverter {
    /// 创建指定目标变体的转换器
    ///
    /// # 参数
    /// * `variant` - 目标中文变体，例如 `Variant::ZhTW`
    pub fn new(variant: Variant) -> Self {
        debug!("加载转换词表: {:?}", variant);
        Self {
            variant,
            inner: zhconv::get_builtin_converter(variant),
        }
    }

    /// 从变体名称创建转换器
    ///
    /// # 参数
    /// * `name` - 变体名称，例如 `zh-TW`、`zh-HK`、`zh-Hant`
    ///
    /// # 返回值
    /// * `Result<ChineseConverter>` - 名称无法识别时返回配置错误
    pub fn from_name(name: &str) -> Result<Self> {
        let variant: Variant = name
            .parse()
            .map_err(|_| EpubError::ConfigError(format!("未知的中文变体: {}", name)))?;
        Ok(Self::new(variant))
    }

    /// 目标变体
    pub fn variant(&self) -> Variant {
        self.variant
    }
}

impl Default for ChineseConverter {
    fn default() -> Self {
        Self::new(Variant::ZhTW)
    }
}

impl TextConverter for ChineseConverter {
    fn convert(&self, text: &str) -> String {
        self.inner.convert(text)
    }
}

/// 逐行转换文本内容
///
/// 按 `\n` 切分后逐行转换，再用 `\n` 拼接。行数保持不变，
/// 行尾的 `\r` 作为行内容的一部分原样经过转换器。
pub fn convert_content(converter: &dyn TextConverter, text: &str) -> String {
    text.split('\n')
        .map(|line| converter.convert(line))
        .collect::<Vec<_>>()
        .join("\n")
}
