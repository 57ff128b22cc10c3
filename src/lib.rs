pub mod batch;
pub mod epub;

// === 核心API重新导出 ===

/// EPUB转码器（主要接口）
pub use epub::Transcoder;

/// 错误处理
pub use epub::{EpubError, Result};

// === 转换组件 ===

/// 文本转换器
pub use epub::{ChineseConverter, TextConverter, convert_content};

/// 条目分类、名称转换与元数据修补
pub use epub::{MetadataPatcher, is_convertible, patch_metadata, transliterate_name};

/// 转码结果
pub use epub::{EntryFailure, EntryKind, TranscodeReport};

/// 配置
pub use epub::ConvertConfig;

/// 批量转换
pub use batch::{BatchDriver, BatchSummary, FileOutcome, FileStatus};

// === 库信息 ===

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库的描述
pub const DESCRIPTION: &str = "将EPUB电子书中的简体中文转换为繁体中文";

// === 便捷函数 ===

/// 使用默认设置（zh-TW）转换单个EPUB文件
///
/// 每次调用都会取得转换器；批量转换时请构建一个 [`ChineseConverter`]
/// 并通过 [`Transcoder`] 复用。
///
/// # 参数
/// * `input` - 源EPUB文件路径
/// * `output` - 输出EPUB文件路径
///
/// # 示例
///
/// ```rust,no_run
/// let report = epubtc::convert_file("book.epub", "book-tc.epub")?;
/// println!("已转换 {} 个条目", report.converted);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_file<P, Q>(input: P, output: Q) -> Result<TranscodeReport>
where
    P: AsRef<std::path::Path>,
    Q: AsRef<std::path::Path>,
{
    let converter = ChineseConverter::default();
    Transcoder::new(&converter).transcode_file(input, output)
}
