pub mod error;
pub mod converter;
pub mod classifier;
pub mod metadata;
pub mod naming;
pub mod transcoder;
pub mod central_directory;
pub mod container;
pub mod config;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出转换器
pub use converter::{ChineseConverter, TextConverter, convert_content};

// 重新导出条目分类与名称转换
pub use classifier::{TEXT_EXTENSIONS, is_convertible};
pub use naming::{directory_output, single_file_output, transliterate_name};

// 重新导出元数据修补
pub use metadata::{MetadataPatcher, patch_metadata};

// 重新导出转码器
pub use transcoder::{EntryFailure, EntryKind, TranscodeReport, Transcoder};

// 重新导出容器与配置
pub use container::{PackageSummary, read_package_summary};
pub use config::ConvertConfig;
