use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// 转换过程中的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("文件不是有效的EPUB压缩包: {0}")]
    CorruptArchive(String),

    #[error("无法创建输出文件 {path}: {reason}")]
    OutputCreation { path: PathBuf, reason: String },

    #[error("处理条目 '{name}' 失败: {reason}")]
    EntryProcessing { name: String, reason: String },

    #[error("无法访问目录 {path}: {reason}")]
    DirectoryAccess { path: PathBuf, reason: String },

    #[error("无效的通配符模式: {0}")]
    Pattern(String),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}
