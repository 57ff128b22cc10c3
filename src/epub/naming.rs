//! 名称转换
//!
//! 条目名与输出文件名都会经过同一个转换器。路径分隔符不是转换目标，
//! 因此目录结构保持不变。

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::epub::converter::TextConverter;

/// 输出文件扩展名
const EPUB_EXTENSION: &str = "epub";

/// 转换压缩包内的条目名
pub fn transliterate_name(converter: &dyn TextConverter, name: &str) -> String {
    converter.convert(name)
}

/// 转换文件名（主干和扩展名作为一个整体）
///
/// # 返回值
/// * `Option<String>` - 转换后与原名不同时返回新名称；没有变化或不是UTF-8时返回None
fn converted_file_name(converter: &dyn TextConverter, input: &Path) -> Option<String> {
    let file_name = input.file_name()?.to_str()?;
    let converted = converter.convert(file_name);
    (converted != file_name).then_some(converted)
}

/// 单文件模式下的输出路径
///
/// 输出位于输入文件旁边。文件名转换后有变化则直接使用转换后的名称，
/// 否则在主干后追加 `suffix`，保证输出路径不会与输入路径相同。
///
/// # 参数
/// * `converter` - 转换器
/// * `input` - 输入EPUB路径
/// * `suffix` - 追加在主干后的标记，例如 `-tc`
pub fn single_file_output(converter: &dyn TextConverter, input: &Path, suffix: &str) -> PathBuf {
    if let Some(converted) = converted_file_name(converter, input) {
        return input.with_file_name(converted);
    }

    let mut file_name: OsString = input.file_stem().unwrap_or_default().to_os_string();
    file_name.push(suffix);
    file_name.push(".");
    file_name.push(EPUB_EXTENSION);
    input.with_file_name(file_name)
}

/// 目录模式下的输出路径
///
/// 输出位于 `output_dir` 中。文件名转换后有变化则使用转换后的名称，否则沿用原名。
pub fn directory_output(converter: &dyn TextConverter, input: &Path, output_dir: &Path) -> PathBuf {
    match converted_file_name(converter, input) {
        Some(converted) => output_dir.join(converted),
        None => output_dir.join(input.file_name().unwrap_or_default()),
    }
}
