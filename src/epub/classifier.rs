//! 条目分类
//!
//! 只依据扩展名判断压缩包条目是否为需要转换的文本，从不检查内容。

/// 需要转换的文本扩展名
pub const TEXT_EXTENSIONS: [&str; 5] = ["htm", "html", "xhtml", "ncx", "opf"];

/// 包元数据（OPF）文件扩展名
pub const METADATA_EXTENSION: &str = "opf";

/// 提取条目名的扩展名
///
/// 取文件名部分最后一个 `.` 之后的子串，保持原有大小写。
/// 以 `.` 开头且没有其他 `.` 的文件名（如 `.hidden`）视为没有扩展名。
pub fn extension(entry_name: &str) -> Option<&str> {
    let file_name = entry_name.rsplit('/').next().unwrap_or(entry_name);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&file_name[pos + 1..]),
    }
}

/// 判断条目是否需要转换
pub fn is_convertible(entry_name: &str) -> bool {
    extension(entry_name).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
}

/// 判断条目是否为包元数据文件
pub fn is_package_metadata(entry_name: &str) -> bool {
    extension(entry_name) == Some(METADATA_EXTENSION)
}
