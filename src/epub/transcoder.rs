//! 压缩包转码
//!
//! 按源顺序遍历EPUB压缩包中的全部条目：文本条目逐行转换后写入，
//! 其他条目原样复制。每个条目沿用源条目的压缩方式和修改时间。
//! 单个条目失败只会跳过该条目，不会中断整个压缩包的转换。

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::epub::central_directory::{duplicate_names, entry_names};
use crate::epub::classifier::{is_convertible, is_package_metadata};
use crate::epub::converter::{TextConverter, convert_content};
use crate::epub::error::{EpubError, Result};
use crate::epub::metadata::MetadataPatcher;
use crate::epub::naming::transliterate_name;

/// 读取条目时预先分配的最大容量，条目头中声明的大小不可信
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

fn capacity_hint(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOCATION) as usize
}

/// 单个条目的处理失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// 源条目名
    pub name: String,
    /// 失败原因
    pub reason: String,
}

impl EntryFailure {
    fn new(name: &str, reason: impl fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

impl From<EntryFailure> for EpubError {
    fn from(failure: EntryFailure) -> Self {
        EpubError::EntryProcessing {
            name: failure.name,
            reason: failure.reason,
        }
    }
}

/// 条目的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// 文本内容已转换
    Converted,
    /// 内容原样复制
    Passthrough,
    /// 目录条目
    Directory,
}

/// 一次转码的统计结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeReport {
    /// 源压缩包中的条目数
    pub source_entries: usize,
    /// 转换了文本内容的条目数
    pub converted: usize,
    /// 原样复制的条目数
    pub passed_through: usize,
    /// 目录条目数
    pub directories: usize,
    /// 被跳过的条目
    pub failures: Vec<EntryFailure>,
}

impl TranscodeReport {
    /// 写入目标压缩包的条目数
    pub fn written(&self) -> usize {
        self.converted + self.passed_through + self.directories
    }

    /// 是否所有条目都成功写入
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, kind: EntryKind) {
        match kind {
            EntryKind::Converted => self.converted += 1,
            EntryKind::Passthrough => self.passed_through += 1,
            EntryKind::Directory => self.directories += 1,
        }
    }
}

/// 已准备好写入的条目
struct PreparedEntry {
    source_name: String,
    name: String,
    kind: EntryKind,
    content: Vec<u8>,
    options: SimpleFileOptions,
}

/// EPUB转码器
///
/// 持有共享转换器的引用；转换器在进程内只构建一次。
pub struct Transcoder<'a> {
    converter: &'a dyn TextConverter,
    patcher: MetadataPatcher,
}

impl<'a> Transcoder<'a> {
    /// 使用默认的元数据修补规则（zh-CN → zh-TW）创建转码器
    pub fn new(converter: &'a dyn TextConverter) -> Self {
        Self::with_patcher(converter, MetadataPatcher::default())
    }

    /// 使用指定的元数据修补规则创建转码器
    pub fn with_patcher(converter: &'a dyn TextConverter, patcher: MetadataPatcher) -> Self {
        Self { converter, patcher }
    }

    /// 转换器
    pub fn converter(&self) -> &'a dyn TextConverter {
        self.converter
    }

    /// 转码一个压缩包
    ///
    /// # 参数
    /// * `source` - 源EPUB数据
    /// * `sink` - 目标压缩包的写入位置
    ///
    /// # 返回值
    /// * `Result<TranscodeReport>` - 源数据不是有效的压缩包时返回 `CorruptArchive`；
    ///   单个条目的失败记录在报告中
    pub fn transcode<R, W>(&self, mut source: R, sink: W) -> Result<TranscodeReport>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let raw_names = entry_names(&mut source);
        let mut archive =
            ZipArchive::new(source).map_err(|e| EpubError::CorruptArchive(e.to_string()))?;
        let mut writer = ZipWriter::new(sink);
        let mut report = TranscodeReport {
            source_entries: archive.len(),
            ..TranscodeReport::default()
        };

        // 同名条目在 ZipArchive 中只剩一个，多出来的记为失败
        match raw_names {
            Ok(names) => {
                let duplicates = duplicate_names(&names);
                if names.len() == archive.len() + duplicates.len() {
                    report.source_entries = names.len();
                    for name in duplicates {
                        let failure = EntryFailure::new(&name, "条目名重复，该条目被丢弃");
                        warn!("跳过条目 {}", failure);
                        report.failures.push(failure);
                    }
                } else {
                    debug!(
                        "中央目录记录数 {} 与可读条目数 {} 不一致",
                        names.len(),
                        archive.len()
                    );
                }
            }
            Err(e) => debug!("无法扫描中央目录: {}", e),
        }

        for index in 0..archive.len() {
            let outcome = self
                .prepare_entry(&mut archive, index)
                .and_then(|entry| Self::write_entry(&mut writer, entry));

            match outcome {
                Ok(kind) => report.record(kind),
                Err(failure) => {
                    warn!("跳过条目 {}", failure);
                    report.failures.push(failure);
                }
            }
        }

        writer.finish()?;
        Ok(report)
    }

    /// 转码EPUB文件
    ///
    /// 目标压缩包先在内存中构建，全部完成后才写入 `output`，
    /// 因此源文件无效时不会产生输出文件。
    pub fn transcode_file<P, Q>(&self, input: P, output: Q) -> Result<TranscodeReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let output = output.as_ref();

        let file = File::open(input)
            .map_err(|e| EpubError::CorruptArchive(format!("{}: {}", input.display(), e)))?;

        let mut buffer = Cursor::new(Vec::new());
        let report = self.transcode(BufReader::new(file), &mut buffer)?;

        fs::write(output, buffer.into_inner()).map_err(|e| EpubError::OutputCreation {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(report)
    }

    /// 读取并转换一个条目，不写入任何内容
    fn prepare_entry<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        index: usize,
    ) -> std::result::Result<PreparedEntry, EntryFailure> {
        let fallback_name = archive
            .name_for_index(index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index));

        let mut file = archive
            .by_index(index)
            .map_err(|e| EntryFailure::new(&fallback_name, e))?;
        let source_name = file.name().to_string();

        let mut options = SimpleFileOptions::default().compression_method(file.compression());
        if let Some(modified) = file.last_modified() {
            options = options.last_modified_time(modified);
        }
        if let Some(mode) = file.unix_mode() {
            options = options.unix_permissions(mode);
        }

        let name = transliterate_name(self.converter, &source_name);

        if file.is_dir() {
            return Ok(PreparedEntry {
                source_name,
                name,
                kind: EntryKind::Directory,
                content: Vec::new(),
                options,
            });
        }

        let mut raw = Vec::with_capacity(capacity_hint(file.size()));
        file.read_to_end(&mut raw)
            .map_err(|e| EntryFailure::new(&source_name, e))?;
        drop(file);

        let (kind, content) = if is_convertible(&source_name) {
            let text = String::from_utf8(raw)
                .map_err(|e| EntryFailure::new(&source_name, format!("不是有效的UTF-8文本: {}", e)))?;
            let mut converted = convert_content(self.converter, &text);
            if is_package_metadata(&source_name) {
                converted = self.patcher.patch(&converted);
            }
            (EntryKind::Converted, converted.into_bytes())
        } else {
            (EntryKind::Passthrough, raw)
        };

        let options = options.large_file(content.len() as u64 >= u32::MAX as u64);

        Ok(PreparedEntry {
            source_name,
            name,
            kind,
            content,
            options,
        })
    }

    /// 写入一个已准备好的条目
    ///
    /// 内容写入失败时撤销该条目，避免目标压缩包中留下不完整的条目。
    fn write_entry<W: Write + Seek>(
        writer: &mut ZipWriter<W>,
        entry: PreparedEntry,
    ) -> std::result::Result<EntryKind, EntryFailure> {
        let PreparedEntry {
            source_name,
            name,
            kind,
            content,
            options,
        } = entry;

        if kind == EntryKind::Directory {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| EntryFailure::new(&source_name, e))?;
            debug!("目录 {} -> {}", source_name, name);
            return Ok(kind);
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| EntryFailure::new(&source_name, e))?;

        if let Err(e) = writer.write_all(&content) {
            if let Err(abort_err) = writer.abort_file() {
                debug!("撤销条目 {} 失败: {}", name, abort_err);
            }
            return Err(EntryFailure::new(&source_name, e));
        }

        debug!("{:?} {} -> {} ({} 字节)", kind, source_name, name, content.len());
        Ok(kind)
    }
}
