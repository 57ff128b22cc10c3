//! 批量转换
//!
//! 查找输入的EPUB文件，计算输出路径，逐个调用转码器并记录每个文件的结果。
//! 任何一个文件失败都不会中断其余文件的处理。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::epub::config::ConvertConfig;
use crate::epub::container::{PackageSummary, read_package_summary_from_path};
use crate::epub::error::{EpubError, Result};
use crate::epub::naming::{directory_output, single_file_output};
use crate::epub::transcoder::{TranscodeReport, Transcoder};

/// 输入文件扩展名（区分大小写）
const EPUB_EXTENSION: &str = "epub";

/// 判断路径是否为EPUB文件
///
/// 只接受小写的 `.epub` 扩展名，`.EPUB` 会被跳过。
pub fn is_epub(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(EPUB_EXTENSION)
}

/// 展开命令行给出的文件参数
///
/// 只有一个参数且包含 `*` 时按通配符展开，否则按字面路径处理。
pub fn collect_inputs(args: &[String]) -> Result<Vec<PathBuf>> {
    match args {
        [pattern] if pattern.contains('*') => {
            let paths = glob::glob(pattern).map_err(|e| EpubError::Pattern(e.to_string()))?;
            let mut inputs = Vec::new();
            for entry in paths {
                match entry {
                    Ok(path) => inputs.push(path),
                    Err(e) => warn!("无法读取匹配的路径: {}", e),
                }
            }
            Ok(inputs)
        }
        _ => Ok(args.iter().map(PathBuf::from).collect()),
    }
}

/// 单个文件的处理状态
#[derive(Debug)]
pub enum FileStatus {
    /// 转换成功
    Converted {
        report: TranscodeReport,
        summary: Option<PackageSummary>,
    },
    /// 不是EPUB文件，已跳过
    Skipped,
    /// 转换失败
    Failed(EpubError),
}

/// 单个文件的处理结果
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub elapsed: Duration,
    pub status: FileStatus,
}

/// 一批文件的处理结果
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    /// 转换成功的文件数
    pub fn converted(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Converted { .. }))
    }

    /// 跳过的文件数
    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Skipped))
    }

    /// 失败的文件数
    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// 批量转换驱动
pub struct BatchDriver<'a> {
    transcoder: Transcoder<'a>,
    config: &'a ConvertConfig,
}

impl<'a> BatchDriver<'a> {
    /// 创建批量转换驱动
    pub fn new(transcoder: Transcoder<'a>, config: &'a ConvertConfig) -> Self {
        Self { transcoder, config }
    }

    /// 单文件模式：输出写在输入文件旁边
    pub fn convert_files(&self, inputs: &[PathBuf]) -> BatchSummary {
        let outcomes = inputs
            .iter()
            .map(|input| {
                if !is_epub(input) {
                    return self.skip(input);
                }
                let output = single_file_output(
                    self.transcoder.converter(),
                    input,
                    &self.config.output_suffix,
                );
                self.convert_one(input, output)
            })
            .collect();

        BatchSummary { outcomes }
    }

    /// 目录模式：转换目录下（不递归）所有 `.epub` 文件，输出到子目录
    ///
    /// # 返回值
    /// * `Result<BatchSummary>` - 目录无法读取或输出目录无法创建时返回 `DirectoryAccess`
    pub fn convert_directory(&self, directory: &Path) -> Result<BatchSummary> {
        let directory_error = |e: std::io::Error| EpubError::DirectoryAccess {
            path: directory.to_path_buf(),
            reason: e.to_string(),
        };

        let mut inputs = Vec::new();
        for entry in fs::read_dir(directory).map_err(directory_error)? {
            match entry {
                Ok(entry) if entry.path().is_file() && is_epub(&entry.path()) => {
                    inputs.push(entry.path());
                }
                Ok(entry) => debug!("忽略 {}", entry.path().display()),
                Err(e) => warn!("无法读取目录项: {}", e),
            }
        }
        inputs.sort();

        let output_dir = directory.join(&self.config.output_dir);
        fs::create_dir_all(&output_dir).map_err(directory_error)?;

        let outcomes = inputs
            .iter()
            .map(|input| {
                let output = directory_output(self.transcoder.converter(), input, &output_dir);
                self.convert_one(input, output)
            })
            .collect();

        Ok(BatchSummary { outcomes })
    }

    fn skip(&self, input: &Path) -> FileOutcome {
        warn!("跳过文件 {}，它不是EPUB文档", input.display());
        FileOutcome {
            input: input.to_path_buf(),
            output: None,
            elapsed: Duration::ZERO,
            status: FileStatus::Skipped,
        }
    }

    fn convert_one(&self, input: &Path, output: PathBuf) -> FileOutcome {
        info!("正在转换 {} -> {}", input.display(), output.display());
        let started = Instant::now();

        if is_same_file(input, &output) {
            let e = EpubError::OutputCreation {
                path: output,
                reason: "输出路径与输入路径相同".to_string(),
            };
            error!("转换 {} 失败: {}", input.display(), e);
            return FileOutcome {
                input: input.to_path_buf(),
                output: None,
                elapsed: started.elapsed(),
                status: FileStatus::Failed(e),
            };
        }

        let status = match self.transcoder.transcode_file(input, &output) {
            Ok(report) => {
                for failure in &report.failures {
                    warn!("{} 中的条目已跳过: {}", input.display(), failure);
                }
                let summary = match read_package_summary_from_path(&output) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        debug!("无法读取 {} 的书籍信息: {}", output.display(), e);
                        None
                    }
                };
                info!(
                    "{} 转换完成，用时 {:.2}s",
                    input.display(),
                    started.elapsed().as_secs_f64()
                );
                FileStatus::Converted { report, summary }
            }
            Err(e) => {
                error!("转换 {} 失败: {}", input.display(), e);
                FileStatus::Failed(e)
            }
        };

        let output = matches!(status, FileStatus::Converted { .. }).then_some(output);
        FileOutcome {
            input: input.to_path_buf(),
            output,
            elapsed: started.elapsed(),
            status,
        }
    }
}

/// 输出路径是否指向输入文件本身
fn is_same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::converter::tests::TableConverter;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_epub(path: &Path) {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("mimetype", FileOptions::<()>::default().compression_method(CompressionMethod::Stored))
            .unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("OEBPS/content.opf", FileOptions::<()>::default()).unwrap();
        zip.write_all("<dc:title>简体书</dc:title><dc:language>zh-CN</dc:language>".as_bytes())
            .unwrap();
        fs::write(path, zip.finish().unwrap().into_inner()).unwrap();
    }

    #[test]
    fn test_is_epub_is_case_sensitive() {
        assert!(is_epub(Path::new("book.epub")));
        assert!(!is_epub(Path::new("book.EPUB")));
        assert!(!is_epub(Path::new("book.zip")));
        assert!(!is_epub(Path::new("epub")));
    }

    #[test]
    fn test_collect_inputs_literal() {
        let args = vec!["a.epub".to_string(), "b*.epub".to_string()];
        let inputs = collect_inputs(&args).unwrap();
        assert_eq!(inputs, vec![PathBuf::from("a.epub"), PathBuf::from("b*.epub")]);
    }

    #[test]
    fn test_collect_inputs_glob() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.epub"), b"").unwrap();
        fs::write(dir.path().join("two.epub"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let pattern = format!("{}/*.epub", dir.path().display());
        let inputs = collect_inputs(&[pattern]).unwrap();

        assert_eq!(inputs, vec![dir.path().join("one.epub"), dir.path().join("two.epub")]);
    }

    #[test]
    fn test_collect_inputs_bad_pattern() {
        let result = collect_inputs(&["[*.epub".to_string()]);
        assert!(matches!(result, Err(EpubError::Pattern(_))));
    }

    #[test]
    fn test_convert_files() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("novel.epub");
        let chinese = dir.path().join("简体书.epub");
        let broken = dir.path().join("broken.epub");
        let other = dir.path().join("notes.txt");
        write_epub(&plain);
        write_epub(&chinese);
        fs::write(&broken, b"not a zip").unwrap();
        fs::write(&other, b"text").unwrap();

        let config = ConvertConfig::default();
        let driver = BatchDriver::new(Transcoder::new(&TableConverter), &config);
        let summary = driver.convert_files(&[plain.clone(), chinese, broken.clone(), other]);

        assert_eq!(summary.converted(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);

        assert!(dir.path().join("novel-tc.epub").exists());
        assert!(dir.path().join("簡體書.epub").exists());
        assert!(!dir.path().join("broken-tc.epub").exists());

        let first = &summary.outcomes[0];
        assert_eq!(first.input, plain);
        assert_ne!(first.output.as_deref(), Some(plain.as_path()));
        match &first.status {
            FileStatus::Converted { report, summary } => {
                assert!(report.is_complete());
                let summary = summary.as_ref().unwrap();
                assert_eq!(summary.title.as_deref(), Some("簡體書"));
                assert_eq!(summary.language.as_deref(), Some("zh-TW"));
            }
            other => panic!("期望转换成功，实际为 {:?}", other),
        }

        assert!(matches!(summary.outcomes[2].status, FileStatus::Failed(EpubError::CorruptArchive(_))));
        assert!(summary.outcomes[2].output.is_none());
    }

    #[test]
    fn test_convert_directory() {
        let dir = tempdir().unwrap();
        write_epub(&dir.path().join("novel.epub"));
        write_epub(&dir.path().join("简体书.epub"));
        write_epub(&dir.path().join("UPPER.EPUB"));
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_epub(&dir.path().join("nested").join("inner.epub"));

        let config = ConvertConfig::default();
        let driver = BatchDriver::new(Transcoder::new(&TableConverter), &config);
        let summary = driver.convert_directory(dir.path()).unwrap();

        assert_eq!(summary.converted(), 2);
        assert_eq!(summary.failed(), 0);

        let output_dir = dir.path().join("tc");
        assert!(output_dir.join("novel.epub").exists());
        assert!(output_dir.join("簡體書.epub").exists());
        assert!(!output_dir.join("inner.epub").exists());
        assert!(!output_dir.join("UPPER.EPUB").exists());
    }

    #[test]
    fn test_convert_directory_never_overwrites_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("novel.epub");
        write_epub(&input);
        let original = fs::read(&input).unwrap();

        // 绕过配置校验，直接把输出目录设成输入目录
        let config = ConvertConfig {
            output_dir: ".".to_string(),
            ..ConvertConfig::default()
        };
        let driver = BatchDriver::new(Transcoder::new(&TableConverter), &config);
        let summary = driver.convert_directory(dir.path()).unwrap();

        assert_eq!(summary.converted(), 0);
        assert_eq!(summary.failed(), 1);
        assert!(matches!(summary.outcomes[0].status, FileStatus::Failed(EpubError::OutputCreation { .. })));
        assert!(summary.outcomes[0].output.is_none());
        assert_eq!(fs::read(&input).unwrap(), original);
    }

    #[test]
    fn test_is_same_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("book.epub");
        fs::write(&input, b"").unwrap();

        assert!(is_same_file(&input, &input));
        assert!(is_same_file(&input, &dir.path().join(".").join("book.epub")));
        assert!(!is_same_file(&input, &dir.path().join("tc").join("book.epub")));
    }

    #[test]
    fn test_convert_missing_directory() {
        let dir = tempdir().unwrap();
        let config = ConvertConfig::default();
        let driver = BatchDriver::new(Transcoder::new(&TableConverter), &config);

        let result = driver.convert_directory(&dir.path().join("missing"));
        assert!(matches!(result, Err(EpubError::DirectoryAccess { .. })));
    }
}
