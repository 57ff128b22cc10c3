use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::epub::classifier::is_package_metadata;
use crate::epub::error::{EpubError, Result};

/// container.xml在压缩包中的位置
const CONTAINER_PATH: &str = "META-INF/container.xml";

/// OPF文件的媒体类型
const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// 从container.xml中找出OPF文件路径
///
/// 优先返回媒体类型为OPF的rootfile，否则返回第一个rootfile；
/// 没有rootfile时返回None。
fn opf_path_from_container(xml_content: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut first_rootfile = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"rootfile" => {
                let mut full_path = None;
                let mut is_opf = false;

                for attr_result in e.attributes() {
                    let attr = attr_result
                        .map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
                    match attr.key.local_name().as_ref() {
                        b"full-path" => {
                            full_path = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                        b"media-type" => is_opf = attr.value.as_ref() == OPF_MEDIA_TYPE.as_bytes(),
                        _ => {}
                    }
                }

                match full_path.filter(|path| !path.is_empty()) {
                    Some(path) if is_opf => return Ok(Some(path)),
                    Some(path) if first_rootfile.is_none() => first_rootfile = Some(path),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(first_rootfile)
}

/// 转换后书籍的概要信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSummary {
    /// OPF文件在压缩包中的路径
    pub opf_path: String,
    /// 书名（dc:title）
    pub title: Option<String>,
    /// 语言（dc:language）
    pub language: Option<String>,
}

impl PackageSummary {
    /// 从OPF内容中提取书名和语言
    pub fn parse_opf(opf_path: &str, xml_content: &str) -> Result<PackageSummary> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut summary = PackageSummary {
            opf_path: opf_path.to_string(),
            ..PackageSummary::default()
        };
        let mut buf = Vec::new();
        let mut current: Option<&'static str> = None;
        let mut text_content = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    current = match e.local_name().as_ref() {
                        b"title" if summary.title.is_none() => Some("title"),
                        b"language" if summary.language.is_none() => Some("language"),
                        _ => None,
                    };
                    text_content.clear();
                }
                Event::Text(e) if current.is_some() => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::End(_) => {
                    let value = text_content.trim().to_string();
                    match current.take() {
                        Some("title") if !value.is_empty() => summary.title = Some(value),
                        Some("language") if !value.is_empty() => summary.language = Some(value),
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(summary)
    }
}

/// 读取压缩包中的书籍概要
///
/// 先通过container.xml定位OPF文件，找不到时退回到第一个 `.opf` 条目。
pub fn read_package_summary<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<PackageSummary> {
    let opf_path = match read_text_entry(archive, CONTAINER_PATH) {
        Ok(container_xml) => opf_path_from_container(&container_xml)?,
        Err(_) => None,
    };

    let opf_path = match opf_path {
        Some(path) => path,
        None => archive
            .file_names()
            .find(|name| is_package_metadata(name))
            .map(str::to_string)
            .ok_or_else(|| EpubError::ContainerParseError("压缩包中没有OPF文件".to_string()))?,
    };

    let opf_content = read_text_entry(archive, &opf_path)?;
    PackageSummary::parse_opf(&opf_path, &opf_content)
}

/// 读取EPUB文件中的书籍概要
pub fn read_package_summary_from_path<P: AsRef<Path>>(path: P) -> Result<PackageSummary> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    read_package_summary(&mut archive)
}

fn read_text_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = archive.by_name(name)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}
