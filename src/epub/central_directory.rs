//! 中央目录扫描
//!
//! `ZipArchive` 按条目名建立索引，同名条目会被合并成一个。
//! 这里直接读取中央目录记录，得到源压缩包中真实的条目名序列。

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

use crate::epub::error::{EpubError, Result};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;
const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;

const EOCD_SIZE: usize = 22;
const ZIP64_LOCATOR_SIZE: usize = 20;
const ZIP64_EOCD_SIZE: usize = 56;
const CENTRAL_HEADER_SIZE: usize = 46;
const MAX_COMMENT_SIZE: usize = u16::MAX as usize;

/// 按中央目录顺序读取全部条目名（原始字节）
///
/// # 参数
/// * `source` - 压缩包数据
///
/// # 返回值
/// * `Result<Vec<Vec<u8>>>` - 每条中央目录记录的条目名，重复的名称也会保留
pub fn entry_names<R: Read + Seek>(source: &mut R) -> Result<Vec<Vec<u8>>> {
    let len = source.seek(SeekFrom::End(0))?;
    let tail_len = len.min((EOCD_SIZE + MAX_COMMENT_SIZE) as u64);
    let tail_start = len - tail_len;
    let tail = read_at(source, tail_start, tail_len)?;

    let eocd = find_eocd(&tail).ok_or_else(|| corrupt("找不到中央目录结尾记录"))?;
    let mut cd_size = le_u32(&tail, eocd + 12).map(u64::from).ok_or_else(|| corrupt("中央目录结尾记录不完整"))?;
    let mut cd_end = tail_start + eocd as u64;

    if let Some(locator) = eocd.checked_sub(ZIP64_LOCATOR_SIZE) {
        if le_u32(&tail, locator) == Some(ZIP64_LOCATOR_SIGNATURE) {
            let record_offset = le_u64(&tail, locator + 8).ok_or_else(|| corrupt("ZIP64定位记录不完整"))?;
            if record_offset.saturating_add(ZIP64_EOCD_SIZE as u64) > len {
                return Err(corrupt("ZIP64结尾记录超出文件范围"));
            }
            let record = read_at(source, record_offset, ZIP64_EOCD_SIZE as u64)?;
            if le_u32(&record, 0) == Some(ZIP64_EOCD_SIGNATURE) {
                cd_size = le_u64(&record, 40).ok_or_else(|| corrupt("ZIP64结尾记录不完整"))?;
                cd_end = record_offset;
            }
        }
    }

    // 中央目录紧挨在结尾记录之前
    let cd_start = cd_end
        .checked_sub(cd_size)
        .ok_or_else(|| corrupt("中央目录大小超出文件范围"))?;
    let directory = read_at(source, cd_start, cd_size)?;

    let mut names = Vec::new();
    let mut pos = 0;
    while le_u32(&directory, pos) == Some(CENTRAL_HEADER_SIGNATURE) {
        let field = |offset: usize| le_u16(&directory, pos + offset).map(usize::from);
        let (name_len, extra_len, comment_len) = match (field(28), field(30), field(32)) {
            (Some(n), Some(e), Some(c)) => (n, e, c),
            _ => return Err(corrupt("中央目录记录不完整")),
        };

        let name_start = pos + CENTRAL_HEADER_SIZE;
        let name = directory
            .get(name_start..name_start + name_len)
            .ok_or_else(|| corrupt("中央目录中的条目名不完整"))?;
        names.push(name.to_vec());

        pos = name_start + name_len + extra_len + comment_len;
    }

    Ok(names)
}

/// 找出重复出现的条目名
///
/// 每个多余的出现各返回一次，第一次出现的不计入。
pub fn duplicate_names(names: &[Vec<u8>]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| !seen.insert(*name))
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

fn find_eocd(tail: &[u8]) -> Option<usize> {
    let last = tail.len().checked_sub(EOCD_SIZE)?;
    (0..=last)
        .rev()
        .find(|&at| le_u32(tail, at) == Some(EOCD_SIGNATURE))
}

fn read_at<R: Read + Seek>(source: &mut R, offset: u64, len: u64) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    Read::take(&mut *source, len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(corrupt("压缩包数据被截断"));
    }
    Ok(buf)
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2)?.try_into().ok().map(u16::from_le_bytes)
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes.get(at..at + 4)?.try_into().ok().map(u32::from_le_bytes)
}

fn le_u64(bytes: &[u8], at: usize) -> Option<u64> {
    bytes.get(at..at + 8)?.try_into().ok().map(u64::from_le_bytes)
}

fn corrupt(reason: &str) -> EpubError {
    EpubError::CorruptArchive(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn build_archive(names: &[&str]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            zip.start_file(*name, FileOptions::<()>::default()).unwrap();
            zip.write_all(b"content").unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_entry_names_in_order() {
        let data = build_archive(&["mimetype", "OEBPS/书.html", "OEBPS/a.css"]);
        let names = entry_names(&mut Cursor::new(data)).unwrap();

        assert_eq!(
            names,
            vec![b"mimetype".to_vec(), "OEBPS/书.html".as_bytes().to_vec(), b"OEBPS/a.css".to_vec()]
        );
        assert!(duplicate_names(&names).is_empty());
    }

    #[test]
    fn test_entry_names_with_archive_comment() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.set_comment("测试注释");
        zip.start_file("a.html", FileOptions::<()>::default()).unwrap();
        zip.write_all(b"a").unwrap();
        let data = zip.finish().unwrap().into_inner();

        let names = entry_names(&mut Cursor::new(data)).unwrap();
        assert_eq!(names, vec![b"a.html".to_vec()]);
    }

    #[test]
    fn test_not_a_zip() {
        let result = entry_names(&mut Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(EpubError::CorruptArchive(_))));

        let result = entry_names(&mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(EpubError::CorruptArchive(_))));
    }

    #[test]
    fn test_directory_size_beyond_file() {
        let mut data = build_archive(&["a.html"]);
        let eocd = data.len() - EOCD_SIZE;
        data[eocd + 12..eocd + 16].copy_from_slice(&u32::MAX.to_le_bytes());

        let result = entry_names(&mut Cursor::new(data));
        assert!(matches!(result, Err(EpubError::CorruptArchive(_))));
    }

    #[test]
    fn test_duplicate_names() {
        let names = vec![b"a".to_vec(), b"b".to_vec(), b"a".to_vec(), b"a".to_vec()];
        assert_eq!(duplicate_names(&names), vec!["a", "a"]);
    }
}
