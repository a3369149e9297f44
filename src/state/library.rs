/// Directory listing and primary/sidecar grouping
///
/// Files that share a basename (`DSCF0001.RAF`, `DSCF0001.JPG`,
/// `DSCF0001.xmp`) form one group. The group's primary is the first image or
/// video seen; everything else in the group is a sidecar.
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::data::{FileHandle, FileItem};
use crate::error::{LoadError, Result};
use crate::raw::is_raw_container;

/// MIME type reported for vendor RAW containers
pub const RAW_MIME: &str = "image/x-fuji-raf";

/// Bytes read from each file for content sniffing
const SNIFF_LEN: usize = 8192;

fn score(item: &FileItem) -> u8 {
    if item.is_media() {
        2
    } else {
        1
    }
}

/// Group classified files by basename.
///
/// Every input appears exactly once in the output, either as a primary or as
/// a sidecar. Groups are sorted by primary name, sidecars by their own name.
pub fn group_files(files: Vec<(FileHandle, Option<String>)>) -> Vec<FileItem> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FileItem>> = HashMap::new();

    for (handle, mime) in files {
        let key = handle.basename().to_string();
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        group.push(FileItem::new(handle, mime));
    }

    let mut result: Vec<FileItem> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|members| !members.is_empty())
        .map(|mut members| {
            // Strictly greater, so ties keep the earliest file
            let mut best = 0;
            for (i, item) in members.iter().enumerate() {
                if score(item) > score(&members[best]) {
                    best = i;
                }
            }
            let mut primary = members.remove(best);
            members.sort_by(|a, b| a.name().cmp(b.name()));
            primary.sidecars = members;
            primary
        })
        .collect();

    result.sort_by(|a, b| a.name().cmp(b.name()));
    result
}

/// Sniff a file's MIME type from its leading bytes
pub fn sniff_mime(head: &[u8]) -> Option<String> {
    match infer::get(head) {
        Some(kind) => Some(kind.mime_type().to_string()),
        None if is_raw_container(head) => Some(RAW_MIME.to_string()),
        None => None,
    }
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    std::fs::File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// List, classify and group the regular files directly inside `dir`
pub fn scan_directory_blocking(dir: &Path) -> Result<Vec<FileItem>> {
    info!("🔍 Scanning folder: {}", dir.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let mime = match read_head(path) {
            Ok(head) => sniff_mime(&head),
            Err(e) => {
                warn!("Could not sniff {}: {}", path.display(), e);
                None
            }
        };
        debug!("{} -> {:?}", path.display(), mime);
        files.push((FileHandle::new(path), mime));
    }

    let total = files.len();
    let grouped = group_files(files);
    info!("✅ Scan complete: {} files in {} groups", total, grouped.len());
    Ok(grouped)
}

/// Async wrapper that runs the scan off the UI thread
pub async fn scan_directory(dir: PathBuf) -> std::result::Result<Vec<FileItem>, LoadError> {
    let items = tokio::task::spawn_blocking(move || scan_directory_blocking(&dir)).await??;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: Option<&str>) -> (FileHandle, Option<String>) {
        (FileHandle::new(format!("/photos/{}", name)), mime.map(str::to_string))
    }

    fn names(items: &[FileItem]) -> Vec<&str> {
        items.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn test_media_file_becomes_primary() {
        let grouped = group_files(vec![
            file("DSCF0001.xmp", Some("text/xml")),
            file("DSCF0001.RAF", Some(RAW_MIME)),
            file("DSCF0001.JPG", Some("image/jpeg")),
        ]);
        assert_eq!(grouped.len(), 1);
        // First media file seen wins the tie
        assert_eq!(grouped[0].name(), "DSCF0001.RAF");
        assert_eq!(names(&grouped[0].sidecars), vec!["DSCF0001.JPG", "DSCF0001.xmp"]);
    }

    #[test]
    fn test_non_media_group_keeps_first_seen() {
        let grouped = group_files(vec![file("notes.txt", None), file("notes.md", Some("text/markdown"))]);
        assert_eq!(grouped[0].name(), "notes.txt");
        assert_eq!(names(&grouped[0].sidecars), vec!["notes.md"]);
    }

    #[test]
    fn test_every_file_appears_once_and_groups_are_sorted() {
        let input = vec![
            file("b.jpg", Some("image/jpeg")),
            file("a.mov", Some("video/quicktime")),
            file("b.json", None),
            file("README", None),
            file("a.jpg", Some("image/jpeg")),
        ];
        let grouped = group_files(input.clone());
        assert_eq!(names(&grouped), vec!["README", "a.mov", "b.jpg"]);

        let mut seen: Vec<&str> = grouped
            .iter()
            .flat_map(|g| std::iter::once(g.name()).chain(g.sidecars.iter().map(|s| s.name())))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["README", "a.jpg", "a.mov", "b.jpg", "b.json"]);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let input = vec![
            file("x.JPG", Some("image/jpeg")),
            file("x.RAF", Some(RAW_MIME)),
            file("y.txt", None),
        ];
        assert_eq!(group_files(input.clone()), group_files(input));
    }

    #[test]
    fn test_sniff_raw_container() {
        let mut head = b"FUJIFILMCCD-RAW 0201FF383501".to_vec();
        head.resize(128, 0);
        assert_eq!(sniff_mime(&head).as_deref(), Some(RAW_MIME));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]).as_deref(), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"plain text"), None);
    }

    #[test]
    fn test_scan_directory_groups_real_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("IMG_1.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).unwrap();
        std::fs::write(dir.path().join("IMG_1.xmp"), b"<x:xmpmeta/>").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("IMG_2.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();

        let grouped = scan_directory_blocking(dir.path()).unwrap();
        assert_eq!(names(&grouped), vec!["IMG_1.jpg"]);
        assert_eq!(grouped[0].mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(names(&grouped[0].sidecars), vec!["IMG_1.xmp"]);
    }
}
