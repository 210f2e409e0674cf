//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;

/// All members of a zip archive, in archive order.
pub fn zip_members(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

pub fn zip_member(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    zip_members(bytes).into_iter().find(|(n, _)| n == name).map(|(_, data)| data)
}

pub fn build_zip(members: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        zip.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Rebuild an archive, letting `edit` replace or drop members and appending `extra`.
pub fn rewrite_zip(
    bytes: &[u8],
    edit: impl Fn(&str, Vec<u8>) -> Option<Vec<u8>>,
    extra: &[(&str, &[u8])],
) -> Vec<u8> {
    let mut members: Vec<(String, Vec<u8>)> = zip_members(bytes)
        .into_iter()
        .filter_map(|(name, data)| edit(&name, data).map(|data| (name, data)))
        .collect();
    members.extend(extra.iter().map(|(name, data)| (name.to_string(), data.to_vec())));
    build_zip(&members)
}

/// Replace `from` with `to` inside one member's text.
pub fn patch_member(bytes: &[u8], member: &str, from: &str, to: &str) -> Vec<u8> {
    rewrite_zip(
        bytes,
        |name, data| {
            if name == member {
                let text = String::from_utf8(data).unwrap();
                assert!(text.contains(from), "{member} does not contain {from}");
                Some(text.replace(from, to).into_bytes())
            } else {
                Some(data)
            }
        },
        &[],
    )
}
