//! In-memory ZIP decoding.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use tracing::{debug, info, warn};

use crate::types::Result;

/// Decode a ZIP archive into a path → text map.
///
/// Directory entries and entries that are not valid UTF-8 are skipped. Entries
/// that fail to decompress are logged and skipped; a corrupt archive header is
/// an [`crate::types::ScribeError::Archive`].
///
/// At most `max_entry_size` bytes are inflated per entry. The size the archive
/// declares is not trusted; anything larger is skipped.
pub fn decode_zip(bytes: &[u8], max_entry_size: u64) -> Result<BTreeMap<String, String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut files = BTreeMap::new();

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to open archive entry #{}: {}", index, e);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().replace('\\', "/");
        if entry.size() > max_entry_size {
            debug!("Skipping {} ({} bytes over limit)", name, entry.size());
            continue;
        }

        let mut raw = Vec::new();
        if let Err(e) = entry
            .by_ref()
            .take(max_entry_size.saturating_add(1))
            .read_to_end(&mut raw)
        {
            warn!("Failed to read {}: {}", name, e);
            continue;
        }
        if raw.len() as u64 > max_entry_size {
            warn!("Skipping {}: inflates past {} bytes", name, max_entry_size);
            continue;
        }

        match String::from_utf8(raw) {
            Ok(text) => {
                files.insert(name, text);
            }
            Err(_) => debug!("Skipping binary entry: {}", name),
        }
    }

    info!("Extracted {} text files from archive", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScribeError;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const LIMIT: u64 = 1024 * 1024;

    fn build_zip(entries: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_decode_text_entries() {
        let bytes = build_zip(
            &[
                ("proj/main.py", b"print('hi')\n"),
                ("proj/lib/util.py", b"def f(): pass\n"),
            ],
            &["proj/", "proj/lib/"],
        );
        let files = decode_zip(&bytes, LIMIT).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["proj/main.py"], "print('hi')\n");
        assert!(files.contains_key("proj/lib/util.py"));
    }

    #[test]
    fn test_binary_entries_skipped() {
        let bytes = build_zip(&[("logo.png", &[0x89, 0x50, 0xff, 0xfe]), ("a.js", b"x")], &[]);
        let files = decode_zip(&bytes, LIMIT).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["a.js"]);
    }

    #[test]
    fn test_oversized_entries_skipped() {
        let big = vec![b' '; 4096];
        let bytes = build_zip(&[("big.py", &big), ("small.py", b"x = 1\n")], &[]);
        let files = decode_zip(&bytes, 1024).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["small.py"]);

        let exact = decode_zip(&bytes, 4096).unwrap();
        assert_eq!(exact["big.py"].len(), 4096);
    }

    #[test]
    fn test_corrupt_archive() {
        assert!(matches!(
            decode_zip(b"definitely not a zip", LIMIT),
            Err(ScribeError::Archive(_))
        ));
    }
}
