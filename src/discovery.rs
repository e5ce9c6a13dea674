//! Source discovery, template selection, part naming and stale-part cleanup.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{MergeError, MergeResult};
use crate::types::Source;

/// Extension (case-insensitive) of workbooks picked up from the input directory.
pub const SOURCE_EXTENSION: &str = "xlsx";

/// List the `.xlsx` files directly under `dir`, ordered by ascending size.
///
/// Subdirectories are not descended into. Equal sizes keep file-name order. The returned
/// sources carry their merge ordinal in `index`.
pub fn discover_sources(dir: &Path) -> MergeResult<Vec<Source>> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // the directory itself could not be read
            Err(err) if err.depth() == 0 => {
                return Err(MergeError::Discovery {
                    dir: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(_) => continue,
        };
        if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        found.push((metadata.len(), entry.into_path()));
    }

    if found.is_empty() {
        return Err(MergeError::NoSources {
            dir: dir.to_path_buf(),
        });
    }

    found.sort_by_key(|(size, _)| *size);
    Ok(found
        .into_iter()
        .enumerate()
        .map(|(index, (_, path))| Source::new(index, path))
        .collect())
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Pick the template: the explicit path when given (it must exist), otherwise the largest source.
///
/// An explicit template is not removed from `sources`; if it is one of them it is merged too.
pub fn select_template(sources: &[Source], explicit: Option<&Path>) -> MergeResult<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(MergeError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok(path.to_path_buf());
    }
    // sources are sorted by size, so the last one is the largest
    sources
        .last()
        .map(|s| s.path.clone())
        .ok_or_else(|| MergeError::Config {
            message: "no sources to pick a template from".to_string(),
        })
}

fn split_output(output: &Path) -> (String, String) {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| SOURCE_EXTENSION.to_string());
    (stem, ext)
}

/// Path of output part `part_number`: `<stem>_part<N>.<ext>` next to `output`.
pub fn part_path(output: &Path, part_number: u32) -> PathBuf {
    let (stem, ext) = split_output(output);
    output.with_file_name(format!("{stem}_part{part_number}.{ext}"))
}

/// Delete every `<stem>_part<N>.<ext>` file left next to `output` by an earlier run.
///
/// Returns the removed paths. A file that matches but cannot be removed fails the run.
pub fn remove_stale_parts(output: &Path) -> MergeResult<Vec<PathBuf>> {
    let (stem, ext) = split_output(output);
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!("{stem}_part");
    let suffix = format!(".{ext}");

    let pattern = format!(
        "{}/{}*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(&prefix),
        glob::Pattern::escape(&suffix)
    );
    let matches = glob::glob(&pattern).map_err(|e| MergeError::Config {
        message: format!("invalid output path pattern {pattern}: {e}"),
    })?;

    let mut removed = Vec::new();
    for path in matches.filter_map(Result::ok) {
        let is_part = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(prefix.as_str()))
            .and_then(|n| n.strip_suffix(suffix.as_str()))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if !is_part || !path.is_file() {
            continue;
        }
        std::fs::remove_file(&path).map_err(|source| MergeError::Cleanup {
            path: path.clone(),
            source,
        })?;
        removed.push(path);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{discover_sources, part_path, remove_stale_parts, select_template};
    use crate::error::MergeError;
    use crate::types::Source;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("xlsx_merge_{name}_{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn part_names_derive_from_output_path() {
        assert_eq!(
            part_path(Path::new("out/merged.xlsx"), 1),
            PathBuf::from("out/merged_part1.xlsx")
        );
        assert_eq!(part_path(Path::new("report"), 12), PathBuf::from("report_part12.xlsx"));
        assert_eq!(
            part_path(Path::new("/tmp/a.b.XLSX"), 3),
            PathBuf::from("/tmp/a.b_part3.XLSX")
        );
    }

    #[test]
    fn sources_are_sorted_by_size_and_filtered_by_extension() {
        let dir = temp_dir("discover");
        fs::write(dir.join("big.xlsx"), vec![0u8; 300]).unwrap();
        fs::write(dir.join("small.XLSX"), vec![0u8; 10]).unwrap();
        fs::write(dir.join("mid.xlsx"), vec![0u8; 100]).unwrap();
        fs::write(dir.join("notes.txt"), vec![0u8; 1]).unwrap();
        fs::create_dir_all(dir.join("nested.xlsx")).unwrap();
        fs::write(dir.join("nested.xlsx").join("inner.xlsx"), vec![0u8; 5]).unwrap();

        let sources = discover_sources(&dir).unwrap();
        let names: Vec<String> = sources.iter().map(Source::file_name).collect();
        assert_eq!(names, vec!["small.XLSX", "mid.xlsx", "big.xlsx"]);
        assert_eq!(sources[2].index, 2);

        let template = select_template(&sources, None).unwrap();
        assert_eq!(template, dir.join("big.xlsx"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_directory_has_no_sources() {
        let dir = temp_dir("empty");
        assert!(matches!(discover_sources(&dir), Err(MergeError::NoSources { .. })));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn explicit_template_must_exist() {
        let sources = vec![Source::new(0, "a.xlsx")];
        let missing = Path::new("/definitely/not/here/template.xlsx");
        assert!(matches!(
            select_template(&sources, Some(missing)),
            Err(MergeError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn cleanup_removes_only_numbered_parts() {
        let dir = temp_dir("cleanup");
        let output = dir.join("merged.xlsx");
        for name in ["merged_part1.xlsx", "merged_part2.xlsx", "merged_part10.xlsx"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        for name in ["merged.xlsx", "merged_partial.xlsx", "merged_part3.csv", "other_part1.xlsx"] {
            fs::write(dir.join(name), b"x").unwrap();
        }

        let mut removed = remove_stale_parts(&output).unwrap();
        removed.sort();
        assert_eq!(removed.len(), 3);
        assert!(!dir.join("merged_part10.xlsx").exists());
        assert!(dir.join("merged.xlsx").exists());
        assert!(dir.join("merged_partial.xlsx").exists());
        assert!(dir.join("merged_part3.csv").exists());
        assert!(dir.join("other_part1.xlsx").exists());

        fs::remove_dir_all(&dir).ok();
    }
}
