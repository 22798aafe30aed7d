// src/watch/module_name.rs

//! Conversion of a watched file path back into an importable dotted name.

use crate::errors::{HotreloadError, Result};
use crate::watch::path_utils::NormalizedPath;
use crate::watch::patterns::SOURCE_EXTENSION;

/// Name of the conventional source-layout directory that is dropped from
/// module names (`project/src/pkg/mod.py` imports as `pkg.mod`).
const SRC_SEGMENT: &str = "src";

/// Turn `path` into a dotted module name, using the parent of `module_root`
/// as the import base.
///
/// ```
/// use hotreload::watch::module_name::path_to_module;
///
/// let name = path_to_module(&"/x/y/pkg/sub/mod.py".into(), &"/x/y/pkg".into()).unwrap();
/// assert_eq!(name, "pkg.sub.mod");
/// ```
///
/// Fails with [`HotreloadError::Mapping`] if `path` does not live under the
/// parent of `module_root`, or if nothing is left to name.
pub fn path_to_module(path: &NormalizedPath, module_root: &NormalizedPath) -> Result<String> {
    let mapping_err = || HotreloadError::Mapping {
        path: path.to_string(),
        root: module_root.to_string(),
    };

    let base = module_root.parent().ok_or_else(mapping_err)?;
    let suffix = path.strip_base(&base).ok_or_else(mapping_err)?;

    let mut segments: Vec<&str> = suffix.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(pos) = segments.iter().position(|s| *s == SRC_SEGMENT) {
        segments.drain(..=pos);
    }

    let ext = format!(".{SOURCE_EXTENSION}");
    if let Some(last) = segments.pop() {
        segments.push(last.strip_suffix(ext.as_str()).unwrap_or(last));
    }
    segments.retain(|s| !s.is_empty());

    if segments.is_empty() {
        return Err(mapping_err());
    }
    Ok(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(path: &str, root: &str) -> Result<String> {
        path_to_module(&path.into(), &root.into())
    }

    #[test]
    fn nested_module_under_package() {
        assert_eq!(convert("/x/y/pkg/sub/mod.py", "/x/y/pkg").unwrap(), "pkg.sub.mod");
    }

    #[test]
    fn src_layout_root() {
        assert_eq!(convert("/x/src/pkg/a.py", "/x/src/pkg").unwrap(), "pkg.a");
    }

    #[test]
    fn src_segment_inside_suffix_is_dropped() {
        assert_eq!(convert("/x/proj/src/pkg/a.py", "/x/proj").unwrap(), "pkg.a");
    }

    #[test]
    fn src_must_be_a_whole_segment() {
        assert_eq!(
            convert("/x/resources/pkg/srcutil.py", "/x/resources/pkg").unwrap(),
            "pkg.srcutil"
        );
    }

    #[test]
    fn windows_recorded_paths() {
        let cases = [
            (
                "C:\\Users\\user\\Documents\\test\\functions.py",
                "C:\\Users\\user\\Documents\\test",
            ),
            (
                "C:\\Users\\user\\Documents\\src\\test\\functions.py",
                "C:\\Users\\user\\Documents\\src\\test",
            ),
            (
                "C:\\Users\\user\\Documents\\site-packages\\test\\functions.py",
                "C:\\Users\\user\\Documents\\site-packages\\test",
            ),
        ];
        for (path, root) in cases {
            assert_eq!(convert(path, root).unwrap(), "test.functions", "{path}");
        }
    }

    #[test]
    fn path_outside_root_is_a_mapping_error() {
        let err = convert("/elsewhere/pkg/a.py", "/x/y/pkg").unwrap_err();
        assert!(matches!(err, HotreloadError::Mapping { .. }));
    }

    #[test]
    fn root_itself_is_a_mapping_error() {
        assert!(convert("/x/y", "/x/y/pkg").is_err());
    }

    #[test]
    fn non_source_files_keep_their_extension() {
        assert_eq!(convert("/x/pkg/style.qss", "/x/pkg").unwrap(), "pkg.style.qss");
    }
}
