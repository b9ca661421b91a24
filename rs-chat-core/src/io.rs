use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs, io};

use serde::Serialize;

/// A model file found in the models directory.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
	/// File name (no path)
	pub file: String,
	/// Size in bytes
	pub size: u64,
	/// Last modification, seconds since the Unix epoch
	pub mtime: u64,
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/weights.json` + `"bin"` → `data/weights.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Reduces a client-supplied file name to its last path component.
///
/// Both `/` and `\` are treated as separators so that a name like
/// `..\..\secret.json` cannot escape the models directory on any platform.
/// Returns `None` when nothing usable is left.
pub(crate) fn base_name(requested: &str) -> Option<&str> {
	let name = requested.rsplit(['/', '\\']).next()?.trim();
	if name.is_empty() || name == "." || name == ".." {
		return None;
	}
	Some(name)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Whether `derived` exists and is at least as recent as `source`.
pub(crate) fn is_up_to_date<P: AsRef<Path>, Q: AsRef<Path>>(derived: P, source: Q) -> bool {
	let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
	match (modified(derived.as_ref()), modified(source.as_ref())) {
		(Some(derived), Some(source)) => derived >= source,
		_ => false,
	}
}

/// Lists all files with a given extension (case-insensitive) in a directory.
///
/// Entries are sorted newest first, then by file name.
pub(crate) fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<FileEntry>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		if !path.is_file() {
			continue;
		}

		let matches = path
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
		if !matches {
			continue;
		}

		if let Some(name) = path.file_name() {
			let metadata = entry.metadata()?;
			let mtime = metadata
				.modified()
				.unwrap_or(SystemTime::UNIX_EPOCH)
				.duration_since(UNIX_EPOCH)
				.map(|d| d.as_secs())
				.unwrap_or(0);
			files.push(FileEntry {
				file: name.to_string_lossy().to_string(),
				size: metadata.len(),
				mtime,
			});
		}
	}

	files.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.file.cmp(&b.file)));
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_output_path() {
		let path = build_output_path("data/weights.json", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/weights.bin"));
	}

	#[test]
	fn test_base_name() {
		assert_eq!(base_name("weights.json"), Some("weights.json"));
		assert_eq!(base_name("../../etc/weights.json"), Some("weights.json"));
		assert_eq!(base_name("..\\models\\w.JSON"), Some("w.JSON"));
		assert_eq!(base_name("models/"), None);
		assert_eq!(base_name(".."), None);
	}

	#[test]
	fn test_list_files_filters_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("a.json"), "{}").unwrap();
		fs::write(dir.path().join("b.JSON"), "{}").unwrap();
		fs::write(dir.path().join("a.bin"), "").unwrap();
		fs::create_dir(dir.path().join("sub.json")).unwrap();

		let mut names: Vec<String> = list_files(dir.path(), "json").unwrap().into_iter().map(|f| f.file).collect();
		names.sort();
		assert_eq!(names, vec!["a.json", "b.JSON"]);
	}
}
