use std::fs;
use std::path::{Path, PathBuf};
use std::{env, io};

/// Reads a whole text file into memory.
pub fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	fs::read_to_string(filename)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
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

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Creates the parent directory of `path` when it has one.
pub(crate) fn ensure_parent<P: AsRef<Path>>(path: P) -> io::Result<()> {
	match path.as_ref().parent() {
		Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_swaps_extension() {
		let path = build_output_path("data/airport.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/airport.bin"));

		let bare = build_output_path("airport", "bin").unwrap();
		assert_eq!(bare, PathBuf::from("airport.bin"));
	}

	#[test]
	fn current_folder_is_resolved() {
		assert!(normalize_folder(".").is_absolute() || normalize_folder(".") == PathBuf::from("."));
		assert_eq!(normalize_folder("reports"), PathBuf::from("reports"));
	}

	#[test]
	fn parent_directories_are_created() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("a").join("b").join("file.json");
		ensure_parent(&target).unwrap();
		assert!(dir.path().join("a").join("b").is_dir());
		ensure_parent("file.json").unwrap();
	}
}
