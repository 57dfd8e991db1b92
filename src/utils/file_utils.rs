use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
}

/// Creates the directory that will hold `path`, if it has one and it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_text_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("video2seq_file_utils_{}", std::process::id()));
        let path = root.join("nested").join("deeper").join("k.txt");
        let _ = fs::remove_dir_all(&root);

        write_text(&path, "1 2 3 4").unwrap();
        assert_eq!(read_text(&path).unwrap(), "1 2 3 4");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_ensure_parent_dir_accepts_bare_file_name() {
        assert!(ensure_parent_dir(Path::new("frame.png")).is_ok());
    }

    #[test]
    fn test_read_text_missing_file_mentions_path() {
        let err = read_text(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(format!("{:#}", err).contains("here.txt"));
    }
}
