//! Input lines for a run.

use std::fs;
use std::path::PathBuf;

use glob::glob;

use crate::error::RunError;

/// Reads the input named by `spec` as one ordered sequence of lines.
///
/// `spec` is either a file path or a glob pattern. Matching files are read in
/// sorted path order and their lines concatenated.
pub fn read_lines(spec: &str) -> Result<Vec<String>, RunError> {
    let paths = input_files(spec)?;
    let mut lines = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)
            .map_err(|e| RunError::Input(format!("failed to read input file {}: {e}", path.display())))?;
        lines.extend(content.lines().map(String::from));
    }
    Ok(lines)
}

fn input_files(spec: &str) -> Result<Vec<PathBuf>, RunError> {
    let direct = PathBuf::from(spec);
    if direct.is_file() {
        return Ok(vec![direct]);
    }
    let matches = glob(spec).map_err(|e| RunError::Input(format!("bad input pattern {spec:?}: {e}")))?;
    let mut paths: Vec<PathBuf> = matches.flatten().filter(|p| p.is_file()).collect();
    if paths.is_empty() {
        return Err(RunError::Input(format!("no input file matches {spec:?}")));
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, "first line\r\nsecond line\n\nlast").unwrap();

        let lines = read_lines(path.to_str().unwrap()).unwrap();
        assert_eq!(lines, ["first line", "second line", "", "last"]);
    }

    #[test]
    fn glob_concatenates_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b1\nb2\n").unwrap();
        fs::write(dir.path().join("a.txt"), "a1\n").unwrap();
        fs::write(dir.path().join("skip.md"), "nope\n").unwrap();

        let pattern = format!("{}/*.txt", dir.path().display());
        assert_eq!(read_lines(&pattern).unwrap(), ["a1", "b1", "b2"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        assert!(matches!(read_lines(&pattern), Err(RunError::Input(_))));
    }
}
