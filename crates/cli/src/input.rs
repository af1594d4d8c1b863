use std::io::Read;

use anyhow::{Context, Result};

/// Resolve the INPUT argument to raw JSON text.
///
/// `-` reads stdin, `@path` reads a file, anything else is the JSON itself.
pub fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read metrics from stdin")?;
        return Ok(buf);
    }
    if let Some(path) = arg.strip_prefix('@') {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metrics file: {path}"));
    }
    Ok(arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inline_json_passes_through() {
        assert_eq!(read_input(r#"[{"cpu": 1}]"#).unwrap(), r#"[{"cpu": 1}]"#);
    }

    #[test]
    fn at_prefix_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(read_input(&arg).unwrap(), "[]");
    }

    #[test]
    fn missing_file_is_error() {
        assert!(read_input("@/definitely/not/here.json").is_err());
    }
}
