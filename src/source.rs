use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const PREAMBLE: &str = r"\documentclass[12pt]{article}
\usepackage{amsmath}
\usepackage{amsfonts}
\usepackage{amssymb}
\pagestyle{empty}
\begin{document}
";

const POSTAMBLE: &str = r"
\end{document}
";

/// A math expression together with the settings that affect its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSource {
    pub expression: String,
    pub dpi: u32,
    pub display: bool,
}

impl MathSource {
    pub fn new(expression: impl Into<String>, dpi: u32, display: bool) -> Self {
        Self {
            expression: expression.into(),
            dpi,
            display,
        }
    }

    /// The expression wrapped in a complete LaTeX document.
    pub fn document(&self) -> String {
        let mut doc = String::from(PREAMBLE);
        if self.display {
            doc.push_str(r"\[");
            doc.push_str(&self.expression);
            doc.push_str(r"\]");
        } else {
            doc.push('$');
            doc.push_str(&self.expression);
            doc.push('$');
        }
        doc.push_str(POSTAMBLE);
        doc
    }

    /// Hex SHA-256 over everything that changes the rendered image.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.expression.as_bytes());
        hasher.update(self.dpi.to_le_bytes());
        hasher.update([self.display as u8]);
        hex::encode(hasher.finalize())
    }

    /// `<hash>_<height>_.png`
    pub fn file_name(&self, height: u32) -> String {
        format!("{}_{}_.png", self.hash(), height)
    }

    /// Returns the height encoded in `file_name` if it names an image of this source.
    pub fn matches(&self, file_name: &str) -> Option<u32> {
        height_in_name(&self.hash(), file_name)
    }

    /// Looks in `dir` for an image previously rendered from this source.
    pub fn find_in_dir(&self, dir: &Path) -> std::io::Result<Option<(PathBuf, u32)>> {
        let hash = self.hash();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(height) = height_in_name(&hash, name) {
                return Ok(Some((entry.path(), height)));
            }
        }
        Ok(None)
    }
}

/// Parses `<hash>_<digits>_.png`.
fn height_in_name(hash: &str, file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(hash)?
        .strip_prefix('_')?
        .strip_suffix("_.png")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_document() {
        let src = MathSource::new(r"x^2", 120, false);
        let doc = src.document();
        assert!(doc.starts_with(r"\documentclass[12pt]{article}"));
        assert!(doc.contains("\\begin{document}\n$x^2$\n\\end{document}"));
        assert!(doc.trim_end().ends_with(r"\end{document}"));
    }

    #[test]
    fn test_display_document() {
        let src = MathSource::new(r"\frac{a}{b}", 120, true);
        assert!(src.document().contains(r"\[\frac{a}{b}\]"));
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = MathSource::new("a+b", 120, false);
        assert_eq!(a.hash(), MathSource::new("a+b", 120, false).hash());
        assert_eq!(a.hash().len(), 64);
        assert_ne!(a.hash(), MathSource::new("a+c", 120, false).hash());
        assert_ne!(a.hash(), MathSource::new("a+b", 300, false).hash());
        assert_ne!(a.hash(), MathSource::new("a+b", 120, true).hash());
    }

    #[test]
    fn test_file_name_matches() {
        let src = MathSource::new(r"\sum_{k=1}^n k", 120, false);
        let name = src.file_name(17);
        assert_eq!(name, format!("{}_17_.png", src.hash()));
        assert_eq!(src.matches(&name), Some(17));

        let other = MathSource::new("y", 120, false);
        assert_eq!(other.matches(&name), None);
        assert_eq!(src.matches(&format!("{}_x_.png", src.hash())), None);
        assert_eq!(src.matches(&format!("old-{name}")), None);
        assert_eq!(src.matches(&format!("{}_+5_.png", src.hash())), None);
        assert_eq!(src.matches(&format!("{}__.png", src.hash())), None);
        assert_eq!(src.matches(&format!("{name}.bak")), None);
    }

    #[test]
    fn test_find_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = MathSource::new("e^{i\\pi}", 120, false);
        assert_eq!(src.find_in_dir(dir.path()).unwrap(), None);

        std::fs::write(dir.path().join("unrelated.png"), b"x").unwrap();
        std::fs::create_dir(dir.path().join(src.file_name(3))).unwrap();
        assert_eq!(src.find_in_dir(dir.path()).unwrap(), None);

        let path = dir.path().join(src.file_name(21));
        std::fs::write(&path, b"png").unwrap();
        assert_eq!(src.find_in_dir(dir.path()).unwrap(), Some((path, 21)));
    }
}
