//! Declaration scanner.
//!
//! Walks a set of source roots and collects every struct declaration that
//! carries a marker-tag comment (`// @tag key:"value" ...`) into a
//! [`Summary`]. Scanning is read-only and fail-fast: the first malformed
//! declaration aborts the whole scan so a partial summary is never handed
//! downstream.

use super::types::{Annot, Decl, Field, SourceFile, Summary};
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source root does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Line-oriented scanner over `.rs` files.
pub struct Scanner {
    roots: Vec<PathBuf>,
    annot_re: Regex,
    struct_re: Regex,
    bad_struct_re: Regex,
    field_re: Regex,
    skip_re: Regex,
}

impl Scanner {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            // `// @tag ...` but not `/// @tag` doc comments.
            annot_re: Regex::new(r"^\s*//\s*(@[A-Za-z_][A-Za-z0-9_-]*)\s*(.*?)\s*$").unwrap(),
            struct_re: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)\s*\{\s*$")
                .unwrap(),
            bad_struct_re: Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)")
                .unwrap(),
            field_re: Regex::new(
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?([a-z_]\w*)\s*:\s*([^/]+?)\s*,?\s*(?://\s*(.*?)\s*)?$",
            )
            .unwrap(),
            skip_re: Regex::new(r"^\s*(?:$|///|//!|#\[|//)").unwrap(),
        }
    }

    /// Scan all roots and produce the build's [`Summary`].
    pub fn scan(&self) -> Result<Summary, ScanError> {
        let start = Instant::now();
        let mut summary = Summary::new();

        for root in &self.roots {
            if !root.is_dir() {
                return Err(ScanError::MissingRoot(root.clone()));
            }

            let walk = WalkBuilder::new(root)
                .hidden(false)
                .git_ignore(true)
                .sort_by_file_path(|a, b| a.cmp(b))
                .build();

            for entry in walk {
                let entry = entry?;
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("rs") {
                    continue;
                }
                self.scan_file(path, &mut summary)?;
            }
        }

        info!(
            annotations = summary.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scan completed"
        );
        Ok(summary)
    }

    fn scan_file(&self, path: &Path, summary: &mut Summary) -> Result<(), ScanError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Generated files carry the conventional banner and are never
        // scanned, otherwise a build would re-discover its own output.
        if let Some(first) = content.lines().next() {
            if first.starts_with("// Code generated") && first.contains("DO NOT EDIT") {
                debug!(file = %path.display(), "Skipping generated file");
                return Ok(());
            }
        }

        let file = SourceFile {
            module: module_name(path),
            path: path.to_path_buf(),
        };

        let lines: Vec<&str> = content.lines().collect();
        // Pending (tag, param, line) annotations waiting for their struct.
        let mut pending: Vec<(String, String, usize)> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;

            if let Some(caps) = self.annot_re.captures(line) {
                pending.push((caps[1].to_string(), caps[2].to_string(), line_no));
                i += 1;
                continue;
            }

            if pending.is_empty() {
                i += 1;
                continue;
            }

            if let Some(caps) = self.struct_re.captures(line) {
                let decl_name = caps[1].to_string();
                let (fields, next) = self.parse_fields(path, &lines, i + 1)?;
                debug!(
                    file = %path.display(),
                    decl = %decl_name,
                    annotations = pending.len(),
                    "Found annotated declaration"
                );

                let id = summary.push_decl(Decl {
                    file: file.clone(),
                    name: decl_name,
                    line: line_no,
                    fields,
                });
                for (tag_name, tag_param, _) in pending.drain(..) {
                    summary.push_annot(Annot {
                        tag_name,
                        tag_param,
                        decl: id,
                    });
                }
                i = next;
                continue;
            }

            if self.bad_struct_re.is_match(line) {
                return Err(ScanError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    message: "annotated declaration must be a brace struct".to_string(),
                });
            }

            // Doc comments, attributes and blank lines may sit between the
            // annotation and its struct header.
            if self.skip_re.is_match(line) {
                i += 1;
                continue;
            }

            let (tag, _, tag_line) = &pending[0];
            return Err(ScanError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("annotation {tag} (line {tag_line}) is not attached to a struct declaration"),
            });
        }

        if let Some((tag, _, tag_line)) = pending.first() {
            return Err(ScanError::Parse {
                path: path.to_path_buf(),
                line: *tag_line,
                message: format!("annotation {tag} is not attached to a struct declaration"),
            });
        }

        Ok(())
    }

    /// Parse field lines from `start` until the closing brace; returns the
    /// fields and the index of the line after the closing brace.
    fn parse_fields(
        &self,
        path: &Path,
        lines: &[&str],
        start: usize,
    ) -> Result<(Vec<Field>, usize), ScanError> {
        let mut fields = Vec::new();
        let mut i = start;

        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;

            if line.trim() == "}" {
                return Ok((fields, i + 1));
            }

            if let Some(caps) = self.field_re.captures(line) {
                fields.push(Field {
                    names: vec![caps[1].to_string()],
                    type_name: caps[2].to_string(),
                    struct_tag: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
                    line: line_no,
                });
                i += 1;
                continue;
            }

            if self.skip_re.is_match(line) {
                i += 1;
                continue;
            }

            return Err(ScanError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("unsupported field syntax: {}", line.trim()),
            });
        }

        Err(ScanError::Parse {
            path: path.to_path_buf(),
            line: start,
            message: "unterminated struct body".to_string(),
        })
    }
}

fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem == "mod" {
        if let Some(parent) = path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
            return parent.to_string();
        }
    }
    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_source(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_annotated_struct() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/server.rs",
            r#"
// @envconfig prefix:"PG"
pub struct DatabaseCfg {
    pub host: String, // default:"localhost"
    pub port: u16, // default:"5432" required:"true"
}
"#,
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert_eq!(summary.len(), 1);

        let annot = &summary.annots()[0];
        assert_eq!(annot.tag_name, "@envconfig");
        assert_eq!(annot.tag_param, r#"prefix:"PG""#);

        let decl = summary.decl(annot.decl);
        assert_eq!(decl.name, "DatabaseCfg");
        assert_eq!(decl.file.module, "server");
        assert_eq!(decl.fields.len(), 2);
        assert_eq!(decl.fields[0].name(), "host");
        assert_eq!(decl.fields[0].type_name, "String");
        assert_eq!(decl.fields[0].struct_tag, r#"default:"localhost""#);
        assert_eq!(decl.fields[1].struct_tag, r#"default:"5432" required:"true""#);
    }

    #[test]
    fn test_untagged_structs_ignored() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "pub struct Plain {\n    pub a: u32,\n}\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_doc_comments_and_attrs_between() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            r#"
// @envconfig
/// Server wiring.
#[derive(Debug, Clone)]
pub struct ServerCfg {
    /// Bind address.
    pub address: String,
}
"#,
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert_eq!(summary.len(), 1);
        let decl = summary.decl(summary.annots()[0].decl);
        assert_eq!(decl.name, "ServerCfg");
        assert_eq!(decl.fields.len(), 1);
    }

    #[test]
    fn test_multiple_annotations_one_decl() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "// @envconfig\n// @mock\npub struct Dual {\n    pub a: u32,\n}\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.annots()[0].decl, summary.annots()[1].decl);
    }

    #[test]
    fn test_doc_comment_is_not_annotation() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "/// @envconfig is documented here, not applied\npub struct Plain {\n    pub a: u32,\n}\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_dangling_annotation_fails() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "src/lib.rs", "// @envconfig\npub fn not_a_struct() {}\n");

        let err = Scanner::new([dir.path().join("src")]).scan().unwrap_err();
        match err {
            ScanError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("@envconfig"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_annotation_at_eof_fails() {
        let dir = TempDir::new().unwrap();
        write_source(dir.path(), "src/lib.rs", "// @envconfig\n");

        assert!(matches!(
            Scanner::new([dir.path().join("src")]).scan(),
            Err(ScanError::Parse { .. })
        ));
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "// @envconfig\npub struct Wrapper(String);\n",
        );

        let err = Scanner::new([dir.path().join("src")]).scan().unwrap_err();
        assert!(err.to_string().contains("brace struct"));
    }

    #[test]
    fn test_unterminated_struct_fails() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "// @envconfig\npub struct Open {\n    pub a: u32,\n",
        );

        let err = Scanner::new([dir.path().join("src")]).scan().unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_missing_root() {
        let err = Scanner::new([PathBuf::from("/nonexistent/tagforge-root")])
            .scan()
            .unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }

    #[test]
    fn test_discovery_order_is_stable() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/a.rs",
            "// @envconfig\npub struct First {\n    pub a: u32,\n}\n",
        );
        write_source(
            dir.path(),
            "src/b.rs",
            "// @envconfig\npub struct Second {\n    pub b: u32,\n}\n",
        );

        let scanner = Scanner::new([dir.path().join("src")]);
        let names = |summary: &Summary| -> Vec<String> {
            summary
                .annots()
                .iter()
                .map(|a| summary.decl(a.decl).name.clone())
                .collect()
        };

        let first = names(&scanner.scan().unwrap());
        assert_eq!(first, vec!["First", "Second"]);
        // Identical inputs produce identical ordering.
        assert_eq!(first, names(&scanner.scan().unwrap()));
    }

    #[test]
    fn test_generated_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/generated/envconfig_annotated.rs",
            "// Code generated by tagforge. DO NOT EDIT.\n//\n// TagName:\n//   @envconfig\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_mod_rs_module_name() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/infra/mod.rs",
            "// @envconfig\npub struct CacheCfg {\n    pub url: String,\n}\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        assert_eq!(summary.decl(summary.annots()[0].decl).file.module, "infra");
    }

    #[test]
    fn test_generic_field_type() {
        let dir = TempDir::new().unwrap();
        write_source(
            dir.path(),
            "src/lib.rs",
            "// @envconfig\npub struct Cfg {\n    pub extra: std::collections::HashMap<String, String>,\n}\n",
        );

        let summary = Scanner::new([dir.path().join("src")]).scan().unwrap();
        let decl = summary.decl(summary.annots()[0].decl);
        assert_eq!(
            decl.fields[0].type_name,
            "std::collections::HashMap<String, String>"
        );
    }
}
