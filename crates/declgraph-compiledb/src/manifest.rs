//! The build-tooling manifest convention: a `compile_commands.json` file in
//! the project's build directory. Discovery and parsing are delegated to
//! serde; this module only models the convention.

use serde::Deserialize;
use std::path::Path;

use crate::error::DbError;

pub const MANIFEST_FILENAME: &str = "compile_commands.json";

/// One manifest entry as emitted by the build tooling. Carries either an
/// `arguments` array or a single `command` string.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub directory: String,
    pub file: String,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Reads and parses the manifest in `dir`. Both failure cases carry the
/// external layer's message verbatim.
pub fn load(dir: &Path) -> Result<Vec<ManifestEntry>, DbError> {
    let path = dir.join(MANIFEST_FILENAME);
    let bytes = std::fs::read(&path).map_err(|source| DbError::NotFound {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DbError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Shell-style word splitting for entries that carry only a `command`
/// string. Understands single quotes, double quotes and backslash escapes;
/// no variable expansion.
pub fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            Some(_) => match c {
                '"' => quote = None,
                '\\' => {
                    if let Some(next) = chars.next() {
                        if next != '"' && next != '\\' {
                            current.push('\\');
                        }
                        current.push(next);
                    }
                }
                _ => current.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        args.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        assert_eq!(
            split_command("cc -O2 -c main.c"),
            vec!["cc", "-O2", "-c", "main.c"]
        );
    }

    #[test]
    fn respects_quotes() {
        assert_eq!(
            split_command(r#"cc "-DNAME=two words" -I 'dir with spaces'"#),
            vec!["cc", "-DNAME=two words", "-I", "dir with spaces"]
        );
    }

    #[test]
    fn keeps_empty_quoted_arguments() {
        assert_eq!(split_command(r#"cc """#), vec!["cc", ""]);
    }

    #[test]
    fn backslash_escapes_a_space() {
        assert_eq!(split_command(r"cc path\ with\ space"), vec!["cc", "path with space"]);
    }
}
