//! Import resolution: locating external content fragments on disk and
//! splicing them into the document before tree construction.
//!
//! An `import` attribute holds a comma-separated list of specifiers
//! (`val1:val2:stem`). Each specifier expands a per-tag path scheme with
//! positional (`{#1}`) and attribute placeholders, then the target file is
//! located with fuzzy per-segment matching: exact, prefix, suffix,
//! substring, in that order, accepting only an unambiguous hit.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::Config;
use crate::document::{self, Element, XmlNode};
use crate::error::BuildError;

static COMMA_REGEX: OnceLock<Regex> = OnceLock::new();

fn comma_regex() -> &'static Regex {
    // Splits on commas while ignoring commas inside quoted strings
    COMMA_REGEX.get_or_init(|| Regex::new(r#"(?:[^,"']|"[^"]*"|'[^']*')+"#).unwrap())
}

/// Split a comma-separated list, honoring single and double quotes, and
/// strip surrounding whitespace and quotes from each item.
pub fn split_quoted_commas(text: &str) -> Vec<String> {
    comma_regex()
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"')
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Expand `{name}` placeholders in a path scheme.
///
/// `{{` and `}}` escape literal braces. Returns the offending placeholder
/// name on failure so callers can build a precise configuration error.
pub fn expand_scheme(scheme: &str, vars: &BTreeMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(scheme.len());
    let mut chars = scheme.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(name);
                }
                match vars.get(&name) {
                    Some(value) => out.push_str(value),
                    None => return Err(name),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Pick the unique candidate matching `segment`, trying exact, prefix,
/// suffix and substring matches in that order. A strategy that matches more
/// than one candidate is skipped in favor of the next one; if no strategy
/// yields exactly one hit there is no match.
pub fn resolve_fuzzy_segment<S: AsRef<str>>(segment: &str, candidates: &[S]) -> Option<String> {
    let strategies: [&dyn Fn(&str) -> bool; 4] = [
        &|c: &str| c == segment,
        &|c: &str| c.starts_with(segment),
        &|c: &str| c.ends_with(segment),
        &|c: &str| c.contains(segment),
    ];
    for matches in strategies {
        let mut hits = candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| matches(c));
        if let Some(first) = hits.next() {
            if hits.next().is_none() {
                return Some(first.to_string());
            }
        }
    }
    None
}

/// Like [`resolve_fuzzy_segment`] but for file names: the fuzzy match runs
/// on the candidate's stem while the extension is constrained separately
/// (`None` accepts any extension, but an extension must be present).
pub fn resolve_fuzzy_file<S: AsRef<str>>(
    stem: &str,
    extension: Option<&str>,
    candidates: &[S],
) -> Option<String> {
    let pool: Vec<(&str, &str)> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|name| {
            let (candidate_stem, ext) = name.rsplit_once('.')?;
            match extension {
                Some(want) if ext != want => None,
                _ => Some((candidate_stem, name)),
            }
        })
        .collect();
    let stems: Vec<&str> = pool.iter().map(|(s, _)| *s).collect();
    let matched_stem = resolve_fuzzy_segment(stem, &stems)?;
    pool.iter()
        .find(|(s, _)| *s == matched_stem)
        .map(|(_, name)| name.to_string())
}

/// Walk `relative` below `base`, resolving every path segment fuzzily
/// against the real directory listing. Returns the validated path, or
/// `None` when any segment has zero or several matches.
pub fn file_almost_exists(
    base: &Path,
    relative: &str,
    extension: Option<&str>,
) -> Option<PathBuf> {
    let segments: Vec<&str> = relative
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let mut current = base.to_path_buf();
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let (dirs, files) = list_dir(&current)?;
        let resolved = if last {
            resolve_fuzzy_file(segment, extension, &files)
        } else {
            resolve_fuzzy_segment(segment, &dirs)
        }?;
        current.push(resolved);
    }
    Some(current)
}

fn list_dir(dir: &Path) -> Option<(Vec<String>, Vec<String>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().ok()?.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();
    Some((dirs, files))
}

/// Resolve every import specifier of `element`, splicing the located
/// content into its subtree, and record the resolved paths in the
/// `imported` bookkeeping attribute.
pub fn resolve_imports(element: &mut Element, config: &Config) -> Result<(), BuildError> {
    let Some(import_attr) = element.remove_attr("import") else {
        return Ok(());
    };
    let specifiers = split_quoted_commas(&import_attr);
    let single = specifiers.len() == 1;
    let scheme = config.import_scheme(&element.tag).to_string();
    let base = config.base_dir();

    let mut imported: Vec<PathBuf> = Vec::new();
    for specifier in &specifiers {
        let resolved = locate(element, specifier, &scheme, &base)?;
        tracing::info!(file = %resolved.display(), tag = %element.tag, "import file");
        splice(element, &resolved, single)?;
        // recorded relative to the base directory so the bookkeeping
        // attribute, and the fingerprint it feeds, survive relocation
        let recorded = resolved
            .strip_prefix(&base)
            .map(Path::to_path_buf)
            .unwrap_or(resolved);
        imported.push(recorded);
    }

    let joined = imported
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ");
    element.set_attr("imported", joined);
    Ok(())
}

/// Expand the tag's path scheme for one specifier and locate the file.
fn locate(
    element: &Element,
    specifier: &str,
    scheme: &str,
    base: &Path,
) -> Result<PathBuf, BuildError> {
    let parts: Vec<&str> = specifier.split(':').collect();
    let (stem, placeholders) = parts.split_last().expect("split yields at least one part");

    let mut vars: BTreeMap<String, String> = placeholders
        .iter()
        .enumerate()
        .map(|(i, value)| (format!("#{}", i + 1), value.trim().to_string()))
        .collect();
    for (k, v) in &element.attrs {
        vars.insert(k.clone(), v.clone());
    }

    let prefix = expand_scheme(scheme, &vars).map_err(|placeholder| {
        BuildError::ImportPathConfig {
            tag: element.tag.clone(),
            specifier: specifier.to_string(),
            scheme: scheme.to_string(),
            placeholder,
        }
    })?;
    let full = format!("{prefix}{}", stem.trim());

    // An explicit extension restricts the search; otherwise prefer a
    // structural .xml file, falling back to any extension.
    let found = match split_extension(&full) {
        (bare, Some(ext)) => file_almost_exists(base, &bare, Some(ext.as_str())),
        (_, None) => file_almost_exists(base, &full, Some("xml"))
            .or_else(|| file_almost_exists(base, &full, None)),
    };

    found.ok_or_else(|| BuildError::ImportNotFound {
        tag: element.tag.clone(),
        path: full,
        scheme: scheme.to_string(),
    })
}

/// Split an explicit extension off the final path component.
fn split_extension(path: &str) -> (String, Option<String>) {
    match path.rsplit_once('/') {
        Some((dir, file)) => match file.rsplit_once('.') {
            Some((stem, ext)) => (format!("{dir}/{stem}"), Some(ext.to_string())),
            None => (path.to_string(), None),
        },
        None => match path.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
            None => (path.to_string(), None),
        },
    }
}

/// Splice the located file into the importing element.
///
/// A structural file whose root tag equals the importing tag, imported as
/// the only specifier, is merged in place: the imported root's attributes
/// win over the importing node's, and the imported children are appended.
/// Anything else is appended wholesale (raw text for non-XML files).
fn splice(element: &mut Element, path: &Path, single: bool) -> Result<(), BuildError> {
    let is_xml = path.extension().map(|e| e == "xml").unwrap_or(false);
    if !is_xml {
        let text = fs::read_to_string(path)?;
        element.children.push(XmlNode::Text(text));
        return Ok(());
    }

    let input = fs::read_to_string(path)?;
    let imported = document::parse_str(&input, path).map_err(|_| BuildError::ImportMalformed {
        path: path.to_path_buf(),
    })?;

    if imported.tag == element.tag && single {
        for (k, v) in imported.attrs {
            element.set_attr(&k, v);
        }
        element.children.extend(imported.children);
    } else {
        element.children.push(XmlNode::Element(imported));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn splits_on_commas_outside_quotes() {
        assert_eq!(
            split_quoted_commas("a, b:c , 'd, e'"),
            vec!["a", "b:c", "d, e"]
        );
        assert!(split_quoted_commas("").is_empty());
    }

    #[test]
    fn expands_named_and_positional_placeholders() {
        let mut vars = BTreeMap::new();
        vars.insert("#1".to_string(), "w1".to_string());
        vars.insert("year".to_string(), "2025".to_string());
        assert_eq!(
            expand_scheme("TP/{year}/{#1}/", &vars).unwrap(),
            "TP/2025/w1/"
        );
    }

    #[test]
    fn undefined_placeholder_is_reported() {
        let vars = BTreeMap::new();
        assert_eq!(expand_scheme("TP/{week}/", &vars), Err("week".to_string()));
    }

    #[test]
    fn fuzzy_priority_exact_then_prefix_then_suffix_then_substring() {
        let candidates = vec!["w1", "w1-bis", "old-w2"];
        assert_eq!(resolve_fuzzy_segment("w1", &candidates).as_deref(), Some("w1"));
        assert_eq!(
            resolve_fuzzy_segment("w1-b", &candidates).as_deref(),
            Some("w1-bis")
        );
        assert_eq!(
            resolve_fuzzy_segment("w2", &candidates).as_deref(),
            Some("old-w2")
        );
        assert_eq!(
            resolve_fuzzy_segment("d-w", &candidates).as_deref(),
            Some("old-w2")
        );
    }

    #[test]
    fn fuzzy_ambiguity_yields_none() {
        let candidates = vec!["exo1a", "exo1b"];
        assert_eq!(resolve_fuzzy_segment("exo1", &candidates), None);
    }

    #[test]
    fn fuzzy_file_honors_extension() {
        let candidates = vec!["exo1.xml", "exo1.tex", "notes"];
        assert_eq!(
            resolve_fuzzy_file("exo1", Some("xml"), &candidates).as_deref(),
            Some("exo1.xml")
        );
        // any-extension search is ambiguous here
        assert_eq!(resolve_fuzzy_file("exo1", None, &candidates), None);
        // extensionless files never match
        assert_eq!(resolve_fuzzy_file("notes", None, &candidates), None);
    }

    #[test]
    fn walks_partial_directory_names() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("TP-semaine1");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("exo-pointers.xml"), "<Exercice/>").unwrap();

        let found = file_almost_exists(tmp.path(), "TP/exo-pointers", Some("xml")).unwrap();
        assert_eq!(found, dir.join("exo-pointers.xml"));

        assert!(file_almost_exists(tmp.path(), "TD/exo-pointers", Some("xml")).is_none());
    }

    fn config_at(dir: &Path) -> Config {
        let mut config = Config::default().rooted_at(dir);
        config
            .import_paths
            .insert("TP".to_string(), "sources/{#1}/".to_string());
        config
    }

    #[test]
    fn records_imported_paths_and_splices_children() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("exo1.xml"), "<Exercice>count to ten</Exercice>").unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:exo1");
        resolve_imports(&mut element, &config_at(tmp.path())).unwrap();

        assert!(element.attr("import").is_none());
        let imported = element.attr("imported").unwrap();
        assert!(imported.contains("exo1.xml"), "imported = {imported}");
        assert_eq!(element.child_elements().count(), 1);
    }

    #[test]
    fn imported_paths_are_recorded_relative_to_the_base() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("exo1.xml"), "<Exercice>e</Exercice>").unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:exo1");
        resolve_imports(&mut element, &config_at(tmp.path())).unwrap();

        assert_eq!(element.attr("imported"), Some("'sources/w1/exo1.xml'"));
    }

    #[test]
    fn same_tag_merge_prefers_imported_attributes() {
        // Regression: when the imported root carries the same tag, its
        // attributes overwrite the importing node's on conflict.
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("tp.xml"),
            r#"<TP name="from-file" lang="markdown"><Exercice>e</Exercice></TP>"#,
        )
        .unwrap();

        let mut element = Element::new("TP");
        element.set_attr("name", "local");
        element.set_attr("room", "B2");
        element.set_attr("import", "w1:tp");
        resolve_imports(&mut element, &config_at(tmp.path())).unwrap();

        assert_eq!(element.attr("name"), Some("from-file"));
        assert_eq!(element.attr("lang"), Some("markdown"));
        // attributes the imported root does not carry survive
        assert_eq!(element.attr("room"), Some("B2"));
        assert_eq!(element.child_elements().count(), 1);
    }

    #[test]
    fn missing_import_fails_with_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sources").join("w1")).unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:ghost");
        let err = resolve_imports(&mut element, &config_at(tmp.path())).unwrap_err();
        assert!(matches!(err, BuildError::ImportNotFound { .. }), "{err}");
    }

    #[test]
    fn ambiguous_import_fails_with_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("exo1a.xml"), "<Exercice/>").unwrap();
        fs::write(dir.join("exo1b.xml"), "<Exercice/>").unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:exo1");
        let err = resolve_imports(&mut element, &config_at(tmp.path())).unwrap_err();
        assert!(matches!(err, BuildError::ImportNotFound { .. }), "{err}");
    }

    #[test]
    fn unresolvable_scheme_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default().rooted_at(tmp.path());
        config
            .import_paths
            .insert("TP".to_string(), "sources/{week}/".to_string());

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:exo1");
        let err = resolve_imports(&mut element, &config).unwrap_err();
        assert!(matches!(err, BuildError::ImportPathConfig { .. }), "{err}");
    }

    #[test]
    fn malformed_imported_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("exo1.xml"), "").unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:exo1");
        let err = resolve_imports(&mut element, &config_at(tmp.path())).unwrap_err();
        assert!(matches!(err, BuildError::ImportMalformed { .. }), "{err}");
    }

    #[test]
    fn non_xml_import_is_appended_as_text() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sources").join("w1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("preamble.tex"), "\\usepackage{tikz}").unwrap();

        let mut element = Element::new("TP");
        element.set_attr("import", "w1:preamble.tex");
        resolve_imports(&mut element, &config_at(tmp.path())).unwrap();
        assert_eq!(element.direct_text(), "\\usepackage{tikz}");
    }
}
