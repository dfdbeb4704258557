use std::path::Path;

/// The path resolves above the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapesRoot;

/// Normalize `target` to a `/`-joined path relative to `root`.
///
/// Purely lexical: nothing is read from disk and symlinks are not followed.
/// Backslashes count as separators. The project root itself normalizes to
/// the empty string.
pub fn normalize(root: &Path, target: &str) -> Result<String, EscapesRoot> {
    let unified = target.replace('\\', "/");
    if is_absolute(&unified) {
        let root_str = root.to_string_lossy().replace('\\', "/");
        let root_parts = resolve(root_str.split('/'))?;
        let target_parts = resolve(unified.split('/'))?;
        if target_parts.len() < root_parts.len()
            || target_parts[..root_parts.len()] != root_parts[..]
        {
            return Err(EscapesRoot);
        }
        return Ok(target_parts[root_parts.len()..].join("/"));
    }
    Ok(resolve(unified.split('/'))?.join("/"))
}

fn is_absolute(unified: &str) -> bool {
    unified.starts_with('/') || Path::new(unified).is_absolute()
}

fn resolve<'a>(segments: impl Iterator<Item = &'a str>) -> Result<Vec<&'a str>, EscapesRoot> {
    let mut parts = Vec::new();
    for seg in segments {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(EscapesRoot);
                }
            }
            s => parts.push(s),
        }
    }
    Ok(parts)
}

/// `path` equals `prefix` or lies beneath it, compared component-wise.
/// An empty prefix is the project root and contains everything.
pub fn within(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() || path == prefix {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/work/project";

    fn norm(t: &str) -> Result<String, EscapesRoot> {
        normalize(Path::new(ROOT), t)
    }

    #[test]
    fn relative_paths() {
        assert_eq!(norm("src/hooks/test.ts").unwrap(), "src/hooks/test.ts");
        assert_eq!(norm("./src//hooks/./test.ts").unwrap(), "src/hooks/test.ts");
        assert_eq!(norm("src/lib/../hooks/x.ts").unwrap(), "src/hooks/x.ts");
        assert_eq!(norm("src\\hooks\\x.ts").unwrap(), "src/hooks/x.ts");
        assert_eq!(norm("docs/").unwrap(), "docs");
        assert_eq!(norm(".").unwrap(), "");
    }

    #[test]
    fn escaping_paths() {
        assert_eq!(norm("../secrets"), Err(EscapesRoot));
        assert_eq!(norm("src/../../etc/passwd"), Err(EscapesRoot));
        assert_eq!(norm("/etc/passwd"), Err(EscapesRoot));
        assert_eq!(norm("/work/project-evil/x"), Err(EscapesRoot));
        assert_eq!(norm("/work/project/../other/x"), Err(EscapesRoot));
    }

    #[test]
    fn absolute_paths_under_root() {
        assert_eq!(norm("/work/project/src/a.rs").unwrap(), "src/a.rs");
        assert_eq!(norm("/work/project/src/../b.rs").unwrap(), "b.rs");
        assert_eq!(norm("/work/project").unwrap(), "");
    }

    #[test]
    fn within_is_component_wise() {
        assert!(within("src/hooks/a.ts", "src/hooks"));
        assert!(within("src/hooks", "src/hooks"));
        assert!(within("anything/at/all", ""));
        assert!(!within("src/hooks-evil/a.ts", "src/hook"));
        assert!(!within("src/hooks-evil/a.ts", "src/hooks"));
        assert!(!within("src", "src/hooks"));
        assert!(!within("Src/hooks/a.ts", "src/hooks"));
    }
}
