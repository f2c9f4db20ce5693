// Relative specifier resolution against the module store

use crate::store::Modules;

/// Source extensions tried when a specifier omits one, in priority order
pub const EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Emitted extensions that may name a TypeScript source
const EMITTED: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts"]),
    ("cjs", &["cts"]),
];

/// Resolve `specifier` as written in `importer` to a module path in `modules`.
///
/// Only relative specifiers are resolved; packages and aliases yield `None`.
pub fn resolve(importer: &str, specifier: &str, modules: &Modules) -> Option<String> {
    if !is_relative(specifier) {
        return None;
    }

    let dir = importer.rfind('/').map(|i| &importer[..i]).unwrap_or("");
    let base = normalize(&format!("{}/{}", dir, specifier))?;

    candidates(&base).into_iter().find(|c| modules.exists(c))
}

pub fn is_relative(specifier: &str) -> bool {
    specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../")
}

fn candidates(base: &str) -> Vec<String> {
    let mut out = vec![base.to_string()];

    if let Some((stem, ext)) = base.rsplit_once('.') {
        if let Some((_, sources)) = EMITTED.iter().find(|(emitted, _)| *emitted == ext) {
            out.extend(sources.iter().map(|s| format!("{}.{}", stem, s)));
        }
    }
    out.extend(EXTENSIONS.iter().map(|ext| format!("{}.{}", base, ext)));
    out.extend(EXTENSIONS.iter().map(|ext| join(base, &format!("index.{}", ext))));
    out
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Collapse `.` and `..` segments. Returns `None` if the path escapes the root
fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
