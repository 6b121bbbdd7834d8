//! Supported upload extensions and their display languages.

/// Extension → language tag. Only these extensions are accepted.
const LANGUAGES: &[(&str, &str)] = &[
    (".js", "javascript"),
    (".jsx", "jsx"),
    (".ts", "typescript"),
    (".tsx", "tsx"),
    (".py", "python"),
    (".java", "java"),
    (".cs", "csharp"),
    (".go", "go"),
    (".rb", "ruby"),
    (".php", "php"),
    (".html", "html"),
    (".css", "css"),
    (".scss", "scss"),
    (".less", "less"),
    (".json", "json"),
    (".xml", "xml"),
    (".yaml", "yaml"),
    (".yml", "yaml"),
    (".md", "markdown"),
    (".diff", "diff"),
    (".patch", "diff"),
    (".txt", "text"),
    (".sh", "bash"),
    (".swift", "swift"),
    (".kt", "kotlin"),
    (".c", "c"),
    (".cpp", "cpp"),
    (".h", "c"),
    (".hpp", "cpp"),
];

/// Language tag for unknown extensions.
pub const PLAIN_TEXT: &str = "text";

/// Lowercased extension of a file name, including the dot.
///
/// Only the last path component is considered. A leading dot counts
/// (`.bashrc` has extension `.bashrc`); a name without any dot has none.
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rfind('.').map(|i| base[i..].to_lowercase())
}

/// Whether files with this name may be uploaded.
pub fn is_supported(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| LANGUAGES.iter().any(|(e, _)| *e == ext))
}

/// Display language for a file name, defaulting to [`PLAIN_TEXT`].
pub fn language_for(name: &str) -> &'static str {
    extension_of(name)
        .and_then(|ext| LANGUAGES.iter().find(|(e, _)| *e == ext).map(|(_, lang)| *lang))
        .unwrap_or(PLAIN_TEXT)
}

/// All supported extensions, for help text.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(ext, _)| *ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_last_component() {
        assert_eq!(extension_of("src/Main.PY").as_deref(), Some(".py"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("dir.d/Makefile"), None);
        assert_eq!(extension_of(".bashrc").as_deref(), Some(".bashrc"));
    }

    #[test]
    fn supported_files_get_their_language() {
        assert!(is_supported("a.py"));
        assert_eq!(language_for("a.py"), "python");
        assert_eq!(language_for("fix.patch"), "diff");
        assert_eq!(language_for("x.hpp"), "cpp");
        assert_eq!(language_for("notes.yml"), "yaml");
    }

    #[test]
    fn unsupported_files_fall_back_to_text() {
        assert!(!is_supported("main.rs"));
        assert!(!is_supported("Makefile"));
        assert_eq!(language_for("main.rs"), PLAIN_TEXT);
    }

    #[test]
    fn every_extension_starts_with_dot() {
        assert!(supported_extensions().all(|e| e.starts_with('.')));
        assert_eq!(supported_extensions().count(), 29);
    }
}
