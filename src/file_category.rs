/// File categorization by extension.
///
/// This module maps a file name to a category label using an ordered table of
/// (label, extension set) pairs. The table is plain data handed to whoever needs
/// it; nothing here reads global state.
///
/// # Examples
///
/// ```
/// use filesorter::file_category::CategoryTable;
///
/// let table = CategoryTable::reference();
/// assert_eq!(table.classify("photo.PNG"), "Images");
/// assert_eq!(table.classify("notes.txt"), "Documents");
/// assert_eq!(table.classify("Makefile"), "Other");
/// ```
use std::collections::HashSet;

/// Label used for files that match no category in the reference table.
pub const DEFAULT_LABEL: &str = "Other";

/// One row of a [`CategoryTable`]: a label and the extensions that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    /// The category label, also used verbatim as the subfolder name.
    pub label: String,
    /// Lower-cased extensions including the leading dot (e.g. ".jpg").
    pub extensions: HashSet<String>,
}

impl CategoryEntry {
    /// Creates an entry, normalizing every extension.
    ///
    /// Extensions are lower-cased and given a leading dot when it is missing,
    /// so `"JPG"`, `".jpg"` and `".JPG"` all end up as `".jpg"`.
    pub fn new<I, S>(label: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            label: label.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Returns true if the given (already lower-cased) extension belongs here.
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions.contains(ext)
    }
}

/// Ordered category table with a fallback label.
///
/// Lookup walks the entries in declared order and returns the first entry whose
/// extension set contains the file's extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
    default_label: String,
}

const IMAGES: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".tiff",
];
const VIDEO: &[&str] = &[
    ".mp4", ".avi", ".mkv", ".mov", ".flv", ".wmv", ".webm", ".m4v", ".m3u8",
];
const DOCUMENTS: &[&str] = &[
    ".txt", ".doc", ".docx", ".pdf", ".xlsx", ".xls", ".ppt", ".pptx", ".md", ".csv", ".json",
    ".xml", ".html", ".css", ".js", ".py", ".java", ".cpp", ".c",
];
const AUDIO: &[&str] = &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"];
const ARCHIVES: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"];
const PROGRAMS: &[&str] = &[".exe", ".msi", ".apk", ".dmg", ".deb", ".rpm"];

impl CategoryTable {
    /// Creates a table from entries in priority order.
    pub fn new(entries: Vec<CategoryEntry>, default_label: impl Into<String>) -> Self {
        Self {
            entries,
            default_label: default_label.into(),
        }
    }

    /// The standard table with English labels.
    pub fn reference() -> Self {
        Self::with_labels(
            [
                "Images",
                "Video",
                "Documents",
                "Audio",
                "Archives",
                "Programs",
            ],
            DEFAULT_LABEL,
        )
    }

    /// The standard table with Chinese labels.
    pub fn reference_zh() -> Self {
        Self::with_labels(["图片", "视频", "文本", "音频", "压缩包", "程序"], "其他")
    }

    fn with_labels(labels: [&str; 6], default_label: &str) -> Self {
        let sets = [IMAGES, VIDEO, DOCUMENTS, AUDIO, ARCHIVES, PROGRAMS];
        let entries = labels
            .iter()
            .zip(sets)
            .map(|(label, exts)| CategoryEntry::new(*label, exts.iter().copied()))
            .collect();
        Self::new(entries, default_label)
    }

    /// The label returned when nothing matches.
    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// The entries in priority order.
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Iterates all labels in table order, followed by the default label.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|entry| entry.label.as_str())
            .chain(std::iter::once(self.default_label.as_str()))
    }

    /// Looks up an extension (with leading dot, any case) in table order.
    pub fn category_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = ext.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.contains(&ext))
            .map(|entry| entry.label.as_str())
    }

    /// Classifies a file name into a category label.
    ///
    /// Names without a real extension (no dot, a single leading dot as in
    /// `.gitignore`, or a trailing dot) fall through to the default label.
    ///
    /// ```
    /// use filesorter::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::reference();
    /// assert_eq!(table.classify("backup.tar.gz"), "Archives");
    /// assert_eq!(table.classify(".gitignore"), "Other");
    /// ```
    pub fn classify(&self, file_name: &str) -> &str {
        extension_of(file_name)
            .and_then(|ext| self.category_for_extension(&ext))
            .unwrap_or(self.default_label.as_str())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::reference()
    }
}

/// Extracts the lower-cased extension of a file name, including the dot.
///
/// Returns `None` when the name has no dot, when its only dot is the leading
/// one of a hidden file, or when the name ends with a dot.
///
/// ```
/// use filesorter::file_category::extension_of;
///
/// assert_eq!(extension_of("Photo.JPG").as_deref(), Some(".jpg"));
/// assert_eq!(extension_of(".bashrc"), None);
/// assert_eq!(extension_of(".config.json").as_deref(), Some(".json"));
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    let idx = file_name.rfind('.')?;
    if idx == 0 || idx + 1 == file_name.len() {
        return None;
    }
    Some(file_name[idx..].to_lowercase())
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_labels_in_order() {
        let table = CategoryTable::reference();
        let labels: Vec<_> = table.labels().collect();
        assert_eq!(
            labels,
            vec![
                "Images",
                "Video",
                "Documents",
                "Audio",
                "Archives",
                "Programs",
                "Other"
            ]
        );
    }

    #[test]
    fn test_classify_case_insensitive() {
        let table = CategoryTable::reference();
        assert_eq!(table.classify("a.JPG"), "Images");
        assert_eq!(table.classify("a.jpg"), "Images");
        assert_eq!(table.classify("a.Mp3"), "Audio");
    }

    #[test]
    fn test_every_reference_extension_classifies() {
        let table = CategoryTable::reference();
        for entry in table.entries() {
            for ext in &entry.extensions {
                let name = format!("file{}", ext.to_uppercase());
                assert_eq!(table.classify(&name), entry.label, "{}", name);
            }
        }
    }

    #[test]
    fn test_classify_without_extension() {
        let table = CategoryTable::reference();
        assert_eq!(table.classify("README"), "Other");
        assert_eq!(table.classify(".gitignore"), "Other");
        assert_eq!(table.classify("trailing."), "Other");
        assert_eq!(table.classify(""), "Other");
    }

    #[test]
    fn test_hidden_file_with_real_extension() {
        let table = CategoryTable::reference();
        assert_eq!(table.classify(".eslintrc.json"), "Documents");
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        let table = CategoryTable::reference();
        assert_eq!(table.classify("unknown.xyz"), "Other");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.b.C").as_deref(), Some(".c"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("dot."), None);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let table = CategoryTable::new(
            vec![
                CategoryEntry::new("First", ["log"]),
                CategoryEntry::new("Second", [".LOG", ".out"]),
            ],
            "Misc",
        );
        assert_eq!(table.classify("server.log"), "First");
        assert_eq!(table.classify("server.out"), "Second");
        assert_eq!(table.classify("server.err"), "Misc");
    }

    #[test]
    fn test_entry_normalizes_extensions() {
        let entry = CategoryEntry::new("Notes", ["TXT", " .Md "]);
        assert!(entry.contains(".txt"));
        assert!(entry.contains(".md"));
    }

    #[test]
    fn test_chinese_reference_table() {
        let table = CategoryTable::reference_zh();
        assert_eq!(table.classify("photo.png"), "图片");
        assert_eq!(table.classify("setup.exe"), "程序");
        assert_eq!(table.classify("mystery"), "其他");
        assert_eq!(table.default_label(), "其他");
    }
}
