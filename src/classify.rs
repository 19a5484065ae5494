//! Keyword based category assignment.

/// Free-text fields of an entry to classify.
#[derive(Debug, Default, Clone)]
pub struct ClassificationInput {
    pub name: String,
    pub path: String,
    pub description: String,
}

impl ClassificationInput {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: description.into(),
        }
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            basename(&self.path),
            self.description
        )
        .to_lowercase()
    }
}

/// File name part of a path written with either separator.
fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Categories and their keywords, kept in insertion order.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct CategoryKeywordTable {
    categories: Vec<(String, Vec<String>)>,
}

impl CategoryKeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a category. Keywords are lower-cased; empty ones are dropped.
    pub fn with_category<I, S>(mut self, name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.categories.push((name.into(), keywords));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, keywords)| (name.as_str(), keywords.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Keywords are matched as substrings, so short ones that occur inside
    /// common words ("edge" in "knowledge", "git" in "digital") are avoided.
    pub fn builtin() -> Self {
        Self::new()
            .with_category(
                "Web Browsers",
                [
                    "chrome", "firefox", "microsoft edge", "msedge", "internet explorer",
                    "iexplore", "browser", "opera gx", "brave", "vivaldi", "safari",
                ],
            )
            .with_category(
                "Development",
                [
                    "visual studio", "vscode", "github", "git bash", "python", "terminal",
                    "powershell", "jetbrains", "intellij", "pycharm", "docker", "postman",
                    "sublime", "notepad++",
                ],
            )
            .with_category(
                "Office",
                [
                    "microsoft word", "winword", "excel", "powerpoint", "outlook", "onenote",
                    "office", "wps", "pdf", "acrobat", "libreoffice", "notion",
                ],
            )
            .with_category(
                "Communication",
                [
                    "wechat", "tencent qq", "teams", "zoom", "slack", "discord", "telegram",
                    "skype", "dingtalk", "whatsapp",
                ],
            )
            .with_category(
                "Media",
                ["music", "spotify", "vlc", "player", "video", "netflix", "itunes", "potplayer"],
            )
            .with_category(
                "Games",
                ["steam", "epic games", "game", "battle.net", "ubisoft", "riot client"],
            )
            .with_category(
                "Graphics",
                ["photoshop", "illustrator", "gimp", "paint", "blender", "figma", "inkscape"],
            )
            .with_category(
                "Utilities",
                [
                    "7-zip", "winrar", "everything", "cleaner", "control panel", "explorer",
                    "calculator", "settings",
                ],
            )
    }
}

pub const DEFAULT_CATEGORY: &str = "Other";

/// Assigns the first category whose keyword appears in an entry's text.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    table: CategoryKeywordTable,
    default_category: String,
}

impl CategoryClassifier {
    pub fn new(table: CategoryKeywordTable, default_category: impl Into<String>) -> Self {
        Self {
            table,
            default_category: default_category.into(),
        }
    }

    pub fn table(&self) -> &CategoryKeywordTable {
        &self.table
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn classify(&self, input: &ClassificationInput) -> &str {
        let text = input.search_text();

        self.table
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(name, _)| name)
            .unwrap_or(self.default_category.as_str())
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(CategoryKeywordTable::builtin(), DEFAULT_CATEGORY)
    }
}
