//! Manual catalogue loading with builder pattern and fallback chains.
//!
//! Provides [`ManualCatalogue`], the immutable set of command manuals a bot
//! serves, and [`CatalogueBuilder`] for loading it from one of several
//! sources with automatic fallback.
//!
//! Declaration files hold one manual or an array of manuals, as JSON or
//! YAML. The file stem names the module the manuals belong to, so
//! `jumprole.yaml` declares the commands of the `jumprole` module.
//!
//! Every declaration is reviewed once, at load time: classified, checked
//! for semantic problems, and linted. Declarations that fail are logged
//! with field-level detail and kept aside as [`Rejection`]s instead of
//! failing the whole load.
//!
//! # Loading patterns
//!
//! ```no_run
//! use command_manual_db::ManualCatalogue;
//!
//! let catalogue = ManualCatalogue::from_dir("manuals/").unwrap();
//! for rejection in catalogue.rejected() {
//!     eprintln!("skipped: {rejection}");
//! }
//!
//! let catalogue = ManualCatalogue::builder()
//!     .from_dir("/etc/bot/manuals/")
//!     .from_file("manuals.json")
//!     .build()
//!     .unwrap();
//! assert!(catalogue.get("tj").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use command_manual_core::{Classification, CommandManual, classify, validate_manual};
use command_manual_syntax::lint_manual;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CatalogueError, Result};

const DECLARATION_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Describes where a [`ManualCatalogue`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueSource {
    /// A directory of declaration files, one module per file.
    Directory(PathBuf),
    /// A single declaration file.
    File(PathBuf),
    /// Manuals registered in code.
    Inline,
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<CatalogueSource>),
}

/// A manual that passed review, with the module it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub module: String,
    pub origin: PathBuf,
    pub manual: CommandManual,
}

/// A declaration excluded from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub origin: PathBuf,
    /// Position of the declaration within its file.
    pub position: usize,
    /// The declared name, when there was a string `name` field.
    pub name: Option<String>,
    pub reasons: Vec<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.origin.display(), self.position)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        write!(f, ": {}", self.reasons.join("; "))
    }
}

/// Every problem with an already-typed manual: semantic errors from
/// [`validate_manual`] followed by template lint issues.
///
/// An empty vector means the manual can be served.
pub fn manual_problems(manual: &CommandManual) -> Vec<String> {
    validate_manual(manual)
        .into_iter()
        .map(|err| err.to_string())
        .chain(lint_manual(manual).into_iter().map(|issue| issue.to_string()))
        .collect()
}

/// Classifies and reviews one declaration.
///
/// # Errors
///
/// Returns every reason the declaration cannot be served.
pub fn review_declaration(value: &Value) -> std::result::Result<CommandManual, Vec<String>> {
    let manual = match classify(value) {
        Classification::Invalid(err) => return Err(vec![err.to_string()]),
        other => other.into_manual().map_err(|err| vec![err.to_string()])?,
    };
    let problems = manual_problems(&manual);
    if problems.is_empty() {
        Ok(manual)
    } else {
        Err(problems)
    }
}

/// The immutable set of manuals a bot serves, indexed by command name.
///
/// Built once during startup and shared by reference afterwards.
#[derive(Debug, Clone)]
pub struct ManualCatalogue {
    entries: Vec<CatalogueEntry>,
    index: HashMap<String, usize>,
    rejected: Vec<Rejection>,
    source: CatalogueSource,
}

impl ManualCatalogue {
    /// Returns a new [`CatalogueBuilder`] for configuring a fallback chain.
    pub fn builder() -> CatalogueBuilder {
        CatalogueBuilder::new()
    }

    fn empty(source: CatalogueSource) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            rejected: Vec::new(),
            source,
        }
    }

    /// Builds a catalogue from manuals declared in code, all in `module`.
    ///
    /// Manuals are reviewed exactly like file declarations.
    pub fn from_manuals(module: &str, manuals: impl IntoIterator<Item = CommandManual>) -> Self {
        let mut catalogue = Self::empty(CatalogueSource::Inline);
        let origin = PathBuf::from("<inline>");
        for (position, manual) in manuals.into_iter().enumerate() {
            let problems = manual_problems(&manual);
            let name = manual.name().to_string();
            if problems.is_empty() {
                catalogue.insert(module, &origin, position, manual);
            } else {
                catalogue.reject(&origin, position, Some(name), problems);
            }
        }
        catalogue
    }

    /// Loads every `*.json`, `*.yaml` and `*.yml` file in a directory.
    ///
    /// Files are read in name order so rejections of duplicate names are
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::IoError`] if the directory or a file cannot
    /// be read, or a JSON/YAML error if a file does not parse at all.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && is_declaration_file(&file_path) {
                files.push(file_path);
            }
        }
        files.sort();

        let mut catalogue = Self::empty(CatalogueSource::Directory(path.to_path_buf()));
        for file in &files {
            catalogue.load_file(file)?;
        }
        debug!(
            directory = %path.display(),
            files = files.len(),
            manuals = catalogue.len(),
            rejected = catalogue.rejected.len(),
            "loaded manual catalogue"
        );
        Ok(catalogue)
    }

    /// Loads a single declaration file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::UnsupportedFormat`] for unknown extensions,
    /// [`CatalogueError::IoError`] if the file cannot be read, or a
    /// JSON/YAML error if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut catalogue = Self::empty(CatalogueSource::File(path.to_path_buf()));
        catalogue.load_file(path)?;
        Ok(catalogue)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let declarations = read_declarations(path)?;
        let module = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        for (position, value) in declarations.iter().enumerate() {
            match review_declaration(value) {
                Ok(manual) => self.insert(&module, path, position, manual),
                Err(reasons) => {
                    let name = value
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    self.reject(path, position, name, reasons);
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, module: &str, origin: &Path, position: usize, manual: CommandManual) {
        let name = manual.name().to_string();
        if let Some(&existing) = self.index.get(&name) {
            let first = self.entries[existing].origin.display().to_string();
            self.reject(
                origin,
                position,
                Some(name),
                vec![format!("duplicate command name, first declared in {first}")],
            );
            return;
        }

        self.index.insert(name, self.entries.len());
        self.entries.push(CatalogueEntry {
            module: module.to_string(),
            origin: origin.to_path_buf(),
            manual,
        });
    }

    fn reject(&mut self, origin: &Path, position: usize, name: Option<String>, reasons: Vec<String>) {
        let rejection = Rejection {
            origin: origin.to_path_buf(),
            position,
            name,
            reasons,
        };
        warn!(%rejection, "excluding command manual");
        self.rejected.push(rejection);
    }

    /// Looks up a manual by command name.
    pub fn get(&self, command: &str) -> Option<&CommandManual> {
        self.entry(command).map(|e| &e.manual)
    }

    pub fn entry(&self, command: &str) -> Option<&CatalogueEntry> {
        self.index.get(command).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, command: &str) -> bool {
        self.index.contains_key(command)
    }

    /// Entries in load order.
    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Module names in the order their first manual was loaded.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !modules.contains(&entry.module.as_str()) {
                modules.push(&entry.module);
            }
        }
        modules
    }

    /// Entries belonging to `module`, in load order.
    pub fn in_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a CatalogueEntry> {
        self.entries.iter().filter(move |e| e.module == module)
    }

    /// Declarations excluded during loading.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &CatalogueSource {
        &self.source
    }
}

fn is_declaration_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DECLARATION_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reads a declaration file into one value per declared manual.
fn read_declarations(path: &Path) -> Result<Vec<Value>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let value: Value = match extension.as_deref() {
        Some("json") => serde_json::from_reader(BufReader::new(std::fs::File::open(path)?))?,
        Some("yaml" | "yml") => {
            serde_yaml::from_reader(BufReader::new(std::fs::File::open(path)?))?
        }
        _ => return Err(CatalogueError::UnsupportedFormat(path.to_path_buf())),
    };

    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// Builder for constructing a [`ManualCatalogue`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first source that
/// loads wins; if all fail, [`CatalogueError::NoSourcesAvailable`] is
/// returned.
pub struct CatalogueBuilder {
    sources: Vec<CatalogueSource>,
}

impl CatalogueBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of declaration files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogueSource::Directory(path.into()));
        self
    }

    /// Adds a single declaration file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogueSource::File(path.into()));
        self
    }

    /// Attempts to load manuals from configured sources in order.
    pub fn build(self) -> Result<ManualCatalogue> {
        if self.sources.is_empty() {
            return Err(CatalogueError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                CatalogueSource::Directory(path) => ManualCatalogue::from_dir(path),
                CatalogueSource::File(path) => ManualCatalogue::from_file(path),
                CatalogueSource::Inline | CatalogueSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut catalogue) => {
                    catalogue.source = CatalogueSource::Multiple(all_sources);
                    return Ok(catalogue);
                }
                Err(err) => debug!(?source, error = %err, "manual source unavailable"),
            }
        }

        Err(CatalogueError::NoSourcesAvailable)
    }
}

impl Default for CatalogueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use command_manual_core::{CommandArgument, MultifacetedCommandManual, SubcommandManual};
    use serde_json::json;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn choose_json() -> Value {
        json!({
            "name": "choose",
            "syntax": "<prefix>jumprole choose $1",
            "arguments": [{"name": "channel", "id": "channel", "optional": false}],
            "description": "Designates a channel."
        })
    }

    #[test]
    fn test_review_declaration_collects_lint_problems() {
        let value = json!({
            "name": "x",
            "syntax": "<prefix>x $1 $3",
            "arguments": [{"name": "a", "id": "a", "optional": false}],
            "description": ""
        });
        let reasons = review_declaration(&value).unwrap_err();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("`$3` refers past the 1 declared arguments"));
    }

    #[test]
    fn test_from_file_accepts_single_manual_and_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let single = write(dir.path(), "jumprole.json", &choose_json().to_string());
        let catalogue = ManualCatalogue::from_file(&single).unwrap();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.entry("choose").unwrap().module, "jumprole");

        let list = json!([choose_json(), {"name": "broken"}]);
        let many = write(dir.path(), "more.json", &list.to_string());
        let catalogue = ManualCatalogue::from_file(&many).unwrap();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.rejected().len(), 1);
        assert_eq!(catalogue.rejected()[0].position, 1);
        assert_eq!(catalogue.rejected()[0].name.as_deref(), Some("broken"));
    }

    #[test]
    fn test_yaml_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = r#"
name: tier
description: Manage tiers.
subcommands:
  - name: list
    syntax: "<prefix>tier list"
    arguments: []
    description: Lists tiers.
  - name: delete
    syntax: "<prefix>tier delete NAME $1"
    arguments:
      - name: tier name
        id: name
        optional: false
    description: Deletes a tier.
"#;
        let path = write(dir.path(), "tiers.yml", yaml);
        let catalogue = ManualCatalogue::from_file(&path).unwrap();
        let CommandManual::Multifaceted(tier) = catalogue.get("tier").unwrap() else {
            panic!("expected multifaceted");
        };
        assert_eq!(tier.subcommand_names(), vec!["list", "delete"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "{}");
        assert!(matches!(
            ManualCatalogue::from_file(&path),
            Err(CatalogueError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", &choose_json().to_string());
        write(dir.path(), "b.json", &choose_json().to_string());
        write(dir.path(), "readme.md", "not a manual");

        let catalogue = ManualCatalogue::from_dir(dir.path()).unwrap();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.entry("choose").unwrap().module, "a");
        assert_eq!(catalogue.rejected().len(), 1);
        assert!(catalogue.rejected()[0].reasons[0].starts_with("duplicate command name"));
    }

    #[test]
    fn test_from_manuals_reviews_inline_declarations() {
        let good = SubcommandManual::new("info", "<prefix>info", "Shows info.");
        let bad = MultifacetedCommandManual::new("tj", "").with_subcommand(
            SubcommandManual::new("get", "<prefix>tj get {opt $1}[ X $1]", "")
                .with_argument(CommandArgument::required("x", "x")),
        );

        let catalogue =
            ManualCatalogue::from_manuals("Stock", [good.into(), CommandManual::from(bad)]);
        assert_eq!(catalogue.modules(), vec!["Stock"]);
        assert!(catalogue.contains("info"));
        assert!(!catalogue.contains("tj"));
        assert_eq!(catalogue.source(), &CatalogueSource::Inline);

        let rendered = catalogue.rejected()[0].to_string();
        assert!(rendered.starts_with("<inline>[1] (tj): get: fragment `{opt $1}`"));
    }

    #[test]
    fn test_builder_falls_back_to_next_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "jumprole.json", &choose_json().to_string());

        let catalogue = ManualCatalogue::builder()
            .from_dir(dir.path().join("missing"))
            .from_file(&file)
            .build()
            .unwrap();
        assert!(catalogue.contains("choose"));
        assert!(matches!(catalogue.source(), CatalogueSource::Multiple(s) if s.len() == 2));

        assert!(matches!(
            ManualCatalogue::builder().build(),
            Err(CatalogueError::NoSourcesAvailable)
        ));
    }
}
