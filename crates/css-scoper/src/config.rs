//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use css_rewrite::{
    RewriteMode, SectionBoundary, SectionPlan, DEFAULT_DECLARATION, DEFAULT_TARGETS,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

/// File looked up in the workspace when `--config` is not given.
pub const CONFIG_FILE: &str = "css-scoper.json";

const PAGES_STYLESHEET: &str = "styles/pages-core.css";
const DASHBOARDS_STYLESHEET: &str = "styles/unified-dashboards.css";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoperConfig {
    /// The width-fix pass.
    pub width_fix: WidthFixConfig,
    /// Namespace jobs by name.
    pub namespaces: BTreeMap<String, NamespaceJob>,
}

/// Width-fix settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidthFixConfig {
    /// Stylesheet to patch.
    pub file: Utf8PathBuf,
    /// Selectors whose blocks receive the declaration.
    pub selectors: Vec<String>,
    /// The declaration to inject.
    pub declaration: String,
}

impl Default for WidthFixConfig {
    fn default() -> Self {
        Self {
            file: Utf8PathBuf::from(DASHBOARDS_STYLESHEET),
            selectors: DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect(),
            declaration: DEFAULT_DECLARATION.to_string(),
        }
    }
}

/// A namespace job: one stylesheet, its sections and the scanner to use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceJob {
    /// Stylesheet to rewrite.
    pub file: Utf8PathBuf,
    /// Scanner mode.
    #[serde(default)]
    pub mode: RewriteMode,
    /// Namespace of the leading section.
    pub namespace: String,
    /// Following sections, in file order.
    #[serde(default)]
    pub sections: Vec<SectionBoundary>,
}

impl NamespaceJob {
    /// Returns the section plan for this job.
    pub fn plan(&self) -> SectionPlan {
        SectionPlan {
            namespace: self.namespace.clone(),
            boundaries: self.sections.clone(),
        }
    }

    /// The merged page stylesheet: auth, browse, cart and family details.
    pub fn pages() -> Self {
        Self {
            file: Utf8PathBuf::from(PAGES_STYLESHEET),
            mode: RewriteMode::KeyframeAware,
            namespace: ".auth-page".to_string(),
            sections: vec![
                SectionBoundary::new(banner("BROWSE PAGE STYLES"), ".browse-page"),
                SectionBoundary::new(banner("CART PAGE STYLES"), ".cart-page"),
                SectionBoundary::new(banner("FAMILY DETAILS PAGE STYLES"), ".family-details-page"),
            ],
        }
    }

    /// The unified dashboard stylesheet: family, operator, visitor and company.
    pub fn dashboards() -> Self {
        Self {
            file: Utf8PathBuf::from(DASHBOARDS_STYLESHEET),
            mode: RewriteMode::Plain,
            namespace: ".family-dash".to_string(),
            sections: vec![
                SectionBoundary::new(banner("OPERATOR DASHBOARD STYLES"), ".operator-dash"),
                SectionBoundary::new(banner("VISITOR DASHBOARD STYLES"), ".visitor-dash"),
                SectionBoundary::new(banner("COMPANY DASHBOARD STYLES"), ".company-dash"),
            ],
        }
    }
}

/// The opening of a section banner comment.
pub fn banner(title: &str) -> String {
    format!("/* {}\n   {}", "=".repeat(44), title)
}

impl Default for ScoperConfig {
    fn default() -> Self {
        Self {
            width_fix: WidthFixConfig::default(),
            namespaces: BTreeMap::from([
                ("pages".to_string(), NamespaceJob::pages()),
                ("dashboards".to_string(), NamespaceJob::dashboards()),
            ]),
        }
    }
}

/// What a config file may contain; anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    width_fix: Option<WidthFixConfig>,
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceJob>,
}

impl ScoperConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `css-scoper.json` in the
    /// workspace is used when present, and the built-in jobs otherwise.
    /// Returns the config and the file it came from.
    pub fn load(
        workspace: &Utf8Path,
        explicit: Option<&Utf8Path>,
    ) -> Result<(Self, Option<Utf8PathBuf>), String> {
        let path = match explicit {
            Some(path) if path.is_relative() => workspace.join(path),
            Some(path) => path.to_path_buf(),
            None => {
                let path = workspace.join(CONFIG_FILE);
                if !path.exists() {
                    return Ok((Self::default(), None));
                }
                path
            }
        };

        let content = fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
        let config = Self::parse(&content).map_err(|e| format!("{}: {}", path, e))?;
        Ok((config, Some(path)))
    }

    /// Parses config file content over the built-in defaults.
    pub fn parse(content: &str) -> Result<Self, String> {
        let file: ConfigFile =
            serde_json::from_str(&strip_comments(content)).map_err(|e| e.to_string())?;

        let mut config = Self::default();
        if let Some(width_fix) = file.width_fix {
            config.width_fix = width_fix;
        }
        config.namespaces.extend(file.namespaces);
        Ok(config)
    }

    /// Returns the job names, comma separated.
    pub fn job_names(&self) -> String {
        self.namespaces
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Removes `//` and `/* */` comments outside of JSON strings.
fn strip_comments(json: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Str,
        Escape,
        LineComment,
        BlockComment,
    }

    let mut result = String::with_capacity(json.len());
    let mut state = State::Code;
    let mut chars = json.chars().peekable();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (State::Code, '"') => {
                result.push(c);
                State::Str
            }
            (State::Code, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                State::LineComment
            }
            (State::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                State::BlockComment
            }
            (State::Str, '\\') => {
                result.push(c);
                State::Escape
            }
            (State::Str, '"') => {
                result.push(c);
                State::Code
            }
            (State::Escape, _) => {
                result.push(c);
                State::Str
            }
            (State::LineComment, '\n') => {
                result.push(c);
                State::Code
            }
            (State::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                State::Code
            }
            (State::LineComment | State::BlockComment, _) => state,
            (State::Code | State::Str, _) => {
                result.push(c);
                state
            }
        };
    }

    result
}
