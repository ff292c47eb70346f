//! Template names are paths relative to their source root and must end in
//! `.jinja`.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use axum::response::{Html, IntoResponse};
use minijinja::{
    value::Rest, AutoEscape, Environment, Error, ErrorKind, HtmlEscape, State, Value,
};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, error};
use walkdir::WalkDir;

use crate::{error::TemplateError, view::View};

pub const TEMPLATE_EXTENSION: &str = "jinja";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub name: String,
    pub data: String,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Points every `include`, `extends`, `import`, `from` and `evaluate`
    /// reference to template `old` at `new` instead.
    pub fn rename_references(&mut self, old: &str, new: &str) {
        let renamed = reference_pattern().replace_all(&self.data, |caps: &Captures| {
            if &caps[3] == old {
                format!("{}{}{new}{}", &caps[1], &caps[2], &caps[4])
            } else {
                caps[0].to_string()
            }
        });
        if let std::borrow::Cow::Owned(data) = renamed {
            self.data = data;
        }
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(\{%-?\s*(?:include|extends|import|from)\s+|evaluate\(\s*)(["'])([^"']+)(["'])"#,
        )
        .expect("reference pattern is valid")
    })
}

fn has_template_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}

pub trait TemplateSource: Send + Sync {
    /// Human readable origin, used in error messages.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Vec<TemplateFile>, TemplateError>;
}

#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn load(&self) -> Result<Vec<TemplateFile>, TemplateError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !has_template_extension(&name) {
                continue;
            }

            let data = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(template = %name, "loaded template file");
            files.push(TemplateFile { name, data });
        }
        Ok(files)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    files: Vec<TemplateFile>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, data: impl Into<String>) -> Self {
        self.files.push(TemplateFile::new(name, data));
        self
    }
}

impl TemplateSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> Result<Vec<TemplateFile>, TemplateError> {
        Ok(self
            .files
            .iter()
            .filter(|file| has_template_extension(&file.name))
            .cloned()
            .collect())
    }
}

type Preprocessor = Box<dyn Fn(Vec<TemplateFile>) -> Vec<TemplateFile>>;
type Customizer = Box<dyn FnOnce(&mut Environment<'static>)>;

#[derive(Default)]
pub struct TemplateSetBuilder {
    sources: Vec<Box<dyn TemplateSource>>,
    preprocessors: Vec<Preprocessor>,
    customizers: Vec<Customizer>,
    entry: Option<String>,
}

impl TemplateSetBuilder {
    pub fn source(mut self, source: impl TemplateSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Rewrites the whole list of loaded files. Runs in registration order.
    pub fn preprocess<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(Vec<TemplateFile>) -> Vec<TemplateFile> + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Rewrites each loaded file in place.
    pub fn preprocess_each<F>(self, preprocessor: F) -> Self
    where
        F: Fn(&mut TemplateFile) + 'static,
    {
        self.preprocess(move |mut files| {
            files.iter_mut().for_each(&preprocessor);
            files
        })
    }

    /// Renders template `name` instead of the first loaded one.
    pub fn execute(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Gives access to the environment after the built-in helpers are
    /// registered, e.g. to add functions or filters.
    pub fn customize<F>(mut self, customizer: F) -> Self
    where
        F: FnOnce(&mut Environment<'static>) + 'static,
    {
        self.customizers.push(Box::new(customizer));
        self
    }

    pub fn build(self) -> Result<TemplateSet, TemplateError> {
        if self.sources.is_empty() {
            return Err(TemplateError::NoSources);
        }

        let mut files = Vec::new();
        for source in &self.sources {
            let loaded = source.load()?;
            if loaded.is_empty() {
                return Err(TemplateError::EmptySource(source.describe()));
            }
            files.extend(loaded);
        }

        for preprocessor in &self.preprocessors {
            files = preprocessor(files);
        }

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name: &str| AutoEscape::Html);
        register_helpers(&mut env);
        for customizer in self.customizers {
            customizer(&mut env);
        }

        let mut names = Vec::with_capacity(files.len());
        let mut seen = HashSet::new();
        for TemplateFile { name, data } in files {
            if !seen.insert(name.clone()) {
                return Err(TemplateError::Duplicate(name));
            }
            env.add_template_owned(name.clone(), data)
                .map_err(|source| TemplateError::Parse {
                    name: name.clone(),
                    source,
                })?;
            names.push(name);
        }

        let entry = match self.entry {
            Some(entry) if seen.contains(&entry) => entry,
            Some(entry) => return Err(TemplateError::UnknownEntry(entry)),
            None => names
                .first()
                .cloned()
                .ok_or_else(|| TemplateError::EmptySource("preprocessed template set".into()))?,
        };
        debug!(entry = %entry, templates = names.len(), "compiled template set");

        Ok(TemplateSet {
            env: Arc::new(env),
            entry,
            names,
        })
    }
}

#[derive(Clone)]
pub struct TemplateSet {
    env: Arc<Environment<'static>>,
    entry: String,
    names: Vec<String>,
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("entry", &self.entry)
            .field("names", &self.names)
            .finish()
    }
}

impl TemplateSet {
    pub fn builder() -> TemplateSetBuilder {
        TemplateSetBuilder::default()
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Renders template `name`. Failures are logged and replaced by an inline
    /// error paragraph so the page still shows what went wrong.
    pub fn render_html<S: Serialize>(&self, name: &str, ctx: S) -> String {
        match self.render(name, ctx) {
            Ok(html) => html,
            Err(err) => {
                error!(template = %name, error = %err, "cannot execute template");
                format!(
                    r#"<p style="color:red">cannot render template '{}': {}</p>"#,
                    HtmlEscape(name),
                    HtmlEscape(&err.to_string())
                )
            }
        }
    }

    pub fn render_entry<S: Serialize>(&self, ctx: S) -> String {
        self.render_html(&self.entry, ctx)
    }

    /// A view rendering the entry template with the model as context.
    pub fn view<M>(&self) -> View<M>
    where
        M: Serialize + Send + 'static,
    {
        let set = self.clone();
        View::new(move |_parts, model| Html(set.render_entry(&model)).into_response())
    }
}

fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("to_json", to_json);
    env.add_function("map", map);
    env.add_function("html", html);
    env.add_function("str", text);
    env.add_function("evaluate", evaluate);
}

fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value)
        .map_err(|err| Error::new(ErrorKind::InvalidOperation, "cannot encode JSON").with_source(err))
}

/// `map("k1", v1, "k2", v2)` builds a map, e.g. to pass several values to
/// `evaluate`.
fn map(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "map expects key/value pairs",
        ));
    }

    let mut res = BTreeMap::new();
    for pair in args.chunks(2) {
        let key = pair[0].as_str().ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation, "map keys must be strings")
        })?;
        res.insert(key.to_string(), pair[1].clone());
    }
    Ok(Value::from_serialize(&res))
}

fn concat(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

fn html(args: Rest<Value>) -> Value {
    Value::from_safe_string(concat(&args))
}

fn text(args: Rest<Value>) -> String {
    concat(&args)
}

/// Renders another template of the set with `data` as context.
fn evaluate(state: &State, name: &str, data: Value) -> Value {
    let rendered = state
        .env()
        .get_template(name)
        .and_then(|template| template.render(data));
    match rendered {
        Ok(html) => Value::from_safe_string(html),
        Err(err) => {
            error!(template = %name, error = %err, "cannot evaluate template");
            Value::from_safe_string(format!("<p>{}</p>", HtmlEscape(&err.to_string())))
        }
    }
}

#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod tests;
