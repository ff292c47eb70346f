use anyhow::Context;
use axum::{
    response::{Html, IntoResponse},
    routing::MethodRouter,
};
use form::query::decode_query;
use mvu::{
    Case, FormDecode, MultipartForm, Page, Redirect, Schema, TemplateSet, Transition, View,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Root context of every page template.
#[derive(Serialize)]
struct Screen<'a, M> {
    model: &'a M,
}

/// Renders template `name` with the model under `model`.
fn screen<M>(templates: &TemplateSet, name: &'static str) -> View<M>
where
    M: Serialize + Send + 'static,
{
    let templates = templates.clone();
    View::new(move |_parts, model| {
        Html(templates.render_html(name, Screen { model: &model })).into_response()
    })
}

// counter

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "Count")]
    pub count: i64,
    /// Taken from `?step=` on every request.
    #[serde(skip, default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            count: 0,
            step: default_step(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Increment {}

impl FormDecode for Increment {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Increment")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Decrement {}

impl FormDecode for Decrement {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Decrement")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Add {
    #[serde(rename = "Amount")]
    pub amount: i64,
}

impl FormDecode for Add {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Add").value("Amount", |a| &mut a.amount)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Finish {}

impl FormDecode for Finish {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Finish")
    }
}

#[derive(Debug, Default)]
struct StepQuery {
    step: Option<i64>,
}

impl FormDecode for StepQuery {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("StepQuery").value("step", |q| &mut q.step)
    }
}

fn step_of(query: Option<&str>) -> i64 {
    match decode_query::<StepQuery>(query.unwrap_or_default()) {
        Ok(StepQuery { step: Some(step) }) if step > 0 => step,
        Ok(_) => default_step(),
        Err(error) => {
            warn!(%error, "ignoring invalid counter query");
            default_step()
        }
    }
}

pub fn counter_page(templates: &TemplateSet, max_memory: u64) -> Page<Counter> {
    Page::builder()
        .view(screen(templates, "counter.jinja"))
        .on_request(|parts, model: Counter| Counter {
            step: step_of(parts.uri.query()),
            ..model
        })
        .case(Case::new("increment", |m: Counter, _: Increment| Counter {
            count: m.count.saturating_add(m.step),
            ..m
        }))
        .case(Case::new("decrement", |m: Counter, _: Decrement| Counter {
            count: m.count.saturating_sub(m.step),
            ..m
        }))
        .case(Case::try_new("add", |m: Counter, msg: Add| {
            let count = m
                .count
                .checked_add(msg.amount)
                .context("counter overflow")?;
            Ok::<_, anyhow::Error>(Counter { count, ..m })
        }))
        .case(Case::new("finish", |m: Counter, _: Finish| {
            let target = format!("/done?count={}", m.count);
            Transition::redirect(m, Redirect::forward(target))
        }))
        .max_memory(max_memory)
        .build()
}

// upload

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
    #[serde(rename = "Size")]
    pub size: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UploadAvatar {
    pub title: String,
    #[serde(skip)]
    pub avatar: Vec<u8>,
    #[serde(skip)]
    pub form: Option<MultipartForm>,
}

impl FormDecode for UploadAvatar {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("UploadAvatar")
            .value("Title", |u| &mut u.title)
            .file("Avatar", |u| &mut u.avatar)
            .raw_form(|u| &mut u.form)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClearAvatar {}

impl FormDecode for ClearAvatar {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("ClearAvatar")
    }
}

pub fn upload_page(templates: &TemplateSet, max_memory: u64) -> Page<Profile> {
    Page::builder()
        .view(screen(templates, "upload.jinja"))
        .case(Case::new("upload", |_: Profile, msg: UploadAvatar| {
            let part = msg
                .form
                .as_ref()
                .and_then(|form| form.files.get("Avatar"))
                .and_then(|parts| parts.first());
            Profile {
                title: msg.title,
                file_name: part
                    .and_then(|part| part.file_name.clone())
                    .unwrap_or_default(),
                content_type: part
                    .and_then(|part| part.content_type.clone())
                    .unwrap_or_default(),
                size: msg.avatar.len(),
            }
        }))
        .case(Case::new("clear", |_: Profile, _: ClearAvatar| {
            Profile::default()
        }))
        .max_memory(max_memory)
        .build()
}

// done

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Done {
    #[serde(rename = "Count")]
    pub count: i64,
}

#[derive(Debug, Default)]
struct DoneQuery {
    count: i64,
}

impl FormDecode for DoneQuery {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("DoneQuery").value("count", |q| &mut q.count)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Restart {}

impl FormDecode for Restart {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Restart")
    }
}

pub fn done_page(templates: &TemplateSet, max_memory: u64) -> Page<Done> {
    Page::builder()
        .view(screen(templates, "done.jinja"))
        .on_request(|parts, model: Done| {
            match decode_query::<DoneQuery>(parts.uri.query().unwrap_or_default()) {
                Ok(query) => Done { count: query.count },
                Err(error) => {
                    warn!(%error, "ignoring invalid done query");
                    model
                }
            }
        })
        .case(Case::new("restart", |m: Done, _: Restart| {
            Transition::redirect(m, Redirect::see_other("/"))
        }))
        .max_memory(max_memory)
        .build()
}

// about

#[derive(Debug, Clone, Serialize)]
pub struct About {
    pub name: &'static str,
    pub version: &'static str,
}

pub fn about_route(templates: &TemplateSet) -> MethodRouter {
    screen(templates, "about.jinja").fixed(About {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
