pub mod assets;
pub mod case;
pub mod error;
mod multipart;
pub mod page;
pub mod template;
pub mod view;

pub use assets::{Asset, AssetStore};
pub use case::{Case, CaseError, EventDecodeError, MsgHandler, Transition};
pub use error::{DispatchError, TemplateError};
pub use page::{Model, Page, PageBuilder, DEFAULT_MAX_MEMORY};
pub use template::{DirSource, MemorySource, TemplateFile, TemplateSet, TemplateSource};
pub use view::View;

pub use form::{FormDecode, MultipartForm, Schema};
pub use protocol::domain::{NavDir, Redirect};
