pub mod error;
pub mod multipart;
pub mod query;
pub mod schema;
pub mod value;

pub use error::{FormError, ValueError};
pub use multipart::{FilePart, MultipartForm};
pub use schema::{decode, FormDecode, Schema};
pub use value::FieldValue;
