use std::collections::BTreeMap;

use bytes::Bytes;
use protocol::protocol::is_reserved_key;
use tracing::trace;

use crate::{
    error::{FormError, ValueError},
    multipart::MultipartForm,
    value::FieldValue,
};

type ValueSetter<T> = Box<dyn Fn(&mut T, &[String]) -> Result<(), ValueError> + Send + Sync>;
type FileSetter<T> = Box<dyn Fn(&mut T, Bytes) + Send + Sync>;
type FormSetter<T> = Box<dyn Fn(&mut T, &MultipartForm) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Value,
    File,
}

/// A type that can be decoded from a form.
pub trait FormDecode: Default + Sized + 'static {
    fn schema() -> Schema<Self>;
}

impl FormDecode for () {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("()")
    }
}

pub fn decode<T: FormDecode>(form: &MultipartForm) -> Result<T, FormError> {
    let mut dst = T::default();
    T::schema().decode_form(&mut dst, form)?;
    Ok(dst)
}

pub struct Schema<T> {
    type_name: &'static str,
    values: BTreeMap<&'static str, ValueSetter<T>>,
    files: BTreeMap<&'static str, FileSetter<T>>,
    raw_form: Option<FormSetter<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            values: BTreeMap::new(),
            files: BTreeMap::new(),
            raw_form: None,
        }
    }

    /// Binds form key `name` to a scalar, sequence or optional field.
    /// Panics when `name` is already bound.
    pub fn value<F>(mut self, name: &'static str, field: fn(&mut T) -> &mut F) -> Self
    where
        F: FieldValue + 'static,
    {
        self.assert_unbound(name);
        self.values.insert(
            name,
            Box::new(move |dst: &mut T, values: &[String]| field(dst).decode_values(values)),
        );
        self
    }

    /// Binds the single uploaded file of form key `name` to a byte field.
    /// Panics when `name` is already bound.
    pub fn file(mut self, name: &'static str, field: fn(&mut T) -> &mut Vec<u8>) -> Self {
        self.assert_unbound(name);
        self.files.insert(
            name,
            Box::new(move |dst: &mut T, data: Bytes| *field(dst) = data.to_vec()),
        );
        self
    }

    /// Binds a copy of the whole parsed form, for access to file names,
    /// content types and other multipart details.
    pub fn raw_form(mut self, field: fn(&mut T) -> &mut Option<MultipartForm>) -> Self {
        assert!(
            self.raw_form.is_none(),
            "{} binds the raw form twice",
            self.type_name
        );
        self.raw_form = Some(Box::new(move |dst: &mut T, form: &MultipartForm| {
            *field(dst) = Some(form.clone());
        }));
        self
    }

    fn assert_unbound(&self, name: &str) {
        assert!(
            !self.values.contains_key(name) && !self.files.contains_key(name),
            "{} binds form field '{name}' twice",
            self.type_name
        );
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if self.values.contains_key(name) {
            Some(FieldKind::Value)
        } else if self.files.contains_key(name) {
            Some(FieldKind::File)
        } else {
            None
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().chain(self.files.keys()).copied()
    }

    /// Binds the text values of `form`, skipping reserved keys, then its
    /// files. Fails on the first key without a matching field.
    pub fn decode_form(&self, dst: &mut T, form: &MultipartForm) -> Result<(), FormError> {
        if let Some(bind) = &self.raw_form {
            bind(dst, form);
        }

        for (key, values) in &form.values {
            if is_reserved_key(key) {
                trace!(key = %key, "skipping reserved form key");
                continue;
            }
            self.bind_value(dst, key, values)?;
        }

        for (key, parts) in &form.files {
            let bind = self
                .files
                .get(key.as_str())
                .ok_or_else(|| FormError::UnknownFileField {
                    type_name: self.type_name,
                    key: key.clone(),
                })?;

            match parts.as_slice() {
                [] => {}
                [part] => bind(dst, part.data.clone()),
                _ => {
                    return Err(FormError::MultipleFiles {
                        type_name: self.type_name,
                        field: key.clone(),
                        count: parts.len(),
                    })
                }
            }
        }

        Ok(())
    }

    /// Binds key/values pairs without reserved-key filtering.
    pub fn decode_values<'a, I>(&self, dst: &mut T, pairs: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    {
        for (key, values) in pairs {
            self.bind_value(dst, key, values)?;
        }
        Ok(())
    }

    fn bind_value(&self, dst: &mut T, key: &str, values: &[String]) -> Result<(), FormError> {
        let bind = self
            .values
            .get(key)
            .ok_or_else(|| FormError::UnknownField {
                type_name: self.type_name,
                key: key.to_string(),
            })?;

        bind(dst, values).map_err(|source| FormError::Value {
            type_name: self.type_name,
            field: key.to_string(),
            values: values.to_vec(),
            source,
        })
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .field("raw_form", &self.raw_form.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/schema_tests.rs"]
mod tests;
