use std::collections::BTreeMap;

use crate::{error::FormError, schema::FormDecode};

/// Decodes an `application/x-www-form-urlencoded` string (a URL query or a
/// urlencoded body) into a fresh `T`. Every key must be a value field of `T`;
/// reserved keys are not skipped.
pub fn decode_query<T: FormDecode>(query: &str) -> Result<T, FormError> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        grouped
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    let mut dst = T::default();
    T::schema().decode_values(&mut dst, &grouped)?;
    Ok(dst)
}
