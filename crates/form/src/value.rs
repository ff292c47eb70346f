use crate::error::ValueError;

/// Text accepted as `true` by boolean fields.
pub const TRUE_WORDS: [&str; 3] = ["true", "on", "1"];
/// Text accepted as `false` by boolean fields.
pub const FALSE_WORDS: [&str; 3] = ["false", "off", "0"];

/// A single value parsed from one piece of text.
pub trait Scalar: Sized {
    /// Name of the destination kind reported in conversion errors.
    const EXPECTED: &'static str;

    fn parse_scalar(raw: &str) -> Result<Self, ValueError>;
}

/// A destination field that can be filled from the values of one form key.
pub trait FieldValue {
    fn decode_values(&mut self, values: &[String]) -> Result<(), ValueError>;
}

/// Writes `values` into `dst`. On error `dst` is left untouched.
pub fn decode<F: FieldValue + ?Sized>(dst: &mut F, values: &[String]) -> Result<(), ValueError> {
    dst.decode_values(values)
}

pub fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    if TRUE_WORDS.contains(&raw) {
        Ok(true)
    } else if FALSE_WORDS.contains(&raw) {
        Ok(false)
    } else {
        Err(ValueError::conversion(raw, bool::EXPECTED))
    }
}

fn last(values: &[String]) -> Result<&str, ValueError> {
    values.last().map(String::as_str).ok_or(ValueError::Missing)
}

macro_rules! scalar_field {
    ($($ty:ty => $parse:expr),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn parse_scalar(raw: &str) -> Result<Self, ValueError> {
                    let parse: fn(&str) -> Result<$ty, ValueError> = $parse;
                    parse(raw)
                }
            }

            impl FieldValue for $ty {
                fn decode_values(&mut self, values: &[String]) -> Result<(), ValueError> {
                    *self = <$ty as Scalar>::parse_scalar(last(values)?)?;
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! numeric_field {
    ($($ty:ty),* $(,)?) => {
        scalar_field! {
            $($ty => |raw| raw
                .parse::<$ty>()
                .map_err(|_| ValueError::conversion(raw, stringify!($ty)))),*
        }
    };
}

scalar_field! {
    String => |raw| Ok(raw.to_string()),
    bool => parse_bool,
}

numeric_field!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<T: Scalar> FieldValue for Vec<T> {
    fn decode_values(&mut self, values: &[String]) -> Result<(), ValueError> {
        let parsed = values
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                T::parse_scalar(raw).map_err(|source| ValueError::Element {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        *self = parsed;
        Ok(())
    }
}

/// An empty last value clears the field.
impl<T: Scalar> FieldValue for Option<T> {
    fn decode_values(&mut self, values: &[String]) -> Result<(), ValueError> {
        let raw = last(values)?;
        *self = if raw.is_empty() {
            None
        } else {
            Some(T::parse_scalar(raw)?)
        };
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/value_tests.rs"]
mod tests;
