use super::*;
use crate::multipart::FilePart;

#[derive(Debug, Default)]
struct Signup {
    name: String,
    age: u8,
    newsletter: bool,
    tags: Vec<String>,
    avatar: Vec<u8>,
    form: Option<MultipartForm>,
}

impl FormDecode for Signup {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Signup")
            .value("Name", |s| &mut s.name)
            .value("Age", |s| &mut s.age)
            .value("Newsletter", |s| &mut s.newsletter)
            .value("Tags", |s| &mut s.tags)
            .file("Avatar", |s| &mut s.avatar)
            .raw_form(|s| &mut s.form)
    }
}

fn file(data: &'static [u8]) -> FilePart {
    FilePart {
        file_name: Some("avatar.png".into()),
        content_type: Some("image/png".into()),
        data: Bytes::from_static(data),
    }
}

#[test]
fn binds_values_and_skips_reserved_keys() {
    let form = MultipartForm::new()
        .with_value("_state", "{\"Count\":1}")
        .with_value("_eventType", "signup")
        .with_value("Name", "ada")
        .with_value("Age", "36")
        .with_value("Newsletter", "on")
        .with_value("Tags", "math")
        .with_value("Tags", "engines");

    let signup: Signup = decode(&form).expect("decode");
    assert_eq!(signup.name, "ada");
    assert_eq!(signup.age, 36);
    assert!(signup.newsletter);
    assert_eq!(signup.tags, vec!["math", "engines"]);
    assert!(signup.avatar.is_empty());
}

#[test]
fn unknown_key_names_type_and_key() {
    let form = MultipartForm::new()
        .with_value("Name", "ada")
        .with_value("Nickname", "countess");

    let err = decode::<Signup>(&form).expect_err("unknown key");
    assert_eq!(
        err,
        FormError::UnknownField {
            type_name: "Signup",
            key: "Nickname".into(),
        }
    );
    assert!(err.to_string().contains("Signup"));
    assert!(err.to_string().contains("Nickname"));
}

#[test]
fn conversion_error_names_field() {
    let form = MultipartForm::new().with_value("Age", "old");
    let err = decode::<Signup>(&form).expect_err("bad age");
    match err {
        FormError::Value {
            type_name,
            field,
            values,
            source,
        } => {
            assert_eq!(type_name, "Signup");
            assert_eq!(field, "Age");
            assert_eq!(values, vec!["old".to_string()]);
            assert_eq!(source, ValueError::conversion("old", "u8"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn file_field_cardinality() {
    let mut form = MultipartForm::new();
    form.files.insert("Avatar".into(), Vec::new());
    let none: Signup = decode(&form).expect("zero files");
    assert!(none.avatar.is_empty());

    let one: Signup = decode(&MultipartForm::new().with_file("Avatar", file(b"png")))
        .expect("one file");
    assert_eq!(one.avatar, b"png");

    let two = MultipartForm::new()
        .with_file("Avatar", file(b"a"))
        .with_file("Avatar", file(b"b"));
    assert_eq!(
        decode::<Signup>(&two).expect_err("two files"),
        FormError::MultipleFiles {
            type_name: "Signup",
            field: "Avatar".into(),
            count: 2,
        }
    );
}

#[test]
fn unknown_file_key_is_rejected() {
    let form = MultipartForm::new().with_file("Resume", file(b"pdf"));
    assert!(matches!(
        decode::<Signup>(&form),
        Err(FormError::UnknownFileField { ref key, .. }) if key == "Resume"
    ));
}

#[test]
fn raw_form_is_bound_as_is() {
    let form = MultipartForm::new()
        .with_value("Name", "ada")
        .with_file("Avatar", file(b"png"));
    let signup: Signup = decode(&form).expect("decode");
    let raw = signup.form.expect("raw form bound");
    assert_eq!(raw, form);
    assert_eq!(raw.files["Avatar"][0].file_name.as_deref(), Some("avatar.png"));
}

#[test]
fn schema_describes_its_fields() {
    let schema = Signup::schema();
    assert_eq!(schema.type_name(), "Signup");
    assert_eq!(schema.kind_of("Age"), Some(FieldKind::Value));
    assert_eq!(schema.kind_of("Avatar"), Some(FieldKind::File));
    assert_eq!(schema.kind_of("_state"), None);
    assert_eq!(schema.field_names().count(), 5);
}

#[test]
#[should_panic(expected = "binds form field 'Name' twice")]
fn duplicate_binding_panics_at_setup() {
    let _ = Schema::<Signup>::new("Signup")
        .value("Name", |s| &mut s.name)
        .value("Name", |s| &mut s.tags);
}

#[test]
fn unit_type_accepts_only_reserved_keys() {
    let form = MultipartForm::new().with_value("_eventType", "noop");
    decode::<()>(&form).expect("reserved keys only");
    assert!(decode::<()>(&form.with_value("x", "1")).is_err());
}
