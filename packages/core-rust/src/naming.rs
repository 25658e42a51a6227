//! Identifier case conversion, event-name derivation and service type name
//! normalization.
//!
//! All transforms are pure. Empty input is a contract violation at the call
//! site and is reported as [`NamingError::EmptyInput`].

/// Namespace prefixed onto bare service type names.
pub const DEFAULT_SERVICE_NAMESPACE: &str = "org.myrobotlab.service";

const PUBLISH_PREFIX: &str = "publish";
const GET_PREFIX: &str = "get";
const CALLBACK_PREFIX: &str = "on";

/// Errors from naming transforms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("naming transform given empty input")]
    EmptyInput,
}

/// Case applied to every character by [`to_under_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Lower,
    Upper,
    Preserve,
}

fn non_empty(s: &str) -> Result<&str, NamingError> {
    if s.is_empty() {
        Err(NamingError::EmptyInput)
    } else {
        Ok(s)
    }
}

/// Upper-cases the first character and leaves the rest unchanged.
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `s` is empty.
pub fn capitalize(s: &str) -> Result<String, NamingError> {
    let mut chars = non_empty(s)?.chars();
    let mut out = String::with_capacity(s.len());
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
    }
    out.push_str(chars.as_str());
    Ok(out)
}

/// Derives the callback name a subscriber uses for a published method:
/// `publishFoo` and `getFoo` become `onFoo`, anything else `onName`.
///
/// A name that already starts with `on` gets a second prefix (`onFoo` ->
/// `onOnFoo`). A bare `publish` or `get` with nothing after the prefix is
/// treated like any other name (`onPublish`).
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `method_name` is empty.
pub fn callback_topic_name(method_name: &str) -> Result<String, NamingError> {
    let name = non_empty(method_name)?;
    let stem = name
        .strip_prefix(PUBLISH_PREFIX)
        .or_else(|| name.strip_prefix(GET_PREFIX))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name);
    Ok(format!("{CALLBACK_PREFIX}{}", capitalize(stem)?))
}

/// Converts `snake_case` to `camelCase`: each `_`-separated segment is
/// capitalized, the segments are joined, and the first character of the
/// result is lower-cased. Empty segments (doubled or trailing `_`) are dropped.
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `s` is empty.
pub fn to_camel_case(s: &str) -> Result<String, NamingError> {
    let mut joined = String::with_capacity(s.len());
    for segment in non_empty(s)?.split('_').filter(|seg| !seg.is_empty()) {
        joined.push_str(&capitalize(segment)?);
    }

    let mut chars = joined.chars();
    let mut out = String::with_capacity(joined.len());
    if let Some(first) = chars.next() {
        out.extend(first.to_lowercase());
    }
    out.push_str(chars.as_str());
    Ok(out)
}

/// Converts `camelCase` to `snake_case` style: an underscore goes before every
/// upper-case character that immediately follows a lower-case one, then each
/// character is re-cased according to `mode`. Digits and `_` are not
/// lower-case, so `servo1Name` becomes `servo1name`.
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `s` is empty.
pub fn to_under_score(s: &str, mode: CaseMode) -> Result<String, NamingError> {
    let s = non_empty(s)?;
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if prev_lower && c.is_uppercase() {
            out.push('_');
        }
        match mode {
            CaseMode::Lower => out.extend(c.to_lowercase()),
            CaseMode::Upper => out.extend(c.to_uppercase()),
            CaseMode::Preserve => out.push(c),
        }
        prev_lower = c.is_lowercase();
    }
    Ok(out)
}

/// Prefixes `namespace` onto a bare type name. Names that already contain a
/// `.` are returned unchanged.
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `type_name` is empty.
pub fn qualify_type_name(type_name: &str, namespace: &str) -> Result<String, NamingError> {
    let name = non_empty(type_name)?;
    if name.contains('.') || namespace.is_empty() {
        Ok(name.to_string())
    } else {
        Ok(format!("{namespace}.{name}"))
    }
}

/// [`qualify_type_name`] with [`DEFAULT_SERVICE_NAMESPACE`].
///
/// # Errors
///
/// Returns [`NamingError::EmptyInput`] if `type_name` is empty.
pub fn full_type_name(type_name: &str) -> Result<String, NamingError> {
    qualify_type_name(type_name, DEFAULT_SERVICE_NAMESPACE)
}

/// Last `.`-separated component of a type name.
#[must_use]
pub fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    // ---- capitalize ----

    #[test]
    fn capitalize_first_char_only() {
        assert_eq!(capitalize("servo").unwrap(), "Servo");
        assert_eq!(capitalize("moveTo").unwrap(), "MoveTo");
        assert_eq!(capitalize("X").unwrap(), "X");
        assert_eq!(capitalize("éclair").unwrap(), "Éclair");
    }

    #[test]
    fn empty_input_rejected_everywhere() {
        assert_eq!(capitalize(""), Err(NamingError::EmptyInput));
        assert_eq!(callback_topic_name(""), Err(NamingError::EmptyInput));
        assert_eq!(to_camel_case(""), Err(NamingError::EmptyInput));
        assert_eq!(to_under_score("", CaseMode::Lower), Err(NamingError::EmptyInput));
        assert_eq!(full_type_name(""), Err(NamingError::EmptyInput));
    }

    // ---- callback_topic_name ----

    #[test]
    fn callback_from_publish_and_get() {
        assert_eq!(callback_topic_name("publishFoo").unwrap(), "onFoo");
        assert_eq!(callback_topic_name("getBar").unwrap(), "onBar");
        assert_eq!(callback_topic_name("baz").unwrap(), "onBaz");
    }

    #[test]
    fn callback_lowercase_remainder_is_capitalized() {
        assert_eq!(callback_topic_name("publishstate").unwrap(), "onState");
    }

    #[test]
    fn callback_doubles_existing_on_prefix() {
        assert_eq!(callback_topic_name("onFoo").unwrap(), "onOnFoo");
    }

    #[test]
    fn callback_bare_prefix_kept_whole() {
        assert_eq!(callback_topic_name("publish").unwrap(), "onPublish");
        assert_eq!(callback_topic_name("get").unwrap(), "onGet");
    }

    // ---- case conversion ----

    #[test]
    fn camel_case_from_snake() {
        assert_eq!(to_camel_case("foo_bar").unwrap(), "fooBar");
        assert_eq!(to_camel_case("servo_controller_name").unwrap(), "servoControllerName");
        assert_eq!(to_camel_case("Foo").unwrap(), "foo");
        assert_eq!(to_camel_case("foo__bar_").unwrap(), "fooBar");
    }

    #[test]
    fn under_score_lower() {
        assert_eq!(to_under_score("fooBar", CaseMode::Lower).unwrap(), "foo_bar");
        assert_eq!(
            to_under_score("servoControllerName", CaseMode::Lower).unwrap(),
            "servo_controller_name"
        );
    }

    #[test]
    fn under_score_upper_and_preserve() {
        assert_eq!(to_under_score("fooBar", CaseMode::Upper).unwrap(), "FOO_BAR");
        assert_eq!(to_under_score("fooBar", CaseMode::Preserve).unwrap(), "foo_Bar");
    }

    #[test]
    fn under_score_consecutive_capitals_split_once() {
        assert_eq!(to_under_score("getURL", CaseMode::Lower).unwrap(), "get_url");
        assert_eq!(to_under_score("URLName", CaseMode::Preserve).unwrap(), "URLName");
    }

    #[test]
    fn under_score_only_splits_after_lower_case_letters() {
        assert_eq!(to_under_score("servo1Name", CaseMode::Lower).unwrap(), "servo1name");
        assert_eq!(to_under_score("foo_Bar", CaseMode::Lower).unwrap(), "foo_bar");
        assert_eq!(to_under_score("x9Y", CaseMode::Preserve).unwrap(), "x9Y");
    }

    // ---- type names ----

    #[test]
    fn bare_type_gets_default_namespace() {
        assert_eq!(full_type_name("Servo").unwrap(), "org.myrobotlab.service.Servo");
        assert_eq!(
            full_type_name("com.example.Arm").unwrap(),
            "com.example.Arm"
        );
        assert_eq!(qualify_type_name("Arm", "com.example").unwrap(), "com.example.Arm");
    }

    #[test]
    fn simple_name_strips_namespace() {
        assert_eq!(simple_name("org.myrobotlab.service.Servo"), "Servo");
        assert_eq!(simple_name("Servo"), "Servo");
    }

    // ---- properties ----

    proptest! {
        #[test]
        fn snake_to_camel_and_back(segments in prop::collection::vec("[a-z]{2,8}", 1..5)) {
            let snake = segments.join("_");
            let camel = to_camel_case(&snake).unwrap();
            prop_assert!(!camel.contains('_'));
            prop_assert_eq!(to_under_score(&camel, CaseMode::Lower).unwrap(), snake);
        }

        #[test]
        fn under_score_preserve_only_adds_separators(s in "[a-zA-Z]{1,24}") {
            let out = to_under_score(&s, CaseMode::Preserve).unwrap();
            prop_assert_eq!(out.replace('_', ""), s);
        }
    }
}
