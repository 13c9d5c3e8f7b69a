//! Call arguments and their partition into template, body and query parts.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::template::Template;

/// Named call arguments. Keys are sorted, which keeps query strings and
/// recorded requests deterministic.
pub type Args = BTreeMap<String, Value>;

/// Reserved argument sent as the raw or form-encoded request body.
pub const DATA: &str = "data";

/// Reserved argument sent as a JSON-encoded request body.
pub const PAYLOAD: &str = "payload";

/// Build `Args` from `name => value` pairs. Values go through
/// `serde_json::Value::from`, so pass `json!(..)` for nested structures.
///
/// ```
/// use devourer_core::args;
///
/// let args = args! { "id" => 5, "title" => "hello" };
/// assert_eq!(args["id"], 5);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $(
            args.insert(
                ::std::string::String::from($key),
                $crate::__private::serde_json::Value::from($value),
            );
        )+
        args
    }};
}

/// Arguments of one call split by role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub placeholders: Args,
    pub data: Option<Value>,
    pub payload: Option<Value>,
    pub params: Args,
}

/// Split `args` against `template`.
///
/// Placeholder names are claimed first, then the reserved `data` and
/// `payload` names; whatever is left becomes query parameters. Missing
/// placeholders are not detected here, `Template::render` reports them.
pub fn partition(template: &Template, args: Args) -> Partition {
    let mut partition = Partition::default();
    for (name, value) in args {
        if template.has_placeholder(&name) {
            partition.placeholders.insert(name, value);
        } else if name == DATA {
            partition.data = Some(value);
        } else if name == PAYLOAD {
            partition.payload = Some(value);
        } else {
            partition.params.insert(name, value);
        }
    }
    partition
}

/// Text form of an argument value in a URL: strings verbatim, everything
/// else as its JSON text.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten named values into wire pairs for a query string or form body.
///
/// `null` drops the key. An array repeats the key once per element, skipping
/// `null` elements. Everything else is one pair rendered by `render_value`.
pub fn encode_pairs<'a, I>(entries: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut pairs = Vec::new();
    for (name, value) in entries {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| (name.clone(), render_value(item))),
            ),
            other => pairs.push((name.clone(), render_value(other))),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn splits_into_disjoint_groups() {
        let template = Template::parse("posts/{id}/").unwrap();
        let args = args! {
            "id" => 5,
            "data" => "raw",
            "payload" => json!({ "title": "t" }),
            "foo" => 1,
        };

        let partition = partition(&template, args);
        assert_eq!(partition.placeholders, args! { "id" => 5 });
        assert_eq!(partition.data, Some(json!("raw")));
        assert_eq!(partition.payload, Some(json!({ "title": "t" })));
        assert_eq!(partition.params, args! { "foo" => 1 });
    }

    #[test]
    fn passthrough_keeps_value_type() {
        let template = Template::parse("posts/").unwrap();
        let partition = partition(&template, args! { "foo" => 1, "flag" => true });
        assert_eq!(partition.params["foo"], json!(1));
        assert_eq!(partition.params["flag"], json!(true));
        assert!(partition.placeholders.is_empty());
    }

    #[test]
    fn empty_args_give_empty_partition() {
        let template = Template::parse("posts/{id}").unwrap();
        assert_eq!(partition(&template, args! {}), Partition::default());
    }

    #[test]
    fn render_value_strips_string_quotes_only() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(5)), "5");
        assert_eq!(render_value(&json!(1.5)), "1.5");
        assert_eq!(render_value(&json!(false)), "false");
        assert_eq!(render_value(&Value::Null), "null");
        assert_eq!(render_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn encode_pairs_drops_nulls_and_repeats_arrays() {
        let args = args! {
            "gone" => Value::Null,
            "id" => json!([1, null, "x"]),
            "q" => "a b",
            "empty" => json!([]),
        };
        let pairs = encode_pairs(&args);
        let expected: Vec<(String, String)> = [("id", "1"), ("id", "x"), ("q", "a b")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(pairs, expected);
    }
}
