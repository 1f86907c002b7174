//! Predicate Normalizer
//!
//! Canonicalizes raw predicate input: operator mixing is rejected and every
//! key is rewritten to camelCase. Nothing else about the tree changes.

use serde_json::{Map, Value};

use crate::predicates::{Operator, PredicateError};

/// Validate and canonicalize a raw predicate tree.
///
/// Arrays are cleaned element by element, objects key by key, and scalars are
/// returned unchanged. `index` is carried into the error so bulk callers can
/// point at the offending rule.
///
/// # Errors
///
/// Returns [`PredicateError::MixedOperators`] when any object, at any depth,
/// holds an `AND`/`OR` key alongside another key, and
/// [`PredicateError::DuplicateField`] when two keys of one object share a
/// camelCase name.
pub fn clean_predicate(predicate: &Value, index: Option<usize>) -> Result<Value, PredicateError> {
    match predicate {
        Value::Array(items) => items
            .iter()
            .map(|item| clean_predicate(item, index))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => clean_object(map, index).map(Value::Object),
        scalar => Ok(scalar.clone()),
    }
}

fn clean_object(
    map: &Map<String, Value>,
    index: Option<usize>,
) -> Result<Map<String, Value>, PredicateError> {
    let has_operator = map.keys().any(|key| Operator::from_key(key).is_some());

    if has_operator && map.len() > 1 {
        return Err(PredicateError::MixedOperators { index });
    }

    let mut cleaned = Map::with_capacity(map.len());

    for (key, value) in map {
        let key = to_camel_case(key);

        if cleaned.contains_key(&key) {
            return Err(PredicateError::DuplicateField { key, index });
        }

        let value = clean_predicate(value, index)?;
        cleaned.insert(key, value);
    }

    Ok(cleaned)
}

/// Convert a `snake_case` key to `camelCase`.
///
/// The first component is kept verbatim; later components are capitalised
/// with the remainder lowercased. Empty components are dropped, so the output
/// never contains `_` and converting it again is a no-op.
pub fn to_camel_case(key: &str) -> String {
    let mut components = key.split('_');
    let mut camel = String::with_capacity(key.len());

    if let Some(head) = components.next() {
        camel.push_str(head);
    }

    for component in components {
        let mut chars = component.chars();

        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(&chars.as_str().to_lowercase());
        }
    }

    camel
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn converts_snake_case_keys() -> TestResult {
        let predicate = json!({
            "OR": [
                {"variant_predicate": {"ids": ["V1"]}},
                {"product_predicate": {"ids": ["P1"]}}
            ]
        });

        let cleaned = clean_predicate(&predicate, None)?;

        assert_eq!(
            cleaned,
            json!({
                "OR": [
                    {"variantPredicate": {"ids": ["V1"]}},
                    {"productPredicate": {"ids": ["P1"]}}
                ]
            })
        );

        Ok(())
    }

    #[test]
    fn rejects_two_operators_on_one_level() {
        let predicate = json!({
            "AND": [{"productPredicate": {"ids": ["P1"]}}],
            "OR": [{"productPredicate": {"ids": ["P1"]}}]
        });

        assert_eq!(
            clean_predicate(&predicate, None),
            Err(PredicateError::MixedOperators { index: None })
        );
    }

    #[test]
    fn rejects_operator_mixed_with_filter_deep_in_tree() {
        let predicate = json!({
            "AND": [
                {"OR": [
                    {"categoryPredicate": {"ids": ["C1"]}},
                    {
                        "AND": [{"productPredicate": {"ids": ["P1"]}}],
                        "variant_predicate": {"ids": ["V1"]}
                    }
                ]}
            ]
        });

        assert_eq!(
            clean_predicate(&predicate, Some(3)),
            Err(PredicateError::MixedOperators { index: Some(3) })
        );
    }

    #[test]
    fn rejects_keys_colliding_after_camel_casing() {
        let predicate = json!({
            "OR": [{
                "product_predicate": {"ids": ["P1"]},
                "productPredicate": {"ids": ["P2"]}
            }]
        });

        assert_eq!(
            clean_predicate(&predicate, Some(0)),
            Err(PredicateError::DuplicateField {
                key: "productPredicate".to_string(),
                index: Some(0),
            })
        );
    }

    #[test]
    fn operator_keys_are_only_recognised_in_upper_case() -> TestResult {
        let predicate = json!({"and": [], "product_predicate": {"ids": []}});

        let cleaned = clean_predicate(&predicate, None)?;

        assert_eq!(cleaned, json!({"and": [], "productPredicate": {"ids": []}}));

        Ok(())
    }

    #[test]
    fn scalars_pass_through_untouched() -> TestResult {
        assert_eq!(clean_predicate(&json!(42), None)?, json!(42));
        assert_eq!(
            clean_predicate(&json!([1, "two", {"some_key": null}]), None)?,
            json!([1, "two", {"someKey": null}])
        );

        Ok(())
    }

    #[test]
    fn cleaning_is_idempotent() -> TestResult {
        let inputs = [
            json!({"OR": [{"variant_predicate": {"ids": ["V1"]}}]}),
            json!({"AND": [{"OR": [{"category_predicate": {"ids": ["C1", "C2"]}}]}]}),
            json!({"product_predicate": {"ids": ["P1"]}, "collection__predicate_": {"ids": []}}),
            json!([{"base_price": {"range": {"gte": 10}}}]),
            json!({}),
        ];

        for input in inputs {
            let once = clean_predicate(&input, None)?;
            let twice = clean_predicate(&once, None)?;

            assert_eq!(once, twice, "cleaning {input} twice changed the result");
        }

        Ok(())
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("product_predicate"), "productPredicate");
        assert_eq!(to_camel_case("productPredicate"), "productPredicate");
        assert_eq!(to_camel_case("base_PRICE"), "basePrice");
        assert_eq!(to_camel_case("a__b"), "aB");
        assert_eq!(to_camel_case("AND"), "AND");
        assert_eq!(to_camel_case("ids"), "ids");
    }
}
