//! Decoding and validation of the provider's answer text.
//!
//! The answer must be the JSON envelope requested by the prompt:
//! `{"items":[{"category","rank","topic","summary","sources"}]}`. Missing or null
//! fields decode to their empty value so validation, not decoding, decides
//! which items survive.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use ota_core::ContextItem;

use crate::error::MalformedResponse;
use crate::ids::IdGenerator;

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Option<Vec<Option<RawContextItem>>>,
}

/// One item exactly as the provider sent it.
///
/// `null` decodes like a missing field, so a single sloppy item is dropped by
/// validation instead of failing the whole answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawContextItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "non_null_sources")]
    pub sources: Option<Vec<String>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// `null` entries inside `sources` carry no URL and are skipped.
fn non_null_sources<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let sources = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(sources.map(|list| list.into_iter().flatten().collect()))
}

impl RawContextItem {
    /// `category`, `topic` and `summary` must all be non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.category.is_empty() && !self.topic.is_empty() && !self.summary.is_empty()
    }
}

/// Decodes `output_text` into raw items.
///
/// # Errors
///
/// Returns [`MalformedResponse::InvalidJson`] if the text is not the expected
/// envelope, or [`MalformedResponse::EmptyItems`] if `items` is missing or
/// empty. A `null` element of `items` decodes as an all-empty item.
pub fn decode_items(output_text: &str) -> Result<Vec<RawContextItem>, MalformedResponse> {
    let envelope: ItemsEnvelope =
        serde_json::from_str(output_text).map_err(MalformedResponse::InvalidJson)?;

    match envelope.items {
        Some(items) if !items.is_empty() => {
            Ok(items.into_iter().map(Option::unwrap_or_default).collect())
        }
        _ => Err(MalformedResponse::EmptyItems),
    }
}

/// Drops invalid items, keeping the provider's order.
#[must_use]
pub fn retain_valid(items: Vec<RawContextItem>) -> Vec<RawContextItem> {
    items.into_iter().filter(RawContextItem::is_valid).collect()
}

/// Assigns ids and the owning run to validated items.
pub fn into_context_items(
    items: Vec<RawContextItem>,
    run_id: Uuid,
    ids: &dyn IdGenerator,
) -> Vec<ContextItem> {
    items
        .into_iter()
        .map(|raw| ContextItem {
            id: ids.next_id(),
            collection_run_id: run_id,
            category: raw.category,
            rank: raw.rank,
            topic: raw.topic,
            summary: raw.summary,
            sources: raw.sources.unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    const THREE_ITEMS: &str = r#"{"items":[
        {"category":"top","rank":1,"topic":"A","summary":"a","sources":["http://x"]},
        {"category":"top","rank":2,"topic":"","summary":"b","sources":[]},
        {"category":"sports","rank":1,"topic":"C","summary":"c"}
    ]}"#;

    #[test]
    fn decode_rejects_non_json() {
        let err = decode_items("not json at all").unwrap_err();
        assert!(matches!(err, MalformedResponse::InvalidJson(_)), "got: {err:?}");
    }

    #[test]
    fn decode_rejects_json_of_wrong_shape() {
        let err = decode_items("[1,2,3]").unwrap_err();
        assert!(matches!(err, MalformedResponse::InvalidJson(_)), "got: {err:?}");
    }

    #[test]
    fn decode_rejects_empty_items() {
        let err = decode_items(r#"{"items":[]}"#).unwrap_err();
        assert!(matches!(err, MalformedResponse::EmptyItems), "got: {err:?}");
    }

    #[test]
    fn decode_rejects_missing_or_null_items() {
        assert!(matches!(decode_items("{}"), Err(MalformedResponse::EmptyItems)));
        assert!(matches!(
            decode_items(r#"{"items":null}"#),
            Err(MalformedResponse::EmptyItems)
        ));
    }

    #[test]
    fn decode_defaults_missing_fields() {
        let items = decode_items(r#"{"items":[{"topic":"only topic"}]}"#).unwrap();
        assert_eq!(items[0].category, "");
        assert_eq!(items[0].rank, 0);
        assert!(items[0].sources.is_none());
        assert!(!items[0].is_valid());
    }

    #[test]
    fn retain_valid_drops_items_with_any_empty_required_field() {
        let items = decode_items(
            r#"{"items":[
                {"category":"top","rank":1,"topic":"keep","summary":"s"},
                {"category":"","rank":2,"topic":"t","summary":"s"},
                {"category":"top","rank":3,"topic":"","summary":"s"},
                {"category":"top","rank":4,"topic":"t","summary":""}
            ]}"#,
        )
        .unwrap();

        let kept = retain_valid(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].topic, "keep");
    }

    #[test]
    fn retain_valid_keeps_provider_order() {
        let kept = retain_valid(decode_items(THREE_ITEMS).unwrap());
        let topics: Vec<&str> = kept.iter().map(|i| i.topic.as_str()).collect();
        assert_eq!(topics, vec!["A", "C"]);
    }

    #[test]
    fn into_context_items_assigns_ids_and_run() {
        let ids = SequentialIds::default();
        let run_id = Uuid::from_u128(99);
        let items = into_context_items(retain_valid(decode_items(THREE_ITEMS).unwrap()), run_id, &ids);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, Uuid::from_u128(1));
        assert_eq!(items[1].id, Uuid::from_u128(2));
        assert!(items.iter().all(|i| i.collection_run_id == run_id));
        assert_eq!(items[0].sources, vec!["http://x"]);
        assert!(items[1].sources.is_empty());
    }

    #[test]
    fn null_fields_invalidate_only_their_item() {
        let items = decode_items(
            r#"{"items":[
                {"category":"top","rank":1,"topic":"keep","summary":"s","sources":["http://x"]},
                {"category":"top","rank":2,"topic":null,"summary":"s"},
                {"category":null,"rank":3,"topic":"t","summary":"s"},
                {"category":"top","rank":4,"topic":"t","summary":null}
            ]}"#,
        )
        .expect("null fields must not fail the answer");

        assert_eq!(items.len(), 4);
        assert_eq!(items[1].topic, "");
        let kept = retain_valid(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].topic, "keep");
    }

    #[test]
    fn null_rank_and_sources_decode_as_empty() {
        let items = decode_items(
            r#"{"items":[{"category":"top","rank":null,"topic":"t","summary":"s","sources":null}]}"#,
        )
        .unwrap();

        assert_eq!(items[0].rank, 0);
        assert!(items[0].sources.is_none());
        assert!(items[0].is_valid());
    }

    #[test]
    fn null_entries_inside_sources_are_skipped() {
        let items = decode_items(
            r#"{"items":[{"category":"top","rank":1,"topic":"t","summary":"s","sources":[null,"http://x"]}]}"#,
        )
        .unwrap();
        assert_eq!(items[0].sources.as_deref(), Some(&["http://x".to_string()][..]));
    }

    #[test]
    fn null_item_counts_as_one_invalid_item() {
        let items = decode_items(
            r#"{"items":[null,{"category":"top","rank":1,"topic":"t","summary":"s"}]}"#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert!(!items[0].is_valid());
        assert_eq!(retain_valid(items).len(), 1);
    }

    #[test]
    fn rank_beyond_32_bits_is_kept() {
        let items = decode_items(
            r#"{"items":[{"category":"top","rank":3000000000,"topic":"t","summary":"s"}]}"#,
        )
        .unwrap();
        assert_eq!(items[0].rank, 3_000_000_000);
    }

    #[test]
    fn wrongly_typed_field_still_fails_the_answer() {
        let err = decode_items(r#"{"items":[{"category":"top","rank":"one","topic":"t","summary":"s"}]}"#)
            .unwrap_err();
        assert!(matches!(err, MalformedResponse::InvalidJson(_)), "got: {err:?}");
    }

    #[test]
    fn parsing_is_a_pure_function_of_the_text() {
        let tuples = |text: &str| -> Vec<(String, i64, String, String, Vec<String>)> {
            into_context_items(
                retain_valid(decode_items(text).unwrap()),
                Uuid::new_v4(),
                &crate::ids::RandomIds,
            )
            .into_iter()
            .map(|i| (i.category, i.rank, i.topic, i.summary, i.sources))
            .collect()
        };

        assert_eq!(tuples(THREE_ITEMS), tuples(THREE_ITEMS));
    }
}
