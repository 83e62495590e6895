//! Collection paging
//!
//! Graph collections return `{ "value": [...], "@odata.nextLink": "..." }`.
//! Pages are concatenated in the order received; nothing is deduplicated or
//! reordered, and a failure on any page fails the whole read.

use serde_json::Value;

use crate::error::{BackupError, BackupResult};
use crate::graph::GraphApi;

const NEXT_LINK: &str = "@odata.nextLink";

/// Fetch every page of a collection
pub fn fetch_all<A>(api: &A, path: &str, page_size: Option<u32>) -> BackupResult<Vec<Value>>
where
    A: GraphApi + ?Sized,
{
    let mut items = Vec::new();
    let mut next = Some(with_page_size(path, page_size));
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        let mut page = api.get(&url)?;
        pages += 1;

        match page.get_mut("value").map(Value::take) {
            Some(Value::Array(values)) => {
                tracing::debug!(%url, page = pages, count = values.len(), "Fetched page");
                items.extend(values);
            }
            _ => {
                return Err(BackupError::Transport(format!(
                    "Response from {} is not a collection page",
                    url
                )))
            }
        }

        next = page
            .get(NEXT_LINK)
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .map(str::to_string);
    }

    tracing::debug!(%path, pages, total = items.len(), "Collection complete");
    Ok(items)
}

/// Append `$top` to the first request when a page size is configured
fn with_page_size(path: &str, page_size: Option<u32>) -> String {
    match page_size {
        Some(top) => {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{}{}$top={}", path, separator, top)
        }
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake::FakeGraph;
    use serde_json::json;

    #[test]
    fn test_follows_next_links_in_order() {
        let api = FakeGraph::new()
            .with_json(
                "deviceManagement/intents",
                json!({"value": [{"id": "1"}, {"id": "2"}], "@odata.nextLink": "https://graph/p2"}),
            )
            .with_json(
                "https://graph/p2",
                json!({"value": [{"id": "3"}, {"id": "4"}], "@odata.nextLink": "https://graph/p3"}),
            )
            .with_json("https://graph/p3", json!({"value": [{"id": "5"}]}));

        let items = fetch_all(&api, "deviceManagement/intents", None).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(api.requests().len(), 3);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let api = FakeGraph::new()
            .with_json("c", json!({"value": [{"id": "a"}], "@odata.nextLink": "https://graph/c2"}))
            .with_json("https://graph/c2", json!({"value": [{"id": "a"}]}));

        assert_eq!(fetch_all(&api, "c", None).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let api = FakeGraph::new().with_collection("c", vec![]);
        assert!(fetch_all(&api, "c", None).unwrap().is_empty());
    }

    #[test]
    fn test_failed_page_fails_whole_read() {
        let api = FakeGraph::new()
            .with_json("c", json!({"value": [{"id": "a"}], "@odata.nextLink": "https://graph/c2"}))
            .with_transport_error("https://graph/c2", "connection reset");

        let err = fetch_all(&api, "c", None).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_non_collection_response() {
        let api = FakeGraph::new().with_json("c", json!({"id": "single"}));
        assert!(matches!(fetch_all(&api, "c", None), Err(BackupError::Transport(_))));
    }

    #[test]
    fn test_page_size_query() {
        assert_eq!(with_page_size("a/b", Some(50)), "a/b?$top=50");
        assert_eq!(with_page_size("a/b?$filter=x", Some(50)), "a/b?$filter=x&$top=50");
        assert_eq!(with_page_size("a/b", None), "a/b");
    }
}
