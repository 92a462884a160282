//! Activity event model.
//!
//! Every field is optional: an event only carries the parts that apply to its
//! `type` (a page view has a request and a page, a grant change has a grant,
//! and so on). Absent markup leaves the field as `None` or an empty list.

use serde::Serialize;

/// A decoded activity event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: Option<String>,
    pub datetime: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub cascading: Option<String>,
    pub wiki_id: Option<String>,
    pub journaled: Option<String>,
    pub version: Option<String>,

    pub request: Option<Request>,
    pub is_image: Option<String>,
    pub page: Option<PageRef>,
    pub root_page: Option<PageRef>,
    pub source_page: Option<PageRef>,
    pub descendant_page: Option<PageRef>,
    pub root_copy_page: Option<PageRef>,
    pub root_delete_page: Option<PageRef>,
    pub file: Option<File>,
    pub data: Option<Data>,
    pub diff: Option<Diff>,
    pub create_reason: Option<String>,
    pub create_reason_detail: Option<String>,
    pub user: Option<User>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub revision: Option<String>,
    pub revision_previous: Option<String>,
    pub revision_reverted: Option<String>,
    pub comment: Option<Comment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags_added: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags_removed: Vec<Tag>,
    pub property: Option<Property>,
    pub restriction_id: Option<String>,
    pub previous_restriction_id: Option<String>,
    pub score: Option<String>,
    pub grant: Option<Grant>,
    pub auth_method_password: Option<String>,
    pub auth_method_apikey: Option<String>,
    pub origin: Option<String>,
    pub reason_type: Option<String>,
    pub display_name_previous: Option<String>,
    pub display_name_current: Option<String>,
    pub content_type_previous: Option<String>,
    pub content_type_current: Option<String>,
    pub change_comment: Option<String>,
    pub title_segment_previous: Option<String>,
    pub title_segment_current: Option<String>,
    pub workflow: Option<Workflow>,

    /// Raw markup of root-level children that no binding recognised.
    ///
    /// `Some` means the producer is ahead of this schema.
    pub unrecognized: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Request {
    pub id: Option<String>,
    pub seq: Option<String>,
    pub count: Option<String>,
    pub signature: Option<String>,
    pub ip: Option<String>,
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Option<String>,
    pub anonymous: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Shared shape of `page`, `root.page`, `source.page` and the other page references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub id: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: Option<String>,
    pub res_id: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Data {
    pub uri_host: Option<String>,
    pub uri_scheme: Option<String>,
    pub uri_query: Option<String>,
    pub query: Option<String>,
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub added: Option<String>,
    pub removed: Option<String>,
    pub attributes: Option<String>,
    pub structural: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: Option<String>,
    pub content: Option<CommentContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentContent {
    pub content_type: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: Option<String>,
    pub tag_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Property {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub id: Option<String>,
    pub grant_type: Option<String>,
    pub role_id: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workflow {
    pub name: Option<String>,
    pub uri_next: Option<String>,
    pub data: Option<WorkflowData>,
}

/// Underscore-prefixed keys carried by workflow submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowData {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub customer_activity_id: Option<String>,
    pub request_id: Option<String>,
    pub email: Option<String>,
    pub search: Option<String>,
    pub path: Option<String>,
}

impl Event {
    /// Whether decoding left markup it could not map.
    pub fn has_unrecognized(&self) -> bool {
        self.unrecognized.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Returns the value in `slot`, initialising it first when absent.
pub(crate) fn fill<T: Default>(slot: &mut Option<T>) -> &mut T {
    slot.get_or_insert_with(T::default)
}

/// Returns the entry currently being filled, creating one if the list is empty.
pub(crate) fn current<T: Default>(items: &mut Vec<T>) -> &mut T {
    if items.is_empty() {
        items.push(T::default());
    }
    let last = items.len() - 1;
    &mut items[last]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_wire_names() {
        let event = Event {
            id: Some("x".to_string()),
            event_type: Some("page:view".to_string()),
            ..Event::default()
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["id"], "x");
        assert_eq!(json["type"], "page:view");
        assert!(json.get("tags_added").is_none());
    }

    #[test]
    fn test_current_creates_first_entry() {
        let mut tags: Vec<Tag> = Vec::new();
        current(&mut tags).name = Some("a".to_string());
        tags.push(Tag::default());
        current(&mut tags).name = Some("b".to_string());

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name.as_deref(), Some("a"));
        assert_eq!(tags[1].name.as_deref(), Some("b"));
    }
}
