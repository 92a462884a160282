//! Declarative path bindings for event markup.
//!
//! Paths are relative to the root element. Attributes are addressed with an
//! `@` segment (`request/@seq`), element text by the element path
//! (`request/signature`). Adding a field to the schema means adding a row to
//! [`BINDINGS`]; the decoder itself never changes.

use crate::event::{current, fill, Event};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Assigns a decoded string to a field.
pub type Setter = fn(&mut Event, String);

/// Runs when an element opens; used to start a new entry in a repeated list.
pub type Action = fn(&mut Event);

/// How a markup path maps onto [`Event`].
#[derive(Clone, Copy)]
pub enum Binding {
    /// Attribute value (path ends in `@name`).
    Attr(Setter),
    /// Trimmed text content of the element.
    Text(Setter),
    /// Element start.
    Open(Action),
}

/// Schema version the table below describes (the `version` attribute producers send).
pub const SCHEMA_VERSION: &str = "2";

/// Every path the decoder understands.
pub static BINDINGS: &[(&str, Binding)] = &[
    // root attributes
    ("@id", Binding::Attr(|e, v| e.id = Some(v))),
    ("@datetime", Binding::Attr(|e, v| e.datetime = Some(v))),
    ("@type", Binding::Attr(|e, v| e.event_type = Some(v))),
    ("@cascading", Binding::Attr(|e, v| e.cascading = Some(v))),
    ("@wikiid", Binding::Attr(|e, v| e.wiki_id = Some(v))),
    ("@journaled", Binding::Attr(|e, v| e.journaled = Some(v))),
    ("@version", Binding::Attr(|e, v| e.version = Some(v))),
    // request
    ("request", Binding::Open(|e| {
        fill(&mut e.request);
    })),
    ("request/@id", Binding::Attr(|e, v| fill(&mut e.request).id = Some(v))),
    ("request/@seq", Binding::Attr(|e, v| fill(&mut e.request).seq = Some(v))),
    ("request/@count", Binding::Attr(|e, v| fill(&mut e.request).count = Some(v))),
    ("request/signature", Binding::Text(|e, v| fill(&mut e.request).signature = Some(v))),
    ("request/ip", Binding::Text(|e, v| fill(&mut e.request).ip = Some(v))),
    ("request/session-id", Binding::Text(|e, v| fill(&mut e.request).session_id = Some(v))),
    ("request/parameters", Binding::Open(|e| {
        fill(&mut e.request);
    })),
    ("request/parameters/param", Binding::Open(|e| {
        fill(&mut e.request).parameters.push(Default::default())
    })),
    ("request/parameters/param/@name", Binding::Attr(|e, v| {
        current(&mut fill(&mut e.request).parameters).name = Some(v)
    })),
    ("request/parameters/param", Binding::Text(|e, v| {
        current(&mut fill(&mut e.request).parameters).value = Some(v)
    })),
    ("request/user", Binding::Open(|e| {
        fill(&mut fill(&mut e.request).user);
    })),
    ("request/user/@id", Binding::Attr(|e, v| fill(&mut fill(&mut e.request).user).id = Some(v))),
    ("request/user/@anonymous", Binding::Attr(|e, v| {
        fill(&mut fill(&mut e.request).user).anonymous = Some(v)
    })),
    ("request/user/@username", Binding::Attr(|e, v| {
        fill(&mut fill(&mut e.request).user).username = Some(v)
    })),
    ("request/user/name", Binding::Text(|e, v| fill(&mut fill(&mut e.request).user).name = Some(v))),
    ("isimage", Binding::Text(|e, v| e.is_image = Some(v))),
    // page references
    ("page/@id", Binding::Attr(|e, v| fill(&mut e.page).id = Some(v))),
    ("page/path", Binding::Text(|e, v| fill(&mut e.page).path = Some(v))),
    ("root.page/@id", Binding::Attr(|e, v| fill(&mut e.root_page).id = Some(v))),
    ("root.page/path", Binding::Text(|e, v| fill(&mut e.root_page).path = Some(v))),
    ("source.page/@id", Binding::Attr(|e, v| fill(&mut e.source_page).id = Some(v))),
    ("source.page/path", Binding::Text(|e, v| fill(&mut e.source_page).path = Some(v))),
    ("descendant.page/@id", Binding::Attr(|e, v| fill(&mut e.descendant_page).id = Some(v))),
    ("descendant.page/path", Binding::Text(|e, v| fill(&mut e.descendant_page).path = Some(v))),
    ("root.copy.page/@id", Binding::Attr(|e, v| fill(&mut e.root_copy_page).id = Some(v))),
    ("root.copy.page/path", Binding::Text(|e, v| fill(&mut e.root_copy_page).path = Some(v))),
    ("root.delete.page/@id", Binding::Attr(|e, v| fill(&mut e.root_delete_page).id = Some(v))),
    ("root.delete.page/path", Binding::Text(|e, v| fill(&mut e.root_delete_page).path = Some(v))),
    // file
    ("file/@id", Binding::Attr(|e, v| fill(&mut e.file).id = Some(v))),
    ("file/@res-id", Binding::Attr(|e, v| fill(&mut e.file).res_id = Some(v))),
    ("file/filename", Binding::Text(|e, v| fill(&mut e.file).filename = Some(v))),
    // data
    ("data/_uri.host", Binding::Text(|e, v| fill(&mut e.data).uri_host = Some(v))),
    ("data/_uri.scheme", Binding::Text(|e, v| fill(&mut e.data).uri_scheme = Some(v))),
    ("data/_uri.query", Binding::Text(|e, v| fill(&mut e.data).uri_query = Some(v))),
    ("data/query", Binding::Text(|e, v| fill(&mut e.data).query = Some(v))),
    ("data/constraint", Binding::Text(|e, v| fill(&mut e.data).constraint = Some(v))),
    // diff
    ("diff/added", Binding::Text(|e, v| fill(&mut e.diff).added = Some(v))),
    ("diff/removed", Binding::Text(|e, v| fill(&mut e.diff).removed = Some(v))),
    ("diff/attributes", Binding::Text(|e, v| fill(&mut e.diff).attributes = Some(v))),
    ("diff/structural", Binding::Text(|e, v| fill(&mut e.diff).structural = Some(v))),
    ("create-reason", Binding::Text(|e, v| e.create_reason = Some(v))),
    ("create-reason-detail", Binding::Text(|e, v| e.create_reason_detail = Some(v))),
    // user
    ("user", Binding::Open(|e| {
        fill(&mut e.user);
    })),
    ("user/@id", Binding::Attr(|e, v| fill(&mut e.user).id = Some(v))),
    ("user/@anonymous", Binding::Attr(|e, v| fill(&mut e.user).anonymous = Some(v))),
    ("user/@username", Binding::Attr(|e, v| fill(&mut e.user).username = Some(v))),
    ("user/name", Binding::Text(|e, v| fill(&mut e.user).name = Some(v))),
    // revisions
    ("from", Binding::Text(|e, v| e.from = Some(v))),
    ("to", Binding::Text(|e, v| e.to = Some(v))),
    ("revision", Binding::Text(|e, v| e.revision = Some(v))),
    ("revision.previous", Binding::Text(|e, v| e.revision_previous = Some(v))),
    ("revision.reverted", Binding::Text(|e, v| e.revision_reverted = Some(v))),
    // comment
    ("comment/@id", Binding::Attr(|e, v| fill(&mut e.comment).id = Some(v))),
    ("comment/content/@type", Binding::Attr(|e, v| {
        fill(&mut fill(&mut e.comment).content).content_type = Some(v)
    })),
    ("comment/content", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.comment).content).value = Some(v)
    })),
    // tags
    ("tags-added/tag", Binding::Open(|e| e.tags_added.push(Default::default()))),
    ("tags-added/tag/name", Binding::Text(|e, v| current(&mut e.tags_added).name = Some(v))),
    ("tags-added/tag/type", Binding::Text(|e, v| current(&mut e.tags_added).tag_type = Some(v))),
    ("tags-removed/tag", Binding::Open(|e| e.tags_removed.push(Default::default()))),
    ("tags-removed/tag/name", Binding::Text(|e, v| current(&mut e.tags_removed).name = Some(v))),
    ("tags-removed/tag/type", Binding::Text(|e, v| {
        current(&mut e.tags_removed).tag_type = Some(v)
    })),
    // property and restrictions
    ("property/id", Binding::Text(|e, v| fill(&mut e.property).id = Some(v))),
    ("property/name", Binding::Text(|e, v| fill(&mut e.property).name = Some(v))),
    ("restriction-id", Binding::Text(|e, v| e.restriction_id = Some(v))),
    ("previous.restriction-id", Binding::Text(|e, v| e.previous_restriction_id = Some(v))),
    ("score", Binding::Text(|e, v| e.score = Some(v))),
    // grant
    ("grant/id", Binding::Text(|e, v| fill(&mut e.grant).id = Some(v))),
    ("grant/type", Binding::Text(|e, v| fill(&mut e.grant).grant_type = Some(v))),
    ("grant/role/@id", Binding::Attr(|e, v| fill(&mut e.grant).role_id = Some(v))),
    ("grant/user", Binding::Open(|e| {
        fill(&mut fill(&mut e.grant).user);
    })),
    ("grant/user/@id", Binding::Attr(|e, v| fill(&mut fill(&mut e.grant).user).id = Some(v))),
    ("grant/user/@anonymous", Binding::Attr(|e, v| {
        fill(&mut fill(&mut e.grant).user).anonymous = Some(v)
    })),
    ("grant/user/@username", Binding::Attr(|e, v| {
        fill(&mut fill(&mut e.grant).user).username = Some(v)
    })),
    ("grant/user/name", Binding::Text(|e, v| fill(&mut fill(&mut e.grant).user).name = Some(v))),
    // authentication and profile changes
    ("authmethod-password", Binding::Text(|e, v| e.auth_method_password = Some(v))),
    ("authmethod-apikey", Binding::Text(|e, v| e.auth_method_apikey = Some(v))),
    ("origin", Binding::Text(|e, v| e.origin = Some(v))),
    ("reason-type", Binding::Text(|e, v| e.reason_type = Some(v))),
    ("displayname.previous", Binding::Text(|e, v| e.display_name_previous = Some(v))),
    ("displayname.current", Binding::Text(|e, v| e.display_name_current = Some(v))),
    ("contenttype.previous", Binding::Text(|e, v| e.content_type_previous = Some(v))),
    ("contenttype.current", Binding::Text(|e, v| e.content_type_current = Some(v))),
    ("change-comment", Binding::Text(|e, v| e.change_comment = Some(v))),
    ("titlesegment.previous", Binding::Text(|e, v| e.title_segment_previous = Some(v))),
    ("titlesegment.current", Binding::Text(|e, v| e.title_segment_current = Some(v))),
    // workflow
    ("workflow/@name", Binding::Attr(|e, v| fill(&mut e.workflow).name = Some(v))),
    ("workflow/uri.next", Binding::Text(|e, v| fill(&mut e.workflow).uri_next = Some(v))),
    ("workflow/data/_userid", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).user_id = Some(v)
    })),
    ("workflow/data/_username", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).username = Some(v)
    })),
    ("workflow/data/_customeractivityid", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).customer_activity_id = Some(v)
    })),
    ("workflow/data/_requestid", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).request_id = Some(v)
    })),
    ("workflow/data/_email", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).email = Some(v)
    })),
    ("workflow/data/_search", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).search = Some(v)
    })),
    ("workflow/data/_path", Binding::Text(|e, v| {
        fill(&mut fill(&mut e.workflow).data).path = Some(v)
    })),
];

/// Bindings grouped by path. A path may carry both an `Open` and a `Text` binding.
pub struct BindingTable {
    by_path: HashMap<&'static str, Vec<Binding>>,
    root_children: HashSet<&'static str>,
}

impl BindingTable {
    fn build(rows: &'static [(&'static str, Binding)]) -> Self {
        let mut by_path: HashMap<&'static str, Vec<Binding>> = HashMap::new();
        let mut root_children = HashSet::new();
        for &(path, binding) in rows {
            by_path.entry(path).or_default().push(binding);
            let first = path.split('/').next().unwrap_or(path);
            if !first.starts_with('@') {
                root_children.insert(first);
            }
        }
        Self {
            by_path,
            root_children,
        }
    }

    /// Bindings registered for `path`, in table order.
    pub fn lookup(&self, path: &str) -> &[Binding] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether an element directly below the root is part of the schema.
    pub fn is_known_root_child(&self, name: &str) -> bool {
        self.root_children.contains(name)
    }
}

/// Lazily built index over [`BINDINGS`].
pub static TABLE: LazyLock<BindingTable> = LazyLock::new(|| BindingTable::build(BINDINGS));
