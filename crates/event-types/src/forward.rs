//! Forward conversion: [`Event`] → event markup.
//!
//! Absent fields are omitted. The output decodes back to the same event with
//! [`crate::reverse::decode_event`], except that `Some("")` text reads back as
//! `None`.

use crate::error::{EventCodecError, Result};
use crate::event::{Event, PageRef, Tag, User};
use crate::reverse::ROOT_ELEMENT;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;

/// Encode an event to markup bytes.
pub fn encode_event(event: &Event) -> Result<Vec<u8>> {
    let mut out = MarkupWriter::new();

    out.start(
        ROOT_ELEMENT,
        &[
            ("id", &event.id),
            ("datetime", &event.datetime),
            ("type", &event.event_type),
            ("cascading", &event.cascading),
            ("wikiid", &event.wiki_id),
            ("journaled", &event.journaled),
            ("version", &event.version),
        ],
    )?;

    if let Some(request) = &event.request {
        out.start(
            "request",
            &[
                ("id", &request.id),
                ("seq", &request.seq),
                ("count", &request.count),
            ],
        )?;
        out.text_element("signature", &request.signature)?;
        out.text_element("ip", &request.ip)?;
        out.text_element("session-id", &request.session_id)?;
        out.start("parameters", &[])?;
        for param in &request.parameters {
            out.start("param", &[("name", &param.name)])?;
            out.text(&param.value)?;
            out.end("param")?;
        }
        out.end("parameters")?;
        if let Some(user) = &request.user {
            out.user(user)?;
        }
        out.end("request")?;
    }

    out.text_element("isimage", &event.is_image)?;
    out.page("page", &event.page)?;
    out.page("root.page", &event.root_page)?;
    out.page("source.page", &event.source_page)?;
    out.page("descendant.page", &event.descendant_page)?;
    out.page("root.copy.page", &event.root_copy_page)?;
    out.page("root.delete.page", &event.root_delete_page)?;

    if let Some(file) = &event.file {
        out.start("file", &[("id", &file.id), ("res-id", &file.res_id)])?;
        out.text_element("filename", &file.filename)?;
        out.end("file")?;
    }

    if let Some(data) = &event.data {
        out.start("data", &[])?;
        out.text_element("_uri.host", &data.uri_host)?;
        out.text_element("_uri.scheme", &data.uri_scheme)?;
        out.text_element("_uri.query", &data.uri_query)?;
        out.text_element("query", &data.query)?;
        out.text_element("constraint", &data.constraint)?;
        out.end("data")?;
    }

    if let Some(diff) = &event.diff {
        out.start("diff", &[])?;
        out.text_element("added", &diff.added)?;
        out.text_element("removed", &diff.removed)?;
        out.text_element("attributes", &diff.attributes)?;
        out.text_element("structural", &diff.structural)?;
        out.end("diff")?;
    }

    out.text_element("create-reason", &event.create_reason)?;
    out.text_element("create-reason-detail", &event.create_reason_detail)?;
    if let Some(user) = &event.user {
        out.user(user)?;
    }
    out.text_element("from", &event.from)?;
    out.text_element("to", &event.to)?;
    out.text_element("revision", &event.revision)?;
    out.text_element("revision.previous", &event.revision_previous)?;
    out.text_element("revision.reverted", &event.revision_reverted)?;

    if let Some(comment) = &event.comment {
        out.start("comment", &[("id", &comment.id)])?;
        if let Some(content) = &comment.content {
            out.start("content", &[("type", &content.content_type)])?;
            out.text(&content.value)?;
            out.end("content")?;
        }
        out.end("comment")?;
    }

    out.tags("tags-added", &event.tags_added)?;
    out.tags("tags-removed", &event.tags_removed)?;

    if let Some(property) = &event.property {
        out.start("property", &[])?;
        out.text_element("id", &property.id)?;
        out.text_element("name", &property.name)?;
        out.end("property")?;
    }

    out.text_element("restriction-id", &event.restriction_id)?;
    out.text_element("previous.restriction-id", &event.previous_restriction_id)?;
    out.text_element("score", &event.score)?;

    if let Some(grant) = &event.grant {
        out.start("grant", &[])?;
        out.text_element("id", &grant.id)?;
        out.text_element("type", &grant.grant_type)?;
        if grant.role_id.is_some() {
            out.empty("role", &[("id", &grant.role_id)])?;
        }
        if let Some(user) = &grant.user {
            out.user(user)?;
        }
        out.end("grant")?;
    }

    out.text_element("authmethod-password", &event.auth_method_password)?;
    out.text_element("authmethod-apikey", &event.auth_method_apikey)?;
    out.text_element("origin", &event.origin)?;
    out.text_element("reason-type", &event.reason_type)?;
    out.text_element("displayname.previous", &event.display_name_previous)?;
    out.text_element("displayname.current", &event.display_name_current)?;
    out.text_element("contenttype.previous", &event.content_type_previous)?;
    out.text_element("contenttype.current", &event.content_type_current)?;
    out.text_element("change-comment", &event.change_comment)?;
    out.text_element("titlesegment.previous", &event.title_segment_previous)?;
    out.text_element("titlesegment.current", &event.title_segment_current)?;

    if let Some(workflow) = &event.workflow {
        out.start("workflow", &[("name", &workflow.name)])?;
        out.text_element("uri.next", &workflow.uri_next)?;
        if let Some(data) = &workflow.data {
            out.start("data", &[])?;
            out.text_element("_userid", &data.user_id)?;
            out.text_element("_username", &data.username)?;
            out.text_element("_customeractivityid", &data.customer_activity_id)?;
            out.text_element("_requestid", &data.request_id)?;
            out.text_element("_email", &data.email)?;
            out.text_element("_search", &data.search)?;
            out.text_element("_path", &data.path)?;
            out.end("data")?;
        }
        out.end("workflow")?;
    }

    // Unrecognized markup is already serialized; pass it through untouched.
    if let Some(raw) = &event.unrecognized {
        out.write(XmlEvent::Text(BytesText::from_escaped(raw.as_str())))?;
    }

    out.end(ROOT_ELEMENT)?;
    Ok(out.into_inner())
}

struct MarkupWriter {
    writer: Writer<Vec<u8>>,
}

impl MarkupWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    fn write(&mut self, event: XmlEvent<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| EventCodecError::Encode(e.to_string()))
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, &Option<String>)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for (key, value) in attrs {
            if let Some(value) = value {
                element.push_attribute((*key, value.as_str()));
            }
        }
        element
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &Option<String>)]) -> Result<()> {
        self.write(XmlEvent::Start(Self::element(name, attrs)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &Option<String>)]) -> Result<()> {
        self.write(XmlEvent::Empty(Self::element(name, attrs)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(XmlEvent::End(BytesEnd::new(name)))
    }

    fn text(&mut self, value: &Option<String>) -> Result<()> {
        match value {
            Some(value) if !value.is_empty() => self.write(XmlEvent::Text(BytesText::new(value))),
            _ => Ok(()),
        }
    }

    fn text_element(&mut self, name: &str, value: &Option<String>) -> Result<()> {
        if value.is_none() {
            return Ok(());
        }
        self.start(name, &[])?;
        self.text(value)?;
        self.end(name)
    }

    fn user(&mut self, user: &User) -> Result<()> {
        self.start(
            "user",
            &[
                ("id", &user.id),
                ("anonymous", &user.anonymous),
                ("username", &user.username),
            ],
        )?;
        self.text_element("name", &user.name)?;
        self.end("user")
    }

    fn page(&mut self, name: &str, page: &Option<PageRef>) -> Result<()> {
        let Some(page) = page else {
            return Ok(());
        };
        self.start(name, &[("id", &page.id)])?;
        self.text_element("path", &page.path)?;
        self.end(name)
    }

    fn tags(&mut self, name: &str, tags: &[Tag]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        for tag in tags {
            self.start("tag", &[])?;
            self.text_element("name", &tag.name)?;
            self.text_element("type", &tag.tag_type)?;
            self.end("tag")?;
        }
        self.end(name)
    }
}
