//! XML wire format for templates.
//!
//! ```xml
//! <template name="long_genes" title="Genes with long length" important="false" keywords="" edited="false">
//!   <query model="genomic">
//!     <view path="Gene.symbol"/>
//!     <node path="Gene.length">
//!       <constraint op="&gt;" editable="true" code="A">
//!         <value type="integer" value="1000"/>
//!       </constraint>
//!     </node>
//!   </query>
//! </template>
//! ```
//!
//! Everything is carried in attributes so no text content is whitespace
//! sensitive. Optional metadata is omitted when absent, which keeps "absent"
//! and "empty" distinct across a round trip.

use crate::constraint::{Constraint, ConstraintError, ConstraintOp};
use crate::error::QueryError;
use crate::node::PathNode;
use crate::query::PathQuery;
use crate::template::{TemplateMetadata, TemplateQuery};
use crate::value::Value;
use minequery_model::Model;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("malformed template document: {0}")]
    Malformed(String),
    #[error("template is written against model `{found}`, expected `{expected}`")]
    ModelMismatch { expected: String, found: String },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    /// XML 1.0 has no way to carry this character, not even as a reference.
    #[error("attribute `{attribute}` contains {ch:?}, which XML cannot represent")]
    UnrepresentableChar { attribute: String, ch: char },
    /// Writing a well-formed in-memory template never fails; seeing this is a bug.
    #[error("failed to write template xml: {0}")]
    Write(String),
}

// ============================================================================
// Writing
// ============================================================================

pub fn template_to_xml(template: &TemplateQuery) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_template(&mut writer, template)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Push `key="value"` with markup escaped and `\t`, `\n`, `\r` written as
/// character references so attribute normalisation cannot turn them into spaces.
fn push_attr(start: &mut BytesStart<'_>, key: &str, value: &str) -> Result<(), XmlError> {
    if let Some(ch) = value.chars().find(|ch| !is_xml_char(*ch)) {
        return Err(XmlError::UnrepresentableChar {
            attribute: key.to_string(),
            ch,
        });
    }
    let escaped = escape(value)
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;");
    start.push_attribute((key.as_bytes(), escaped.as_bytes()));
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

fn write_template(writer: &mut Writer<Vec<u8>>, template: &TemplateQuery) -> Result<(), XmlError> {
    let meta = template.metadata();
    let mut root = BytesStart::new("template");
    for (key, value) in [
        ("name", &meta.name),
        ("title", &meta.title),
        ("description", &meta.description),
        ("comment", &meta.comment),
    ] {
        if let Some(value) = value {
            push_attr(&mut root, key, value)?;
        }
    }
    push_attr(&mut root, "important", bool_attr(meta.important))?;
    push_attr(&mut root, "keywords", &meta.keywords)?;
    push_attr(&mut root, "edited", bool_attr(template.is_edited()))?;
    emit(writer, Event::Start(root))?;

    write_query(writer, template.query())?;

    emit(writer, Event::End(BytesEnd::new("template")))
}

fn write_query(writer: &mut Writer<Vec<u8>>, query: &PathQuery) -> Result<(), XmlError> {
    let mut start = BytesStart::new("query");
    push_attr(&mut start, "model", query.model().name())?;
    if let Some(logic) = query.constraint_logic() {
        push_attr(&mut start, "constraintLogic", logic)?;
    }
    emit(writer, Event::Start(start))?;

    for path in query.view() {
        let mut view = BytesStart::new("view");
        push_attr(&mut view, "path", path)?;
        emit(writer, Event::Empty(view))?;
    }

    for node in query.nodes() {
        let mut start = BytesStart::new("node");
        push_attr(&mut start, "path", node.path())?;
        if node.constraints().is_empty() {
            emit(writer, Event::Empty(start))?;
            continue;
        }
        emit(writer, Event::Start(start))?;
        for constraint in node.constraints() {
            write_constraint(writer, constraint)?;
        }
        emit(writer, Event::End(BytesEnd::new("node")))?;
    }

    emit(writer, Event::End(BytesEnd::new("query")))
}

fn write_constraint(writer: &mut Writer<Vec<u8>>, constraint: &Constraint) -> Result<(), XmlError> {
    let mut start = BytesStart::new("constraint");
    push_attr(&mut start, "op", constraint.op().symbol())?;
    push_attr(&mut start, "editable", bool_attr(constraint.is_editable()))?;
    for (key, value) in [
        ("description", constraint.description()),
        ("identifier", constraint.identifier()),
        ("code", constraint.code()),
    ] {
        if let Some(value) = value {
            push_attr(&mut start, key, value)?;
        }
    }
    if constraint.values().is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    for value in constraint.values() {
        let mut elem = BytesStart::new("value");
        push_attr(&mut elem, "type", value.type_tag())?;
        push_attr(&mut elem, "value", &value.to_string())?;
        emit(writer, Event::Empty(elem))?;
    }
    emit(writer, Event::End(BytesEnd::new("constraint")))
}

// ============================================================================
// Reading
// ============================================================================

/// Parse a template document written by [`template_to_xml`]. Paths are
/// resolved against `model`, which must be the model the document names.
pub fn template_from_xml(text: &str, model: &Arc<Model>) -> Result<TemplateQuery, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut parser = TemplateParser::new(model);

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open(&e)?,
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close(e.name().as_ref())?;
            }
            Event::End(e) => parser.close(e.name().as_ref())?,
            Event::Text(t) => {
                if !t.unescape()?.trim().is_empty() {
                    return Err(XmlError::Malformed("unexpected text content".to_string()));
                }
            }
            Event::CData(t) => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(XmlError::Malformed("unexpected CDATA content".to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let template = parser.finish()?;
    tracing::debug!(
        template = template.name().unwrap_or_default(),
        nodes = template.query().len(),
        "parsed template xml"
    );
    Ok(template)
}

struct PendingConstraint {
    op: ConstraintOp,
    editable: bool,
    description: Option<String>,
    identifier: Option<String>,
    code: Option<String>,
    values: Vec<Value>,
}

struct TemplateHeader {
    metadata: TemplateMetadata,
    edited: bool,
}

struct TemplateParser<'m> {
    model: &'m Arc<Model>,
    header: Option<TemplateHeader>,
    query: Option<PathQuery>,
    query_closed: bool,
    node: Option<PathNode>,
    constraint: Option<PendingConstraint>,
    done: bool,
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, XmlError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn required(attrs: &mut HashMap<String, String>, element: &str, key: &str) -> Result<String, XmlError> {
    attrs
        .remove(key)
        .ok_or_else(|| XmlError::Malformed(format!("<{element}> is missing `{key}`")))
}

fn parse_bool(element: &str, key: &str, text: &str) -> Result<bool, XmlError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(XmlError::Malformed(format!(
            "<{element}> has non-boolean `{key}`: {other:?}"
        ))),
    }
}

impl<'m> TemplateParser<'m> {
    fn new(model: &'m Arc<Model>) -> Self {
        Self {
            model,
            header: None,
            query: None,
            query_closed: false,
            node: None,
            constraint: None,
            done: false,
        }
    }

    fn unexpected(element: &str) -> XmlError {
        XmlError::Malformed(format!("unexpected <{element}>"))
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), XmlError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = attributes(e)?;
        match name.as_str() {
            "template" if self.header.is_none() && !self.done => {
                let important = match attrs.remove("important") {
                    Some(text) => parse_bool("template", "important", &text)?,
                    None => false,
                };
                let edited = match attrs.remove("edited") {
                    Some(text) => parse_bool("template", "edited", &text)?,
                    None => false,
                };
                self.header = Some(TemplateHeader {
                    metadata: TemplateMetadata {
                        name: attrs.remove("name"),
                        title: attrs.remove("title"),
                        description: attrs.remove("description"),
                        comment: attrs.remove("comment"),
                        important,
                        keywords: attrs.remove("keywords").unwrap_or_default(),
                    },
                    edited,
                });
            }
            "query" if self.header.is_some() && self.query.is_none() && !self.query_closed => {
                let found = required(&mut attrs, "query", "model")?;
                if found != self.model.name() {
                    return Err(XmlError::ModelMismatch {
                        expected: self.model.name().to_string(),
                        found,
                    });
                }
                let mut query = PathQuery::new(Arc::clone(self.model));
                query.set_constraint_logic(attrs.remove("constraintLogic"));
                self.query = Some(query);
            }
            "view" if !self.query_closed && self.node.is_none() => {
                let path = required(&mut attrs, "view", "path")?;
                let query = self.query.as_mut().ok_or_else(|| Self::unexpected("view"))?;
                query.add_view(&path)?;
            }
            "node" if self.query.is_some() && !self.query_closed && self.node.is_none() => {
                let path = required(&mut attrs, "node", "path")?;
                self.node = Some(PathNode::new(path));
            }
            "constraint" if self.node.is_some() && self.constraint.is_none() => {
                let op: ConstraintOp = required(&mut attrs, "constraint", "op")?.parse()?;
                let editable = match attrs.remove("editable") {
                    Some(text) => parse_bool("constraint", "editable", &text)?,
                    None => false,
                };
                self.constraint = Some(PendingConstraint {
                    op,
                    editable,
                    description: attrs.remove("description"),
                    identifier: attrs.remove("identifier"),
                    code: attrs.remove("code"),
                    values: Vec::new(),
                });
            }
            "value" => {
                let pending = self
                    .constraint
                    .as_mut()
                    .ok_or_else(|| Self::unexpected("value"))?;
                let tag = required(&mut attrs, "value", "type")?;
                let text = required(&mut attrs, "value", "value")?;
                let value = Value::parse_tagged(&tag, &text).ok_or_else(|| {
                    XmlError::Malformed(format!("value {text:?} is not a valid `{tag}`"))
                })?;
                pending.values.push(value);
            }
            other => return Err(Self::unexpected(other)),
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), XmlError> {
        match name {
            b"constraint" => {
                let pending = self
                    .constraint
                    .take()
                    .ok_or_else(|| Self::unexpected("/constraint"))?;
                let mut constraint =
                    Constraint::new(pending.op, pending.values)?.editable(pending.editable);
                if let Some(description) = pending.description {
                    constraint = constraint.with_description(description);
                }
                if let Some(identifier) = pending.identifier {
                    constraint = constraint.with_identifier(identifier);
                }
                if let Some(code) = pending.code {
                    constraint = constraint.with_code(code);
                }
                let node = self.node.as_mut().ok_or_else(|| Self::unexpected("/constraint"))?;
                node.push_constraint(constraint);
            }
            b"node" => {
                let node = self.node.take().ok_or_else(|| Self::unexpected("/node"))?;
                let query = self.query.as_mut().ok_or_else(|| Self::unexpected("/node"))?;
                query.add_or_replace_node(node)?;
            }
            b"query" => {
                self.query_closed = true;
            }
            b"template" => {
                self.done = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<TemplateQuery, XmlError> {
        if !self.done {
            return Err(XmlError::Malformed("missing </template>".to_string()));
        }
        let header = self
            .header
            .ok_or_else(|| XmlError::Malformed("missing <template>".to_string()))?;
        let query = self
            .query
            .ok_or_else(|| XmlError::Malformed("missing <query>".to_string()))?;
        let mut template = TemplateQuery::new(header.metadata, &query);
        template.set_edited(header.edited);
        Ok(template)
    }
}

impl TemplateQuery {
    /// Serialize to the XML wire format.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        template_to_xml(self)
    }

    pub fn from_xml(text: &str, model: &Arc<Model>) -> Result<Self, XmlError> {
        template_from_xml(text, model)
    }
}
