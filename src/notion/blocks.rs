//! Block update payloads
//!
//! `PATCH /blocks/{id}` takes the new content under a field named after the
//! block's type, e.g. `{"to_do": {"checked": true}}`. Each supported type is a
//! variant of [`BlockContent`] carrying its own payload; serde's external
//! tagging produces the type-named field.
//!
//! Payloads type the fields the server knows about and keep everything else
//! in `extra`, so the caller's content object is forwarded intact. A typed
//! field the caller sent as `null` is parked in `extra` so the null survives.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Block types that can be updated in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    Quote,
    Toggle,
    ToDo,
    Callout,
    Code,
    Equation,
    Bookmark,
    Embed,
    Image,
    Video,
    Pdf,
    File,
    Audio,
    Divider,
    Breadcrumb,
    TableOfContents,
    Table,
    TableRow,
}

impl BlockType {
    pub const ALL: [BlockType; 24] = [
        BlockType::Paragraph,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::BulletedListItem,
        BlockType::NumberedListItem,
        BlockType::Quote,
        BlockType::Toggle,
        BlockType::ToDo,
        BlockType::Callout,
        BlockType::Code,
        BlockType::Equation,
        BlockType::Bookmark,
        BlockType::Embed,
        BlockType::Image,
        BlockType::Video,
        BlockType::Pdf,
        BlockType::File,
        BlockType::Audio,
        BlockType::Divider,
        BlockType::Breadcrumb,
        BlockType::TableOfContents,
        BlockType::Table,
        BlockType::TableRow,
    ];

    /// Name used by the Notion API
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading1 => "heading_1",
            BlockType::Heading2 => "heading_2",
            BlockType::Heading3 => "heading_3",
            BlockType::BulletedListItem => "bulleted_list_item",
            BlockType::NumberedListItem => "numbered_list_item",
            BlockType::Quote => "quote",
            BlockType::Toggle => "toggle",
            BlockType::ToDo => "to_do",
            BlockType::Callout => "callout",
            BlockType::Code => "code",
            BlockType::Equation => "equation",
            BlockType::Bookmark => "bookmark",
            BlockType::Embed => "embed",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Pdf => "pdf",
            BlockType::File => "file",
            BlockType::Audio => "audio",
            BlockType::Divider => "divider",
            BlockType::Breadcrumb => "breadcrumb",
            BlockType::TableOfContents => "table_of_contents",
            BlockType::Table => "table",
            BlockType::TableRow => "table_row",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedBlockType {
                block_type: s.to_string(),
            })
    }
}

/// Text blocks: paragraph, list items, quote, toggle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_toggleable: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToDoBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalloutBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bookmark and embed blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Externally hosted file reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Image, video, pdf, file and audio blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOfContentsBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_column_header: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_row_header: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRowBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<Vec<Value>>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Divider and breadcrumb blocks carry no fields of their own
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyBlock {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payloads with a passthrough map
trait Passthrough {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

macro_rules! impl_passthrough {
    ($($payload:ty),+ $(,)?) => {
        $(
            impl Passthrough for $payload {
                fn extra_mut(&mut self) -> &mut Map<String, Value> {
                    &mut self.extra
                }
            }
        )+
    };
}

impl_passthrough!(
    RichTextBlock,
    HeadingBlock,
    ToDoBlock,
    CalloutBlock,
    CodeBlock,
    EquationBlock,
    LinkBlock,
    FileBlock,
    TableOfContentsBlock,
    TableBlock,
    TableRowBlock,
    EmptyBlock,
);

/// New content for a block, keyed by block type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockContent {
    #[serde(rename = "paragraph")]
    Paragraph(RichTextBlock),
    #[serde(rename = "heading_1")]
    Heading1(HeadingBlock),
    #[serde(rename = "heading_2")]
    Heading2(HeadingBlock),
    #[serde(rename = "heading_3")]
    Heading3(HeadingBlock),
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem(RichTextBlock),
    #[serde(rename = "numbered_list_item")]
    NumberedListItem(RichTextBlock),
    #[serde(rename = "quote")]
    Quote(RichTextBlock),
    #[serde(rename = "toggle")]
    Toggle(RichTextBlock),
    #[serde(rename = "to_do")]
    ToDo(ToDoBlock),
    #[serde(rename = "callout")]
    Callout(CalloutBlock),
    #[serde(rename = "code")]
    Code(CodeBlock),
    #[serde(rename = "equation")]
    Equation(EquationBlock),
    #[serde(rename = "bookmark")]
    Bookmark(LinkBlock),
    #[serde(rename = "embed")]
    Embed(LinkBlock),
    #[serde(rename = "image")]
    Image(FileBlock),
    #[serde(rename = "video")]
    Video(FileBlock),
    #[serde(rename = "pdf")]
    Pdf(FileBlock),
    #[serde(rename = "file")]
    File(FileBlock),
    #[serde(rename = "audio")]
    Audio(FileBlock),
    #[serde(rename = "divider")]
    Divider(EmptyBlock),
    #[serde(rename = "breadcrumb")]
    Breadcrumb(EmptyBlock),
    #[serde(rename = "table_of_contents")]
    TableOfContents(TableOfContentsBlock),
    #[serde(rename = "table")]
    Table(TableBlock),
    #[serde(rename = "table_row")]
    TableRow(TableRowBlock),
}

impl BlockContent {
    /// Build the variant named by `block_type` from a caller's content object
    pub fn from_parts(
        block_type: &str,
        content: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let block_type: BlockType = block_type.parse()?;

        Ok(match block_type {
            BlockType::Paragraph => BlockContent::Paragraph(decode(block_type, content)?),
            BlockType::Heading1 => BlockContent::Heading1(decode(block_type, content)?),
            BlockType::Heading2 => BlockContent::Heading2(decode(block_type, content)?),
            BlockType::Heading3 => BlockContent::Heading3(decode(block_type, content)?),
            BlockType::BulletedListItem => {
                BlockContent::BulletedListItem(decode(block_type, content)?)
            }
            BlockType::NumberedListItem => {
                BlockContent::NumberedListItem(decode(block_type, content)?)
            }
            BlockType::Quote => BlockContent::Quote(decode(block_type, content)?),
            BlockType::Toggle => BlockContent::Toggle(decode(block_type, content)?),
            BlockType::ToDo => BlockContent::ToDo(decode(block_type, content)?),
            BlockType::Callout => BlockContent::Callout(decode(block_type, content)?),
            BlockType::Code => BlockContent::Code(decode(block_type, content)?),
            BlockType::Equation => BlockContent::Equation(decode(block_type, content)?),
            BlockType::Bookmark => BlockContent::Bookmark(decode(block_type, content)?),
            BlockType::Embed => BlockContent::Embed(decode(block_type, content)?),
            BlockType::Image => BlockContent::Image(decode(block_type, content)?),
            BlockType::Video => BlockContent::Video(decode(block_type, content)?),
            BlockType::Pdf => BlockContent::Pdf(decode(block_type, content)?),
            BlockType::File => BlockContent::File(decode(block_type, content)?),
            BlockType::Audio => BlockContent::Audio(decode(block_type, content)?),
            BlockType::Divider => BlockContent::Divider(decode(block_type, content)?),
            BlockType::Breadcrumb => BlockContent::Breadcrumb(decode(block_type, content)?),
            BlockType::TableOfContents => {
                BlockContent::TableOfContents(decode(block_type, content)?)
            }
            BlockType::Table => BlockContent::Table(decode(block_type, content)?),
            BlockType::TableRow => BlockContent::TableRow(decode(block_type, content)?),
        })
    }
}

fn decode<T>(block_type: BlockType, content: Map<String, Value>) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Passthrough,
{
    let nulls: Vec<String> = content
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(key, _)| key.clone())
        .collect();

    let mut payload: T = serde_json::from_value(Value::Object(content)).map_err(|e| {
        ValidationError::InvalidArguments {
            message: format!("invalid content for {} block: {}", block_type, e),
        }
    })?;

    let extra = payload.extra_mut();
    for key in nulls {
        extra.entry(key).or_insert(Value::Null);
    }

    Ok(payload)
}
