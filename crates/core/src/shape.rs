//! Shape tree of a slide, independent of the container format.

use serde::{Deserialize, Serialize};

/// A positioned element on a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// A shape with a text body, optionally filling a layout placeholder.
    TextFrame {
        placeholder: Option<PlaceholderKind>,
        paragraphs: Vec<Paragraph>,
    },
    /// A table; one entry per row, one string per cell.
    Table { rows: Vec<Vec<String>> },
    /// A group of shapes.
    Group { children: Vec<Shape> },
    /// Pictures, connectors, charts and anything else without text.
    Other,
}

impl Shape {
    /// Convenience constructor for a text frame.
    pub fn text_frame(placeholder: Option<PlaceholderKind>, paragraphs: Vec<Paragraph>) -> Self {
        Shape::TextFrame {
            placeholder,
            paragraphs,
        }
    }
}

/// One paragraph of a text body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    /// Outline level; 0 for top-level text.
    pub level: u32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: 0,
        }
    }

    pub fn with_level(text: impl Into<String>, level: u32) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// Role of a layout placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderKind {
    Title,
    CenterTitle,
    Subtitle,
    /// Body or generic content placeholder.
    Body,
    SlideNumber,
    Footer,
    Date,
    Header,
    SlideImage,
    Other,
}

impl PlaceholderKind {
    /// Map an OOXML `p:ph/@type` value. A placeholder without a type is a
    /// generic object placeholder, which carries body content.
    pub fn from_ooxml(value: Option<&str>) -> Self {
        match value {
            None | Some("body") | Some("obj") => Self::Body,
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenterTitle,
            Some("subTitle") => Self::Subtitle,
            Some("sldNum") => Self::SlideNumber,
            Some("ftr") => Self::Footer,
            Some("dt") => Self::Date,
            Some("hdr") => Self::Header,
            Some("sldImg") => Self::SlideImage,
            Some(_) => Self::Other,
        }
    }

    /// Whether this placeholder holds the slide title.
    pub fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle)
    }

    /// Whether this placeholder only carries layout chrome (numbers, dates, thumbnails).
    pub fn is_chrome(self) -> bool {
        matches!(
            self,
            Self::SlideNumber | Self::Footer | Self::Date | Self::Header | Self::SlideImage
        )
    }
}
