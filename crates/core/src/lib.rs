//! Core domain types, text loading, context assembly and chat session state
//! for chatting with an uploaded document.

pub mod context;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod normalize;
pub mod render;
pub mod session;
pub mod shape;
pub mod text;
pub mod types;

pub use context::{ContextAssembler, ExtractedContext};
pub use error::{Error, Result};
pub use extract::SlideExtractor;
pub use gateway::{ApiKey, ChatGateway, ChatMessage, ChatRequest, MessageRole};
pub use normalize::TextNormalizer;
pub use session::{ChatTurn, Role, Session};
pub use shape::{Paragraph, PlaceholderKind, Shape};
pub use text::{load_text, load_text_document};
pub use types::{Deck, Document, DocumentBody, DocumentKind, Slide, SlideFailure, Table};
