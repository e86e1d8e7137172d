pub mod models;
pub mod normalize;
pub mod parser;
pub mod prompts;

pub use models::*;
pub use normalize::{clean_text, remove_stopwords, tokenize_text, PORTUGUESE_STOPWORDS};
pub use parser::{parse_classification, ParseError};
pub use prompts::{build_classification_prompt, build_reply_prompt};
