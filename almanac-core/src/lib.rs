pub mod config;
pub mod discord;
pub mod graph;
pub mod links;
pub mod markdown;
pub mod mention;
pub mod output;
pub mod page;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod site;
pub mod template;

// Re-export main types
pub use graph::{GraphError, PageGraph};
pub use markdown::Markdown;
pub use mention::{MentionResolver, ResolveError};
pub use output::{OutputError, output_all_pages};
pub use page::{Page, PageMeta};
pub use parser::{PageParser, ParseError};
pub use scanner::{ScanError, SiteScanner};
pub use site::Wiki;
pub use template::{TemplateError, Templates};
