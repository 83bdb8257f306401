//! Entry nodes: configured text and repository content

mod repository_source;
mod text_input;

pub use repository_source::{parse_repository, repository_source, RepositoryConfigError};
pub use text_input::text_input;
