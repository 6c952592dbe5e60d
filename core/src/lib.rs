pub mod ast;
pub mod config;
pub mod index;
pub mod line_context;
pub mod registry;
pub mod resolver;
pub mod token;
pub mod util;
pub mod workspace;

pub use ast::{Module, parse_source};
pub use config::AnalyzerConfig;
pub use index::{Completion, CompletionKind, Signature, SymbolIndex};
pub use line_context::{ChainLink, LineContext, analyze_line};
pub use workspace::{SourceUnit, Workspace};
