// Parser crate for CloudWatch log shipping
// Resolves stream identities through a registry of naming schemes and
// decodes subscription payloads

pub mod types;
pub mod base_parser;
pub mod registry_parser;
pub mod awslogs;

mod parsers;

// Naming scheme implementations
pub mod stream_path_parser;
pub mod task_definition_parser;

// Re-export main types
pub use types::*;
pub use base_parser::{IdentityParser, LayoutHint};
pub use registry_parser::{parse_stream_identity, ParserRegistry};
pub use awslogs::{decode_awslogs, AwsLogs, SubscriptionEvent};

// Re-export schemes
pub use stream_path_parser::StreamPathParser;
pub use task_definition_parser::TaskDefinitionParser;
