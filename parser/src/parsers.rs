//! Central naming scheme registration module
//!
//! Schemes are tried in the order returned here. Structured schemes go first;
//! the legacy task definition scheme accepts every input and must stay last.

use crate::base_parser::IdentityParser;
use crate::{StreamPathParser, TaskDefinitionParser};
use tracing::debug;

/// Returns all available naming schemes in priority order.
///
/// ```rust,ignore
/// pub fn all_parsers() -> Vec<Box<dyn IdentityParser>> {
///     vec![
///         Box::new(StreamPathParser) as Box<dyn IdentityParser>,
///         Box::new(KubernetesPodParser) as Box<dyn IdentityParser>,  // <-- new scheme
///         Box::new(TaskDefinitionParser) as Box<dyn IdentityParser>,
///     ]
/// }
/// ```
pub fn all_parsers() -> Vec<Box<dyn IdentityParser>> {
    debug!("Initializing naming scheme collection");

    vec![
        Box::new(StreamPathParser) as Box<dyn IdentityParser>,
        Box::new(TaskDefinitionParser) as Box<dyn IdentityParser>,
    ]
}
