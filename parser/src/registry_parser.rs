use crate::base_parser::IdentityParser;
use crate::parsers::all_parsers;
use crate::{ParseError, ParseOutcome};
use std::sync::OnceLock;
use tracing::{debug, info, trace, warn};

/// ParserRegistry - holds the known naming schemes and picks one per input
///
/// To add a scheme, modify `parsers.rs`; nothing here needs to change.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn IdentityParser>>,
}

impl ParserRegistry {
    /// Create a new registry with all schemes from the central registry
    pub fn new() -> Self {
        let parsers = all_parsers();

        info!(
            "Registered {} naming schemes: {}",
            parsers.len(),
            parsers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );

        Self { parsers }
    }

    /// Register a custom scheme ahead of the built-in ones
    pub fn register(&mut self, parser: Box<dyn IdentityParser>) {
        info!("Registering custom naming scheme: {}", parser.name());
        self.parsers.insert(0, parser);
    }

    /// Get scheme by name
    pub fn get_parser(&self, name: &str) -> Option<&dyn IdentityParser> {
        let result = self.parsers.iter().find(|p| p.name() == name).map(|p| p.as_ref());

        if result.is_none() {
            warn!("Naming scheme not found: {}", name);
        }

        result
    }

    /// Resolve the identity of a stream. Never fails: input no scheme can
    /// make sense of comes back as `ParseOutcome::Unparseable`.
    pub fn parse(&self, stream_id: &str, group_name: &str) -> ParseOutcome {
        let Some(parser) = self.parsers.iter().find(|p| {
            let can_parse = p.can_parse(stream_id, group_name);
            trace!("Scheme '{}' can_parse result: {}", p.name(), can_parse);
            can_parse
        }) else {
            return unparseable(stream_id, group_name, ParseError::NoMatchingScheme);
        };

        match parser.parse(stream_id, group_name) {
            Ok(identity) => {
                debug!(
                    "Stream '{}' in group '{}' resolved by '{}' to {}/{}/{}",
                    stream_id,
                    group_name,
                    parser.name(),
                    identity.environment,
                    identity.project,
                    identity.task
                );
                ParseOutcome::Parsed(identity)
            }
            Err(e) => unparseable(stream_id, group_name, e),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unparseable(stream_id: &str, group_name: &str, reason: ParseError) -> ParseOutcome {
    warn!(
        "Unparseable stream identity (stream '{}', group '{}'): {}",
        stream_id, group_name, reason
    );
    ParseOutcome::Unparseable {
        raw_stream_id: stream_id.to_string(),
        raw_group_name: group_name.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse with the process-wide default registry
pub fn parse_stream_identity(stream_id: &str, group_name: &str) -> ParseOutcome {
    static DEFAULT_REGISTRY: OnceLock<ParserRegistry> = OnceLock::new();
    DEFAULT_REGISTRY
        .get_or_init(ParserRegistry::new)
        .parse(stream_id, group_name)
}
