use crate::base_parser::IdentityParser;
use crate::{Environment, ParseError, StreamIdentity, TaskRole, DEFAULT_APP, UNKNOWN_REVISION};
use tracing::trace;

const ECS_PREFIX: &str = "/ecs/";
const ECS_PLATFORM: &str = "ecs";
const TASK_DEFINITION_SUFFIX: &str = "-td";

/// Task definition parser - recovers identity from legacy ECS log group names
///
/// Group names are hyphen-joined tokens with the environment and task role
/// embedded in either order, e.g. `/ecs/alta-customer-manager-staging-worker-td`
/// or `/ecs/alta-customer-manager-worker-staging-td`. Older groups omit one or
/// both markers (`/ecs/veritas-td`).
pub struct TaskDefinitionParser;

impl IdentityParser for TaskDefinitionParser {
    fn name(&self) -> &'static str {
        "task-definition"
    }

    /// Fallback scheme, accepts anything
    fn can_parse(&self, _stream_id: &str, _group_name: &str) -> bool {
        true
    }

    fn parse(&self, _stream_id: &str, group_name: &str) -> Result<StreamIdentity, ParseError> {
        let mut tokens = tokenize(group_name);
        trace!("Group '{}' tokenized as {:?}", group_name, tokens);

        let environment = take_marker(&mut tokens, Environment::from_token)
            .unwrap_or_else(Environment::legacy_default);
        let task = take_marker(&mut tokens, TaskRole::from_token)
            .unwrap_or_else(TaskRole::legacy_default);

        let project = tokens.join("-").trim_end_matches('-').to_string();
        if project.is_empty() {
            return Err(ParseError::EmptyProject(group_name.to_string()));
        }

        Ok(StreamIdentity {
            platform: ECS_PLATFORM.to_string(),
            environment,
            project,
            app: DEFAULT_APP.to_string(),
            task,
            revision: UNKNOWN_REVISION.to_string(),
        })
    }
}

/// Strips the platform prefix and task definition suffix, then splits on `-`
fn tokenize(group_name: &str) -> Vec<&str> {
    let name = group_name.strip_prefix(ECS_PREFIX).unwrap_or(group_name);
    let name = name.strip_suffix(TASK_DEFINITION_SUFFIX).unwrap_or(name);
    name.split('-').collect()
}

/// Removes the first token that `matcher` recognizes and returns its value.
/// The leading token is the start of the project name and never a marker.
fn take_marker<T>(tokens: &mut Vec<&str>, matcher: impl Fn(&str) -> Option<T>) -> Option<T> {
    let (index, value) = tokens
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(index, token)| matcher(token).map(|value| (index, value)))?;
    tokens.remove(index);
    Some(value)
}
