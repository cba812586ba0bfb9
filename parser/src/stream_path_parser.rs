use crate::base_parser::{detect_layout, IdentityParser, LayoutHint};
use crate::{ParseError, StreamIdentity, DEFAULT_APP};

/// Stream path parser - handles `/`-delimited stream ids with fixed field positions
/// Example: ecs/dev/net-messenger/main/web/4831a7cdac1248548c8ecbe2aeef4de3
pub struct StreamPathParser;

impl IdentityParser for StreamPathParser {
    fn name(&self) -> &'static str {
        "stream-path"
    }

    fn can_parse(&self, stream_id: &str, _group_name: &str) -> bool {
        detect_layout(stream_id) != LayoutHint::Unstructured
    }

    fn parse(&self, stream_id: &str, _group_name: &str) -> Result<StreamIdentity, ParseError> {
        let segments: Vec<&str> = stream_id.split('/').collect();

        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(ParseError::EmptySegment {
                stream_id: stream_id.to_string(),
                position,
            });
        }

        match segments.as_slice() {
            [platform, environment, project, app, task, revision] => Ok(StreamIdentity {
                platform: platform.to_string(),
                environment: (*environment).into(),
                project: project.to_string(),
                app: app.to_string(),
                task: (*task).into(),
                revision: revision.to_string(),
            }),
            // legacy streams never had a distinct app segment
            [platform, environment, project, task, revision] => Ok(StreamIdentity {
                platform: platform.to_string(),
                environment: (*environment).into(),
                project: project.to_string(),
                app: DEFAULT_APP.to_string(),
                task: (*task).into(),
                revision: revision.to_string(),
            }),
            _ => Err(ParseError::NoMatchingScheme),
        }
    }
}
