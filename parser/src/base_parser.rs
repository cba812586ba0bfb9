use crate::{ParseError, StreamIdentity};

/// Base trait that every naming scheme implements
pub trait IdentityParser: Send + Sync {
    /// Returns the name of this scheme (e.g., "stream-path", "task-definition")
    fn name(&self) -> &'static str;

    /// Checks if this scheme applies to the given stream id / group name pair
    fn can_parse(&self, stream_id: &str, group_name: &str) -> bool;

    /// Recover the identity. Only called after `can_parse` returned true.
    fn parse(&self, stream_id: &str, group_name: &str) -> Result<StreamIdentity, ParseError>;
}

/// Shape of a stream id, judged by its `/`-separated segment count
pub fn detect_layout(stream_id: &str) -> LayoutHint {
    match stream_id.split('/').count() {
        6 => LayoutHint::SixSegment,
        5 => LayoutHint::FiveSegment,
        _ => LayoutHint::Unstructured,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutHint {
    /// `platform/environment/project/app/task/revision`
    SixSegment,
    /// `platform/environment/project/task/revision`
    FiveSegment,
    Unstructured,
}
