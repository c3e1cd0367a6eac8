use chrono::{DateTime, Utc};

/// A fact about a change to an aggregate.
///
/// Events are produced by `Aggregate::handle` and consumed by
/// `Aggregate::apply`; nothing mutates them afterwards.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted `<context>.<entity>.<what happened>` name, e.g.
    /// `invoicing.line_item.added`. Stable across releases.
    fn event_type(&self) -> &'static str;

    /// Schema version of this event type's payload.
    fn version(&self) -> u32;

    /// Business time at which the triggering command was issued.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// `event_type` with the schema version appended (`...added@v1`), for logs.
    fn qualified_type(&self) -> String {
        format!("{}@v{}", self.event_type(), self.version())
    }
}
