//! Bridge from Bevy's `tracing` spans to Micromegas thread-local spans.
//!
//! With the `trace` feature Bevy opens a `tracing` span for every schedule
//! run and every system execution. This layer forwards the schedule spans
//! and the spans of this crate's own systems as Micromegas named scopes, so
//! a fixed tick shows up in the timeline as `FixedUpdate` with the chase
//! systems nested under it. Engine-internal system spans are skipped.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

micromegas_tracing::static_span_location!(BRIDGE_LOCATION);

/// Module path prefix of the systems worth a scope of their own.
const CRATE_PREFIX: &str = "ghost_chase::";

/// Interned scope name stored in a bridged span's extensions.
struct BridgedScope {
    name: &'static str,
}

/// Pulls the `name` field out of a span's attributes.
#[derive(Default)]
struct NameVisitor {
    name: Option<String>,
}

impl Visit for NameVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "name" {
            self.name = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" && self.name.is_none() {
            self.name = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }
}

/// Scope label for a span, or `None` when the span is not bridged.
pub fn scope_label(span_kind: &str, name: &str) -> Option<String> {
    match span_kind {
        "schedule" => Some(name.to_string()),
        "system" => name
            .strip_prefix(CRATE_PREFIX)
            .map(|path| path.replace("::", "/")),
        _ => None,
    }
}

/// A `tracing_subscriber::Layer` that turns schedule and simulation system
/// spans into Micromegas named-scope events.
pub struct MicromegasBridgeLayer;

impl<S> Layer<S> for MicromegasBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let kind = attrs.metadata().name();
        if kind != "schedule" && kind != "system" {
            return;
        }

        let mut visitor = NameVisitor::default();
        attrs.record(&mut visitor);
        let Some(label) = visitor.name.and_then(|name| scope_label(kind, &name)) else {
            return;
        };

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(BridgedScope {
                name: intern_string(&label),
            });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(scope) = span.extensions().get::<BridgedScope>()
        {
            on_begin_named_scope(&BRIDGE_LOCATION, scope.name);
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(scope) = span.extensions().get::<BridgedScope>()
        {
            on_end_named_scope(&BRIDGE_LOCATION, scope.name);
        }
    }
}
