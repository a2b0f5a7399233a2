// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::SpanKind;
    use opentelemetry::{trace::Span as _, trace::Tracer, KeyValue};

    const INSTRUMENTATION_NAME: &str = "blackprint_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();

    struct Instruments {
        tracer: global::BoxedTracer,
        render_hist: Histogram<f64>,
        render_counter: Counter<u64>,
        import_counter: Counter<u64>,
    }

    impl Instruments {
        fn new() -> Self {
            let meter = global::meter(INSTRUMENTATION_NAME);
            Self {
                tracer: global::tracer(INSTRUMENTATION_NAME),
                render_hist: meter
                    .f64_histogram("blackprint.render.duration_ms")
                    .with_description("Template render duration in milliseconds")
                    .init(),
                render_counter: meter
                    .u64_counter("blackprint.render.count")
                    .with_description("Number of template renders")
                    .init(),
                import_counter: meter
                    .u64_counter("blackprint.import.count")
                    .with_description("Number of ref! imports resolved")
                    .init(),
            }
        }
    }

    fn instruments() -> &'static Instruments {
        INSTRUMENTS.get_or_init(Instruments::new)
    }

    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn record_render(template: &str, template_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let instruments = instruments();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("blackprint.template", template.to_string()),
            KeyValue::new("blackprint.source_len", template_len as i64),
            KeyValue::new("blackprint.ok", success),
        ];
        instruments.render_counter.add(1, &attrs);
        instruments.render_hist.record(duration_ms, &attrs);
        let span_attrs = attrs
            .into_iter()
            .chain([KeyValue::new("blackprint.duration_ms", duration_ms)]);
        emit_span(&instruments.tracer, "blackprint.render", span_attrs);
    }

    pub fn record_import(name: &str, success: bool) {
        if !enabled() {
            return;
        }
        let instruments = instruments();
        let attrs = [
            KeyValue::new("blackprint.import", name.to_string()),
            KeyValue::new("blackprint.ok", success),
        ];
        instruments.import_counter.add(1, &attrs);
        emit_span(&instruments.tracer, "blackprint.import", attrs);
    }

    fn emit_span(
        tracer: &global::BoxedTracer,
        name: &'static str,
        attrs: impl IntoIterator<Item = KeyValue>,
    ) {
        let mut span = tracer
            .span_builder(name)
            .with_kind(SpanKind::Internal)
            .start(tracer);
        for attr in attrs {
            span.set_attribute(attr);
        }
        span.end();
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    pub fn enable() {}
    pub fn disable() {}
    pub fn record_render(
        _template: &str,
        _template_len: usize,
        _duration: Duration,
        _success: bool,
    ) {
    }
    pub fn record_import(_name: &str, _success: bool) {}
}

pub use otel::{disable, enable, record_import, record_render};
