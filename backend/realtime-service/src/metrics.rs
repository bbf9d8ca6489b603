use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "realtime_service_http_requests_total",
            "Total HTTP requests handled by realtime-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create realtime_service_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register realtime_service_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "realtime_service_http_request_duration_seconds",
            "HTTP request latency for realtime-service",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .expect("failed to create realtime_service_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register realtime_service_http_request_duration_seconds");
    histogram
});

static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_gauge(
        "realtime_service_active_sessions",
        "Live WebSocket sessions, authenticated or not",
    )
});

static AUTHENTICATED_USERS: Lazy<IntGauge> = Lazy::new(|| {
    register_gauge(
        "realtime_service_authenticated_users",
        "Users with a registered session",
    )
});

static NOTIFICATIONS_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_counter(
        "realtime_service_notifications_delivered_total",
        "Events handed to a session mailbox",
    )
});

static NOTIFICATIONS_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_counter(
        "realtime_service_notifications_dropped_total",
        "Targeted notifications dropped because the user had no session",
    )
});

fn register_gauge(name: &str, help: &str) -> IntGauge {
    let gauge = IntGauge::new(name, help).expect("failed to create gauge");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register gauge");
    gauge
}

fn register_counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("failed to create counter");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register counter");
    counter
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn set_connection_gauges(active_sessions: usize, authenticated_users: usize) {
    ACTIVE_SESSIONS.set(active_sessions as i64);
    AUTHENTICATED_USERS.set(authenticated_users as i64);
}

pub fn record_delivered(count: usize) {
    NOTIFICATIONS_DELIVERED_TOTAL.inc_by(count as u64);
}

pub fn record_dropped() {
    NOTIFICATIONS_DROPPED_TOTAL.inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::Instant;

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Route pattern keeps user ids out of the label set.
        let path = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(response) => {
                    observe_http_request(&method, &path, response.status().as_u16(), elapsed);
                }
                Err(_) => {
                    observe_http_request(&method, &path, 500, elapsed);
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn test_metrics_endpoint_exposes_connection_gauges() {
        set_connection_gauges(3, 2);
        record_delivered(1);
        record_dropped();

        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware)
                .route("/metrics", web::get().to(serve_metrics)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request())
            .await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("realtime_service_active_sessions"));
        assert!(text.contains("realtime_service_authenticated_users"));
        assert!(text.contains("realtime_service_notifications_dropped_total"));
    }
}
