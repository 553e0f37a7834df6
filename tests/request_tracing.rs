use std::io;
use std::sync::{Arc, Mutex};

use questionnaire_api::build_routes;
use questionnaire_api::store::Store;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn every_route_gets_a_request_span() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let routes = build_routes(Store::in_memory());
    for path in ["/health", "/question/7", "/questionnaire/3"] {
        warp::test::request().path(path).reply(&routes).await;
    }

    let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    for path in ["/health", "/question/7", "/questionnaire/3"] {
        let span = format!("request{{method=GET path={} id=", path);
        assert!(output.contains(&span), "no span for {} in:\n{}", path, output);
    }
}
