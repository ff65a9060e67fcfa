//! Mock IFC parsing service.
//!
//! `POST /parse` answers with two walls for any file, except files whose
//! name starts with `broken`, which get a 422.

use std::net::TcpListener;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, post, web};
use serde_json::json;

pub struct MockIfcService {
    pub base_url: String,
}

#[post("/parse")]
async fn parse(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let filename = req
        .headers()
        .get("X-Filename")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if filename.starts_with("broken") || body.is_empty() {
        return HttpResponse::UnprocessableEntity().json(json!({
            "detail": "not an IFC file"
        }));
    }

    HttpResponse::Ok().json(json!({
        "elements": [
            {
                "globalId": "2O2Fr$t4X7Zf8NOew3FLOH",
                "type": "IfcWall",
                "name": "Exterior wall",
                "volume": 3.0,
                "materials": [
                    {"name": "Beton C30/37", "volume": 2.0},
                    {"name": "Steinwolle", "volume": 1.0}
                ]
            },
            {
                "globalId": "1kTvXnbbzCWw8lcMd1dR4o",
                "type": "IfcSlab",
                "materials": [
                    {"name": "Beton C30/37", "volume": 4.0}
                ]
            }
        ]
    }))
}

impl MockIfcService {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(|| App::new().service(parse))
            .workers(1)
            .listen(listener)
            .expect("failed to listen")
            .disable_signals()
            .run();

        tokio::spawn(server);

        MockIfcService {
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }
}
