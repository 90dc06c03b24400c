//! Minimal trellis app — HTML pages, a form that deletes via method override,
//! and a catch-all fallback.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!   TRELLIS_CONFIG=trellis.toml cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/posts/42
//!   curl -X POST http://localhost:3000/posts/42 -d '_method=DELETE'
//!   curl http://localhost:3000/anything-else

use trellis::middleware::{MethodOverride, Trace};
use trellis::{Config, Request, Response, Route, Router, Server, StatusCode};

#[tokio::main]
async fn main() -> Result<(), trellis::Error> {
    tracing_subscriber::fmt::init();

    let config = match std::env::var("TRELLIS_CONFIG") {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::default(),
    };

    let app = Router::new()
        .layer(Trace)
        .layer(MethodOverride::new().field(config.method_override_field.clone()))
        .get("/",              index)
        .get("/posts/{id}",    show_post)
        .delete("/posts/{id}", delete_post)
        // Zero checks: matches everything, so it goes last.
        .route(Route::new(fallback))
        .build();

    Server::with_config(config)?.serve(app).await
}

async fn index(_req: Request) -> Response {
    Response::html(
        r#"<form method="post" action="/posts/42">
  <input type="hidden" name="_method" value="DELETE">
  <button>delete post 42</button>
</form>"#,
    )
}

// GET /posts/{id}
async fn show_post(req: Request) -> Response {
    match req.param_as::<u64>("id") {
        Some(id) => Response::html(format!("<h1>Post {id}</h1>")),
        None => Response::not_found(),
    }
}

// DELETE /posts/{id} (or POST with _method=DELETE) → back to the index
async fn delete_post(req: Request) -> Response {
    tracing::info!(id = req.param("id"), "post deleted");
    Response::redirect("/")
}

async fn fallback(req: Request) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("nothing at {}", req.path()))
}
