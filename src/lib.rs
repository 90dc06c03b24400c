//! # trellis
//!
//! A small HTTP starter kit for personal web servers: ordered routes with
//! `{name}` path variables, onion-ordered middleware, and a hyper server with
//! graceful shutdown.
//!
//! ## How a request flows
//!
//! ```text
//! request ─▶ global middleware (first added runs first)
//!          ─▶ routes, in registration order; the first whose checks all pass wins
//!          ─▶ that route's own middleware ─▶ handler
//! response ◀─ back out through the same layers in reverse
//! ```
//!
//! No route matching is a normal outcome, answered by the not-found handler.
//! Sessions, CSRF tokens, templates and the database are left to you; a
//! handler returns a [`Response`], and anything that can render HTML can fill
//! one with [`Response::html`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::middleware::{MethodOverride, Trace};
//! use trellis::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .layer(Trace)
//!         .layer(MethodOverride::new())
//!         .get("/posts/{id}",    show_post)
//!         .delete("/posts/{id}", delete_post)
//!         .build();
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn show_post(req: Request) -> Response {
//!     match req.param_as::<u64>("id") {
//!         Some(id) => Response::html(format!("<h1>post {id}</h1>")),
//!         None => Response::not_found(),
//!     }
//! }
//!
//! async fn delete_post(_req: Request) -> Response {
//!     Response::redirect("/")
//! }
//! ```

mod check;
mod config;
mod error;
mod handler;
mod params;
mod pattern;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;

pub use http::{Method, StatusCode};

pub use check::{MethodCheck, PathCheck, RouteCheck};
pub use config::{Config, ConfigError};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use params::Params;
pub use pattern::{Pattern, PatternError};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::Route;
pub use router::{App, Router};
pub use server::Server;
