use http::StatusCode;
use micro_route::{handler_fn, BoxError, Context, Router, Server};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct Search {
    name: String,
}

// curl -v http://127.0.0.1:8080/users/7/posts/99
async fn show_post(ctx: &mut Context) -> String {
    let user = ctx.params().get("userId").unwrap_or("?").to_owned();
    let post = ctx.params().get("postId").unwrap_or("?").to_owned();
    format!("user {user}, post {post}\r\n")
}

// curl -v 'http://127.0.0.1:8080/search?name=zava'
async fn search(ctx: &mut Context) -> Result<String, BoxError> {
    let query = ctx.uri().query().unwrap_or("");
    let search: Search = serde_urlencoded::from_str(query)?;
    Ok(format!("searching for {}\r\n", search.name))
}

// curl -v -X POST http://127.0.0.1:8080/things
async fn create_thing(ctx: &mut Context) -> &'static str {
    ctx.status(StatusCode::CREATED);
    "created\r\n"
}

// curl -v http://127.0.0.1:8080/old
async fn relocate(ctx: &mut Context) {
    ctx.redirect("/users/7/posts/99");
}

async fn trace_requests(ctx: &mut Context) {
    tracing::info!(method = %ctx.method(), path = ctx.path(), "inbound request");
    ctx.header("x-powered-by", "micro-route");
}

#[tokio::main]
async fn main() {
    let router = Router::builder()
        .middleware("/users/:userId/posts/:postId", handler_fn(trace_requests))
        .get("/users/:userId/posts/:postId", handler_fn(show_post))
        .get("/search", handler_fn(search))
        .post("/things", handler_fn(create_thing))
        .get("/old", handler_fn(relocate))
        .build()
        .expect("route table should compile");

    Server::builder()
        .router(router)
        .address("127.0.0.1:8080")
        .build()
        .unwrap()
        .start()
        .await;
}
