use micro_route::{handler_fn, Context, Router, Server};

async fn hello_world(_ctx: &mut Context) -> &'static str {
    "hello world\r\n"
}

#[tokio::main]
async fn main() {
    let router = Router::builder()
        .get("/", handler_fn(hello_world))
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
