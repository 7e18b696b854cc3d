//! Greeter: public endpoint for smoke-testing the RPC surface.

use axum::Json;

use crate::extract::RpcJson;
use crate::models::{SayHelloRequest, SayHelloResponse};

/// `GreeterService/SayHello`
pub async fn say_hello_handler(
    RpcJson(body): RpcJson<SayHelloRequest>,
) -> Json<SayHelloResponse> {
    Json(SayHelloResponse {
        message: format!("Hello, {}!", body.name),
    })
}
