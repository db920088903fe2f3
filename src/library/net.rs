//! Network IO kernels.

use std::sync::LazyLock;

use futures::future::BoxFuture;

use crate::block::Interrupt;
use crate::message::Message;
use crate::spec::{async_kernel, pins, KernelIo, Spec};

// One shared client keeps connection pooling across every GET block.
static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// HTTP GET with a header object. The 2xx body is emitted as a string;
/// network failures and non-2xx statuses become error values. The
/// in-flight request races the interrupt channel so a stop is never
/// stuck behind a slow endpoint.
pub(super) fn get() -> Spec {
    fn kernel(io: KernelIo<'_>) -> BoxFuture<'_, Option<Interrupt>> {
        Box::pin(async move {
            let Some(url) = io.inputs[0].as_str() else {
                io.outputs
                    .insert(0, Message::error("GET requires a url string"));
                return None;
            };
            let Some(headers) = io.inputs[1].as_object() else {
                io.outputs
                    .insert(0, Message::error("GET requires a header object"));
                return None;
            };
            let mut request = CLIENT.get(url);
            for (name, value) in headers {
                let Some(value) = value.as_str() else {
                    io.outputs.insert(
                        0,
                        Message::error(format!("GET header {name:?} must be a string")),
                    );
                    return None;
                };
                request = request.header(name.as_str(), value);
            }

            let fetch = async {
                let response = request.send().await?;
                let response = response.error_for_status()?;
                response.text().await
            };
            tokio::select! {
                body = fetch => {
                    match body {
                        Ok(body) => {
                            io.outputs.insert(0, Message::String(body));
                        }
                        Err(err) => {
                            io.outputs.insert(0, Message::error(format!("GET: {err}")));
                        }
                    }
                    None
                }
                interrupt = io.control.recv() => interrupt.or(Some(Interrupt::Stop)),
            }
        })
    }
    Spec {
        name: "GET",
        inputs: pins(&["url", "headers"]),
        outputs: pins(&["body"]),
        kernel: async_kernel(kernel),
    }
}
