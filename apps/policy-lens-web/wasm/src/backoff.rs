use async_trait::async_trait;
use policy_engine::remote::retry::Backoff;
use std::time::Duration;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// Waits on `setTimeout`, so retries never block the page
pub struct TimerBackoff;

#[async_trait(?Send)]
impl Backoff for TimerBackoff {
    async fn wait(&self, delay: Duration) {
        let millis = delay.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|window| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .is_ok()
            });
            if scheduled {
                return;
            }
            tracing::warn!(millis, "could not schedule retry timer, retrying immediately");
            if let Err(err) = resolve.call0(&JsValue::NULL) {
                tracing::warn!(error = ?err, "resolving retry wait failed");
            }
        });
        if let Err(err) = JsFuture::from(promise).await {
            tracing::warn!(error = ?err, "retry wait was rejected");
        }
    }
}
