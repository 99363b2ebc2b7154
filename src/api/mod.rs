//! HTTP query surface for both dashboard modes.

mod error;
mod feed;
mod health;
mod proxy;
mod server;

pub use error::ApiError;
pub use feed::{feed_router, FeedState};
pub use proxy::{proxy_router, ProxyState};
pub use server::serve;
