//! Identity infrastructure module
//!
//! Google and Yandex implementations of `IdentityProvider` over a mockable
//! HTTP client.

mod google;
pub mod http_client;
mod oauth;
mod yandex;

pub use google::GoogleIdentityProvider;
pub use http_client::{HttpClient, HttpClientTrait};
pub use oauth::OAuthClientConfig;
pub use yandex::YandexIdentityProvider;
