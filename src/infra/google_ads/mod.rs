// =============================================================================
// GOOGLE ADS MODULE
// =============================================================================
//
// REST implementation of the core `AdsPlatform` port.
//
// - `oauth`  : refresh-token exchange and access-token caching
// - `gaql`   : the query strings we send to `googleAds:search`
// - `wire`   : serde shapes of requests/responses and their core mapping
// - `google_ads_client` : the HTTP calls, paging and error classification
//
// Requests carry `developer-token` and, when a manager account is configured,
// `login-customer-id`.

pub mod gaql;
pub mod google_ads_client;
pub mod oauth;
pub mod wire;

pub use google_ads_client::{normalize_customer_id, GoogleAdsRestClient, DEFAULT_API_VERSION};
pub use oauth::GoogleAdsCredentials;
