//! API-wrapper tool family (spec §4.3): thin, resilient bindings over
//! third-party HTTP APIs, each a self-contained [`gateway_traits::Service`]
//! registered through [`gateway_traits::ServiceFactory`].

pub(crate) mod shared;

pub mod exchange_rate;
pub mod google_calendar;
pub mod ip_info;
pub mod notion;
pub mod slack;
pub mod weather;
pub mod web_search;

pub use exchange_rate::ExchangeRateService;
pub use google_calendar::GoogleCalendarService;
pub use ip_info::IpInfoService;
pub use notion::NotionService;
pub use slack::SlackService;
pub use weather::WeatherService;
pub use web_search::WebSearchService;
