pub mod http;
pub mod turnstile;
