//! End-to-end tests against a running viewer server.

mod helpers;
mod http_test;
mod ws_test;
