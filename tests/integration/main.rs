//! End-to-end bot sessions against the in-memory exchange.

mod hawkeye_session;
mod mock_exchange;
mod randy_session;
