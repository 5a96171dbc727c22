#![allow(dead_code)]

/// Binds a mock server for the calling test, or ends the test early with
/// `Ok(())` when localhost sockets are unavailable.
macro_rules! require_mock_server {
    () => {
        match crate::support::fixtures::start_mock_server().await {
            Some(server) => server,
            None => return Ok(()),
        }
    };
}

pub mod fixtures;
