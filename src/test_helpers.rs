//! Scripted command channel and board doubles for unit tests.

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use atat::{asynch::AtatClient, AtatCmd};
use embassy_time::Duration;

use crate::{
    config::{CellularConfig, NoPin},
    modules::{ContextOperation, ModuleParams, GENERIC_PROPERTIES},
    properties::PropertyTable,
    AtHandle,
};

/// Records every written command and answers with scripted response bytes,
/// parsed through the command's own `parse`. An exhausted script answers
/// with a timeout.
#[derive(Debug, Default)]
pub struct MockAtClient {
    pub sent: Vec<String>,
    responses: VecDeque<Result<Vec<u8>, atat::Error>>,
}

impl MockAtClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next command with `resp`, the information text between
    /// the echo and the final `OK`.
    pub fn ok(mut self, resp: &[u8]) -> Self {
        self.responses.push_back(Ok(resp.to_vec()));
        self
    }

    pub fn err(mut self, e: atat::Error) -> Self {
        self.responses.push_back(Err(e));
        self
    }
}

impl AtatClient for MockAtClient {
    async fn send<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Result<Cmd::Response, atat::Error> {
        let mut buf = vec![0u8; Cmd::MAX_LEN];
        let len = cmd.write(&mut buf);
        let text = String::from_utf8_lossy(&buf[..len]);
        self.sent.push(text.trim_end().to_string());

        match self.responses.pop_front() {
            Some(Ok(resp)) => cmd.parse(Ok(resp.as_slice())),
            Some(Err(e)) => Err(e),
            None => Err(atat::Error::Timeout),
        }
    }
}

/// Commands written so far.
pub fn sent(at: &AtHandle<'_, MockAtClient>) -> Vec<String> {
    embassy_futures::block_on(at.0.lock()).client.sent.clone()
}

/// Extend the script of a channel already handed to a device.
pub fn script(at: &AtHandle<'_, MockAtClient>, f: impl FnOnce(MockAtClient) -> MockAtClient) {
    let mut ch = embassy_futures::block_on(at.0.lock());
    let client = core::mem::take(&mut ch.client);
    ch.client = f(client);
}

pub struct TestConfig;

impl CellularConfig for TestConfig {
    type ResetPin = NoPin;
    type PowerPin = NoPin;
    type VintPin = NoPin;

    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin> {
        None
    }
    fn power_pin(&mut self) -> Option<&mut Self::PowerPin> {
        None
    }
    fn vint_pin(&mut self) -> Option<&mut Self::VintPin> {
        None
    }
}

/// Profile with every wait shortened to keep tests fast.
#[derive(Debug, Clone, Copy)]
pub struct TestModule;

impl ModuleParams for TestModule {
    fn power_off_pull_time(&self) -> Duration {
        Duration::from_millis(1)
    }
    fn boot_wait(&self) -> Duration {
        Duration::from_millis(1)
    }
    fn reset_hold(&self) -> Duration {
        Duration::from_millis(1)
    }
    fn command_retry_backoff(&self) -> Duration {
        Duration::from_millis(1)
    }
    fn properties(&self) -> PropertyTable {
        GENERIC_PROPERTIES
    }
    fn operation_timeout(&self, _op: ContextOperation) -> Duration {
        Duration::from_millis(50)
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
