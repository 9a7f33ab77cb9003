#![allow(dead_code)]

//! Scripted fake driver for session and orchestrator tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tubepilot_core::{Error, Result};
use tubepilot_driver::{DriverFactory, LaunchOptions, PageDriver};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(LaunchOptions),
    Stop,
    Navigate(String),
    Run(String),
    Eval(String),
    Refresh,
}

#[derive(Default)]
struct FakeState {
    launch: Option<LaunchOptions>,
    calls: Vec<Call>,
    eval_results: VecDeque<Value>,
    fail_eval: bool,
    title: String,
}

/// A `PageDriver` that records every call and replays scripted eval
/// results.
#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        let driver = Self::default();
        driver.state.lock().unwrap().title = "Fake Video".to_string();
        Arc::new(driver)
    }

    /// Queue a result for the next `eval_script` call. Unqueued evals
    /// return JSON null.
    pub fn push_eval(&self, value: Value) {
        self.state.lock().unwrap().eval_results.push_back(value);
    }

    pub fn set_fail_eval(&self, fail: bool) {
        self.state.lock().unwrap().fail_eval = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn run_scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Run(src) => Some(src),
                _ => None,
            })
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::Refresh)).count()
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn start(&self, launch: &LaunchOptions) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(active) = &state.launch {
            if active == launch {
                return Ok(());
            }
            return Err(Error::ConfigurationChanged);
        }
        state.launch = Some(launch.clone());
        state.calls.push(Call::Start(launch.clone()));
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.launch.take().is_some() {
            state.calls.push(Call::Stop);
        }
        Ok(())
    }

    async fn active_launch(&self) -> Option<LaunchOptions> {
        self.state.lock().unwrap().launch.clone()
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.launch.is_none() {
            state.launch = Some(LaunchOptions::default());
            state.calls.push(Call::Start(LaunchOptions::default()));
        }
        state.calls.push(Call::Navigate(url.to_string()));
        Ok(())
    }

    async fn run_script(&self, src: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.launch.is_none() {
            return Ok(());
        }
        state.calls.push(Call::Run(src.to_string()));
        Ok(())
    }

    async fn eval_script(&self, src: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        if state.fail_eval {
            return Err(Error::Driver("scripted eval failure".to_string()));
        }
        if state.launch.is_none() {
            return Err(Error::Driver("driver not started".to_string()));
        }
        state.calls.push(Call::Eval(src.to_string()));
        Ok(state.eval_results.pop_front().unwrap_or(Value::Null))
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.launch.is_none() {
            return Err(Error::Driver("driver not started".to_string()));
        }
        Ok(state.title.clone())
    }

    async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.launch.is_none() {
            return Err(Error::Driver("driver not started".to_string()));
        }
        state.calls.push(Call::Refresh);
        Ok(())
    }
}

/// Hands out fake drivers and keeps them for inspection.
#[derive(Default)]
pub struct FakeFactory {
    created: Mutex<Vec<Arc<FakeDriver>>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Arc<FakeDriver>> {
        self.created.lock().unwrap().clone()
    }
}

impl DriverFactory for FakeFactory {
    fn create(&self) -> Arc<dyn PageDriver> {
        let driver = FakeDriver::new();
        self.created.lock().unwrap().push(driver.clone());
        driver
    }
}
