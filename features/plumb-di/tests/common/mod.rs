#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use plumb_di::{Arguments, Callable, CallableBuilder, DynError, Exit, Generator, Instance};

/// Shared event log written by test callables
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn record(log: &Log, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

pub fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub struct Session;

pub fn unit(_: Arguments) -> Result<Instance, DynError> {
    Ok(Instance::unit())
}

/// A generator yielding a fresh [Session], logging set-up and how it was torn down
pub fn session_generator(name: &'static str, log: &Log) -> CallableBuilder {
    recording_generator(name, log, Exit::Propagate)
}

/// Like [session_generator], answering a failure with `on_failure`
pub fn recording_generator(name: &'static str, log: &Log, on_failure: Exit) -> CallableBuilder {
    let log = log.clone();
    Callable::generator(name, move |_| {
        record(&log, format!("{name}:set-up"));
        let log = log.clone();
        Ok(Generator::new(Instance::new(Session), move |outcome| {
            if outcome.is_failure() {
                record(&log, format!("{name}:clean-up:failure"));
                return Ok(on_failure);
            }
            record(&log, format!("{name}:clean-up"));
            Ok(Exit::Propagate)
        }))
    })
}

/// A function returning `value`, logging each invocation
pub fn recording_function(name: &'static str, log: &Log, value: &'static str) -> CallableBuilder {
    let log = log.clone();
    Callable::function(name, move |_| {
        record(&log, name);
        Ok(Instance::new(value.to_string()))
    })
}
