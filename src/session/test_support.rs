use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crate::reload::{ReloadError, ReloaderTrait};
use crate::render::{RenderError, RendererTrait};
use crate::tree::ConfigTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Render(ConfigTree),
    Reload,
}

/// Call log shared between a fake renderer and a fake reloader.
#[derive(Debug, Clone, Default)]
pub struct Calls(Rc<RefCell<Vec<Call>>>);

impl Calls {
    pub fn take(&self) -> Vec<Call> {
        self.0.take()
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }
}

pub struct FakeRenderer {
    calls: Calls,
    fails_on: fn(&ConfigTree) -> bool,
}

impl FakeRenderer {
    pub fn new(calls: &Calls) -> Self {
        Self::failing_on(calls, |_| false)
    }

    pub fn failing(calls: &Calls) -> Self {
        Self::failing_on(calls, |_| true)
    }

    pub fn failing_on(calls: &Calls, fails_on: fn(&ConfigTree) -> bool) -> Self {
        Self {
            calls: calls.clone(),
            fails_on,
        }
    }
}

impl RendererTrait for FakeRenderer {
    async fn render(&mut self, tree: &ConfigTree) -> Result<(), RenderError> {
        self.calls.push(Call::Render(tree.clone()));
        if (self.fails_on)(tree) {
            return Err(RenderError::WriteError {
                path: PathBuf::from("config/database.yml"),
                source: io::Error::other("disk full"),
            });
        }
        Ok(())
    }
}

pub struct FakeReloader {
    calls: Calls,
    fails: bool,
}

impl FakeReloader {
    pub fn new(calls: &Calls) -> Self {
        Self {
            calls: calls.clone(),
            fails: false,
        }
    }

    pub fn failing(calls: &Calls) -> Self {
        Self {
            calls: calls.clone(),
            fails: true,
        }
    }
}

impl ReloaderTrait for FakeReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        self.calls.push(Call::Reload);
        if self.fails {
            return Err(ReloadError::UnsuccessfulCommand {
                command: "reload".to_string(),
                status: 1,
            });
        }
        Ok(())
    }
}
