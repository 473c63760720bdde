//! In-memory browser for navigator and pipeline tests.

use crate::browser::{BrowserDriver, BrowserError, OriginFilter, TabDriver};
use crate::models::ClickPoint;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// What clicking a point does.
#[derive(Debug, Clone)]
pub enum Link {
    Opens(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
    Goto(String, String),
    Wheel(f64),
    Screenshot(String),
    Click(String, i64, i64),
    Front(String),
    Close(String),
}

#[derive(Debug)]
struct FakeTabState {
    id: String,
    url: String,
    open: bool,
}

#[derive(Debug, Default)]
struct State {
    tabs: Vec<FakeTabState>,
    links: HashMap<ClickPoint, Link>,
    events: Vec<FakeEvent>,
}

impl State {
    fn open_tab(&mut self, url: &str) -> String {
        let id = format!("tab-{}", self.tabs.len());
        self.tabs.push(FakeTabState {
            id: id.clone(),
            url: url.to_string(),
            open: true,
        });
        id
    }

    fn tab_mut(&mut self, id: &str) -> &mut FakeTabState {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .expect("fake tab exists")
    }
}

#[derive(Debug, Clone)]
pub struct FakeBrowser {
    state: Rc<RefCell<State>>,
    viewport_height: u32,
}

impl FakeBrowser {
    pub fn new(viewport_height: u32) -> Self {
        Self {
            state: Rc::default(),
            viewport_height,
        }
    }

    pub fn link(&self, point: ClickPoint, link: Link) {
        self.state.borrow_mut().links.insert(point, link);
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.state.borrow().events.clone()
    }

    pub fn wheel_events(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Wheel(dy) => Some(dy),
                _ => None,
            })
            .collect()
    }

    pub fn screenshot_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, FakeEvent::Screenshot(_)))
            .count()
    }

    pub fn click_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, FakeEvent::Click(..)))
            .count()
    }

    pub fn open_tab_count(&self) -> usize {
        self.state.borrow().tabs.iter().filter(|t| t.open).count()
    }

    pub fn first_tab_id(&self) -> String {
        "tab-0".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct FakeTab {
    id: String,
    state: Rc<RefCell<State>>,
    viewport_height: u32,
}

impl FakeTab {
    fn record(&self, event: FakeEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl TabDriver for FakeTab {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.state.borrow_mut().tab_mut(&self.id).url = url.to_string();
        self.record(FakeEvent::Goto(self.id.clone(), url.to_string()));
        Ok(())
    }

    async fn wait_for_load(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn bring_to_front(&self) -> Result<(), BrowserError> {
        self.record(FakeEvent::Front(self.id.clone()));
        Ok(())
    }

    async fn viewport_height(&self) -> Result<u32, BrowserError> {
        Ok(self.viewport_height)
    }

    async fn wheel(&self, delta_y: f64) -> Result<(), BrowserError> {
        self.record(FakeEvent::Wheel(delta_y));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        std::fs::write(path, b"\x89PNG fake")?;
        self.record(FakeEvent::Screenshot(path.display().to_string()));
        Ok(())
    }

    async fn click(&self, x: f64, y: f64) -> Result<(), BrowserError> {
        let point = ClickPoint::new(x as i64, y as i64);
        self.record(FakeEvent::Click(self.id.clone(), point.x, point.y));
        let mut state = self.state.borrow_mut();
        if let Some(Link::Opens(url)) = state.links.get(&point).cloned() {
            state.open_tab(url);
        }
        Ok(())
    }

    async fn url(&self) -> Result<String, BrowserError> {
        Ok(self.state.borrow_mut().tab_mut(&self.id).url.clone())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let url = self.url().await?;
        Ok(format!(
            "<html><head><title>Story at {url}</title></head><body><p>Body of {url}</p></body></html>"
        ))
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.state.borrow_mut().tab_mut(&self.id).open = false;
        self.record(FakeEvent::Close(self.id.clone()));
        Ok(())
    }
}

impl BrowserDriver for FakeBrowser {
    type Tab = FakeTab;

    async fn new_tab(&self) -> Result<FakeTab, BrowserError> {
        let id = self.state.borrow_mut().open_tab("about:blank");
        Ok(FakeTab {
            id,
            state: Rc::clone(&self.state),
            viewport_height: self.viewport_height,
        })
    }

    async fn tabs(&self) -> Result<Vec<FakeTab>, BrowserError> {
        Ok(self
            .state
            .borrow()
            .tabs
            .iter()
            .filter(|t| t.open)
            .map(|t| FakeTab {
                id: t.id.clone(),
                state: Rc::clone(&self.state),
                viewport_height: self.viewport_height,
            })
            .collect())
    }

    async fn wait_for_new_tab(
        &self,
        known: &HashSet<String>,
        filter: &OriginFilter,
        _timeout: Duration,
    ) -> Result<Option<FakeTab>, BrowserError> {
        let state = self.state.borrow();
        let found = state
            .tabs
            .iter()
            .find(|t| t.open && !known.contains(&t.id) && filter.is_external(&t.url));
        Ok(found.map(|t| FakeTab {
            id: t.id.clone(),
            state: Rc::clone(&self.state),
            viewport_height: self.viewport_height,
        }))
    }
}
