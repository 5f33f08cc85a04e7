use std::fmt;

use crate::ExportFormat;

/// Stages of a single scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStage {
    Idle,
    Fetching,
    Parsing,
    Normalizing,
    Exporting,
    Done,
    Failed,
}

impl RunStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::Fetching => "fetching",
            RunStage::Parsing => "parsing",
            RunStage::Normalizing => "normalizing",
            RunStage::Exporting => "exporting",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A page that was fetched but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWarning {
    pub page: u32,
    pub url: String,
    pub reason: String,
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} ({}) skipped: {}", self.page, self.url, self.reason)
    }
}

/// Where and why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailureInfo {
    pub stage: RunStage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    stage: RunStage,
    url: Option<String>,
    pages_fetched: u32,
    pages_parsed: u32,
    warnings: Vec<PageWarning>,
    rendered: Vec<ExportFormat>,
    failure: Option<RunFailureInfo>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            stage: RunStage::Idle,
            url: None,
            pages_fetched: 0,
            pages_parsed: 0,
            warnings: Vec::new(),
            rendered: Vec::new(),
            failure: None,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn pages_parsed(&self) -> u32 {
        self.pages_parsed
    }

    pub fn warnings(&self) -> &[PageWarning] {
        &self.warnings
    }

    pub fn rendered(&self) -> &[ExportFormat] {
        &self.rendered
    }

    pub fn failure(&self) -> Option<&RunFailureInfo> {
        self.failure.as_ref()
    }

    pub(crate) fn start(&mut self, url: String) {
        self.url = Some(url);
        self.stage = RunStage::Fetching;
    }

    pub(crate) fn finish_fetch(&mut self, count: u32) {
        self.pages_fetched = count;
        self.stage = RunStage::Parsing;
    }

    pub(crate) fn record_parsed(&mut self) {
        self.pages_parsed += 1;
    }

    pub(crate) fn record_warning(&mut self, warning: PageWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn set_stage(&mut self, stage: RunStage) {
        self.stage = stage;
    }

    pub(crate) fn record_rendered(&mut self, format: ExportFormat) {
        if !self.rendered.contains(&format) {
            self.rendered.push(format);
        }
    }

    pub(crate) fn fail(&mut self, reason: String) {
        self.failure = Some(RunFailureInfo {
            stage: self.stage,
            reason,
        });
        self.stage = RunStage::Failed;
    }
}
