use crate::{ExportFormat, PageWarning};

/// Events that drive a run through its stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The driver accepted a URL and starts fetching.
    Started { url: String },
    /// Every page of the thread has been downloaded.
    PagesFetched { count: u32 },
    /// One page produced posts.
    PageParsed { page: u32 },
    /// One page could not be parsed; the run continues.
    PageRejected(PageWarning),
    /// All fetched pages went through a parser.
    ParsingFinished,
    /// The assembled thread has been normalized.
    Normalized,
    /// One requested format has been rendered.
    FormatRendered { format: ExportFormat },
    /// All requested formats have been rendered.
    ExportsFinished,
    /// Unrecoverable error in the current stage.
    Failed { reason: String },
}
