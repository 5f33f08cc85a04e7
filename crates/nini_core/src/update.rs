use crate::{Msg, RunStage, RunState};

/// Pure update function: applies a message to the run state.
///
/// Messages that do not fit the current stage leave the state untouched, and
/// terminal states never change again.
pub fn update(mut state: RunState, msg: Msg) -> RunState {
    let stage = state.stage();
    if stage.is_terminal() {
        return state;
    }

    match (stage, msg) {
        (RunStage::Idle, Msg::Started { url }) => state.start(url),
        (RunStage::Fetching, Msg::PagesFetched { count }) => state.finish_fetch(count),
        (RunStage::Parsing, Msg::PageParsed { .. }) => state.record_parsed(),
        (RunStage::Parsing, Msg::PageRejected(warning)) => state.record_warning(warning),
        (RunStage::Parsing, Msg::ParsingFinished) => state.set_stage(RunStage::Normalizing),
        (RunStage::Normalizing, Msg::Normalized) => state.set_stage(RunStage::Exporting),
        (RunStage::Exporting, Msg::FormatRendered { format }) => state.record_rendered(format),
        (RunStage::Exporting, Msg::ExportsFinished) => state.set_stage(RunStage::Done),
        (_, Msg::Failed { reason }) => state.fail(reason),
        _ => {}
    }

    state
}
