use nini_core::{update, ExportFormat, Msg, PageWarning, RunStage, RunState};

fn drive(msgs: Vec<Msg>) -> RunState {
    msgs.into_iter().fold(RunState::new(), update)
}

fn warning(page: u32) -> PageWarning {
    PageWarning {
        page,
        url: format!("https://example.com/topic/1?page={page}"),
        reason: "no posts found".to_string(),
    }
}

#[test]
fn happy_path_walks_every_stage_in_order() {
    let mut state = RunState::new();
    assert_eq!(state.stage(), RunStage::Idle);

    let steps = [
        (
            Msg::Started {
                url: "https://example.com/topic/1".to_string(),
            },
            RunStage::Fetching,
        ),
        (Msg::PagesFetched { count: 2 }, RunStage::Parsing),
        (Msg::PageParsed { page: 1 }, RunStage::Parsing),
        (Msg::PageParsed { page: 2 }, RunStage::Parsing),
        (Msg::ParsingFinished, RunStage::Normalizing),
        (Msg::Normalized, RunStage::Exporting),
        (
            Msg::FormatRendered {
                format: ExportFormat::Org,
            },
            RunStage::Exporting,
        ),
        (Msg::ExportsFinished, RunStage::Done),
    ];
    for (msg, expected) in steps {
        state = update(state, msg);
        assert_eq!(state.stage(), expected);
    }

    assert_eq!(state.url(), Some("https://example.com/topic/1"));
    assert_eq!(state.pages_fetched(), 2);
    assert_eq!(state.pages_parsed(), 2);
    assert_eq!(state.rendered(), &[ExportFormat::Org]);
    assert!(state.failure().is_none());
}

#[test]
fn page_rejections_are_warnings_not_failures() {
    let state = drive(vec![
        Msg::Started {
            url: "https://example.com/topic/1".to_string(),
        },
        Msg::PagesFetched { count: 3 },
        Msg::PageParsed { page: 1 },
        Msg::PageRejected(warning(2)),
        Msg::PageParsed { page: 3 },
        Msg::ParsingFinished,
    ]);

    assert_eq!(state.stage(), RunStage::Normalizing);
    assert_eq!(state.warnings(), &[warning(2)]);
    assert_eq!(state.pages_parsed(), 2);
}

#[test]
fn failure_records_the_stage_it_happened_in() {
    let state = drive(vec![
        Msg::Started {
            url: "https://example.com/topic/1".to_string(),
        },
        Msg::Failed {
            reason: "network error".to_string(),
        },
    ]);

    assert_eq!(state.stage(), RunStage::Failed);
    let failure = state.failure().unwrap();
    assert_eq!(failure.stage, RunStage::Fetching);
    assert_eq!(failure.reason, "network error");
}

#[test]
fn terminal_states_ignore_further_messages() {
    let failed = drive(vec![
        Msg::Started {
            url: "https://example.com/topic/1".to_string(),
        },
        Msg::Failed {
            reason: "boom".to_string(),
        },
        Msg::PagesFetched { count: 1 },
        Msg::Failed {
            reason: "again".to_string(),
        },
    ]);
    assert_eq!(failed.stage(), RunStage::Failed);
    assert_eq!(failed.failure().unwrap().reason, "boom");
}

#[test]
fn out_of_order_messages_are_ignored() {
    let state = drive(vec![
        Msg::ParsingFinished,
        Msg::PageRejected(warning(1)),
        Msg::ExportsFinished,
    ]);
    assert_eq!(state, RunState::new());
}
