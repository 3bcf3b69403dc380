//! Every run ends in exactly one terminal outcome

use agentgraph_core::{FaultKind, NodeOutcome, RunOutcome, State, StateGraph, END};
use proptest::prelude::*;

fn looping_graph(stop_at: u64) -> StateGraph {
    let mut graph = StateGraph::new();
    graph.add_fn("work", |_ctx, state| {
        let n = state.get_metadata_as::<u64>("n").unwrap_or(0);
        state.set_metadata("n", n + 1);
        Ok(NodeOutcome::Continue)
    });
    graph.add_fn("check", |_ctx, _state| Ok(NodeOutcome::Continue));
    graph.set_entry("work").add_edge("work", "check");
    graph.add_conditional_edge("check", ["work", END], move |state: &State| {
        if state.get_metadata_as::<u64>("n").unwrap_or(0) >= stop_at {
            END.to_string()
        } else {
            "work".to_string()
        }
    });
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_execute_always_terminates(stop_at in 0u64..40, max_steps in 1usize..60) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let compiled = looping_graph(stop_at).compile().unwrap().with_max_steps(max_steps);

        let result = runtime.block_on(compiled.invoke(State::new()));

        // work+check per iteration, at least one iteration
        let needed = 2 * stop_at.max(1) as usize;
        match result {
            Ok(RunOutcome::Completed(state)) => {
                prop_assert!(needed <= max_steps);
                prop_assert_eq!(state.get_metadata_as::<u64>("n"), Some(stop_at.max(1)));
            }
            Ok(RunOutcome::Interrupted { .. }) => prop_assert!(false, "no node interrupts"),
            Err(e) => {
                prop_assert!(needed > max_steps);
                prop_assert_eq!(e.kind(), FaultKind::StepLimit);
            }
        }
    }
}
