use sb_core::{BlockInstance, Category};

/// A program resolved into straight-line steps and single-level loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlanItem {
    Single(usize),
    Loop {
        header: usize,
        body: Vec<usize>,
        /// The closing marker, if the program has one.
        end: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NestedLoop {
    pub(crate) outer: usize,
    pub(crate) inner: usize,
}

/// Resolves every loop body once, before execution. A loop body runs up to the next
/// end-loop marker, or to the end of the program when there is none.
pub(crate) fn build_plan(program: &[BlockInstance]) -> Result<Vec<PlanItem>, NestedLoop> {
    let mut plan = Vec::new();
    let mut index = 0usize;

    while index < program.len() {
        if program[index].definition.category != Category::Loop {
            plan.push(PlanItem::Single(index));
            index += 1;
            continue;
        }

        let header = index;
        let mut body = Vec::new();
        let mut end = None;
        let mut cursor = header + 1;
        while cursor < program.len() {
            match program[cursor].definition.category {
                Category::Structure => {
                    end = Some(cursor);
                    break;
                }
                Category::Loop => {
                    return Err(NestedLoop {
                        outer: header,
                        inner: cursor,
                    })
                }
                _ => body.push(cursor),
            }
            cursor += 1;
        }

        plan.push(PlanItem::Loop { header, body, end });
        index = cursor + 1;
    }

    Ok(plan)
}

#[cfg(test)]
mod plan_tests {
    use super::*;
    use sb_core::{BlockDefinition, BlockOp};
    use std::sync::Arc;

    fn program(ops: Vec<BlockOp>) -> Vec<BlockInstance> {
        ops.into_iter()
            .enumerate()
            .map(|(index, op)| BlockInstance {
                instance_id: index as u64 + 1,
                definition: Arc::new(BlockDefinition::new(format!("b{}", index), "", "", "", op)),
            })
            .collect()
    }

    #[test]
    fn straight_line_program_is_all_singles() {
        let plan = build_plan(&program(vec![BlockOp::StepForward, BlockOp::Celebrate]))
            .expect("plan should build");
        assert_eq!(plan, vec![PlanItem::Single(0), PlanItem::Single(1)]);
    }

    #[test]
    fn loop_body_stops_at_end_marker() {
        let plan = build_plan(&program(vec![
            BlockOp::Repeat { times: 3 },
            BlockOp::StepForward,
            BlockOp::RepairPlank,
            BlockOp::EndLoop,
            BlockOp::Celebrate,
        ]))
        .expect("plan should build");
        assert_eq!(
            plan,
            vec![
                PlanItem::Loop {
                    header: 0,
                    body: vec![1, 2],
                    end: Some(3),
                },
                PlanItem::Single(4),
            ]
        );
    }

    #[test]
    fn unterminated_loop_runs_to_program_end() {
        let plan = build_plan(&program(vec![
            BlockOp::StepForward,
            BlockOp::Repeat { times: 2 },
            BlockOp::StepForward,
        ]))
        .expect("plan should build");
        assert_eq!(
            plan,
            vec![
                PlanItem::Single(0),
                PlanItem::Loop {
                    header: 1,
                    body: vec![2],
                    end: None,
                },
            ]
        );
    }

    #[test]
    fn stray_end_marker_is_a_single_step() {
        let plan = build_plan(&program(vec![BlockOp::EndLoop, BlockOp::StepForward]))
            .expect("plan should build");
        assert_eq!(plan, vec![PlanItem::Single(0), PlanItem::Single(1)]);
    }

    #[test]
    fn nested_loop_is_rejected() {
        let error = build_plan(&program(vec![
            BlockOp::Repeat { times: 2 },
            BlockOp::StepForward,
            BlockOp::Repeat { times: 2 },
            BlockOp::EndLoop,
            BlockOp::EndLoop,
        ]))
        .expect_err("nested loop should fail");
        assert_eq!(error, NestedLoop { outer: 0, inner: 2 });
    }
}
