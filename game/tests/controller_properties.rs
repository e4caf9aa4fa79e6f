use proptest::prelude::*;
use ultrametric::{Phase, TraversalController};

#[derive(Debug, Clone)]
enum Op {
    Move(usize),
    Release,
    Restart,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0usize..40).prop_map(Op::Move),
        3 => Just(Op::Release),
        1 => Just(Op::Restart),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn arbitrary_input_keeps_the_books_straight(
        seed in any::<u64>(),
        width in 1u32..5,
        depth in 1u32..6,
        ops in prop::collection::vec(op(), 0..60),
    ) {
        let mut controller = TraversalController::with_seed(seed);
        controller.start_game(width, depth).unwrap();

        for op in ops {
            let before = controller.snapshot();
            match op {
                Op::Move(node) => match controller.attempt_move(node) {
                    Ok(event) => {
                        prop_assert_eq!(before.phase, Phase::AwaitingMove);
                        prop_assert_eq!(Some(event.layer), before.current_layer);
                        prop_assert_eq!(event.total_cost, before.total_cost + event.step_cost);
                        prop_assert!(event.step_cost >= 1);
                        prop_assert_eq!(controller.phase(), Phase::Locked);
                    }
                    Err(_) => {
                        prop_assert_eq!(controller.phase(), before.phase);
                        prop_assert_eq!(controller.total_cost(), before.total_cost);
                        prop_assert_eq!(controller.move_count(), before.move_count);
                        prop_assert_eq!(controller.current_layer(), before.current_layer);
                    }
                },
                Op::Release => {
                    controller.complete_lock_window();
                    prop_assert_ne!(controller.phase(), Phase::Locked);
                }
                Op::Restart => {
                    controller.restart();
                    controller.start_game(width, depth).unwrap();
                }
            }

            let step_total: u64 = controller.history().iter().map(|m| m.step_cost).sum();
            prop_assert_eq!(step_total, controller.total_cost());
            prop_assert_eq!(controller.history().len() as u32, controller.move_count());
            if let Some(layer) = controller.current_layer() {
                prop_assert_eq!(layer, controller.move_count() + 1);
                prop_assert_eq!(controller.agent_node().map(|n| n.depth), Some(layer - 1));
            }
            if controller.phase() == Phase::Complete {
                prop_assert_eq!(controller.move_count(), depth);
            }
        }
    }
}
