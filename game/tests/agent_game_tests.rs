use rand::{SeedableRng, rngs::StdRng};
use ultrametric::agent::{Strategy, play_session};
use ultrametric::{Phase, TraversalController};

#[test]
fn every_strategy_finishes_a_game() {
    for strategy in [Strategy::First, Strategy::Greedy, Strategy::Random] {
        let mut controller = TraversalController::with_seed(11);
        controller.start_game(5, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let report = play_session(&mut controller, strategy, &mut rng).unwrap();
        assert_eq!(controller.phase(), Phase::Complete);
        assert_eq!(controller.move_count(), 10);
        assert_eq!(report.total_cost, controller.total_cost());
        // Every move costs at least one edge.
        assert!(report.total_cost >= 10, "{strategy:?}: {}", report.total_cost);
    }
}

#[test]
fn greedy_takes_the_cheapest_step_every_turn() {
    for seed in 0..20 {
        let mut controller = TraversalController::with_seed(seed);
        controller.start_game(4, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        while controller.phase() != Phase::Complete {
            let state = controller.state().unwrap().clone();
            let agent = controller.agent_node().unwrap().id;
            let layer = controller.current_layer().unwrap();
            let cheapest = state
                .layer(layer)
                .unwrap()
                .iter()
                .map(|&id| state.distance(agent, id).unwrap())
                .min()
                .unwrap();

            let target = Strategy::Greedy.choose(&controller, &mut rng).unwrap();
            let event = controller.attempt_move(target).unwrap();
            assert_eq!(event.step_cost, cheapest, "seed {seed}, layer {layer}");
            controller.complete_lock_window();
        }
    }
}

#[test]
fn playing_a_finished_game_returns_its_report() {
    let mut controller = TraversalController::with_seed(2);
    controller.start_game(3, 2).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let report = play_session(&mut controller, Strategy::First, &mut rng).unwrap();
    let again = play_session(&mut controller, Strategy::Greedy, &mut rng).unwrap();
    assert_eq!(report, again);
}
