// Integration tests for replaying executor output

use std::time::{Duration, Instant};

use algoviz::algorithms::Algorithm;
use algoviz::dataset::Dataset;
use algoviz::executor::execute;
use algoviz::playback::{PlaybackConfig, PlaybackController, PlaybackState, READY_MESSAGE};

fn controller_for(algorithm: Algorithm, dataset: &Dataset) -> PlaybackController {
    let outcome = execute(algorithm.source(), dataset.values());
    let steps = outcome.result().expect("bundled program failed").clone();
    let mut controller = PlaybackController::new(PlaybackConfig {
        default_speed_ms: 50,
        ..PlaybackConfig::default()
    });
    controller.load(steps);
    controller
}

#[test]
fn test_autoplay_runs_to_the_sorted_array() {
    let dataset = Dataset::default();
    let mut controller = controller_for(Algorithm::BubbleSort, &dataset);
    let total = controller.len();
    assert!(total > 1);

    let mut now = Instant::now();
    controller.toggle_play(now);
    assert_eq!(controller.state(), PlaybackState::Playing);

    let mut ticks = 0;
    while controller.is_playing() {
        now += controller.speed();
        if controller.poll(now) {
            ticks += 1;
        }
        assert!(ticks < total, "playback never stopped");
    }

    assert_eq!(ticks, total - 1);
    assert!(controller.is_at_end());
    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(controller.time_until_tick(now), None);

    let view = controller.current_view(dataset.values());
    assert_eq!(
        view.array,
        &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0][..]
    );
    assert_eq!(view.description, "Sorting Complete!");
    assert_eq!(controller.progress(), 1.0);
}

#[test]
fn test_manual_navigation_matches_recorded_steps() {
    let dataset = Dataset::from(vec![3.0, 1.0, 2.0]);
    let mut controller = controller_for(Algorithm::InsertionSort, &dataset);
    let recorded: Vec<_> = controller.steps().iter().cloned().collect();

    for (index, step) in recorded.iter().enumerate() {
        assert_eq!(controller.cursor(), index);
        assert_eq!(controller.current_step(), Some(step));
        controller.step_forward();
    }
    assert!(!controller.step_forward());

    controller.jump_to_start();
    assert!(!controller.step_back());
    assert_eq!(controller.current_step(), recorded.first());
}

#[test]
fn test_reload_replaces_sequence() {
    let dataset = Dataset::default();
    let mut controller = controller_for(Algorithm::SelectionSort, &dataset);
    controller.jump_to_end();
    controller.toggle_play(Instant::now());

    let shorter = execute(
        "function sort(data, snapshot) { snapshot(data, [0], 'only'); }",
        dataset.values(),
    );
    controller.load(shorter.steps);

    assert_eq!(controller.len(), 1);
    assert_eq!(controller.cursor(), 0);
    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(controller.current_view(dataset.values()).description, "only");

    let empty = execute("function sort(data, snapshot) {}", dataset.values());
    controller.load(empty.steps);
    assert_eq!(controller.state(), PlaybackState::Idle);
    let view = controller.current_view(dataset.values());
    assert_eq!(view.array, dataset.values());
    assert_eq!(view.description, READY_MESSAGE);
}

#[test]
fn test_speed_changes_during_playback() {
    let dataset = Dataset::default();
    let mut controller = controller_for(Algorithm::QuickSort, &dataset);
    let start = Instant::now();
    controller.toggle_play(start);

    controller.slow_down();
    assert_eq!(controller.speed(), Duration::from_millis(100));
    // the armed tick still fires on the old schedule
    assert!(controller.poll(start + Duration::from_millis(50)));
    assert_eq!(
        controller.time_until_tick(start + Duration::from_millis(50)),
        Some(Duration::from_millis(100))
    );

    for _ in 0..100 {
        controller.speed_up();
    }
    assert_eq!(controller.speed(), Duration::from_millis(50));
}
