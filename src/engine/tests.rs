use super::*;

use EngineInput::*;
use EngineState::*;

#[test]
fn fresh_engine_starts_unloaded() {
    assert_eq!(EngineState::default(), Unloaded);
    assert!(!Unloaded.can_transport());
}

#[test]
fn load_ready_play_is_the_happy_path() {
    let state = Unloaded
        .next(LoadRequested)
        .next(BecameReady)
        .next(PlayRequested);
    assert_eq!(state, Playing);
}

#[test]
fn decode_failure_returns_to_unloaded() {
    let state = Unloaded.next(LoadRequested).next(DecodeFailed);
    assert_eq!(state, Unloaded);
}

#[test]
fn transport_commands_are_ignored_while_loading() {
    assert_eq!(Loading.next(PlayRequested), Loading);
    assert_eq!(Loading.next(PauseRequested), Loading);
    assert_eq!(Loading.next(StopRequested), Loading);
}

#[test]
fn transport_commands_are_ignored_without_a_track() {
    assert_eq!(Unloaded.next(PlayRequested), Unloaded);
    assert_eq!(Unloaded.next(StopRequested), Unloaded);
    assert_eq!(Unloaded.next(TrackEnded), Unloaded);
}

#[test]
fn pause_and_resume_round_trip() {
    let paused = Playing.next(PauseRequested);
    assert_eq!(paused, Paused);
    assert_eq!(paused.next(PlayRequested), Playing);
}

#[test]
fn stop_lands_in_paused() {
    assert_eq!(Playing.next(StopRequested), Paused);
    assert_eq!(Ready.next(StopRequested), Paused);
}

#[test]
fn a_finished_track_parks_the_transport() {
    assert_eq!(Playing.next(TrackEnded), Paused);
    // Ending only applies while actually playing.
    assert_eq!(Paused.next(TrackEnded), Paused);
    assert_eq!(Ready.next(TrackEnded), Ready);
}

#[test]
fn a_new_load_supersedes_any_state() {
    for state in [Unloaded, Loading, Ready, Playing, Paused] {
        assert_eq!(state.next(LoadRequested), Loading);
    }
}
