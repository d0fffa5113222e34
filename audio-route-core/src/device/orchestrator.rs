//! Device selection: converges the routes applied for a usecase with what
//! its devices, the call state and the active input ask for.
//!
//! Dependent usecases are not selected recursively. They are pushed onto a
//! worklist that one call to [`DeviceState::select_devices`] drains while the
//! caller holds the device lock.

use std::collections::VecDeque;

use crate::models::devices::{AudioSource, DeviceMask};
use crate::models::error::RouteError;
use crate::models::usecase::{ClassSet, RoutePair, UsecaseClass, UsecaseId};
use crate::routing::catalog::display_name;
use crate::routing::resolver::{resolve_input, resolve_output};

use super::state::DeviceState;

#[derive(Default)]
struct Worklist {
    pending: VecDeque<UsecaseId>,
}

impl Worklist {
    fn push(&mut self, id: UsecaseId) {
        if !self.pending.contains(&id) {
            self.pending.push_back(id);
        }
    }

    fn pop(&mut self) -> Option<UsecaseId> {
        self.pending.pop_front()
    }
}

impl DeviceState {
    /// Selects routes for `id` and for every usecase that depends on it.
    pub fn select_devices(&mut self, id: UsecaseId) -> Result<(), RouteError> {
        self.select_many([id])
    }

    pub(crate) fn select_many(&mut self, ids: impl IntoIterator<Item = UsecaseId>) -> Result<(), RouteError> {
        let mut work = Worklist::default();
        for id in ids {
            work.push(id);
        }
        while let Some(next) = work.pop() {
            self.select_one(next, &mut work)?;
        }
        Ok(())
    }

    fn select_one(&mut self, id: UsecaseId, work: &mut Worklist) -> Result<(), RouteError> {
        let Some(usecase) = self.usecases.find_by_id(id) else {
            log::error!("Could not find usecase {}", id);
            return Err(RouteError::UnknownUsecase(id));
        };
        let current = usecase.routes;
        let class = usecase.class;
        let stream = usecase.stream;
        let own_devices = usecase.devices;
        let source = usecase.source;

        let input = self.input_context();
        let mut devices = own_devices;

        let target = match class {
            UsecaseClass::VoiceCall => {
                devices = self
                    .outputs
                    .get(&stream)
                    .map(|out| out.devices)
                    .filter(|mask| !mask.is_none())
                    .unwrap_or(own_devices);
                RoutePair::new(
                    resolve_input(devices, self.mode, &input),
                    resolve_output(devices, self.mode, self.wideband),
                )
            }
            UsecaseClass::Playback | UsecaseClass::Capture(_) => {
                let inherited = self
                    .usecases
                    .find_by_id(UsecaseId::VoiceCall)
                    .map(|call| call.routes)
                    .unwrap_or(RoutePair::NONE);

                if class == UsecaseClass::Playback {
                    if inherited.output.is_some() {
                        inherited
                    } else {
                        if self.primary_output == Some(stream) {
                            let dependent = self
                                .usecases
                                .find_by_class(ClassSet::CAPTURE)
                                .filter(|uc| uc.source == AudioSource::VoiceCommunication)
                                .map(|uc| uc.id);
                            if let Some(dependent) = dependent {
                                work.push(dependent);
                            }
                        }
                        RoutePair::new(None, resolve_output(own_devices, self.mode, self.wideband))
                    }
                } else if inherited.input.is_some() {
                    inherited
                } else {
                    let out_devices = if source == AudioSource::VoiceCommunication {
                        self.active_primary_devices().unwrap_or(DeviceMask::NONE)
                    } else {
                        DeviceMask::NONE
                    };
                    RoutePair::new(resolve_input(out_devices, self.mode, &input), None)
                }
            }
        };

        if let Some(usecase) = self.usecases.find_by_id_mut(id) {
            usecase.devices = devices;
        }

        if target == current {
            return Ok(());
        }

        log::debug!(
            "select_devices {}: out {} -> {}, in {} -> {}",
            id,
            display_name(current.output),
            display_name(target.output),
            display_name(current.input),
            display_name(target.input)
        );

        if let Some(route) = current.output {
            self.activation.disable(route)?;
        }
        if let Some(route) = current.input {
            self.activation.disable(route)?;
        }

        // Other usecases follow the call: their old paths go down before the
        // call path comes up, and they pick up the call routes afterwards.
        if class == UsecaseClass::VoiceCall {
            for other in self.usecases.ids() {
                if other != id {
                    self.release_routes(other)?;
                    work.push(other);
                }
            }
        }

        if self.mode.is_in_call() {
            self.setup_call_path();
        }

        if let Some(route) = target.output {
            self.activation.enable(route);
        }
        if let Some(route) = target.input {
            self.activation.enable(route);
        }

        if let Some(usecase) = self.usecases.find_by_id_mut(id) {
            usecase.routes = target;
        }
        Ok(())
    }

    /// Disables the applied routes of `id`, output first, and clears them.
    fn release_routes(&mut self, id: UsecaseId) -> Result<(), RouteError> {
        let Some(usecase) = self.usecases.find_by_id_mut(id) else {
            return Err(RouteError::UnknownUsecase(id));
        };
        let routes = std::mem::replace(&mut usecase.routes, RoutePair::NONE);
        if let Some(route) = routes.output {
            self.activation.disable(route)?;
        }
        if let Some(route) = routes.input {
            self.activation.disable(route)?;
        }
        Ok(())
    }

    /// Disables the routes of `id` and removes it from the registry. The
    /// usecase is removed even when a disable fails; the first failure is
    /// returned.
    pub fn teardown_usecase(&mut self, id: UsecaseId) -> Result<(), RouteError> {
        let routes = self
            .usecases
            .find_by_id(id)
            .map(|uc| uc.routes)
            .ok_or(RouteError::UnknownUsecase(id))?;

        let mut result = Ok(());
        for route in [routes.output, routes.input].into_iter().flatten() {
            if let Err(e) = self.activation.disable(route) {
                log::error!("Failed to disable {} for {}: {}", route, id, e);
                result = result.and(Err(e));
            }
        }
        self.usecases.destroy(id)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::config::EngineConfig;
    use crate::models::devices::{AudioMode, ChannelMask};
    use crate::models::usecase::{StreamId, Usecase};
    use crate::routing::catalog::Route;
    use crate::routing::profiles::PcmProfileRegistry;
    use crate::test_support::{FakeTransport, PathEvent, RecordingApplier, RecordingTelephony};

    const PRIMARY: StreamId = StreamId(1);

    fn state() -> (DeviceState, RecordingApplier) {
        let applier = RecordingApplier::default();
        let config = EngineConfig {
            debounce_ms: 0,
            ..EngineConfig::default()
        };
        let state = DeviceState::new(
            &config,
            Box::new(applier.clone()),
            Box::new(RecordingTelephony::default()),
            Arc::new(FakeTransport::default()),
            Arc::new(PcmProfileRegistry::builtin()),
        );
        (state, applier)
    }

    fn with_primary(devices: DeviceMask) -> (DeviceState, RecordingApplier) {
        let (mut state, applier) = state();
        state.register_output(PRIMARY, devices, true);
        state.update_output(PRIMARY, |out| out.standby = false);
        (state, applier)
    }

    fn apply(name: &str) -> PathEvent {
        PathEvent::Apply(name.to_string())
    }

    fn unapply(name: &str) -> PathEvent {
        PathEvent::Unapply(name.to_string())
    }

    #[test]
    fn playback_on_speaker() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_SPEAKER);
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_SPEAKER)
            .unwrap();

        state.select_devices(UsecaseId::Playback).unwrap();

        let uc = state.usecases.find_by_id(UsecaseId::Playback).unwrap();
        assert_eq!(uc.routes, RoutePair::new(None, Some(Route::Speaker)));
        assert_eq!(applier.events(), vec![apply("speaker")]);
    }

    #[test]
    fn second_select_is_a_no_op() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_SPEAKER);
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_SPEAKER)
            .unwrap();
        state.select_devices(UsecaseId::Playback).unwrap();
        applier.clear();

        state.select_devices(UsecaseId::Playback).unwrap();

        assert!(applier.events().is_empty());
        assert_eq!(state.activation.ref_count(Route::Speaker), 1);
    }

    #[test]
    fn unknown_usecase_is_an_error() {
        let (mut state, applier) = state();
        assert_eq!(
            state.select_devices(UsecaseId::Capture).unwrap_err(),
            RouteError::UnknownUsecase(UsecaseId::Capture)
        );
        assert!(applier.events().is_empty());
    }

    #[test]
    fn device_change_disables_before_enabling() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_SPEAKER);
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_SPEAKER)
            .unwrap();
        state.select_devices(UsecaseId::Playback).unwrap();

        let uc = state.usecases.find_by_id_mut(UsecaseId::Playback).unwrap();
        uc.devices = DeviceMask::OUT_SPEAKER | DeviceMask::OUT_WIRED_HEADSET;
        state.select_devices(UsecaseId::Playback).unwrap();

        // The speaker half of the combo is a new reference after the old one
        // was dropped, so the path is cycled.
        assert_eq!(
            applier.events(),
            vec![apply("speaker"), unapply("speaker"), apply("speaker"), apply("headphones")]
        );
        assert_eq!(state.activation.ref_count(Route::Speaker), 1);
        assert_eq!(state.activation.ref_count(Route::Headphones), 1);
    }

    #[test]
    fn unresolvable_mask_leaves_no_route() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_SPEAKER);
        state
            .usecases
            .create(
                UsecaseId::Playback,
                PRIMARY,
                DeviceMask::OUT_EARPIECE | DeviceMask::OUT_AUX_DIGITAL,
            )
            .unwrap();

        state.select_devices(UsecaseId::Playback).unwrap();

        let uc = state.usecases.find_by_id(UsecaseId::Playback).unwrap();
        assert_eq!(uc.routes, RoutePair::NONE);
        assert!(applier.events().is_empty());
    }

    #[test]
    fn playback_inherits_call_routes() {
        let (mut state, _) = with_primary(DeviceMask::OUT_EARPIECE);
        state.mode = AudioMode::InCall;
        state
            .usecases
            .create(UsecaseId::VoiceCall, PRIMARY, DeviceMask::OUT_EARPIECE)
            .unwrap();
        state.select_devices(UsecaseId::VoiceCall).unwrap();

        state
            .usecases
            .create(UsecaseId::PlaybackDeepBuffer, StreamId(2), DeviceMask::OUT_SPEAKER)
            .unwrap();
        state.select_devices(UsecaseId::PlaybackDeepBuffer).unwrap();

        let call = state.usecases.find_by_id(UsecaseId::VoiceCall).unwrap().routes;
        let playback = state
            .usecases
            .find_by_id(UsecaseId::PlaybackDeepBuffer)
            .unwrap()
            .routes;
        assert_eq!(call, RoutePair::new(Some(Route::EarpieceMic), Some(Route::VoiceEarpiece)));
        assert_eq!(playback, call);
        assert_eq!(state.activation.ref_count(Route::VoiceEarpiece), 2);
        assert_eq!(state.activation.ref_count(Route::Speaker), 0);
    }

    #[test]
    fn call_route_change_moves_dependents() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_EARPIECE);
        state.mode = AudioMode::InCall;
        state
            .usecases
            .create(UsecaseId::VoiceCall, PRIMARY, DeviceMask::OUT_EARPIECE)
            .unwrap();
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_EARPIECE)
            .unwrap();
        state.select_devices(UsecaseId::VoiceCall).unwrap();

        state.update_output(PRIMARY, |out| out.devices = DeviceMask::OUT_SPEAKER);
        state.select_devices(UsecaseId::VoiceCall).unwrap();

        let playback = state.usecases.find_by_id(UsecaseId::Playback).unwrap().routes;
        assert_eq!(
            playback,
            RoutePair::new(Some(Route::VoiceSpeakerMic), Some(Route::VoiceSpeaker))
        );
        assert_eq!(state.activation.ref_count(Route::VoiceEarpiece), 0);
        assert_eq!(state.activation.ref_count(Route::VoiceSpeaker), 2);
        assert!(applier.events().contains(&unapply("voice-earpiece")));
    }

    #[test]
    fn primary_playback_reselects_communication_capture() {
        let (mut state, _) = with_primary(DeviceMask::OUT_EARPIECE);
        state.mode = AudioMode::InCommunication;
        let capture = Usecase::new(UsecaseId::Capture, StreamId(7), DeviceMask::IN_BUILTIN_MIC)
            .with_source(AudioSource::VoiceCommunication, ChannelMask::Mono);
        state.usecases.insert(capture).unwrap();
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_EARPIECE)
            .unwrap();
        state.select_devices(UsecaseId::Capture).unwrap();
        assert_eq!(
            state.usecases.find_by_id(UsecaseId::Capture).unwrap().routes.input,
            Some(Route::EarpieceMic)
        );

        state.update_output(PRIMARY, |out| out.devices = DeviceMask::OUT_SPEAKER);
        state.usecases.find_by_id_mut(UsecaseId::Playback).unwrap().devices = DeviceMask::OUT_SPEAKER;
        state.select_devices(UsecaseId::Playback).unwrap();

        assert_eq!(
            state.usecases.find_by_id(UsecaseId::Capture).unwrap().routes,
            RoutePair::new(Some(Route::SpeakerMic), None)
        );
    }

    #[test]
    fn capture_ignores_output_in_standby() {
        let (mut state, _) = with_primary(DeviceMask::OUT_SPEAKER);
        state.update_output(PRIMARY, |out| out.standby = true);
        let capture = Usecase::new(UsecaseId::Capture, StreamId(7), DeviceMask::IN_BUILTIN_MIC)
            .with_source(AudioSource::VoiceCommunication, ChannelMask::Mono);
        state.usecases.insert(capture).unwrap();

        state.select_devices(UsecaseId::Capture).unwrap();

        assert_eq!(
            state.usecases.find_by_id(UsecaseId::Capture).unwrap().routes.input,
            Some(Route::EarpieceMic)
        );
    }

    #[test]
    fn teardown_releases_routes() {
        let (mut state, applier) = with_primary(DeviceMask::OUT_SPEAKER);
        state
            .usecases
            .create(UsecaseId::Playback, PRIMARY, DeviceMask::OUT_SPEAKER)
            .unwrap();
        state.select_devices(UsecaseId::Playback).unwrap();

        state.teardown_usecase(UsecaseId::Playback).unwrap();

        assert!(state.usecases.is_empty());
        assert_eq!(applier.events(), vec![apply("speaker"), unapply("speaker")]);
    }
}
