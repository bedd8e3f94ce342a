//! Call dispatch and the stash-and-resume protocol.
//!
//! 呼叫分发与暂存-恢复协议：
//! - 分发表在构造时建成（方法 → 处理函数，数据而非反射）
//! - 单槽暂存的 Responder 即互斥：占用时再暂存、空槽时再提交都是契约违规
//! - 提交函数读取已归约的状态，把答案交还给远端

use std::collections::HashMap;

use tracing::{debug, warn};

use ul_core::provision::{PageGroup, ProvisionAction, ProvisionState};
use ul_core::rpc::{
    CallPayload, IncomingCall, Responder, ResponsePayload, RpcMethod, RpcReply, RpcStatus,
};
use ul_core::{DeviceChoice, SecretString};

use super::error::CoordinatorError;

type HandlerFn = fn(
    &mut ProvisioningCoordinator,
    RpcMethod,
    CallPayload,
    Responder,
) -> Result<Option<ProvisionAction>, CoordinatorError>;

/// Method → handler table, built once when the coordinator is constructed.
pub struct IncomingCallMap {
    entries: HashMap<RpcMethod, HandlerFn>,
}

impl IncomingCallMap {
    fn standard() -> Self {
        let mut entries: HashMap<RpcMethod, HandlerFn> = HashMap::new();
        for method in RpcMethod::ALL {
            let handler: HandlerFn = match method {
                RpcMethod::SelectKey | RpcMethod::GetEmailOrUsername => {
                    ProvisioningCoordinator::cancel_call
                }
                RpcMethod::DisplayPrimaryPaperKey
                | RpcMethod::ProvisioneeSuccess
                | RpcMethod::ProvisionerSuccess
                | RpcMethod::DisplaySecretExchanged => ProvisioningCoordinator::ignore_call,
                RpcMethod::DisplayAndPromptSecret => {
                    ProvisioningCoordinator::display_and_prompt_secret
                }
                RpcMethod::PromptNewDeviceName => ProvisioningCoordinator::prompt_new_device_name,
                RpcMethod::ChooseDevice => ProvisioningCoordinator::choose_device,
                RpcMethod::ChooseGpgMethod => ProvisioningCoordinator::choose_gpg_method,
                RpcMethod::GetPassphrase => ProvisioningCoordinator::get_passphrase,
            };
            entries.insert(method, handler);
        }
        Self { entries }
    }

    pub fn serves(&self, method: RpcMethod) -> bool {
        self.entries.contains_key(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = RpcMethod> + '_ {
        self.entries.keys().copied()
    }

    fn get(&self, method: RpcMethod) -> Option<HandlerFn> {
        self.entries.get(&method).copied()
    }
}

/// The single pending reply. Created when a stashing prompt arrives,
/// destroyed the instant its submit function resolves it.
struct StashedResponse {
    key: RpcMethod,
    responder: Responder,
}

/// Mediates one provisioning attempt between the peer's prompts and the
/// reducer-owned state.
///
/// One instance per attempt. The caller serializes access; the coordinator
/// itself takes no locks and relies on the single stash slot for mutual
/// exclusion.
pub struct ProvisioningCoordinator {
    page_group: PageGroup,
    call_map: IncomingCallMap,
    stash: Option<StashedResponse>,
}

impl ProvisioningCoordinator {
    pub fn new(adding_new_device: bool) -> Self {
        Self {
            page_group: PageGroup::for_mode(adding_new_device),
            call_map: IncomingCallMap::standard(),
            stash: None,
        }
    }

    pub fn page_group(&self) -> PageGroup {
        self.page_group
    }

    pub fn incoming_call_map(&self) -> &IncomingCallMap {
        &self.call_map
    }

    /// Route one inbound call through the dispatch table. A stashing handler
    /// hands back the action to apply through the reducer; the other classes
    /// produce nothing.
    pub fn handle_incoming(
        &mut self,
        call: IncomingCall,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let IncomingCall {
            method,
            payload,
            responder,
        } = call;
        let handler = self
            .call_map
            .get(method)
            .ok_or(CoordinatorError::UnhandledMethod { method })?;
        handler(self, method, payload, responder)
    }

    // ===== Canceling and ignoring handlers =====

    fn cancel_call(
        &mut self,
        method: RpcMethod,
        _payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        debug!(method = %method, "refusing unsupported prompt");
        Self::deliver(method, responder.reject(RpcStatus::generic(CANCEL_DESC)));
        Ok(None)
    }

    fn ignore_call(
        &mut self,
        method: RpcMethod,
        _payload: CallPayload,
        _responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        // Dropping the responder closes the reply channel without an answer.
        debug!(method = %method, "informational call, no reply");
        Ok(None)
    }

    // ===== Stashing handlers =====

    fn display_and_prompt_secret(
        &mut self,
        method: RpcMethod,
        payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let CallPayload::SecretPrompt(arg) = payload else {
            return Err(CoordinatorError::PayloadMismatch { method });
        };
        self.stash_response(method, responder)?;
        Ok(Some(ProvisionAction::ShowCodePage {
            code: SecretString::new(arg.phrase),
            error: SecretString::new(arg.previous_err),
        }))
    }

    fn prompt_new_device_name(
        &mut self,
        method: RpcMethod,
        payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let CallPayload::DeviceNamePrompt(arg) = payload else {
            return Err(CoordinatorError::PayloadMismatch { method });
        };
        self.stash_response(method, responder)?;
        Ok(Some(ProvisionAction::ShowDeviceNamePage {
            existing_devices: arg.existing_devices,
            error: SecretString::new(arg.error_message),
        }))
    }

    fn choose_device(
        &mut self,
        method: RpcMethod,
        payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let CallPayload::ChooseDevice(arg) = payload else {
            return Err(CoordinatorError::PayloadMismatch { method });
        };
        self.stash_response(method, responder)?;
        Ok(Some(ProvisionAction::ShowDeviceListPage {
            devices: arg.devices,
            can_select_no_device: arg.can_select_no_device,
        }))
    }

    fn choose_gpg_method(
        &mut self,
        method: RpcMethod,
        payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let CallPayload::ChooseGpgMethod(arg) = payload else {
            return Err(CoordinatorError::PayloadMismatch { method });
        };
        self.stash_response(method, responder)?;
        Ok(Some(ProvisionAction::ShowGpgMethodPage { keys: arg.keys }))
    }

    fn get_passphrase(
        &mut self,
        method: RpcMethod,
        payload: CallPayload,
        responder: Responder,
    ) -> Result<Option<ProvisionAction>, CoordinatorError> {
        let CallPayload::GetPassphrase(arg) = payload else {
            return Err(CoordinatorError::PayloadMismatch { method });
        };
        self.stash_response(method, responder)?;
        Ok(Some(ProvisionAction::ShowPassphrasePage {
            kind: arg.pinentry.kind,
            error: SecretString::new(arg.pinentry.retry_label),
        }))
    }

    // ===== Stash slot =====

    fn stash_response(
        &mut self,
        key: RpcMethod,
        responder: Responder,
    ) -> Result<(), CoordinatorError> {
        if let Some(pending) = &self.stash {
            return Err(CoordinatorError::StashOccupied {
                pending: pending.key,
                incoming: key,
            });
        }
        debug!(method = %key, "stashing pending response");
        self.stash = Some(StashedResponse { key, responder });
        Ok(())
    }

    fn take_stashed(&mut self, wanted: RpcMethod) -> Result<Responder, CoordinatorError> {
        match self.stash.take() {
            None => Err(CoordinatorError::NoStashedResponse { wanted }),
            Some(stashed) if stashed.key != wanted => {
                let have = stashed.key;
                // The pending call stays intact; only the submit call dies.
                self.stash = Some(stashed);
                Err(CoordinatorError::ResponseKeyMismatch { wanted, have })
            }
            Some(stashed) => Ok(stashed.responder),
        }
    }

    fn deliver(method: RpcMethod, outcome: Result<(), RpcReply>) {
        if outcome.is_err() {
            warn!(method = %method, "reply channel closed, response dropped");
        }
    }

    // ===== Submit functions =====

    /// Resolve the stashed text-code prompt from the reduced state.
    ///
    /// Returns `Ok(false)` without touching the stash while a validation
    /// error is pending. A missing or mismatched stash is a sequencing bug
    /// and errs.
    pub fn submit_text_code(
        &mut self,
        state: &ProvisionState,
    ) -> Result<bool, CoordinatorError> {
        if state.has_error() {
            return Ok(false);
        }
        let responder = self.take_stashed(RpcMethod::DisplayAndPromptSecret)?;
        Self::deliver(
            RpcMethod::DisplayAndPromptSecret,
            responder.resolve(ResponsePayload::Secret {
                code: None,
                phrase: state.code_page_text_code.expose().to_owned(),
            }),
        );
        Ok(true)
    }

    /// Resolve the stashed device-name prompt with the accepted name.
    pub fn submit_device_name(
        &mut self,
        state: &ProvisionState,
    ) -> Result<bool, CoordinatorError> {
        if state.has_error() {
            return Ok(false);
        }
        let responder = self.take_stashed(RpcMethod::PromptNewDeviceName)?;
        Self::deliver(
            RpcMethod::PromptNewDeviceName,
            responder.resolve(ResponsePayload::DeviceName(state.device_name.clone())),
        );
        Ok(true)
    }

    /// Resolve the stashed device-choice prompt. `Ok(false)` until a choice
    /// was validly recorded.
    pub fn submit_device_select(
        &mut self,
        state: &ProvisionState,
    ) -> Result<bool, CoordinatorError> {
        if state.has_error() {
            return Ok(false);
        }
        let Some(choice) = &state.selected_device else {
            return Ok(false);
        };
        let answer = match choice {
            DeviceChoice::Device(id) => id.as_str().to_owned(),
            DeviceChoice::NoDevice => String::new(),
        };
        let responder = self.take_stashed(RpcMethod::ChooseDevice)?;
        Self::deliver(
            RpcMethod::ChooseDevice,
            responder.resolve(ResponsePayload::ChosenDevice(answer)),
        );
        Ok(true)
    }

    /// Resolve the stashed GPG-method prompt. `Ok(false)` until a method was
    /// chosen.
    pub fn submit_gpg_method(
        &mut self,
        state: &ProvisionState,
    ) -> Result<bool, CoordinatorError> {
        if state.has_error() {
            return Ok(false);
        }
        let Some(method) = state.gpg_method else {
            return Ok(false);
        };
        let responder = self.take_stashed(RpcMethod::ChooseGpgMethod)?;
        Self::deliver(
            RpcMethod::ChooseGpgMethod,
            responder.resolve(ResponsePayload::GpgMethod(method)),
        );
        Ok(true)
    }

    /// Resolve the stashed passphrase/paper-key prompt. Storage is never
    /// requested on this path; the engine keeps the secret itself after
    /// success.
    pub fn submit_passphrase(
        &mut self,
        state: &ProvisionState,
    ) -> Result<bool, CoordinatorError> {
        if state.has_error() {
            return Ok(false);
        }
        let responder = self.take_stashed(RpcMethod::GetPassphrase)?;
        Self::deliver(
            RpcMethod::GetPassphrase,
            responder.resolve(ResponsePayload::Passphrase {
                passphrase: state.passphrase.expose().to_owned(),
                store_secret: false,
            }),
        );
        Ok(true)
    }
}

const CANCEL_DESC: &str = "Canceling RPC";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::oneshot::error::TryRecvError;
    use ul_core::provision::{page, reduce, Navigate, Page, ProvisionState, Tab};
    use ul_core::rpc::{CallClass, GpgMethod, ReplyReceiver};

    fn coordinator() -> ProvisioningCoordinator {
        ProvisioningCoordinator::new(false)
    }

    fn incoming(method: RpcMethod, payload: serde_json::Value) -> (IncomingCall, ReplyReceiver) {
        let (responder, rx) = Responder::channel();
        let call = IncomingCall::from_wire(method.as_str(), payload, responder).unwrap();
        (call, rx)
    }

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn every_method_has_a_handler_of_its_class() {
        let coordinator = coordinator();
        let map = coordinator.incoming_call_map();
        assert_eq!(map.methods().count(), RpcMethod::ALL.len());
        for method in RpcMethod::ALL {
            assert!(map.serves(method), "{method}");
        }
    }

    #[test]
    fn cancel_class_always_rejects_and_never_resolves() {
        for method in RpcMethod::ALL
            .into_iter()
            .filter(|m| m.call_class() == CallClass::Cancel)
        {
            let mut coordinator = coordinator();
            let (call, mut rx) = incoming(method, json!({"anything": "at all"}));
            let action = coordinator.handle_incoming(call).unwrap();
            assert_eq!(action, None, "{method}");
            assert_eq!(
                rx.try_recv().unwrap(),
                RpcReply::Error(RpcStatus::generic("Canceling RPC")),
                "{method}"
            );
        }
    }

    #[test]
    fn ignore_class_never_replies_at_all() {
        for method in RpcMethod::ALL
            .into_iter()
            .filter(|m| m.call_class() == CallClass::Ignore)
        {
            let mut coordinator = coordinator();
            let (call, mut rx) = incoming(method, json!({}));
            let action = coordinator.handle_incoming(call).unwrap();
            assert_eq!(action, None, "{method}");
            assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Closed, "{method}");
        }
    }

    #[test]
    fn text_code_happy_path() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::DisplayAndPromptSecret,
            json!({"phrase": "mocktest"}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        assert_eq!(
            action,
            ProvisionAction::ShowCodePage {
                code: secret("mocktest"),
                error: SecretString::default(),
            }
        );

        let state = reduce(ProvisionState::new(), action);
        assert_eq!(state.code_page_text_code.expose(), "mocktest");
        assert!(!state.has_error());
        assert_eq!(
            page::show_code_page(coordinator.page_group(), &state),
            Some(Navigate {
                tab: Tab::Login,
                stack: vec![Page::Login, Page::CodePage],
            })
        );

        assert_eq!(coordinator.submit_text_code(&state), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::Secret {
                code: None,
                phrase: "mocktest".to_string(),
            })
        );

        // The stash is gone; a second submit is a sequencing bug.
        assert_eq!(
            coordinator.submit_text_code(&state),
            Err(CoordinatorError::NoStashedResponse {
                wanted: RpcMethod::DisplayAndPromptSecret,
            })
        );
    }

    #[test]
    fn text_code_error_path_resolves_nothing() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::DisplayAndPromptSecret,
            json!({"phrase": "mocktest", "previousErr": "anerror"}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);
        assert_eq!(state.error.expose(), "anerror");
        assert_eq!(page::show_code_page(coordinator.page_group(), &state), None);

        assert_eq!(coordinator.submit_text_code(&state), Ok(false));
        // Still pending: the channel stays open and empty.
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn device_name_collision_then_acceptance() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::PromptNewDeviceName,
            json!({"existingDevices": ["deva", "devb"]}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);
        assert_eq!(
            state.existing_devices,
            vec!["deva".into(), "devb".into()]
        );
        assert!(!state.has_error());

        let dupe = reduce(
            state,
            ProvisionAction::SubmitDeviceName {
                name: "deva".to_string(),
            },
        );
        assert!(dupe.has_error());
        assert_eq!(dupe.device_name, "deva");
        assert_eq!(
            page::show_set_device_name_page(coordinator.page_group(), &dupe),
            None
        );
        assert_eq!(coordinator.submit_device_name(&dupe), Ok(false));

        let accepted = reduce(
            dupe,
            ProvisionAction::SubmitDeviceName {
                name: "new name".to_string(),
            },
        );
        assert!(!accepted.has_error());
        assert_eq!(
            page::show_set_device_name_page(coordinator.page_group(), &accepted),
            Some(Navigate {
                tab: Tab::Login,
                stack: vec![Page::Login, Page::SetPublicName],
            })
        );

        assert_eq!(coordinator.submit_device_name(&accepted), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::DeviceName("new name".to_string()))
        );
        assert!(coordinator.submit_device_name(&accepted).is_err());
    }

    #[test]
    fn second_prompt_while_stashed_is_refused() {
        let mut coordinator = coordinator();
        let (first, _first_rx) = incoming(
            RpcMethod::DisplayAndPromptSecret,
            json!({"phrase": "mocktest"}),
        );
        coordinator.handle_incoming(first).unwrap();

        let (second, _second_rx) = incoming(
            RpcMethod::PromptNewDeviceName,
            json!({"existingDevices": []}),
        );
        assert_eq!(
            coordinator.handle_incoming(second),
            Err(CoordinatorError::StashOccupied {
                pending: RpcMethod::DisplayAndPromptSecret,
                incoming: RpcMethod::PromptNewDeviceName,
            })
        );
    }

    #[test]
    fn mismatched_submit_keeps_the_stash_alive() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::DisplayAndPromptSecret,
            json!({"phrase": "mocktest"}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);

        assert_eq!(
            coordinator.submit_device_name(&state),
            Err(CoordinatorError::ResponseKeyMismatch {
                wanted: RpcMethod::PromptNewDeviceName,
                have: RpcMethod::DisplayAndPromptSecret,
            })
        );

        // The pending call survived the bad submit.
        assert_eq!(coordinator.submit_text_code(&state), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::Secret {
                code: None,
                phrase: "mocktest".to_string(),
            })
        );
    }

    #[test]
    fn choose_device_round_trips_the_chosen_id() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::ChooseDevice,
            json!({
                "devices": [
                    {"type": "desktop", "name": "work laptop", "deviceID": "aa11"},
                    {"type": "mobile", "name": "phone", "deviceID": "bb22"}
                ],
                "canSelectNoDevice": false
            }),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);
        assert!(page::show_device_list_page(coordinator.page_group(), &state).is_some());

        let chosen = reduce(
            state,
            ProvisionAction::SubmitDeviceSelect {
                device_id: Some("bb22".into()),
            },
        );
        assert_eq!(coordinator.submit_device_select(&chosen), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::ChosenDevice("bb22".to_string()))
        );
    }

    #[test]
    fn device_select_waits_for_a_recorded_choice() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::ChooseDevice,
            json!({"devices": [{"type": "desktop", "name": "a", "deviceID": "aa11"}]}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);

        // No submission dispatched yet: not submittable, stash untouched.
        assert_eq!(coordinator.submit_device_select(&state), Ok(false));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn gpg_method_round_trips_the_ordinal() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::ChooseGpgMethod,
            json!({"keys": [{"keyID": "deadbeef", "algorithm": "rsa"}]}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);
        assert!(page::show_gpg_page(coordinator.page_group(), &state).is_some());

        let chosen = reduce(
            state,
            ProvisionAction::SubmitGpgMethod {
                method: GpgMethod::Sign,
            },
        );
        assert_eq!(coordinator.submit_gpg_method(&chosen), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::GpgMethod(GpgMethod::Sign))
        );
    }

    #[test]
    fn passphrase_retry_label_blocks_submission() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::GetPassphrase,
            json!({"pinentry": {"type": 2, "prompt": "Enter it", "retryLabel": "wrong passphrase"}}),
        );
        let action = coordinator.handle_incoming(call).unwrap().unwrap();
        let state = reduce(ProvisionState::new(), action);
        assert_eq!(state.error.expose(), "wrong passphrase");
        assert_eq!(
            page::show_passphrase_page(coordinator.page_group(), &state),
            None
        );
        assert_eq!(coordinator.submit_passphrase(&state), Ok(false));

        let retried = reduce(
            state,
            ProvisionAction::SubmitPassphrase {
                passphrase: secret("correct horse"),
            },
        );
        assert_eq!(coordinator.submit_passphrase(&retried), Ok(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            RpcReply::Result(ResponsePayload::Passphrase {
                passphrase: "correct horse".to_string(),
                store_secret: false,
            })
        );
    }

    #[test]
    fn handler_refuses_a_payload_for_another_method() {
        let mut coordinator = coordinator();
        let (responder, _rx) = Responder::channel();
        // Hand-build a call whose payload was decoded for a different method.
        let call = IncomingCall {
            method: RpcMethod::DisplayAndPromptSecret,
            payload: CallPayload::DeviceNamePrompt(ul_core::rpc::DeviceNamePromptArg {
                existing_devices: vec![],
                error_message: String::new(),
            }),
            responder,
        };
        assert_eq!(
            coordinator.handle_incoming(call),
            Err(CoordinatorError::PayloadMismatch {
                method: RpcMethod::DisplayAndPromptSecret,
            })
        );
    }

    #[test]
    fn dropping_the_coordinator_abandons_a_pending_call() {
        let mut coordinator = coordinator();
        let (call, mut rx) = incoming(
            RpcMethod::DisplayAndPromptSecret,
            json!({"phrase": "mocktest"}),
        );
        coordinator.handle_incoming(call).unwrap();
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);

        drop(coordinator);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Closed);
    }
}
