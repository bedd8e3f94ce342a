//! Provisioning flow orchestrator
//!
//! 这个模块把三个纯部件接到一起:协调器(呼叫分发与暂存)、归约器(纯状态转换)
//! 和页面选择器(纯导航决策),并把选出的导航指令交给路由端口执行。
//!
//! # Architecture / 架构
//!
//! ```text
//! Inbound RPC calls / User submissions
//!   ↓
//! ProvisionOrchestrator (serializes entry points)
//!   ↓
//! ProvisioningCoordinator (dispatch table + stash slot)
//!   ↓
//! reduce (pure state transitions)
//!   ↓
//! page selectors (pure navigation decisions)
//!   ↓
//! RouterPort side effect
//! ```

use std::mem;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info_span, Instrument};

use ul_core::ports::RouterPort;
use ul_core::provision::{page, reduce, Navigate, PageGroup, ProvisionAction, ProvisionState};
use ul_core::rpc::{GpgMethod, IncomingCall, PassphraseKind, RpcStatus};
use ul_core::{DeviceId, SecretString};

use super::coordinator::ProvisioningCoordinator;
use super::error::{CoordinatorError, ProvisionError};

type Selector = fn(PageGroup, &ProvisionState) -> Option<Navigate>;
type SubmitFn =
    fn(&mut ProvisioningCoordinator, &ProvisionState) -> Result<bool, CoordinatorError>;

/// Drives one provisioning attempt end to end.
///
/// 负责管理一次配网尝试,串行化入站呼叫与用户提交,并执行导航副作用。
pub struct ProvisionOrchestrator {
    page_group: PageGroup,
    coordinator: Mutex<ProvisioningCoordinator>,
    state: Mutex<ProvisionState>,
    /// Serializes every entry point, standing in for the host's effect queue.
    dispatch_lock: Mutex<()>,
    router: Arc<dyn RouterPort>,
}

impl ProvisionOrchestrator {
    pub fn new(adding_new_device: bool, router: Arc<dyn RouterPort>) -> Self {
        let coordinator = ProvisioningCoordinator::new(adding_new_device);
        Self {
            page_group: coordinator.page_group(),
            coordinator: Mutex::new(coordinator),
            state: Mutex::new(ProvisionState::new()),
            dispatch_lock: Mutex::new(()),
            router,
        }
    }

    pub fn page_group(&self) -> PageGroup {
        self.page_group
    }

    /// Read the current state under the lock, e.g. to render a prompt.
    pub async fn with_state<R>(&self, read: impl FnOnce(&ProvisionState) -> R) -> R {
        let state = self.state.lock().await;
        read(&state)
    }

    /// 处理一条入站呼叫
    ///
    /// Routes the call through the dispatch table and, for stashing prompts,
    /// applies the produced action.
    pub async fn handle_call(&self, call: IncomingCall) -> Result<(), ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.handle_call", method = %call.method);
        async {
            let action = {
                let mut coordinator = self.coordinator.lock().await;
                coordinator.handle_incoming(call)?
            };
            match action {
                Some(action) => self.apply(action).await,
                None => Ok(()),
            }
        }
        .instrument(span)
        .await
    }

    /// 用户提交配对码
    pub async fn submit_text_code(&self, phrase: SecretString) -> Result<bool, ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.submit_text_code");
        self.submit(
            ProvisionAction::SubmitTextCode { phrase },
            ProvisioningCoordinator::submit_text_code,
        )
        .instrument(span)
        .await
    }

    /// 用户提交设备名
    pub async fn submit_device_name(&self, name: String) -> Result<bool, ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.submit_device_name");
        self.submit(
            ProvisionAction::SubmitDeviceName { name },
            ProvisioningCoordinator::submit_device_name,
        )
        .instrument(span)
        .await
    }

    /// 用户选择一台已有设备(`None` 表示明确选择"无设备")
    pub async fn submit_device_select(
        &self,
        device_id: Option<DeviceId>,
    ) -> Result<bool, ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.submit_device_select");
        self.submit(
            ProvisionAction::SubmitDeviceSelect { device_id },
            ProvisioningCoordinator::submit_device_select,
        )
        .instrument(span)
        .await
    }

    /// 用户选择 GPG 参与方式
    pub async fn submit_gpg_method(&self, method: GpgMethod) -> Result<bool, ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.submit_gpg_method");
        self.submit(
            ProvisionAction::SubmitGpgMethod { method },
            ProvisioningCoordinator::submit_gpg_method,
        )
        .instrument(span)
        .await
    }

    /// 用户提交口令或纸钥匙
    pub async fn submit_passphrase(
        &self,
        passphrase: SecretString,
    ) -> Result<bool, ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let span = info_span!("provision.submit_passphrase");
        self.submit(
            ProvisionAction::SubmitPassphrase { passphrase },
            ProvisioningCoordinator::submit_passphrase,
        )
        .instrument(span)
        .await
    }

    /// Record a terminal failure reported by the engine and route to the
    /// error page. The attempt is over after this.
    pub async fn fail_attempt(&self, status: RpcStatus) -> Result<(), ProvisionError> {
        let _serial = self.dispatch_lock.lock().await;
        let code = status.code;
        let span = info_span!("provision.fail_attempt", code);
        self.apply(ProvisionAction::ShowFinalErrorPage { status })
            .instrument(span)
            .await
    }

    /// Reduce one arrival action into the state, then run its page selector
    /// and hand any instruction to the router. The state lock is released
    /// before the navigation side effect runs.
    async fn apply(&self, action: ProvisionAction) -> Result<(), ProvisionError> {
        debug!(action = action.name(), "applying action");
        let selector = selector_for(&action);
        let instruction = {
            let mut state = self.state.lock().await;
            *state = reduce(mem::take(&mut *state), action);
            selector.and_then(|select| select(self.page_group, &state))
        };
        self.navigate(instruction).await
    }

    /// Reduce one submission, resolve the stashed call from the reduced
    /// state, and navigate only once the resolution actually happened. A
    /// rejected entry (`Ok(false)`) leaves both the stash and the current
    /// page alone.
    async fn submit(
        &self,
        action: ProvisionAction,
        submit: SubmitFn,
    ) -> Result<bool, ProvisionError> {
        debug!(action = action.name(), "applying submission");
        let selector = selector_for(&action);
        let (resolved, instruction) = {
            let mut state = self.state.lock().await;
            *state = reduce(mem::take(&mut *state), action);
            let mut coordinator = self.coordinator.lock().await;
            let resolved = submit(&mut coordinator, &state)?;
            let instruction = if resolved {
                selector.and_then(|select| select(self.page_group, &state))
            } else {
                None
            };
            (resolved, instruction)
        };
        self.navigate(instruction).await?;
        Ok(resolved)
    }

    async fn navigate(&self, instruction: Option<Navigate>) -> Result<(), ProvisionError> {
        match instruction {
            Some(instruction) => self
                .router
                .navigate(instruction)
                .await
                .map_err(ProvisionError::Navigation),
            None => Ok(()),
        }
    }
}

/// Which selector an action can unlock. Prompt arrivals route to their page;
/// among submissions only the accepted device name navigates, the rest
/// re-render their prompt in place.
fn selector_for(action: &ProvisionAction) -> Option<Selector> {
    match action {
        ProvisionAction::ShowCodePage { .. } => Some(page::show_code_page),
        ProvisionAction::ShowDeviceListPage { .. } => Some(page::show_device_list_page),
        ProvisionAction::ShowGpgMethodPage { .. } => Some(page::show_gpg_page),
        ProvisionAction::ShowPassphrasePage {
            kind: PassphraseKind::Passphrase,
            ..
        } => Some(page::show_passphrase_page),
        ProvisionAction::ShowPassphrasePage {
            kind: PassphraseKind::PaperKey,
            ..
        } => Some(page::show_paperkey_page),
        ProvisionAction::ShowFinalErrorPage { .. } => Some(page::show_final_error_page),
        ProvisionAction::SubmitDeviceName { .. } => Some(page::show_set_device_name_page),
        _ => None,
    }
}
