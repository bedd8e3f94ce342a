//! Pure page-selection: which UI page should be visible given the state.
//!
//! Selectors never navigate themselves; they produce an instruction the
//! routing collaborator consumes opaquely, or `None` when their page's
//! backing state is absent (including when an error is shown in place).

use serde::Serialize;

use crate::provision::state::ProvisionState;
use crate::rpc::PassphraseKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Login,
    Devices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Page {
    #[serde(rename = "login")]
    Login,
    #[serde(rename = "devicePage")]
    DevicePage,
    #[serde(rename = "codePage")]
    CodePage,
    #[serde(rename = "setPublicName")]
    SetPublicName,
    #[serde(rename = "selectDevice")]
    SelectDevice,
    #[serde(rename = "gpgSign")]
    GpgSign,
    #[serde(rename = "passphrase")]
    Passphrase,
    #[serde(rename = "paperkey")]
    PaperKey,
    #[serde(rename = "error")]
    Error,
}

/// One navigation instruction: `{tab, stack}`. Produced here, interpreted
/// only by the routing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigate {
    pub tab: Tab,
    pub stack: Vec<Page>,
}

/// Which navigation base the attempt uses. Picked once from the mode flag;
/// the protocol mechanics are identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageGroup {
    /// First-device provisioning, rooted in the login tab.
    Login,
    /// Adding a device to an existing account, rooted in the devices tab.
    Devices,
}

impl PageGroup {
    pub fn for_mode(adding_new_device: bool) -> Self {
        if adding_new_device {
            PageGroup::Devices
        } else {
            PageGroup::Login
        }
    }

    fn tab(self) -> Tab {
        match self {
            PageGroup::Login => Tab::Login,
            PageGroup::Devices => Tab::Devices,
        }
    }

    fn base(self) -> Vec<Page> {
        match self {
            PageGroup::Login => vec![Page::Login],
            PageGroup::Devices => vec![Page::DevicePage],
        }
    }

    fn to(self, page: Page) -> Navigate {
        let mut stack = self.base();
        stack.push(page);
        Navigate {
            tab: self.tab(),
            stack,
        }
    }
}

/// Code entry page: shown for a fresh pairing phrase. An error suppresses
/// navigation; it is rendered in place on whatever page is current.
pub fn show_code_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (!state.code_page_text_code.is_empty() && !state.has_error())
        .then(|| group.to(Page::CodePage))
}

/// Public-name page: shown only once a device name submission was accepted,
/// never merely because the prompt was displayed.
pub fn show_set_device_name_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (!state.device_name.is_empty() && !state.has_error()).then(|| group.to(Page::SetPublicName))
}

/// Device list page: shown while a choice is still pending.
pub fn show_device_list_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (!state.selectable_devices.is_empty()
        && state.selected_device.is_none()
        && !state.has_error())
    .then(|| group.to(Page::SelectDevice))
}

/// GPG method page: shown while the key-involvement choice is pending.
pub fn show_gpg_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (!state.gpg_keys.is_empty() && state.gpg_method.is_none() && !state.has_error())
        .then(|| group.to(Page::GpgSign))
}

pub fn show_passphrase_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (state.passphrase_kind == Some(PassphraseKind::Passphrase)
        && state.passphrase.is_empty()
        && !state.has_error())
    .then(|| group.to(Page::Passphrase))
}

pub fn show_paperkey_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    (state.passphrase_kind == Some(PassphraseKind::PaperKey)
        && state.passphrase.is_empty()
        && !state.has_error())
    .then(|| group.to(Page::PaperKey))
}

/// Terminal failure page.
pub fn show_final_error_page(group: PageGroup, state: &ProvisionState) -> Option<Navigate> {
    state.final_error.is_some().then(|| group.to(Page::Error))
}
