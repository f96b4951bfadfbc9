//! Presentation adapter.
//!
//! Translates user gestures into calls on the capability model and the
//! export pipeline. [`TierView`] is the data a UI needs to redraw itself
//! after a tier transition; [`ActionRouter`] checks permissions and either
//! runs the export, returns a share stub message or asks for an upgrade.

use crate::capability::{
    is_available, profile_of, required_tier, Capability, ExportFormat, ShareChannel, Tier,
};
use crate::error::ChartyError;
use crate::export::{ChartSource, ExportOutcome, ExportOverrides, ExportPipeline};
use crate::session::UsageRecorder;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

/// One export or share button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub id: &'static str,
    pub label: &'static str,
    pub available: bool,
    pub required_tier: Tier,
    /// Resolution label, shown on the JPG button only
    pub quality: Option<&'static str>,
}

/// Everything tier-dependent the UI displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierView {
    pub tier: Tier,
    pub display_name: &'static str,
    pub body_class: String,
    pub progress_percent: u8,
    pub quality_label: &'static str,
    pub formats: Vec<ActionButton>,
    pub channels: Vec<ActionButton>,
    pub watermark_note: &'static str,
    pub upgrade_prompt: Option<&'static str>,
    pub registration_message: Option<&'static str>,
    pub show_upgrade_button: bool,
    pub auto_spacing: bool,
    pub advanced_charts: bool,
    pub custom_branding: bool,
}

impl TierView {
    pub fn for_tier(tier: Tier) -> Self {
        let features = &profile_of(tier).features;

        let formats = ExportFormat::ALL
            .into_iter()
            .map(|format| ActionButton {
                id: format.as_str(),
                label: format.label(),
                available: is_available(tier, format),
                required_tier: required_tier(format),
                quality: (format == ExportFormat::Jpg).then(|| tier.quality_label()),
            })
            .collect();

        let channels = ShareChannel::ALL
            .into_iter()
            .map(|channel| ActionButton {
                id: channel.as_str(),
                label: channel.label(),
                available: is_available(tier, channel),
                required_tier: required_tier(channel),
                quality: None,
            })
            .collect();

        Self {
            tier,
            display_name: tier.display_name(),
            body_class: format!("tier-{}", tier.as_str()),
            progress_percent: tier.progress_percent(),
            quality_label: tier.quality_label(),
            formats,
            channels,
            watermark_note: if features.watermark {
                "Includes GetCharty.com Watermark"
            } else {
                "No watermark!"
            },
            upgrade_prompt: upgrade_prompt(tier),
            registration_message: tier
                .next()
                .map(|next| match next {
                    Tier::Registered => "Upgrade to Registered for this feature",
                    _ => "Upgrade to VIPer for this feature",
                }),
            show_upgrade_button: tier == Tier::Noob,
            auto_spacing: features.auto_spacing,
            advanced_charts: features.advanced_charts,
            custom_branding: features.custom_branding,
        }
    }

    pub fn available_formats(&self) -> impl Iterator<Item = &ActionButton> {
        self.formats.iter().filter(|b| b.available)
    }

    pub fn available_channels(&self) -> impl Iterator<Item = &ActionButton> {
        self.channels.iter().filter(|b| b.available)
    }
}

fn upgrade_prompt(tier: Tier) -> Option<&'static str> {
    match tier {
        Tier::Noob => Some("Register for Free to get PDF & HTML exports"),
        Tier::Registered => {
            Some("Upgrade to VIPer for SVG & PNG exports, custom coloring, and much more")
        }
        Tier::Viper => None,
    }
}

/// Message shown when a user follows the upgrade prompt.
pub fn upgrade_message(target: Tier) -> &'static str {
    match target {
        Tier::Noob | Tier::Registered => {
            "Redirecting to registration page... Register for free to unlock PDF, HTML exports and sharing features!"
        }
        Tier::Viper => {
            "Redirecting to VIPer upgrade page... Get premium exports, advanced sharing, and professional features!"
        }
    }
}

/// Stub share message for a channel at a tier.
pub fn share_message(channel: ShareChannel, tier: Tier) -> &'static str {
    match (channel, tier) {
        (ShareChannel::Socials, Tier::Noob) => {
            "Social Sharing (Noob)\n\nShare your chart on:\n- Twitter (with watermark)\n- Facebook (with watermark)\n- LinkedIn (Requires Registered)\n- Instagram (Requires VIPer)"
        }
        (ShareChannel::Socials, Tier::Registered) => {
            "Social Sharing (Registered)\n\nShare your chart on:\n- Twitter (reduced watermark)\n- Facebook (reduced watermark)\n- LinkedIn (reduced watermark)\n- Instagram Stories (Requires VIPer)\n- Custom formats (Requires VIPer)"
        }
        (ShareChannel::Socials, Tier::Viper) => {
            "Premium Social Sharing (VIPer)\n\nShare your chart on:\n- All platforms (minimal watermark)\n- Custom branded posts\n- Scheduled posting\n- Analytics tracking"
        }
        (ShareChannel::Permalink, _) => {
            "Permalink Sharing\n\nGenerate a shareable link to your chart that others can view and interact with."
        }
        (ShareChannel::Email, _) => {
            "Email Sharing\n\nSend your chart directly via email with custom branding and analytics tracking."
        }
    }
}

/// A user gesture on an export or share button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Export(ExportFormat),
    Share(ShareChannel),
}

impl Action {
    pub fn capability(&self) -> Capability {
        match self {
            Action::Export(format) => Capability::Format(*format),
            Action::Share(channel) => Capability::Channel(*channel),
        }
    }
}

impl FromStr for Action {
    type Err = ChartyError;

    /// Parse a button id such as `pdf` or `permalink`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Capability>()? {
            Capability::Format(format) => Ok(Action::Export(format)),
            Capability::Channel(channel) => Ok(Action::Share(channel)),
        }
    }
}

/// What handling an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Exported(ExportOutcome),
    Shared {
        channel: ShareChannel,
        message: &'static str,
    },
    /// The action is locked at the current tier; nothing was run
    UpgradeRequired {
        capability: Capability,
        required: Tier,
        message: String,
    },
}

impl ActionOutcome {
    /// Text shown to the user for this outcome.
    pub fn message(&self) -> String {
        match self {
            ActionOutcome::Exported(outcome) => format!(
                "{} Export: {} saved as {} ({})",
                outcome.tier.display_name(),
                outcome.format.label(),
                outcome.filename,
                if outcome.watermarked {
                    "Includes watermark"
                } else {
                    "No watermark!"
                }
            ),
            ActionOutcome::Shared { message, .. } => message.to_string(),
            ActionOutcome::UpgradeRequired { message, .. } => message.clone(),
        }
    }
}

/// Routes button actions to the export pipeline or share stubs.
pub struct ActionRouter {
    pipeline: Arc<ExportPipeline>,
    usage: UsageRecorder,
}

impl std::fmt::Debug for ActionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRouter")
            .field("tier", &self.pipeline.tier().current())
            .finish()
    }
}

impl ActionRouter {
    pub fn new(pipeline: Arc<ExportPipeline>, usage: UsageRecorder) -> Self {
        Self { pipeline, usage }
    }

    pub fn view(&self) -> TierView {
        TierView::for_tier(self.pipeline.tier().current())
    }

    /// Handle `action` for `chart`.
    ///
    /// A locked action yields [`ActionOutcome::UpgradeRequired`] without
    /// touching the pipeline. Export failures are returned as errors.
    pub async fn handle(
        &self,
        chart: &dyn ChartSource,
        action: Action,
        overrides: Option<&ExportOverrides>,
    ) -> Result<ActionOutcome, ChartyError> {
        let tier = self.pipeline.tier().current();
        let capability = action.capability();
        let required = required_tier(capability);

        if required > tier {
            let denied = ChartyError::PermissionDenied {
                capability: capability.describe(),
                required,
                current: tier,
            };
            tracing::info!(
                action = capability.as_str(),
                tier = tier.as_str(),
                required = required.as_str(),
                "Action locked at current tier"
            );
            return Ok(ActionOutcome::UpgradeRequired {
                capability,
                required,
                message: denied.user_message(),
            });
        }

        match action {
            Action::Export(format) => {
                let mut overrides = overrides.cloned().unwrap_or_default();
                overrides.format = Some(format);
                self.pipeline
                    .export_current_chart(chart, Some(&overrides))
                    .await
                    .map(ActionOutcome::Exported)
            }
            Action::Share(channel) => {
                self.usage
                    .record(&format!("share_{}", channel.as_str()), tier);
                Ok(ActionOutcome::Shared {
                    channel,
                    message: share_message(channel, tier),
                })
            }
        }
    }
}
